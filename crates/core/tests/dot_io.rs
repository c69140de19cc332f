use bridgegraph_core::builder::build_graph;
use bridgegraph_core::config::{GraphConfig, GroupConfig, RankDir, RenderOptions};
use bridgegraph_core::dot::{parse_native_dot, quote, to_dot, write_dot};
use bridgegraph_core::model::{CallRelation, FunctionRef, PackageRef};

fn sample_relations() -> Vec<CallRelation> {
    let app = PackageRef::new("example.com/app", "app");
    let store = PackageRef::new("example.com/store", "store");
    vec![
        CallRelation::new(
            FunctionRef::new(app.clone(), "main").with_position("/src/app/main.go", 5),
            FunctionRef::new(store.clone(), "Open").with_position("/src/store/db.go", 20),
        )
        .at("/src/app/main.go", 7),
        CallRelation::new(
            FunctionRef::new(store.clone(), "Open"),
            FunctionRef::new(store, "Get").with_receiver("DB", true),
        )
        .at("/src/store/db.go", 22),
    ]
}

#[test]
fn serialization_is_deterministic() {
    let cfg = GraphConfig {
        group: GroupConfig { package: true, by_type: true },
        ..Default::default()
    };
    let (first, _) = build_graph("example.com/app", &sample_relations(), &cfg).unwrap();
    let (second, _) = build_graph("example.com/app", &sample_relations(), &cfg).unwrap();
    let dot = to_dot(&first);
    assert_eq!(dot, to_dot(&second));
    assert_eq!(dot, to_dot(&first));
}

#[test]
fn writer_emits_graph_clusters_nodes_and_edges() {
    let (graph, _) =
        build_graph("example.com/app", &sample_relations(), &GraphConfig::default()).unwrap();
    let dot = to_dot(&graph);

    assert!(dot.starts_with("digraph bridgegraph {\n"));
    assert!(dot.trim_end().ends_with('}'));
    assert!(dot.contains("label=\"example.com/app\";"));
    assert!(dot.contains("rankdir=\"LR\";"));
    assert!(dot.contains("nodesep=\"0.35\";"));
    assert!(dot.contains("node [shape=\"box\" style=\"filled,rounded\""));
    assert!(dot.contains("edge [minlen=\"2\"];"));
    assert!(dot.contains("subgraph \"cluster_focus\" {"));
    assert!(dot.contains(
        "\"example.com/app.main\" [ fillcolor=\"moccasin\" label=\"app\\nmain\" penwidth=\"0.5\" "
    ));
    assert!(dot.contains(
        "\"example.com/app.main\" -> \"example.com/store.Open\" [ tooltip=\"at main.go:7: calling [example.com/store.Open]\" ]"
    ));
}

#[test]
fn writer_honors_render_options() {
    let cfg = GraphConfig {
        render: RenderOptions {
            minlen: 3,
            nodesep: 0.5,
            nodeshape: "ellipse".into(),
            nodestyle: "filled".into(),
            rankdir: RankDir::TB,
        },
        ..Default::default()
    };
    let (graph, _) = build_graph("example.com/app", &sample_relations(), &cfg).unwrap();
    let mut buf = Vec::new();
    write_dot(&graph, &mut buf).unwrap();
    let dot = String::from_utf8(buf).unwrap();
    assert!(dot.contains("rankdir=\"TB\";"));
    assert!(dot.contains("nodesep=\"0.5\";"));
    assert!(dot.contains("node [shape=\"ellipse\" style=\"filled\""));
    assert!(dot.contains("edge [minlen=\"3\"];"));
}

#[test]
fn quote_escapes_special_characters() {
    assert_eq!(quote("plain"), "\"plain\"");
    assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    assert_eq!(quote("a\\b"), "\"a\\\\b\"");
    assert_eq!(quote("line1\r\nline2"), "\"line1\\nline2\"");
}

#[test]
fn reader_parses_opt_callgraph_output() {
    let input = r#"digraph "Call graph: linked.ll" {
	label="Call graph: linked.ll";

	Node0x1 [shape=record,label="{external node}"];
	Node0x1 -> Node0x2;
	Node0x1 -> Node0x3;
	Node0x2 [shape=record,label="{native_fn}"];
	Node0x2 -> Node0x3;
	Node0x2 -> Node0x4;
	Node0x3 [shape=record,label="{helper}"];
	Node0x4 [shape=record,label="{null function}"];
}
"#;
    let graph = parse_native_dot(input).unwrap();
    assert_eq!(graph.nodes(), &["native_fn".to_string(), "helper".to_string()]);
    assert_eq!(graph.edges(), &[("native_fn".to_string(), "helper".to_string())]);
}

#[test]
fn reader_handles_comments_ports_subgraphs_and_defaults() {
    let input = r#"
# generated
strict digraph cg {
    // defaults
    graph [rankdir=LR];
    node [shape=box];
    edge [color=gray];
    /* block
       comment */
    subgraph cluster_0 {
        a [label="{alpha|{<s0>|<s1>}}"];
        b [label="beta"];
    }
    a:s0 -> b -> "c d" [weight=-1];
    e;
}
"#;
    let graph = parse_native_dot(input).unwrap();
    assert_eq!(
        graph.nodes(),
        &["alpha".to_string(), "beta".to_string(), "c d".to_string(), "e".to_string()]
    );
    assert_eq!(
        graph.edges(),
        &[
            ("alpha".to_string(), "beta".to_string()),
            ("beta".to_string(), "c d".to_string())
        ]
    );
    assert!(graph.contains("e"));
}

#[test]
fn reader_drops_empty_labels() {
    let input = "digraph { n1 [label=\"{}\"]; n2 [label=\"{main}\"]; n1 -> n2; }";
    let graph = parse_native_dot(input).unwrap();
    assert_eq!(graph.nodes(), &["main".to_string()]);
    assert!(graph.edges().is_empty());
}

#[test]
fn reader_reports_line_of_errors() {
    let err = parse_native_dot("digraph g {\n  a -> ;\n}").unwrap_err();
    assert_eq!(err.line, 2);

    let err = parse_native_dot("graph g {\n a [label=\"unterminated];\n}").unwrap_err();
    assert_eq!(err.line, 2);
    assert!(err.message.contains("unterminated"));

    assert!(parse_native_dot("not a graph").is_err());
    assert!(parse_native_dot("digraph g { a -> b;").is_err());
}
