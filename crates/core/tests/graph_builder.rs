use std::collections::HashSet;

use bridgegraph_core::builder::{build_graph, BuildError, GraphBuilder};
use bridgegraph_core::config::{FilterConfig, GraphConfig, GroupConfig};
use bridgegraph_core::filter::Decision;
use bridgegraph_core::graph::Graph;
use bridgegraph_core::model::{CallKind, CallRelation, FunctionRef, PackageRef};

const APP: &str = "example.com/app";

fn app() -> PackageRef {
    PackageRef::new(APP, "app")
}

fn store() -> PackageRef {
    PackageRef::new("example.com/store", "store")
}

fn config_with(filter: FilterConfig, group: GroupConfig) -> GraphConfig {
    GraphConfig { filter, group, ..Default::default() }
}

fn node_attr<'g>(graph: &'g Graph, key: &str, attr: &str) -> Option<&'g str> {
    let id = graph.find_node(key).expect("node present");
    graph.node(id).attrs.get(attr)
}

#[test]
fn duplicate_calls_collapse_into_one_edge() {
    let f = FunctionRef::new(app(), "f").with_position("/src/app/main.go", 10);
    let g = FunctionRef::new(app(), "g").with_position("/src/app/util.go", 3);
    let relations = vec![
        CallRelation::new(f.clone(), g.clone()).at("/src/app/main.go", 12),
        CallRelation::new(f, g).at("/src/app/main.go", 14),
    ];

    let (graph, stats) = build_graph(APP, &relations, &GraphConfig::default()).unwrap();
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.node_count(), 2);
    assert_eq!(stats.visited, 2);
    assert_eq!(stats.accepted, 2);

    let edge = &graph.edges()[0];
    assert_eq!(edge.key, "example.com/app.f = static function call => example.com/app.g");
    assert_eq!(
        edge.attrs.get("tooltip"),
        Some("at main.go:12: calling [example.com/app.g]\nat main.go:14: calling [example.com/app.g]")
    );
    assert_eq!(
        node_attr(&graph, "example.com/app.f", "tooltip"),
        Some(
            "example.com/app.f | defined in main.go:10\n\
             at main.go:12: calling [example.com/app.g]\n\
             at main.go:14: calling [example.com/app.g]"
        )
    );
}

#[test]
fn different_call_kinds_are_different_edges() {
    let f = FunctionRef::new(app(), "f");
    let g = FunctionRef::new(app(), "g");
    let relations = vec![
        CallRelation::new(f.clone(), g.clone()),
        CallRelation::new(f.clone(), g.clone()).with_kind(CallKind::Spawn { dynamic: false }),
        CallRelation::new(f.clone(), g.clone()).with_kind(CallKind::Deferred { dynamic: true }),
        CallRelation::new(f, g).with_kind(CallKind::Dynamic),
    ];
    let (graph, _) = build_graph(APP, &relations, &GraphConfig::default()).unwrap();
    assert_eq!(graph.edge_count(), 4);

    let spawn = graph
        .find_edge("example.com/app.f = concurrent static function call => example.com/app.g")
        .expect("spawn edge");
    assert_eq!(graph.edge(spawn).attrs.get("arrowhead"), Some("normalnoneodot"));
    assert_eq!(graph.edge(spawn).attrs.get("style"), None);

    let deferred = graph
        .find_edge("example.com/app.f = deferred dynamic function call => example.com/app.g")
        .expect("deferred edge");
    assert_eq!(graph.edge(deferred).attrs.get("arrowhead"), Some("normalnoneodiamond"));
    assert_eq!(graph.edge(deferred).attrs.get("style"), Some("dashed"));

    let dynamic = graph
        .find_edge("example.com/app.f = dynamic function call => example.com/app.g")
        .expect("dynamic edge");
    assert_eq!(graph.edge(dynamic).attrs.get("style"), Some("dashed"));
}

#[test]
fn node_and_edge_keys_stay_unique() {
    let names = ["a", "b", "c"];
    let mut relations = Vec::new();
    for caller in names {
        for callee in names {
            let rel = CallRelation::new(FunctionRef::new(app(), caller), FunctionRef::new(app(), callee));
            relations.push(rel.clone());
            relations.push(rel);
        }
    }
    let (graph, _) = build_graph(APP, &relations, &GraphConfig::default()).unwrap();

    let node_keys: HashSet<_> = graph.nodes().iter().map(|n| n.key.as_str()).collect();
    let edge_keys: HashSet<_> = graph.edges().iter().map(|e| e.key.as_str()).collect();
    assert_eq!(node_keys.len(), graph.node_count());
    assert_eq!(edge_keys.len(), graph.edge_count());
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 9);
}

#[test]
fn semi_focus_edge_is_drawn_out_of_focus() {
    let p = PackageRef::new("example.com/p", "p");
    let q = PackageRef::new("example.com/q", "q");
    let r = PackageRef::new("example.com/r", "r");
    let relations = vec![
        CallRelation::new(FunctionRef::new(q.clone(), "a"), FunctionRef::new(r.clone(), "b")),
        CallRelation::new(FunctionRef::new(p.clone(), "x"), FunctionRef::new(q, "a")),
        CallRelation::new(FunctionRef::new(r, "b"), FunctionRef::new(p, "y")),
    ];
    let cfg = config_with(
        FilterConfig { focus: Some("example.com/p".into()), ..Default::default() },
        GroupConfig::default(),
    );
    let (graph, stats) = build_graph("example.com/p", &relations, &cfg).unwrap();
    assert_eq!(stats.accepted, 3);
    let bridge = graph
        .find_edge("example.com/q.a = static function call => example.com/r.b")
        .expect("bridge edge");
    assert_eq!(graph.edge(bridge).attrs.get("color"), Some("saddlebrown"));

    // Focus nodes: focus fill, no package prefix in the label.
    assert_eq!(node_attr(&graph, "example.com/p.x", "fillcolor"), Some("lightblue"));
    assert_eq!(node_attr(&graph, "example.com/p.x", "label"), Some("x"));
    assert_eq!(node_attr(&graph, "example.com/q.a", "label"), Some("q\na"));

    let root = graph.cluster(graph.root());
    assert_eq!(root.attrs.get("label"), Some("p"));
    assert_eq!(root.attrs.get("bgcolor"), Some("#e6ecfa"));
}

#[test]
fn rejected_relations_create_no_nodes() {
    let relations = vec![
        CallRelation::new(
            FunctionRef::new(app(), "main"),
            FunctionRef::new(PackageRef::std("fmt", "fmt"), "Println"),
        ),
        CallRelation::new(FunctionRef::new(app(), "main"), FunctionRef::new(app(), "helper")),
    ];
    let cfg = config_with(
        FilterConfig { nostd: true, nointer: true, ..Default::default() },
        GroupConfig::default(),
    );
    let (graph, stats) = build_graph(APP, &relations, &cfg).unwrap();
    assert_eq!(stats.visited, 2);
    assert_eq!(stats.accepted, 0);
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn limit_scenario_accepts_only_inner_calls() {
    let a = PackageRef::new("pkgA", "pkgA");
    let b = PackageRef::new("pkgB", "pkgB");
    let relations = vec![
        CallRelation::new(FunctionRef::new(a.clone(), "f"), FunctionRef::new(b, "g")),
        CallRelation::new(FunctionRef::new(a.clone(), "f"), FunctionRef::new(a, "h")),
    ];
    let cfg = config_with(
        FilterConfig { limit: vec!["pkgA".into()], ..Default::default() },
        GroupConfig::default(),
    );
    let (graph, _) = build_graph("pkgA", &relations, &cfg).unwrap();
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.find_node("pkgB.g").is_none());
    assert!(graph.find_edge("pkgA.f = static function call => pkgA.h").is_some());
}

#[test]
fn focus_package_methods_are_not_type_clustered() {
    let open = FunctionRef::new(app(), "Open").with_receiver("T", true);
    let close = FunctionRef::new(app(), "Close").with_receiver("T", false);
    let get = FunctionRef::new(store(), "Get").with_receiver("DB", true);
    let main = FunctionRef::new(app(), "main");
    let relations = vec![
        CallRelation::new(main.clone(), open),
        CallRelation::new(main.clone(), close),
        CallRelation::new(main, get),
    ];
    let cfg = config_with(
        FilterConfig { focus: Some(APP.into()), ..Default::default() },
        GroupConfig { package: false, by_type: true },
    );
    let (graph, stats) = build_graph(APP, &relations, &cfg).unwrap();

    // Root plus one type cluster for the out-of-focus receiver.
    assert_eq!(stats.clusters, 2);
    let root = graph.cluster(graph.root());
    assert_eq!(root.nodes.len(), 3);
    let type_cluster = root.child("example.com/store.DB").expect("type cluster");
    assert_eq!(graph.cluster(type_cluster).attrs.get("label"), Some("DB"));
    assert_eq!(graph.cluster(type_cluster).attrs.get("fillcolor"), Some("wheat2"));
    assert_eq!(node_attr(&graph, "(*example.com/store.DB).Get", "label"), Some("store\nGet"));
    assert_eq!(node_attr(&graph, "(*example.com/app.T).Open", "label"), Some("Open"));
}

#[test]
fn package_and_type_grouping_nest_clusters() {
    let get = FunctionRef::new(store(), "Get").with_receiver("DB", true);
    let put = FunctionRef::new(store(), "Put").with_receiver("DB", false);
    let serve = FunctionRef::new(PackageRef::std("net/http", "http"), "ListenAndServe");
    let main = FunctionRef::new(app(), "main");
    let relations = vec![
        CallRelation::new(main.clone(), get),
        CallRelation::new(main.clone(), put),
        CallRelation::new(main, serve),
    ];
    let cfg = config_with(FilterConfig::default(), GroupConfig { package: true, by_type: true });
    let (graph, _) = build_graph(APP, &relations, &cfg).unwrap();

    let root = graph.cluster(graph.root());
    let store_id = root.child("example.com/store").expect("store cluster");
    let store_cluster = graph.cluster(store_id);
    assert_eq!(store_cluster.attrs.get("label"), Some("store"));
    assert_eq!(store_cluster.attrs.get("fillcolor"), Some("lightyellow"));
    assert_eq!(store_cluster.attrs.get("tooltip"), Some("package: example.com/store"));
    assert!(store_cluster.nodes.is_empty());

    // Pointer and value receiver methods share one type cluster.
    assert_eq!(store_cluster.children.len(), 1);
    let db = graph.cluster(store_cluster.children[0]);
    assert_eq!(db.key, "example.com/store.DB");
    assert_eq!(db.parent, Some(store_id));
    assert_eq!(db.nodes.len(), 2);
    let get_id = graph.find_node("(*example.com/store.DB).Get").expect("pointer method");
    let put_id = graph.find_node("(example.com/store.DB).Put").expect("value method");
    assert!(db.nodes.contains(&get_id) && db.nodes.contains(&put_id));

    let http = graph.cluster(root.child("net/http").expect("std cluster"));
    assert_eq!(http.attrs.get("label"), Some("net/http"));
    assert_eq!(http.attrs.get("fillcolor"), Some("#E0FFE1"));
    assert_eq!(node_attr(&graph, "net/http.ListenAndServe", "fillcolor"), Some("#adedad"));
    assert_eq!(node_attr(&graph, "net/http.ListenAndServe", "penwidth"), Some("1.5"));

    // Every cluster is reachable from the root exactly once.
    let order = graph.clusters_preorder();
    assert_eq!(order.len(), graph.cluster_count());
    let unique: HashSet<_> = order.iter().collect();
    assert_eq!(unique.len(), order.len());
    for id in order.iter().skip(1) {
        assert!(graph.cluster(*id).parent.is_some());
    }
}

#[test]
fn closures_are_dotted() {
    let main = FunctionRef::new(app(), "main");
    let closure = FunctionRef::new(app(), "main$1").with_enclosing("main");
    let relations = vec![CallRelation::new(main, closure)];
    let (graph, _) = build_graph(APP, &relations, &GraphConfig::default()).unwrap();
    assert_eq!(node_attr(&graph, "example.com/app.main$1", "style"), Some("dotted,filled"));
    assert_eq!(node_attr(&graph, "example.com/app.main$1", "penwidth"), Some("0.5"));
    assert_eq!(node_attr(&graph, "example.com/app.main", "penwidth"), Some("0.5"));
}

#[test]
fn malformed_relation_fails_before_building() {
    let relations = vec![
        CallRelation::new(FunctionRef::new(app(), "main"), FunctionRef::new(app(), "Run")),
        CallRelation::new(FunctionRef::new(app(), "main"), FunctionRef::new(app(), "")),
    ];
    let err = build_graph(APP, &relations, &GraphConfig::default()).unwrap_err();
    assert!(matches!(err, BuildError::MalformedRelation { index: 1, .. }));

    let bad_pkg = vec![CallRelation::new(
        FunctionRef::new(PackageRef::new("", "x"), "F"),
        FunctionRef::new(app(), "Run"),
    )];
    assert!(build_graph(APP, &bad_pkg, &GraphConfig::default()).is_err());
}

#[test]
fn builder_reports_each_decision() {
    let relations = vec![
        CallRelation::new(FunctionRef::new(app(), "main"), FunctionRef::new(app(), "Run")),
        CallRelation::new(FunctionRef::new(app(), "main"), FunctionRef::new(app(), "run")),
    ];
    let cfg = config_with(FilterConfig { nointer: true, ..Default::default() }, GroupConfig::default());
    let mut builder = GraphBuilder::new(APP, &relations, &cfg);
    assert!(matches!(builder.push(&relations[0]), Decision::Accept { .. }));
    assert!(!builder.push(&relations[1]).is_accepted());
    let (graph, stats) = builder.finish();
    assert_eq!(stats.visited, 2);
    assert_eq!(stats.accepted, 1);
    assert_eq!(graph.node_count(), 2);
}
