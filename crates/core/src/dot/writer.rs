use std::io::{self, Write};

use crate::dot::quote;
use crate::graph::{Attrs, ClusterId, Graph, Node};

const INDENT: &str = "    ";

/// Serialize `graph` as a DOT digraph.
///
/// Output is fully determined by the graph: clusters and nodes are written in
/// creation order, edges in first-seen order, attributes sorted by key.
pub fn write_dot<W: Write>(graph: &Graph, out: &mut W) -> io::Result<()> {
    let opts = &graph.options;
    writeln!(out, "digraph bridgegraph {{")?;
    writeln!(out, "{INDENT}label={};", quote(&graph.title))?;
    writeln!(out, "{INDENT}labeljust=\"l\";")?;
    writeln!(out, "{INDENT}fontname=\"Arial\";")?;
    writeln!(out, "{INDENT}fontsize=\"14\";")?;
    writeln!(out, "{INDENT}rankdir={};", quote(opts.rankdir.as_str()))?;
    writeln!(out, "{INDENT}bgcolor=\"lightgray\";")?;
    writeln!(out, "{INDENT}style=\"solid\";")?;
    writeln!(out, "{INDENT}penwidth=\"0.5\";")?;
    writeln!(out, "{INDENT}pad=\"0.0\";")?;
    writeln!(out, "{INDENT}nodesep={};", quote(&opts.nodesep.to_string()))?;
    writeln!(out)?;
    writeln!(
        out,
        "{INDENT}node [shape={} style={} fillcolor=\"honeydew\" fontname=\"Verdana\" penwidth=\"1.0\" margin=\"0.05,0.0\"];",
        quote(&opts.nodeshape),
        quote(&opts.nodestyle)
    )?;
    writeln!(out, "{INDENT}edge [minlen={}];", quote(&opts.minlen.to_string()))?;
    writeln!(out)?;

    write_cluster(graph, graph.root(), 1, out)?;

    for id in graph.top_level() {
        write_node(graph.node(*id), 1, out)?;
    }
    for edge in graph.edges() {
        writeln!(
            out,
            "{INDENT}{} -> {} [ {}]",
            quote(&graph.node(edge.from).key),
            quote(&graph.node(edge.to).key),
            attr_list(&edge.attrs)
        )?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

/// Convenience wrapper returning the DOT text.
pub fn to_dot(graph: &Graph) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_dot(graph, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_cluster<W: Write>(graph: &Graph, id: ClusterId, depth: usize, out: &mut W) -> io::Result<()> {
    let pad = INDENT.repeat(depth);
    let cluster = graph.cluster(id);
    writeln!(out, "{pad}subgraph {} {{", quote(&format!("cluster_{}", cluster.key)))?;
    for (key, value) in cluster.attrs.iter() {
        writeln!(out, "{pad}{INDENT}{}={};", key, quote(value))?;
    }
    for node in &cluster.nodes {
        write_node(graph.node(*node), depth + 1, out)?;
    }
    for child in &cluster.children {
        write_cluster(graph, *child, depth + 1, out)?;
    }
    writeln!(out, "{pad}}}")?;
    Ok(())
}

fn write_node<W: Write>(node: &Node, depth: usize, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}{} [ {}]", INDENT.repeat(depth), quote(&node.key), attr_list(&node.attrs))
}

fn attr_list(attrs: &Attrs) -> String {
    attrs.iter().map(|(k, v)| format!("{}={} ", k, quote(v))).collect()
}
