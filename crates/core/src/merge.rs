//! Cross-graph merge: fuse a native call graph into the managed graph.
//!
//! Resolution order for a native function name:
//! 1. a top-level node whose key is exactly the name (e.g. a node an earlier
//!    merge step synthesized),
//! 2. the first cluster node whose unqualified name matches, scanning clusters
//!    depth-first in creation order and nodes in insertion order,
//! 3. a freshly synthesized, default-styled top-level node.
//!
//! The merge is best-effort: a binding whose wrapper is absent from the
//! managed graph is logged and skipped.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::graph::{Attrs, Graph, NodeId};
use crate::native::NativeGraph;

/// Edge description for calls inside the native graph.
pub const NATIVE_CALL: &str = "native call";
/// Edge description for wrapper -> native boundary calls.
pub const BINDING_CALL: &str = "binding call";

/// Maps managed-side binding wrappers to the native function they invoke.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BindingMap {
    entries: BTreeMap<String, String>,
}

impl BindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick out every symbol whose unqualified name starts with `prefix`.
    ///
    /// `example.com/app._Cfunc_puts` maps to `puts`.
    pub fn from_symbols<I, S>(symbols: I, prefix: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        for symbol in symbols {
            let symbol = symbol.as_ref();
            let simple = simple_name(symbol);
            if let Some(target) = simple.strip_prefix(prefix) {
                if !target.is_empty() {
                    map.insert(symbol, target);
                }
            }
        }
        debug!("binding map: {:?}", map.entries);
        map
    }

    pub fn insert(&mut self, wrapper: impl Into<String>, target: impl Into<String>) {
        self.entries.insert(wrapper.into(), target.into());
    }

    pub fn get(&self, wrapper: &str) -> Option<&str> {
        self.entries.get(wrapper).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Last dotted component of an identity, without any `#signature` suffix.
pub fn simple_name(identity: &str) -> &str {
    let base = identity.split('#').next().unwrap_or(identity);
    base.rsplit('.').next().unwrap_or(base)
}

/// What the merge did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub native_nodes: usize,
    /// Native functions matched to an existing managed node.
    pub resolved_managed: usize,
    /// Nodes created because nothing matched.
    pub synthesized: usize,
    pub native_edges: usize,
    pub boundary_edges: usize,
    /// Wrappers with no node in the managed graph.
    pub skipped_wrappers: Vec<String>,
}

/// Find the node a native function name refers to, if any.
pub fn find_native_node(graph: &Graph, name: &str) -> Option<NodeId> {
    if let Some(id) = graph.find_node(name) {
        if graph.node(id).cluster.is_none() {
            return Some(id);
        }
    }
    graph
        .clusters_preorder()
        .into_iter()
        .flat_map(|c| graph.cluster(c).nodes.iter().copied())
        .find(|id| graph.node(*id).name == name)
}

fn synthesize(graph: &mut Graph, name: &str, report: &mut MergeReport) -> NodeId {
    let (id, created) = graph.insert_node(name, name, Attrs::defaults(name), None);
    if created {
        report.synthesized += 1;
    }
    id
}

/// Merge `native` into `graph`, then link every binding wrapper to its target.
pub fn merge_native(graph: &mut Graph, native: &NativeGraph, bindings: &BindingMap) -> MergeReport {
    let mut report = MergeReport { native_nodes: native.nodes().len(), ..Default::default() };
    info!("merging native graph: {} nodes, {} edges", native.nodes().len(), native.edges().len());

    let mut resolved: HashMap<&str, NodeId> = HashMap::new();
    for name in native.nodes() {
        let id = match find_native_node(graph, name) {
            Some(id) => {
                debug!("{} in managed side", name);
                if graph.node(id).cluster.is_some() {
                    report.resolved_managed += 1;
                }
                id
            }
            None => {
                debug!("{} in native side", name);
                synthesize(graph, name, &mut report)
            }
        };
        resolved.insert(name.as_str(), id);
    }

    for (caller, callee) in native.edges() {
        let (Some(&from), Some(&to)) = (resolved.get(caller.as_str()), resolved.get(callee.as_str()))
        else {
            warn!("native edge {} -> {} references an undeclared node; skipped", caller, callee);
            continue;
        };
        let key = format!("{} = {} => {}", graph.node(from).key, NATIVE_CALL, graph.node(to).key);
        let (_, created) = graph.insert_edge(key, from, to, Attrs::defaults(""));
        if created {
            report.native_edges += 1;
            debug!("add native edge: {} -> {}", caller, callee);
        }
    }

    for (wrapper, target) in bindings.iter() {
        let Some(from) = graph.find_node(wrapper) else {
            warn!("managed side {}()'s node not found", wrapper);
            report.skipped_wrappers.push(wrapper.to_string());
            continue;
        };
        let to = match resolved.get(target) {
            Some(&id) => id,
            None => {
                debug!("{} not found in native side", target);
                synthesize(graph, target, &mut report)
            }
        };
        let key = format!("{} = {} => {}", graph.node(from).key, BINDING_CALL, graph.node(to).key);
        let (_, created) = graph.insert_edge(key, from, to, Attrs::defaults(""));
        if created {
            report.boundary_edges += 1;
        }
    }

    info!(
        "merge done: {} matched, {} synthesized, {} native edges, {} boundary edges, {} skipped",
        report.resolved_managed,
        report.synthesized,
        report.native_edges,
        report.boundary_edges,
        report.skipped_wrappers.len()
    );
    report
}
