//! Graph model: nodes, deduplicated edges and a nested cluster tree.
//!
//! Storage is arena-style. Nodes, edges and clusters live in `Vec`s owned by
//! the `Graph` and are addressed by small copyable ids, with key -> id maps for
//! identity lookups. Clusters are only ever created beneath an existing
//! parent, so the tree cannot contain cycles.

pub mod attrs;

use std::collections::HashMap;

use serde::Serialize;

use crate::config::RenderOptions;

pub use attrs::Attrs;

/// Key of the root cluster.
pub const ROOT_CLUSTER_KEY: &str = "focus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClusterId(pub usize);

/// A function in the rendered graph.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// Unique identity (fully qualified function name, or native symbol).
    pub key: String,
    /// Unqualified function name; what native symbols are matched against.
    pub name: String,
    pub attrs: Attrs,
    /// Owning cluster; `None` means the node sits in the top-level list.
    pub cluster: Option<ClusterId>,
}

/// A deduplicated call edge.
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    /// `<caller> = <description> => <callee>`
    pub key: String,
    pub attrs: Attrs,
}

/// A nested group of nodes (package or receiver type).
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    pub key: String,
    pub attrs: Attrs,
    pub parent: Option<ClusterId>,
    pub nodes: Vec<NodeId>,
    /// Child clusters in creation order.
    pub children: Vec<ClusterId>,
    #[serde(skip)]
    child_index: HashMap<String, ClusterId>,
}

impl Cluster {
    fn new(key: impl Into<String>, attrs: Attrs, parent: Option<ClusterId>) -> Self {
        Self {
            key: key.into(),
            attrs,
            parent,
            nodes: Vec::new(),
            children: Vec::new(),
            child_index: HashMap::new(),
        }
    }

    pub fn child(&self, key: &str) -> Option<ClusterId> {
        self.child_index.get(key).copied()
    }
}

/// The whole rendered graph. Built once per run, serialized, then dropped.
#[derive(Debug, Clone, Serialize)]
pub struct Graph {
    pub title: String,
    pub options: RenderOptions,
    nodes: Vec<Node>,
    #[serde(skip)]
    node_index: HashMap<String, NodeId>,
    top_level: Vec<NodeId>,
    clusters: Vec<Cluster>,
    edges: Vec<Edge>,
    #[serde(skip)]
    edge_index: HashMap<String, EdgeId>,
}

impl Graph {
    /// Create an empty graph with just the root cluster.
    pub fn new(title: impl Into<String>, options: RenderOptions, root_attrs: Attrs) -> Self {
        Self {
            title: title.into(),
            options,
            nodes: Vec::new(),
            node_index: HashMap::new(),
            top_level: Vec::new(),
            clusters: vec![Cluster::new(ROOT_CLUSTER_KEY, root_attrs, None)],
            edges: Vec::new(),
            edge_index: HashMap::new(),
        }
    }

    pub fn root(&self) -> ClusterId {
        ClusterId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find_node(&self, key: &str) -> Option<NodeId> {
        self.node_index.get(key).copied()
    }

    /// Nodes not owned by any cluster, in insertion order.
    pub fn top_level(&self) -> &[NodeId] {
        &self.top_level
    }

    /// Insert a node unless one with `key` already exists.
    ///
    /// Returns the node id and whether it was created. An existing node keeps
    /// its attributes and placement.
    pub fn insert_node(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        attrs: Attrs,
        cluster: Option<ClusterId>,
    ) -> (NodeId, bool) {
        let key = key.into();
        if let Some(id) = self.node_index.get(&key) {
            return (*id, false);
        }
        let id = NodeId(self.nodes.len());
        match cluster {
            Some(c) => self.clusters[c.0].nodes.push(id),
            None => self.top_level.push(id),
        }
        self.node_index.insert(key.clone(), id);
        self.nodes.push(Node { key, name: name.into(), attrs, cluster });
        (id, true)
    }

    pub fn cluster(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id.0]
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Fetch the child cluster `key` under `parent`, creating it with
    /// `make_attrs` on first use.
    pub fn ensure_cluster(
        &mut self,
        parent: ClusterId,
        key: &str,
        make_attrs: impl FnOnce() -> Attrs,
    ) -> ClusterId {
        if let Some(id) = self.clusters[parent.0].child(key) {
            return id;
        }
        let id = ClusterId(self.clusters.len());
        self.clusters.push(Cluster::new(key, make_attrs(), Some(parent)));
        let parent_cluster = &mut self.clusters[parent.0];
        parent_cluster.children.push(id);
        parent_cluster.child_index.insert(key.to_string(), id);
        id
    }

    /// Cluster ids in depth-first pre-order starting at the root.
    pub fn clusters_preorder(&self) -> Vec<ClusterId> {
        let mut out = Vec::with_capacity(self.clusters.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.clusters[id.0].children.iter().rev().copied());
        }
        out
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.0]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn find_edge(&self, key: &str) -> Option<EdgeId> {
        self.edge_index.get(key).copied()
    }

    /// Insert an edge unless one with `key` already exists.
    pub fn insert_edge(
        &mut self,
        key: impl Into<String>,
        from: NodeId,
        to: NodeId,
        attrs: Attrs,
    ) -> (EdgeId, bool) {
        let key = key.into();
        if let Some(id) = self.edge_index.get(&key) {
            return (*id, false);
        }
        let id = EdgeId(self.edges.len());
        self.edge_index.insert(key.clone(), id);
        self.edges.push(Edge { from, to, key, attrs });
        (id, true)
    }
}
