//! Node/edge synthesis, deduplication and clustering.
//!
//! `GraphBuilder` consumes the relation stream one relation at a time:
//! filter, resolve (create-or-fetch) both endpoint nodes, then create or
//! extend the deduplicated edge. Clusters are created lazily as nodes are
//! placed. The whole stream is validated up front so a malformed record never
//! leaves a half-built graph behind.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::GraphConfig;
use crate::filter::{Decision, RelationFilter};
use crate::graph::{Attrs, ClusterId, Graph, NodeId};
use crate::model::{CallRelation, FunctionRef};

pub const FOCUS_FILL: &str = "lightblue";
pub const STD_FILL: &str = "#adedad";
pub const NODE_FILL: &str = "moccasin";
pub const OUT_OF_FOCUS_EDGE: &str = "saddlebrown";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("malformed call relation #{index}: {reason}")]
    MalformedRelation { index: usize, reason: String },
}

/// Counters reported after a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub visited: usize,
    pub accepted: usize,
    pub nodes: usize,
    pub edges: usize,
    pub clusters: usize,
}

/// Check that every relation carries the metadata synthesis relies on.
pub fn validate_relations(relations: &[CallRelation]) -> Result<(), BuildError> {
    for (index, rel) in relations.iter().enumerate() {
        for (role, func) in [("caller", &rel.caller), ("callee", &rel.callee)] {
            if func.name.trim().is_empty() {
                return Err(BuildError::MalformedRelation {
                    index,
                    reason: format!("{role} has an empty name"),
                });
            }
            if let Some(pkg) = &func.package {
                if pkg.path.trim().is_empty() {
                    return Err(BuildError::MalformedRelation {
                        index,
                        reason: format!("{role} '{}' has an empty package path", func.name),
                    });
                }
            }
            if let Some(recv) = &func.receiver {
                if recv.type_name.trim().is_empty() {
                    return Err(BuildError::MalformedRelation {
                        index,
                        reason: format!("{role} '{}' has an empty receiver type", func.name),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Build the managed call graph for `relations`.
pub fn build_graph(
    title: &str,
    relations: &[CallRelation],
    config: &GraphConfig,
) -> Result<(Graph, BuildStats), BuildError> {
    validate_relations(relations)?;
    let mut builder = GraphBuilder::new(title, relations, config);
    for rel in relations {
        builder.push(rel);
    }
    Ok(builder.finish())
}

pub struct GraphBuilder<'a> {
    config: &'a GraphConfig,
    filter: RelationFilter<'a>,
    graph: Graph,
    stats: BuildStats,
}

impl<'a> GraphBuilder<'a> {
    /// `relations` is only used to precompute focus connectivity; feed the
    /// relations themselves through `push`.
    pub fn new(title: &str, relations: &[CallRelation], config: &'a GraphConfig) -> Self {
        let filter = RelationFilter::new(&config.filter, relations);
        let root_attrs = root_cluster_attrs(config, relations);
        let graph = Graph::new(title, config.render.clone(), root_attrs);
        Self { config, filter, graph, stats: BuildStats::default() }
    }

    /// Filter one relation and, if accepted, add it to the graph.
    pub fn push(&mut self, rel: &CallRelation) -> Decision {
        self.stats.visited += 1;
        let decision = self.filter.decide(rel);
        if !decision.is_accepted() {
            return decision;
        }
        self.stats.accepted += 1;
        debug!(
            "call node: {} -> {} ({} -> {}) {}",
            rel.caller.package_path(),
            rel.callee.package_path(),
            rel.caller.qualified_name(),
            rel.callee.qualified_name(),
            rel.caller.position.short()
        );

        let caller = self.resolve_node(&rel.caller);
        let callee = self.resolve_node(&rel.callee);

        let site = rel.site_description();
        self.graph.node_mut(caller).attrs.append_line("tooltip", &site);
        if callee != caller {
            self.graph.node_mut(callee).attrs.append_line("tooltip", &site);
        }

        let key = rel.dedup_key();
        let attrs = self.edge_attrs(rel).with("tooltip", site.clone());
        let (edge, created) = self.graph.insert_edge(key, caller, callee, attrs);
        if !created {
            self.graph.edge_mut(edge).attrs.append_line("tooltip", &site);
        }
        decision
    }

    pub fn finish(mut self) -> (Graph, BuildStats) {
        self.stats.nodes = self.graph.node_count();
        self.stats.edges = self.graph.edge_count();
        self.stats.clusters = self.graph.cluster_count();
        info!("{}/{} edges", self.stats.edges, self.stats.visited);
        (self.graph, self.stats)
    }

    fn resolve_node(&mut self, func: &FunctionRef) -> NodeId {
        let key = func.qualified_name();
        if let Some(id) = self.graph.find_node(&key) {
            return id;
        }
        let focused = self.filter.is_focus(func);
        let attrs = self.node_attrs(func, focused, &key);
        let cluster = self.placement(func, focused);
        let (id, _) = self.graph.insert_node(key, func.name.clone(), attrs, Some(cluster));
        id
    }

    fn node_attrs(&self, func: &FunctionRef, focused: bool, key: &str) -> Attrs {
        let group = self.config.group;
        let mut label = func.relative_name();
        if group.by_type && func.receiver.is_some() {
            label = label.rsplit('.').next().unwrap_or(&func.name).to_string();
        }
        if !group.package && !focused {
            if let Some(pkg) = &func.package {
                label = format!("{}\n{}", pkg.name, label);
            }
        }

        let fill = if focused {
            FOCUS_FILL
        } else if func.is_std() {
            STD_FILL
        } else {
            NODE_FILL
        };

        let mut attrs = Attrs::new().with("fillcolor", fill).with("label", label);
        if func.enclosing.is_some() {
            attrs.set("style", "dotted,filled");
        }
        let heavy = func.exported && func.enclosing.is_none();
        attrs.set("penwidth", if heavy { "1.5" } else { "0.5" });
        attrs.set("tooltip", format!("{} | defined in {}", key, func.position.short()));
        attrs
    }

    fn edge_attrs(&self, rel: &CallRelation) -> Attrs {
        let mut attrs = Attrs::new();
        if rel.kind.is_dynamic() {
            attrs.set("style", "dashed");
        }
        if let Some(head) = rel.kind.arrowhead() {
            attrs.set("arrowhead", head);
        }
        if let Some(focus) = &self.config.filter.focus {
            if rel.caller.package_path() != focus || rel.callee.package_path() != focus {
                attrs.set("color", OUT_OF_FOCUS_EDGE);
            }
        }
        attrs
    }

    /// Pick (and lazily create) the cluster a new node belongs to.
    fn placement(&mut self, func: &FunctionRef, focused: bool) -> ClusterId {
        let group = self.config.group;
        let mut cluster = self.graph.root();
        if focused {
            return cluster;
        }

        if group.package {
            if let Some(pkg) = &func.package {
                cluster = self.graph.ensure_cluster(cluster, &pkg.path, || package_cluster_attrs(func));
            }
        }

        if group.by_type {
            if let (Some(recv), Some(type_key)) = (&func.receiver, func.receiver_type()) {
                let type_name = recv.type_name.clone();
                let std = func.is_std();
                cluster = self.graph.ensure_cluster(cluster, &type_key, || {
                    type_cluster_attrs(&type_key, &type_name, std)
                });
            }
        }
        cluster
    }
}

fn root_cluster_attrs(config: &GraphConfig, relations: &[CallRelation]) -> Attrs {
    let mut attrs = Attrs::new()
        .with("bgcolor", "white")
        .with("label", "")
        .with("labelloc", "t")
        .with("labeljust", "c")
        .with("fontsize", "18");
    if let Some(focus) = &config.filter.focus {
        attrs.set("bgcolor", "#e6ecfa");
        attrs.set("label", focus_package_name(focus, relations));
    }
    attrs
}

/// Short name of the focus package, falling back to its last path segment.
fn focus_package_name(focus: &str, relations: &[CallRelation]) -> String {
    relations
        .iter()
        .flat_map(|rel| [&rel.caller.package, &rel.callee.package])
        .flatten()
        .find(|pkg| pkg.path == focus)
        .map(|pkg| pkg.name.clone())
        .unwrap_or_else(|| focus.rsplit('/').next().unwrap_or(focus).to_string())
}

fn package_cluster_attrs(func: &FunctionRef) -> Attrs {
    let (path, name) = func
        .package
        .as_ref()
        .map(|p| (p.path.as_str(), p.name.as_str()))
        .unwrap_or_default();
    let std = func.is_std();
    Attrs::new()
        .with("penwidth", "0.8")
        .with("fontsize", "16")
        .with("label", if std { path } else { name })
        .with("style", "filled")
        .with("fillcolor", if std { "#E0FFE1" } else { "lightyellow" })
        .with("URL", format!("/?f={path}"))
        .with("fontname", "Tahoma bold")
        .with("tooltip", format!("package: {path}"))
        .with("rank", "sink")
}

fn type_cluster_attrs(type_key: &str, type_name: &str, std: bool) -> Attrs {
    Attrs::new()
        .with("penwidth", "0.5")
        .with("fontsize", "15")
        .with("fontcolor", "#222222")
        .with("label", type_name)
        .with("labelloc", "b")
        .with("style", "rounded,filled")
        .with("fillcolor", if std { "#c2e3c2" } else { "wheat2" })
        .with("tooltip", format!("type: {type_key}"))
}
