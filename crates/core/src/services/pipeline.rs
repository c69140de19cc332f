//! End-to-end run: build the managed graph, optionally merge the native one,
//! and hand back a graph ready for serialization.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result as AnyResult};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::builder::{build_graph, BuildError, BuildStats};
use crate::config::{ConfigError, GraphConfig, NativeFailurePolicy};
use crate::dot::{to_dot, write_dot};
use crate::graph::Graph;
use crate::merge::{merge_native, BindingMap, MergeReport};
use crate::model::FrontendInput;
use crate::native::{NativeBackendRegistry, NativeError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("call-graph construction failed: {0}")]
    Build(#[from] BuildError),
    #[error("native call-graph extraction failed: {0}")]
    Native(#[from] NativeError),
    #[error("failed to write graph: {0}")]
    Io(#[from] io::Error),
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutcome {
    #[serde(skip)]
    pub graph: Graph,
    pub stats: BuildStats,
    /// Present when the native merge ran.
    pub merge: Option<MergeReport>,
    pub native_backend: Option<String>,
    /// Set when the native step failed under the `degrade` policy.
    pub native_error: Option<String>,
}

impl RenderOutcome {
    pub fn to_dot(&self) -> String {
        to_dot(&self.graph)
    }

    pub fn write_dot<W: Write>(&self, out: &mut W) -> Result<(), PipelineError> {
        write_dot(&self.graph, out)?;
        Ok(())
    }
}

/// Wires configuration, frontend input and native backends together.
pub struct GraphPipeline<'a> {
    pub config: &'a GraphConfig,
    pub registry: &'a NativeBackendRegistry,
}

impl<'a> GraphPipeline<'a> {
    pub fn run(&self, input: &FrontendInput) -> Result<RenderOutcome, PipelineError> {
        self.config.validate()?;

        let (mut graph, stats) = build_graph(&input.program, &input.relations, self.config)?;
        info!(
            "managed graph: {} nodes, {} edges, {} clusters",
            stats.nodes, stats.edges, stats.clusters
        );

        let native_cfg = &self.config.native;
        if !native_cfg.is_enabled() {
            info!("no native sources configured; skipping merge");
            return Ok(RenderOutcome {
                graph,
                stats,
                merge: None,
                native_backend: None,
                native_error: None,
            });
        }

        let backend = self.registry.resolve(native_cfg.backend_name())?;
        info!("extracting native call graph with '{}'", backend.name());
        let mut merge = None;
        let mut native_error = None;
        match backend.extract(native_cfg) {
            Ok(native) => {
                let bindings = BindingMap::from_symbols(input.symbols(), &native_cfg.binding_prefix);
                merge = Some(merge_native(&mut graph, &native, &bindings));
            }
            Err(err) => match native_cfg.on_failure {
                NativeFailurePolicy::Abort => return Err(err.into()),
                NativeFailurePolicy::Degrade => {
                    warn!("native merge skipped: {err}");
                    native_error = Some(err.to_string());
                }
            },
        }

        Ok(RenderOutcome {
            graph,
            stats,
            merge,
            native_backend: Some(backend.name().to_string()),
            native_error,
        })
    }
}

/// Load a frontend relation stream from YAML or JSON (by extension).
pub fn load_frontend_input(path: &Path) -> AnyResult<FrontendInput> {
    let body = fs::read(path)
        .with_context(|| format!("Failed to read call relations at {}", path.display()))?;
    let input = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_slice(&body).context("Failed to parse call relations JSON")?
    } else {
        serde_yaml::from_slice(&body).context("Failed to parse call relations YAML")?
    };
    Ok(input)
}
