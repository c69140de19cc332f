//! Native call-graph extraction.
//!
//! The merge engine only depends on `NativeGraph`. How that graph gets
//! produced is up to a `NativeBackend`:
//! - `dot-file`: read an already generated DOT call graph.
//! - `llvm` (feature `llvm-backend`): preprocess, compile, link and run
//!   `opt`'s call-graph printer over the native sources.

pub mod dot_file;
#[cfg(feature = "llvm-backend")]
pub mod llvm;

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::config::NativeConfig;
use crate::dot::DotParseError;

pub use dot_file::DotFileBackend;
#[cfg(feature = "llvm-backend")]
pub use llvm::LlvmBackend;

#[derive(Debug, Error)]
pub enum NativeError {
    #[error("native source root not configured or missing: {0}")]
    MissingRoot(PathBuf),
    #[error("native call-graph file not configured or missing: {0}")]
    MissingDot(PathBuf),
    #[error("no native sources found under {0}")]
    NoSources(PathBuf),
    #[error("refusing to use {0} as build directory: it contains the native source root")]
    UnsafeBuildDir(PathBuf),
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
    #[error("{tool} exited with {status}: {output}")]
    Tool { tool: String, status: String, output: String },
    #[error("native I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] DotParseError),
    #[error("unknown native backend '{name}' (available: {available})")]
    UnknownBackend { name: String, available: String },
}

/// Parsed native call graph: function names and caller -> callee pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NativeGraph {
    nodes: Vec<String>,
    edges: Vec<(String, String)>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl NativeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function; duplicates keep their first position.
    pub fn add_node(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.seen.insert(name.clone()) {
            self.nodes.push(name);
        }
    }

    /// Add a call; both endpoints are declared if needed.
    pub fn add_edge(&mut self, caller: impl Into<String>, callee: impl Into<String>) {
        let (caller, callee) = (caller.into(), callee.into());
        self.add_node(caller.clone());
        self.add_node(callee.clone());
        self.edges.push((caller, callee));
    }

    /// Functions in declaration order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }
}

/// Produces a native call graph for the configured sources.
pub trait NativeBackend: Send + Sync {
    fn extract(&self, config: &NativeConfig) -> Result<NativeGraph, NativeError>;
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
}

/// Backends by name.
#[derive(Default)]
pub struct NativeBackendRegistry {
    backends: HashMap<String, Box<dyn NativeBackend>>,
}

impl NativeBackendRegistry {
    pub fn new() -> Self {
        Self { backends: HashMap::new() }
    }

    pub fn register<B: NativeBackend + 'static>(&mut self, backend: B) -> &mut Self {
        self.backends.insert(backend.name().to_string(), Box::new(backend));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn NativeBackend> {
        self.backends.get(name).map(|b| &**b)
    }

    /// Like `get`, but reports the available names on a miss.
    pub fn resolve(&self, name: &str) -> Result<&dyn NativeBackend, NativeError> {
        self.get(name).ok_or_else(|| NativeError::UnknownBackend {
            name: name.to_string(),
            available: self.names().join(", "),
        })
    }

    /// Sorted backend names for help and error messages.
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.backends.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Registry with every backend compiled into this build.
pub fn default_native_registry() -> NativeBackendRegistry {
    let mut registry = NativeBackendRegistry::new();
    registry.register(DotFileBackend);
    #[cfg(feature = "llvm-backend")]
    {
        registry.register(LlvmBackend);
    }
    registry
}
