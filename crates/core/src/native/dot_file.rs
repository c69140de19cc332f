use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::config::NativeConfig;
use crate::dot::parse_native_dot;
use crate::native::{NativeBackend, NativeError, NativeGraph};

/// Reads a native call graph that was generated ahead of time.
pub struct DotFileBackend;

impl NativeBackend for DotFileBackend {
    fn extract(&self, config: &NativeConfig) -> Result<NativeGraph, NativeError> {
        let path = config.dot.clone().unwrap_or_else(|| PathBuf::from("callgraph.dot"));
        if !path.is_file() {
            return Err(NativeError::MissingDot(path));
        }
        info!("reading native call graph from {}", path.display());
        let body = fs::read_to_string(&path)?;
        Ok(parse_native_dot(&body)?)
    }

    fn name(&self) -> &'static str {
        "dot-file"
    }

    fn description(&self) -> &'static str {
        "Reads a pre-generated native call graph (DOT, e.g. from opt -dot-callgraph)"
    }
}
