use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bridgegraph_core::config::{load_config, GraphConfig};

/// Load the config file when one is given, otherwise start from defaults.
pub fn load_config_or_default(path: Option<&Path>) -> Result<GraphConfig> {
    match path {
        Some(p) => load_config(p),
        None => Ok(GraphConfig::default()),
    }
}

/// Apply the native-input flags shared by `render` and `native`.
pub fn apply_native_flags(
    config: &mut GraphConfig,
    root: Option<PathBuf>,
    dot: Option<PathBuf>,
    backend: Option<String>,
) {
    if root.is_some() {
        config.native.root = root;
    }
    if dot.is_some() {
        config.native.dot = dot;
    }
    if backend.is_some() {
        config.native.backend = backend;
    }
}

/// Write `body` to `path`, creating parent directories as needed.
pub fn write_output(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output dir: {}", parent.display()))?;
        }
    }
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))
}
