use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use bridgegraph_core::native::default_native_registry;

use crate::commands::util::{apply_native_flags, load_config_or_default};

/// Run only the native extraction step and print what it produced.
pub fn native_command(
    config_path: Option<&Path>,
    root: Option<PathBuf>,
    dot: Option<PathBuf>,
    backend: Option<String>,
    json: bool,
) -> Result<()> {
    let mut config = load_config_or_default(config_path)?;
    apply_native_flags(&mut config, root, dot, backend);
    config.validate().context("Invalid configuration")?;
    if !config.native.is_enabled() {
        bail!("No native input configured (use --native-root or --native-dot)");
    }

    let registry = default_native_registry();
    let backend = registry.resolve(config.native.backend_name())?;
    let graph = backend
        .extract(&config.native)
        .with_context(|| format!("Native backend '{}' failed", backend.name()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }

    println!("Native call graph ({})", backend.name());
    println!("  Functions: {}", graph.nodes().len());
    println!("  Calls: {}", graph.edges().len());
    for (caller, callee) in graph.edges() {
        println!("  - {} -> {}", caller, callee);
    }
    Ok(())
}
