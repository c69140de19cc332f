use anyhow::Result;
use serde::Serialize;

use bridgegraph_core::native::default_native_registry;

#[derive(Debug, Serialize)]
pub struct BackendInfo {
    pub name: String,
    pub description: String,
}

/// List the native call-graph backends compiled into this binary.
pub fn list_backends_command(json: bool) -> Result<()> {
    let registry = default_native_registry();
    let entries: Vec<BackendInfo> = registry
        .names()
        .into_iter()
        .filter_map(|name| {
            registry.get(&name).map(|backend| BackendInfo {
                description: backend.description().to_string(),
                name,
            })
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Native backends: (none)");
        return Ok(());
    }

    println!("Native backends:");
    for entry in entries {
        println!("- {}: {}", entry.name, entry.description);
    }

    Ok(())
}
