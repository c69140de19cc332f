use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use bridgegraph_core::config::{GraphConfig, GroupConfig, NativeFailurePolicy, RankDir};
use bridgegraph_core::native::default_native_registry;
use bridgegraph_core::services::{load_frontend_input, GraphPipeline};

use crate::commands::util::{apply_native_flags, load_config_or_default, write_output};
use crate::split_list;

/// Command-line overrides layered on top of the config file.
///
/// `None` / empty means "keep the config value".
#[derive(Debug, Clone, Default)]
pub struct RenderOverrides {
    pub focus: Option<String>,
    pub group: Vec<String>,
    pub nostd: bool,
    pub nointer: bool,
    pub include: Vec<String>,
    pub limit: Vec<String>,
    pub ignore: Vec<String>,
    pub minlen: Option<u32>,
    pub nodesep: Option<f64>,
    pub nodeshape: Option<String>,
    pub nodestyle: Option<String>,
    pub rankdir: Option<String>,
    pub native_root: Option<PathBuf>,
    pub native_dot: Option<PathBuf>,
    pub native_backend: Option<String>,
    pub defines: Vec<String>,
    pub on_native_failure: Option<NativeFailurePolicy>,
}

impl RenderOverrides {
    pub fn apply(self, config: &mut GraphConfig) -> Result<()> {
        let filter = &mut config.filter;
        if self.focus.is_some() {
            filter.focus = self.focus;
        }
        filter.nostd |= self.nostd;
        filter.nointer |= self.nointer;
        let include = split_list(&self.include);
        if !include.is_empty() {
            filter.include = include;
        }
        let limit = split_list(&self.limit);
        if !limit.is_empty() {
            filter.limit = limit;
        }
        let ignore = split_list(&self.ignore);
        if !ignore.is_empty() {
            filter.ignore = ignore;
        }

        let group = split_list(&self.group);
        if !group.is_empty() {
            config.group = GroupConfig::from_flags(&group)?;
        }

        let render = &mut config.render;
        if let Some(minlen) = self.minlen {
            render.minlen = minlen;
        }
        if let Some(nodesep) = self.nodesep {
            render.nodesep = nodesep;
        }
        if let Some(shape) = self.nodeshape {
            render.nodeshape = shape;
        }
        if let Some(style) = self.nodestyle {
            render.nodestyle = style;
        }
        if let Some(rankdir) = self.rankdir {
            render.rankdir = rankdir.parse::<RankDir>()?;
        }

        apply_native_flags(config, self.native_root, self.native_dot, self.native_backend);
        if !self.defines.is_empty() {
            config.native.defines = self.defines;
        }
        if let Some(policy) = self.on_native_failure {
            config.native.on_failure = policy;
        }
        Ok(())
    }
}

/// Build the call graph for `input` and write it as DOT.
pub fn render_command(
    input: &Path,
    config_path: Option<&Path>,
    overrides: RenderOverrides,
    output: Option<&Path>,
    stats_json: bool,
) -> Result<()> {
    let mut config = load_config_or_default(config_path)?;
    overrides.apply(&mut config).context("Invalid command-line option")?;
    let frontend = load_frontend_input(input)?;

    let registry = default_native_registry();
    let pipeline = GraphPipeline { config: &config, registry: &registry };
    let outcome = pipeline
        .run(&frontend)
        .with_context(|| format!("Failed to render call graph for {}", input.display()))?;

    match output {
        Some(path) => write_output(path, &outcome.to_dot())?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            outcome.write_dot(&mut handle).context("Failed to write DOT to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    if stats_json {
        let summary = serde_json::to_string_pretty(&outcome)?;
        // Keep stdout clean for the DOT stream when no output file is given.
        if output.is_some() {
            println!("{summary}");
        } else {
            eprintln!("{summary}");
        }
    }
    Ok(())
}
