//! Run configuration: filtering, grouping, rendering and native merge settings.
//!
//! A `GraphConfig` is usually loaded from a YAML or JSON file (picked by
//! extension) and then overridden field-by-field by CLI flags. `validate()`
//! must pass before a run starts; its failures are configuration errors and
//! abort immediately.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default reserved prefix of FFI binding wrappers on the managed side.
pub const DEFAULT_BINDING_PREFIX: &str = "_Cfunc_";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("minlen must be a positive integer")]
    InvalidMinlen,
    #[error("native source root does not exist: {0}")]
    MissingNativeRoot(PathBuf),
    #[error("native call-graph file does not exist: {0}")]
    MissingNativeDot(PathBuf),
    #[error("binding prefix must not be empty")]
    EmptyBindingPrefix,
    #[error("unknown grouping '{0}' (expected 'pkg' or 'type')")]
    UnknownGrouping(String),
    #[error("unknown rankdir '{0}' (expected LR, RL, TB or BT)")]
    UnknownRankdir(String),
    #[error("preprocessor symbol '{0}' must start with -D or -U")]
    InvalidDefine(String),
    #[error("native build directory {0} must not contain the native source root")]
    UnsafeBuildDir(PathBuf),
}

/// Layout direction passed through to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankDir {
    #[default]
    LR,
    RL,
    TB,
    BT,
}

impl RankDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankDir::LR => "LR",
            RankDir::RL => "RL",
            RankDir::TB => "TB",
            RankDir::BT => "BT",
        }
    }
}

impl fmt::Display for RankDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankDir {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LR" => Ok(RankDir::LR),
            "RL" => Ok(RankDir::RL),
            "TB" => Ok(RankDir::TB),
            "BT" => Ok(RankDir::BT),
            _ => Err(ConfigError::UnknownRankdir(s.to_string())),
        }
    }
}

/// Opaque rendering options; emitted as graph-level attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub minlen: u32,
    pub nodesep: f64,
    pub nodeshape: String,
    pub nodestyle: String,
    pub rankdir: RankDir,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            minlen: 2,
            nodesep: 0.35,
            nodeshape: "box".to_string(),
            nodestyle: "filled,rounded".to_string(),
            rankdir: RankDir::LR,
        }
    }
}

/// Inclusion rules for call relations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Package path of the focus package.
    pub focus: Option<String>,
    /// Drop relations touching the standard distribution.
    pub nostd: bool,
    /// Drop relations whose callee is unexported.
    pub nointer: bool,
    pub include: Vec<String>,
    pub limit: Vec<String>,
    pub ignore: Vec<String>,
}

/// Which clusters to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub package: bool,
    #[serde(rename = "type")]
    pub by_type: bool,
}

impl GroupConfig {
    /// Parse `pkg` / `type` flags, e.g. from `--group pkg,type`.
    pub fn from_flags<S: AsRef<str>>(flags: &[S]) -> Result<Self, ConfigError> {
        let mut group = GroupConfig::default();
        for flag in flags {
            match flag.as_ref().trim() {
                "" => {}
                "pkg" => group.package = true,
                "type" => group.by_type = true,
                other => return Err(ConfigError::UnknownGrouping(other.to_string())),
            }
        }
        Ok(group)
    }
}

/// What to do when the native toolchain fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeFailurePolicy {
    /// Fail the run.
    #[default]
    Abort,
    /// Log and emit the managed graph only.
    Degrade,
}

/// Explicit tool binaries; unset entries fall back to env vars, then PATH.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub unifdef: Option<PathBuf>,
    pub clang: Option<PathBuf>,
    pub llvm_link: Option<PathBuf>,
    pub opt: Option<PathBuf>,
}

/// Native call-graph extraction and merge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    /// Root of the native sources. Enables the `llvm` backend.
    pub root: Option<PathBuf>,
    /// Already generated native call-graph (DOT). Enables the `dot-file` backend.
    pub dot: Option<PathBuf>,
    /// Explicit backend name; inferred from `root`/`dot` when unset.
    pub backend: Option<String>,
    /// Preprocessor symbols handed to unifdef (`-DNAME`, `-DNAME=1`, `-UNAME`).
    pub defines: Vec<String>,
    /// Scratch directory for bitcode; defaults to `<root>/build`.
    pub build_dir: Option<PathBuf>,
    pub tools: ToolPaths,
    pub binding_prefix: String,
    pub on_failure: NativeFailurePolicy,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            root: None,
            dot: None,
            backend: None,
            defines: Vec::new(),
            build_dir: None,
            tools: ToolPaths::default(),
            binding_prefix: DEFAULT_BINDING_PREFIX.to_string(),
            on_failure: NativeFailurePolicy::Abort,
        }
    }
}

impl NativeConfig {
    /// The merge step runs only when a native input is configured.
    pub fn is_enabled(&self) -> bool {
        self.root.is_some() || self.dot.is_some()
    }

    /// Backend to use: explicit name, else `dot-file` for a prebuilt graph,
    /// else `llvm`.
    pub fn backend_name(&self) -> &str {
        match (&self.backend, &self.dot) {
            (Some(name), _) => name.as_str(),
            (None, Some(_)) => "dot-file",
            (None, None) => "llvm",
        }
    }

    /// Scratch directory for bitcode, `<root>/build` unless configured.
    pub fn resolved_build_dir(&self) -> Option<PathBuf> {
        self.build_dir.clone().or_else(|| self.root.as_ref().map(|root| root.join("build")))
    }

    /// The configured build directory when it is the source root or one of
    /// its ancestors.
    pub fn unsafe_build_dir(&self) -> Option<PathBuf> {
        let (root, build_dir) = (self.root.as_ref()?, self.build_dir.as_ref()?);
        // A build dir that does not exist yet cannot contain the root.
        let build = fs::canonicalize(build_dir).ok()?;
        let root = fs::canonicalize(root).unwrap_or_else(|_| root.clone());
        root.starts_with(&build).then(|| build_dir.clone())
    }
}

/// Complete configuration for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub filter: FilterConfig,
    pub group: GroupConfig,
    pub render: RenderOptions,
    pub native: NativeConfig,
}

impl GraphConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.minlen == 0 {
            return Err(ConfigError::InvalidMinlen);
        }
        if self.native.binding_prefix.is_empty() {
            return Err(ConfigError::EmptyBindingPrefix);
        }
        if let Some(root) = &self.native.root {
            if !root.is_dir() {
                return Err(ConfigError::MissingNativeRoot(root.clone()));
            }
        }
        if let Some(dot) = &self.native.dot {
            if !dot.is_file() {
                return Err(ConfigError::MissingNativeDot(dot.clone()));
            }
        }
        if let Some(bad) =
            self.native.defines.iter().find(|d| !(d.starts_with("-D") || d.starts_with("-U")))
        {
            return Err(ConfigError::InvalidDefine(bad.clone()));
        }
        if let Some(build_dir) = self.native.unsafe_build_dir() {
            return Err(ConfigError::UnsafeBuildDir(build_dir));
        }
        Ok(())
    }
}

/// Load a `GraphConfig` from YAML or JSON (by extension).
pub fn load_config(path: &Path) -> Result<GraphConfig> {
    let body = fs::read(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let config = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_slice(&body).context("Failed to parse config JSON")?
    } else {
        serde_yaml::from_slice(&body).context("Failed to parse config YAML")?
    };
    Ok(config)
}
