//! Frontend data model: functions, call sites and call relations.
//!
//! These types describe what the managed-language analysis frontend hands us.
//! They are serde-friendly so a frontend can emit them as JSON or YAML, and
//! they carry just enough metadata for filtering, labeling and clustering:
//! - `PackageRef`: package path/name and whether it ships with the standard distribution.
//! - `FunctionRef`: a single function (optionally a method or a closure).
//! - `CallKind`: the closed set of call-site kinds.
//! - `CallRelation`: one caller -> callee observation at a call site.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Source position as reported by the frontend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
}

impl Position {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self { file: file.into(), line }
    }

    /// `<basename>:<line>`, the form used in tooltips.
    pub fn short(&self) -> String {
        let base = Path::new(&self.file)
            .file_name()
            .and_then(|os| os.to_str())
            .unwrap_or(self.file.as_str());
        format!("{}:{}", base, self.line)
    }
}

/// Package identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRef {
    /// Full import path (e.g. `github.com/acme/tool/internal/db`).
    pub path: String,
    /// Short package name (e.g. `db`).
    pub name: String,
    /// True when the package belongs to the language's standard distribution.
    #[serde(default)]
    pub std: bool,
}

impl PackageRef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into(), std: false }
    }

    pub fn std(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into(), std: true }
    }
}

/// Method receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    pub type_name: String,
    #[serde(default)]
    pub pointer: bool,
}

/// A function as seen by the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRef {
    /// Owning package; `None` for compiler-synthesized wrappers.
    #[serde(default)]
    pub package: Option<PackageRef>,
    #[serde(default)]
    pub receiver: Option<Receiver>,
    pub name: String,
    /// Optional disambiguator when several functions share a qualified name.
    #[serde(default)]
    pub signature: Option<String>,
    /// Name of the enclosing function for closures / nested functions.
    #[serde(default)]
    pub enclosing: Option<String>,
    #[serde(default)]
    pub exported: bool,
    /// Compiler-generated (wrappers, thunks, init stubs).
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default)]
    pub position: Position,
}

impl FunctionRef {
    /// Plain package-level function.
    pub fn new(package: PackageRef, name: impl Into<String>) -> Self {
        let name = name.into();
        let exported = name.chars().next().is_some_and(|c| c.is_uppercase());
        Self {
            package: Some(package),
            receiver: None,
            name,
            signature: None,
            enclosing: None,
            exported,
            synthetic: false,
            position: Position::default(),
        }
    }

    pub fn with_receiver(mut self, type_name: impl Into<String>, pointer: bool) -> Self {
        self.receiver = Some(Receiver { type_name: type_name.into(), pointer });
        self
    }

    pub fn with_enclosing(mut self, enclosing: impl Into<String>) -> Self {
        self.enclosing = Some(enclosing.into());
        self
    }

    pub fn with_position(mut self, file: impl Into<String>, line: u32) -> Self {
        self.position = Position::new(file, line);
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    pub fn package_path(&self) -> &str {
        self.package.as_ref().map(|p| p.path.as_str()).unwrap_or("")
    }

    pub fn is_std(&self) -> bool {
        self.package.as_ref().is_some_and(|p| p.std)
    }

    /// Fully qualified receiver type, e.g. `example.com/app/store.DB`.
    pub fn receiver_type(&self) -> Option<String> {
        self.receiver.as_ref().map(|r| {
            if self.package_path().is_empty() {
                r.type_name.clone()
            } else {
                format!("{}.{}", self.package_path(), r.type_name)
            }
        })
    }

    /// Name relative to the owning package: `F`, `T.M`, `(*T).M`.
    pub fn relative_name(&self) -> String {
        match &self.receiver {
            Some(r) if r.pointer => format!("(*{}).{}", r.type_name, self.name),
            Some(r) => format!("{}.{}", r.type_name, self.name),
            None => self.name.clone(),
        }
    }

    /// Globally unique identity used as the node key.
    pub fn qualified_name(&self) -> String {
        let pkg = self.package_path();
        let base = match &self.receiver {
            Some(r) if pkg.is_empty() => {
                if r.pointer {
                    format!("(*{}).{}", r.type_name, self.name)
                } else {
                    format!("({}).{}", r.type_name, self.name)
                }
            }
            Some(r) => {
                let star = if r.pointer { "*" } else { "" };
                format!("({}{}.{}).{}", star, pkg, r.type_name, self.name)
            }
            None if pkg.is_empty() => self.name.clone(),
            None => format!("{}.{}", pkg, self.name),
        };
        match &self.signature {
            Some(sig) if !sig.is_empty() => format!("{base}#{sig}"),
            _ => base,
        }
    }
}

/// Closed set of call-site kinds.
///
/// `Spawn` and `Deferred` may themselves dispatch dynamically, so they carry
/// that bit along. Serialized as `"static"`, `"dynamic"` or
/// `{"spawn": {"dynamic": true}}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    #[default]
    Static,
    Dynamic,
    Spawn {
        #[serde(default)]
        dynamic: bool,
    },
    Deferred {
        #[serde(default)]
        dynamic: bool,
    },
}

impl CallKind {
    /// True when the call site has no statically resolvable callee.
    pub fn is_dynamic(&self) -> bool {
        match self {
            CallKind::Static => false,
            CallKind::Dynamic => true,
            CallKind::Spawn { dynamic } | CallKind::Deferred { dynamic } => *dynamic,
        }
    }

    /// Human description, also part of the edge dedup key.
    pub fn description(&self, method: bool) -> String {
        let prefix = match self {
            CallKind::Spawn { .. } => "concurrent ",
            CallKind::Deferred { .. } => "deferred ",
            _ => "",
        };
        let dispatch = if self.is_dynamic() { "dynamic" } else { "static" };
        let target = if method { "method" } else { "function" };
        format!("{prefix}{dispatch} {target} call")
    }

    /// Arrowhead override for spawn/defer sites.
    pub fn arrowhead(&self) -> Option<&'static str> {
        match self {
            CallKind::Spawn { .. } => Some("normalnoneodot"),
            CallKind::Deferred { .. } => Some("normalnoneodiamond"),
            _ => None,
        }
    }
}

/// A single caller -> callee observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRelation {
    pub caller: FunctionRef,
    pub callee: FunctionRef,
    #[serde(default)]
    pub kind: CallKind,
    /// Position of the call instruction itself.
    #[serde(default)]
    pub site: Position,
}

impl CallRelation {
    pub fn new(caller: FunctionRef, callee: FunctionRef) -> Self {
        Self { caller, callee, kind: CallKind::Static, site: Position::default() }
    }

    pub fn with_kind(mut self, kind: CallKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.site = Position::new(file, line);
        self
    }

    /// Compiler-generated relation: no caller package, or a synthetic callee.
    pub fn is_synthetic(&self) -> bool {
        self.caller.package.is_none() || self.callee.synthetic
    }

    pub fn description(&self) -> String {
        self.kind.description(self.callee.receiver.is_some())
    }

    /// `<caller> = <description> => <callee>`
    pub fn dedup_key(&self) -> String {
        format!(
            "{} = {} => {}",
            self.caller.qualified_name(),
            self.description(),
            self.callee.qualified_name()
        )
    }

    /// `at <file>:<line>: calling [<callee>]`
    pub fn site_description(&self) -> String {
        format!("at {}: calling [{}]", self.site.short(), self.callee.qualified_name())
    }
}

/// Everything the frontend hands over for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontendInput {
    /// Main package path; used as the graph title.
    #[serde(default)]
    pub program: String,
    /// Every function identity the frontend discovered (not only the ones
    /// participating in relations). Used to derive FFI binding wrappers.
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub relations: Vec<CallRelation>,
}

impl FrontendInput {
    /// Function identities for binding derivation: `functions` when present,
    /// otherwise every relation endpoint in encounter order.
    pub fn symbols(&self) -> Vec<String> {
        if !self.functions.is_empty() {
            return self.functions.clone();
        }
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for rel in &self.relations {
            for func in [&rel.caller, &rel.callee] {
                let key = func.qualified_name();
                if seen.insert(key.clone()) {
                    out.push(key);
                }
            }
        }
        out
    }
}
