//! Relation filter pipeline.
//!
//! Rules run in a fixed order and the first rejecting rule wins:
//! 1. synthetic relations
//! 2. focus package (with the semi-focus bridge)
//! 3. standard-distribution packages (`nostd`)
//! 4. unexported callees (`nointer`)
//! 5. include prefixes, which skip rules 6 and 7
//! 6. limit prefixes (both endpoints must match)
//! 7. ignore prefixes (either endpoint matching rejects)

use std::collections::HashSet;

use tracing::debug;

use crate::config::FilterConfig;
use crate::model::{CallRelation, FunctionRef};

/// Why a relation was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Synthetic,
    OutOfFocus,
    StandardLibrary,
    Unexported,
    NotInLimit,
    Ignored,
}

/// Outcome of running one relation through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept {
        /// Accepted through an include prefix.
        included: bool,
        /// Accepted through the two-hop semi-focus bridge.
        semi_focus: bool,
    },
    Reject(Rejection),
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Decision::Accept { .. })
    }
}

/// Per-function focus connectivity over the whole relation stream.
///
/// The semi-focus rule asks whether a function is called *from* the focus
/// package and whether a function calls *into* it. Both questions look at
/// every non-synthetic relation of the stream, so the answer does not depend
/// on the order relations arrive in.
#[derive(Debug, Default)]
pub struct FocusIndex {
    called_from_focus: HashSet<String>,
    calls_into_focus: HashSet<String>,
}

impl FocusIndex {
    pub fn build<'a>(focus: &str, relations: impl IntoIterator<Item = &'a CallRelation>) -> Self {
        let mut index = FocusIndex::default();
        for rel in relations {
            if rel.is_synthetic() {
                continue;
            }
            if rel.caller.package_path() == focus {
                index.called_from_focus.insert(rel.callee.qualified_name());
            }
            if rel.callee.package_path() == focus {
                index.calls_into_focus.insert(rel.caller.qualified_name());
            }
        }
        index
    }

    pub fn is_called_from_focus(&self, func: &FunctionRef) -> bool {
        self.called_from_focus.contains(&func.qualified_name())
    }

    pub fn calls_into_focus(&self, func: &FunctionRef) -> bool {
        self.calls_into_focus.contains(&func.qualified_name())
    }
}

/// Stateless rule evaluation for a configured filter.
#[derive(Debug)]
pub struct RelationFilter<'a> {
    config: &'a FilterConfig,
    focus_index: FocusIndex,
}

impl<'a> RelationFilter<'a> {
    /// Build a filter for `relations`; the focus index is only computed when
    /// a focus package is configured.
    pub fn new(config: &'a FilterConfig, relations: &[CallRelation]) -> Self {
        debug!("{} limit prefixes: {:?}", config.limit.len(), config.limit);
        debug!("{} ignore prefixes: {:?}", config.ignore.len(), config.ignore);
        debug!("{} include prefixes: {:?}", config.include.len(), config.include);
        debug!("no std packages: {}", config.nostd);
        let focus_index = match &config.focus {
            Some(focus) => FocusIndex::build(focus, relations),
            None => FocusIndex::default(),
        };
        Self { config, focus_index }
    }

    pub fn config(&self) -> &FilterConfig {
        self.config
    }

    pub fn is_focus(&self, func: &FunctionRef) -> bool {
        self.config.focus.as_deref().is_some_and(|f| func.package.is_some() && func.package_path() == f)
    }

    /// Direct focus, or the semi-focus bridge.
    fn focus_decision(&self, rel: &CallRelation) -> Option<bool> {
        if self.is_focus(&rel.caller) || self.is_focus(&rel.callee) {
            return Some(false);
        }
        if self.focus_index.is_called_from_focus(&rel.caller)
            && self.focus_index.calls_into_focus(&rel.callee)
        {
            debug!(
                "edge semi-focus: {} -> {}",
                rel.caller.qualified_name(),
                rel.callee.qualified_name()
            );
            return Some(true);
        }
        None
    }

    pub fn decide(&self, rel: &CallRelation) -> Decision {
        if rel.is_synthetic() {
            return Decision::Reject(Rejection::Synthetic);
        }

        let mut semi_focus = false;
        if self.config.focus.is_some() {
            match self.focus_decision(rel) {
                Some(bridged) => semi_focus = bridged,
                None => return Decision::Reject(Rejection::OutOfFocus),
            }
        }

        if self.config.nostd && (rel.caller.is_std() || rel.callee.is_std()) {
            return Decision::Reject(Rejection::StandardLibrary);
        }

        // Closures have no symbol of their own, so they are never unexported.
        if self.config.nointer && !rel.callee.exported && rel.callee.enclosing.is_none() {
            return Decision::Reject(Rejection::Unexported);
        }

        let caller_pkg = rel.caller.package_path();
        let callee_pkg = rel.callee.package_path();

        let included = !self.config.include.is_empty()
            && (has_prefix(&self.config.include, caller_pkg)
                || has_prefix(&self.config.include, callee_pkg));
        if included {
            debug!("include: {} -> {}", rel.caller.qualified_name(), rel.callee.qualified_name());
            return Decision::Accept { included, semi_focus };
        }

        if !self.config.limit.is_empty()
            && !(has_prefix(&self.config.limit, caller_pkg)
                && has_prefix(&self.config.limit, callee_pkg))
        {
            debug!(
                "NOT in limit: {} -> {}",
                rel.caller.qualified_name(),
                rel.callee.qualified_name()
            );
            return Decision::Reject(Rejection::NotInLimit);
        }

        if !self.config.ignore.is_empty()
            && (has_prefix(&self.config.ignore, caller_pkg)
                || has_prefix(&self.config.ignore, callee_pkg))
        {
            debug!("IS ignored: {} -> {}", rel.caller.qualified_name(), rel.callee.qualified_name());
            return Decision::Reject(Rejection::Ignored);
        }

        Decision::Accept { included, semi_focus }
    }

    pub fn accepts(&self, rel: &CallRelation) -> bool {
        self.decide(rel).is_accepted()
    }
}

/// Plain string-prefix test; not path-segment aware.
pub fn has_prefix(prefixes: &[String], path: &str) -> bool {
    prefixes.iter().any(|p| path.starts_with(p.as_str()))
}
