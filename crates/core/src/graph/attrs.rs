use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fill color of nodes synthesized without frontend metadata.
pub const DEFAULT_FILL: &str = "lightblue";
/// Line style of nodes/edges synthesized without frontend metadata.
pub const DEFAULT_STYLE: &str = "dotted,filled";

/// Attribute bag attached to nodes, edges and clusters.
///
/// Backed by a `BTreeMap` so iteration (and therefore serialization) is
/// deterministic regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attrs(BTreeMap<String, String>);

impl Attrs {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// The default attribute set for synthesized nodes and edges.
    pub fn defaults(label: impl Into<String>) -> Self {
        let mut attrs = Self::new();
        attrs.set("fillcolor", DEFAULT_FILL);
        attrs.set("label", label);
        attrs.set("style", DEFAULT_STYLE);
        attrs.set("tooltip", "");
        attrs
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Append `line` to the value of `key`, newline-separated. An absent or
    /// empty value is replaced instead of producing a leading newline.
    pub fn append_line(&mut self, key: &str, line: &str) {
        match self.0.get_mut(key) {
            Some(existing) if !existing.is_empty() => {
                existing.push('\n');
                existing.push_str(line);
            }
            _ => {
                self.0.insert(key.to_string(), line.to_string());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
