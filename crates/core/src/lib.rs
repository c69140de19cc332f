//! bridgegraph-core
//!
//! Builds an attributed, clustered call graph from a frontend's call-relation
//! stream and optionally fuses in a native (FFI) call graph.
//!
//! Pipeline: `model` relations -> `filter` -> `builder` (into `graph`) ->
//! `merge` with a `native` graph -> `dot` serialization. `services::pipeline`
//! runs the whole thing from a `config`.

pub mod builder;
pub mod config;
pub mod dot;
pub mod filter;
pub mod graph;
pub mod merge;
pub mod model;
pub mod native;
pub mod services;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
