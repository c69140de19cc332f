//! DOT interchange: emitting the final graph and reading native call graphs.

pub mod reader;
pub mod writer;

pub use reader::{parse_native_dot, DotParseError};
pub use writer::{to_dot, write_dot};

/// Quote a DOT ID, escaping backslashes, quotes and newlines.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
