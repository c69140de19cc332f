//! Reader for the DOT subset produced by `opt -dot-callgraph`.
//!
//! Typical input:
//!
//! ```text
//! digraph "Call graph: linked.ll" {
//!     label="Call graph: linked.ll";
//!     Node0x1 [shape=record,label="{external node}"];
//!     Node0x1 -> Node0x2;
//!     Node0x2 [shape=record,label="{main}"];
//!     Node0x2 -> Node0x3;
//!     Node0x3 [shape=record,label="{helper}"];
//! }
//! ```
//!
//! Node IDs are opaque; the function name comes from the record label with
//! its braces stripped. LLVM's pseudo-nodes are dropped together with their
//! edges. Subgraphs are flattened, ports and default-attribute statements ignored.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::native::NativeGraph;

/// Labels LLVM uses for call-graph pseudo-nodes.
const PSEUDO_NODES: &[&str] = &["external node", "null function", "external calling node"];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("DOT parse error at line {line}: {message}")]
pub struct DotParseError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Id(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Equals,
    Semi,
    Comma,
    Colon,
    Arrow,
}

fn tokenize(input: &str) -> Result<Vec<(Tok, usize)>, DotParseError> {
    let mut toks = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    let mut line = 1;
    let mut line_start = true;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                line += 1;
                line_start = true;
                i += 1;
                continue;
            }
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '#' if line_start => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    if chars[i] == '\n' {
                        line += 1;
                    }
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(DotParseError { line, message: "unterminated comment".into() });
                }
                i += 2;
            }
            '{' => {
                toks.push((Tok::LBrace, line));
                i += 1;
            }
            '}' => {
                toks.push((Tok::RBrace, line));
                i += 1;
            }
            '[' => {
                toks.push((Tok::LBracket, line));
                i += 1;
            }
            ']' => {
                toks.push((Tok::RBracket, line));
                i += 1;
            }
            '=' => {
                toks.push((Tok::Equals, line));
                i += 1;
            }
            ';' => {
                toks.push((Tok::Semi, line));
                i += 1;
            }
            ',' => {
                toks.push((Tok::Comma, line));
                i += 1;
            }
            ':' => {
                toks.push((Tok::Colon, line));
                i += 1;
            }
            '-' if matches!(chars.get(i + 1), Some('>') | Some('-')) => {
                toks.push((Tok::Arrow, line));
                i += 2;
            }
            '"' => {
                let start_line = line;
                let mut value = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(DotParseError {
                                line: start_line,
                                message: "unterminated string".into(),
                            })
                        }
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some('\\') if chars.get(i + 1) == Some(&'"') => {
                            value.push('"');
                            i += 2;
                        }
                        Some('\\') if chars.get(i + 1) == Some(&'\n') => {
                            line += 1;
                            i += 2;
                        }
                        Some(ch) => {
                            if *ch == '\n' {
                                line += 1;
                            }
                            value.push(*ch);
                            i += 1;
                        }
                    }
                }
                toks.push((Tok::Id(value), start_line));
            }
            c if is_id_char(c)
                || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit() || *n == '.')) =>
            {
                let mut value = String::from(c);
                i += 1;
                while i < chars.len() && is_id_char(chars[i]) {
                    value.push(chars[i]);
                    i += 1;
                }
                toks.push((Tok::Id(value), line));
            }
            other => {
                return Err(DotParseError { line, message: format!("unexpected character '{other}'") })
            }
        }
        line_start = false;
    }
    Ok(toks)
}

fn is_id_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '$' | '@') || (!c.is_ascii() && !c.is_whitespace())
}

/// Function name carried by a record label: `{main}` -> `main`,
/// `{main|{<s0>|<s1>}}` -> `main`.
fn label_name(label: &str) -> String {
    let trimmed = label.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(trimmed);
    inner.split('|').next().unwrap_or(inner).trim().to_string()
}

struct Parser {
    toks: Vec<(Tok, usize)>,
    pos: usize,
    /// Node IDs in first-seen order.
    order: Vec<String>,
    seen: HashSet<String>,
    labels: HashMap<String, String>,
    edges: Vec<(String, String)>,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos).map(|(t, _)| t)
    }

    fn line(&self) -> usize {
        self.toks
            .get(self.pos)
            .or_else(|| self.toks.last())
            .map(|(_, l)| *l)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        tok
    }

    fn error(&self, message: impl Into<String>) -> DotParseError {
        DotParseError { line: self.line(), message: message.into() }
    }

    fn expect_id(&mut self) -> Result<String, DotParseError> {
        let line = self.line();
        match self.next() {
            Some(Tok::Id(id)) => Ok(id),
            other => Err(DotParseError {
                line,
                message: format!("expected identifier, found {other:?}"),
            }),
        }
    }

    fn touch(&mut self, id: &str) {
        if self.seen.insert(id.to_string()) {
            self.order.push(id.to_string());
        }
    }

    /// Skip a `:port` or `:port:compass` suffix.
    fn skip_port(&mut self) -> Result<(), DotParseError> {
        while self.peek() == Some(&Tok::Colon) {
            self.pos += 1;
            self.expect_id()?;
        }
        Ok(())
    }

    fn parse(mut self) -> Result<NativeGraph, DotParseError> {
        if let Some(Tok::Id(kw)) = self.peek() {
            if kw.eq_ignore_ascii_case("strict") {
                self.pos += 1;
            }
        }
        match self.next() {
            Some(Tok::Id(kw))
                if kw.eq_ignore_ascii_case("digraph") || kw.eq_ignore_ascii_case("graph") => {}
            other => return Err(self.error(format!("expected 'digraph', found {other:?}"))),
        }
        if let Some(Tok::Id(_)) = self.peek() {
            self.pos += 1;
        }
        if self.next() != Some(Tok::LBrace) {
            return Err(self.error("expected '{'"));
        }

        let mut depth = 1usize;
        while depth > 0 {
            match self.peek().cloned() {
                None => return Err(self.error("unexpected end of input")),
                Some(Tok::RBrace) => {
                    self.pos += 1;
                    depth -= 1;
                }
                Some(Tok::LBrace) => {
                    self.pos += 1;
                    depth += 1;
                }
                Some(Tok::Semi) | Some(Tok::Comma) => self.pos += 1,
                Some(Tok::Id(id)) if id.eq_ignore_ascii_case("subgraph") => {
                    self.pos += 1;
                    if let Some(Tok::Id(_)) = self.peek() {
                        self.pos += 1;
                    }
                }
                Some(Tok::Id(id))
                    if ["graph", "node", "edge"].iter().any(|k| id.eq_ignore_ascii_case(k))
                        && self.toks.get(self.pos + 1).map(|(t, _)| t) == Some(&Tok::LBracket) =>
                {
                    self.pos += 1;
                    self.attr_list()?;
                }
                Some(Tok::Id(_)) => self.statement()?,
                Some(other) => return Err(self.error(format!("unexpected token {other:?}"))),
            }
        }
        Ok(self.finish())
    }

    /// Node statement, edge chain, or `key=value` graph attribute.
    fn statement(&mut self) -> Result<(), DotParseError> {
        let first = self.expect_id()?;
        self.skip_port()?;
        if self.peek() == Some(&Tok::Equals) {
            self.pos += 1;
            self.expect_id()?;
            return Ok(());
        }

        let mut chain = vec![first];
        while self.peek() == Some(&Tok::Arrow) {
            self.pos += 1;
            chain.push(self.expect_id()?);
            self.skip_port()?;
        }
        let attrs =
            if self.peek() == Some(&Tok::LBracket) { self.attr_list()? } else { Vec::new() };

        for id in &chain {
            self.touch(id);
        }
        if chain.len() == 1 {
            if let Some((_, label)) = attrs.iter().find(|(k, _)| k == "label") {
                self.labels.insert(chain[0].clone(), label_name(label));
            }
        } else {
            for pair in chain.windows(2) {
                self.edges.push((pair[0].clone(), pair[1].clone()));
            }
        }
        Ok(())
    }

    fn attr_list(&mut self) -> Result<Vec<(String, String)>, DotParseError> {
        let mut attrs = Vec::new();
        while self.peek() == Some(&Tok::LBracket) {
            self.pos += 1;
            loop {
                match self.next() {
                    Some(Tok::RBracket) => break,
                    Some(Tok::Comma) | Some(Tok::Semi) => {}
                    Some(Tok::Id(key)) => {
                        if self.peek() == Some(&Tok::Equals) {
                            self.pos += 1;
                            let value = self.expect_id()?;
                            attrs.push((key, value));
                        } else {
                            attrs.push((key, "true".to_string()));
                        }
                    }
                    other => {
                        return Err(self.error(format!("unexpected {other:?} in attribute list")))
                    }
                }
            }
        }
        Ok(attrs)
    }

    fn finish(self) -> NativeGraph {
        let name_of = |id: &str| -> String {
            self.labels.get(id).cloned().unwrap_or_else(|| id.to_string())
        };
        let keep = |name: &str| !name.is_empty() && !PSEUDO_NODES.contains(&name);

        let mut graph = NativeGraph::new();
        for id in &self.order {
            let name = name_of(id);
            if keep(&name) {
                graph.add_node(name);
            }
        }
        for (from, to) in &self.edges {
            let (from, to) = (name_of(from), name_of(to));
            if keep(&from) && keep(&to) {
                graph.add_edge(from, to);
            }
        }
        graph
    }
}

/// Parse native call-graph DOT text.
pub fn parse_native_dot(input: &str) -> Result<NativeGraph, DotParseError> {
    let toks = tokenize(input)?;
    Parser {
        toks,
        pos: 0,
        order: Vec::new(),
        seen: HashSet::new(),
        labels: HashMap::new(),
        edges: Vec::new(),
    }
    .parse()
}
