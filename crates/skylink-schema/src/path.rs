//! Field path expressions over [`ConfigNode`] trees.
//!
//! A path starts at the `$` root and continues with `.field`, `["key"]` or
//! `['key']` (quoted mapping keys, `\` escapes the next character) and `[N]`
//! (sequence index). A path may also start with a bare field name, in which
//! case it is rooted implicitly: `spec.arn` is the same location as `$.spec.arn`.
//!
//! Resolution never fails. A missing key, an out-of-range index, or a type
//! mismatch along the way all resolve to `None`, which is distinct from a
//! present `null`.

use crate::types::ResourceName;
use crate::ConfigNode;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Largest sequence index [`FieldPath::insert`] will pad a sequence up to.
pub const MAX_INSERT_INDEX: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("field path must not be empty")]
    Empty,
    #[error("invalid field path '{path}' at offset {offset}: {reason}")]
    Syntax {
        path: String,
        offset: usize,
        reason: &'static str,
    },
    #[error("cannot insert at index {index}: the largest insertable index is {max}", max = MAX_INSERT_INDEX)]
    IndexTooLarge { index: usize },
}

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// `.name` form.
    Field(String),
    /// `["name"]` form. Resolves the same way as `Field`, renders quoted.
    Key(String),
    /// `[N]` form.
    Index(usize),
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The `$` path, addressing the whole tree.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self, PathError> {
        if input.trim().is_empty() {
            return Err(PathError::Empty);
        }
        Parser { src: input, pos: 0 }.parse()
    }

    /// The path `$["<resource>"]<relative>`, namespacing `relative` under a
    /// resource instance key as link data does.
    pub fn for_resource(resource: &ResourceName, relative: &FieldPath) -> Self {
        let mut segments = Vec::with_capacity(relative.segments.len() + 1);
        segments.push(PathSegment::Key(resource.as_str().to_owned()));
        segments.extend(relative.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a segment, returning the extended path.
    #[must_use]
    pub fn join(mut self, segment: PathSegment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn resolve<'t>(&self, tree: &'t ConfigNode) -> Option<&'t ConfigNode> {
        self.segments
            .iter()
            .try_fold(tree, |node, segment| match (segment, node) {
                (PathSegment::Field(key) | PathSegment::Key(key), Value::Object(map)) => {
                    map.get(key)
                }
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
                _ => None,
            })
    }

    /// Whether both paths address the same location. `.name` and `["name"]`
    /// are interchangeable here, unlike with `==`.
    pub fn same_location(&self, other: &FieldPath) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (
                        PathSegment::Field(a) | PathSegment::Key(a),
                        PathSegment::Field(b) | PathSegment::Key(b),
                    ) => a == b,
                    (PathSegment::Index(a), PathSegment::Index(b)) => a == b,
                    _ => false,
                })
    }

    /// Write `value` at this path, creating intermediate mappings and
    /// sequences as needed. Nodes of the wrong shape along the way are
    /// replaced. Sequences grow with `null` padding to reach an index, up to
    /// [`MAX_INSERT_INDEX`]; on error the tree may hold created intermediates.
    pub fn insert(&self, tree: &mut ConfigNode, value: ConfigNode) -> Result<(), PathError> {
        let mut node = tree;
        for segment in &self.segments {
            node = child_entry(node, segment)?;
        }
        *node = value;
        Ok(())
    }

    /// Canonical rendering without the leading `$`, the form used to key
    /// recorded field changes, e.g. `["fn"].codeSigningConfigArn`.
    pub fn render_without_root(&self) -> String {
        let rendered = self.to_string();
        rendered.strip_prefix('$').unwrap_or(&rendered).to_owned()
    }
}

fn child_entry<'t>(
    node: &'t mut ConfigNode,
    segment: &PathSegment,
) -> Result<&'t mut ConfigNode, PathError> {
    match segment {
        PathSegment::Field(key) | PathSegment::Key(key) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            match node {
                Value::Object(map) => Ok(map.entry(key.clone()).or_insert(Value::Null)),
                other => Ok(other),
            }
        }
        PathSegment::Index(index) => {
            let index = *index;
            let len = index
                .checked_add(1)
                .filter(|len| *len <= MAX_INSERT_INDEX + 1)
                .ok_or(PathError::IndexTooLarge { index })?;
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            match node {
                Value::Array(items) => {
                    if items.len() < len {
                        items.resize(len, Value::Null);
                    }
                    Ok(&mut items[index])
                }
                other => Ok(other),
            }
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Key(key) => {
                    f.write_str("[\"")?;
                    for c in key.chars() {
                        if c == '"' || c == '\\' {
                            f.write_str("\\")?;
                        }
                        write!(f, "{c}")?;
                    }
                    f.write_str("\"]")?;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Resolve a path string against a tree. A malformed path resolves to `None`.
pub fn resolve<'t>(path: &str, tree: &'t ConfigNode) -> Option<&'t ConfigNode> {
    FieldPath::parse(path).ok()?.resolve(tree)
}

/// Resolve a path string and return the value only if it is a string.
pub fn resolve_str<'t>(path: &str, tree: &'t ConfigNode) -> Option<&'t str> {
    resolve(path, tree)?.as_str()
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn parse(mut self) -> Result<FieldPath, PathError> {
        let mut segments = Vec::new();
        if self.peek() == Some('$') {
            self.bump();
        } else {
            segments.push(PathSegment::Field(self.ident()?));
        }

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.bump();
                    segments.push(PathSegment::Field(self.ident()?));
                }
                '[' => {
                    self.bump();
                    segments.push(self.bracket()?);
                }
                _ => return Err(self.error("expected '.' or '['")),
            }
        }

        Ok(FieldPath { segments })
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, reason: &'static str) -> PathError {
        PathError::Syntax {
            path: self.src.to_owned(),
            offset: self.pos,
            reason,
        }
    }

    fn ident(&mut self) -> Result<String, PathError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                self.bump();
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected a field name"));
        }
        Ok(self.src[start..self.pos].to_owned())
    }

    fn bracket(&mut self) -> Result<PathSegment, PathError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let key = self.quoted(quote)?;
                self.expect_close()?;
                Ok(PathSegment::Key(key))
            }
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
                let index = self.src[start..self.pos]
                    .parse::<usize>()
                    .map_err(|_| self.error("index out of range"))?;
                self.expect_close()?;
                Ok(PathSegment::Index(index))
            }
            _ => Err(self.error("expected a quoted key or an index")),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, PathError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated quoted key")),
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => return Err(self.error("dangling escape")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn expect_close(&mut self) -> Result<(), PathError> {
        if self.bump() == Some(']') {
            Ok(())
        } else {
            Err(self.error("expected ']'"))
        }
    }
}
