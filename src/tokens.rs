//! Token Strings - Templated Fields
//!
//! A token string is a raw template like `Characters/{{Name}}`. Its resolved
//! value is only defined while every referenced token has a value.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::contextual::Contextual;
use crate::state::ContextualState;

/// Case-insensitive token name. Keeps the spelling it was created with.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenName(String);

impl TokenName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lookup key used by maps and sets.
    pub fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl PartialEq for TokenName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl std::hash::Hash for TokenName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for TokenName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TokenName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for TokenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Why a raw template could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    Unclosed { offset: usize },
    EmptyToken { offset: usize },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Unclosed { offset } => write!(f, "unclosed '{{{{' at offset {offset}"),
            TemplateError::EmptyToken { offset } => write!(f, "empty token at offset {offset}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(TokenName),
}

fn parse(raw: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut remaining = raw;
    let mut consumed = 0;

    while let Some(start) = remaining.find("{{") {
        if start > 0 {
            segments.push(Segment::Literal(remaining[..start].to_string()));
        }
        let after_open = &remaining[start + 2..];
        let end = after_open
            .find("}}")
            .ok_or(TemplateError::Unclosed { offset: consumed + start })?;
        let name = after_open[..end].trim();
        if name.is_empty() {
            return Err(TemplateError::EmptyToken { offset: consumed + start });
        }
        segments.push(Segment::Token(TokenName::new(name)));

        let advance = start + 2 + end + 2;
        consumed += advance;
        remaining = &remaining[advance..];
    }
    if !remaining.is_empty() {
        segments.push(Segment::Literal(remaining.to_string()));
    }

    Ok(segments)
}

/// A field whose value is rendered from a template against a context.
#[derive(Debug, Clone)]
pub struct TokenString {
    raw: String,
    segments: Vec<Segment>,
    tokens_used: BTreeSet<TokenName>,
    value: Option<String>,
    state: ContextualState,
}

impl TokenString {
    pub fn parse(raw: impl Into<String>) -> Result<Self, TemplateError> {
        let raw = raw.into();
        let segments = parse(&raw)?;
        let tokens_used = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Token(name) => Some(name.clone()),
                Segment::Literal(_) => None,
            })
            .collect();

        Ok(Self {
            raw,
            segments,
            tokens_used,
            value: None,
            state: ContextualState::default(),
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Resolved value from the last `update`, `None` while not ready.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// A template without placeholders is always ready.
    pub fn is_mutable(&self) -> bool {
        !self.tokens_used.is_empty()
    }

    pub fn references(&self, name: &TokenName) -> bool {
        self.tokens_used.contains(name)
    }

    /// Render with every placeholder replaced by `stub`, for validating the
    /// literal parts of a template before any token has a value.
    pub fn render_with_stub(&self, stub: &str) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.as_str(),
                Segment::Token(_) => stub,
            })
            .collect()
    }

    fn render(&self, context: &dyn Context) -> Option<String> {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token(name) => out.push_str(&context.get_value(name)?),
            }
        }
        Some(out)
    }
}

impl Contextual for TokenString {
    fn update(&mut self, context: &dyn Context) -> bool {
        let previous = self.value.take();
        self.state.reset();

        for name in &self.tokens_used {
            if !context.is_defined(name) {
                self.state.add_unready_token(name);
            }
        }
        if self.state.unready_tokens().is_empty() {
            self.value = self.render(context);
        }

        previous != self.value
    }

    fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    fn tokens_used(&self) -> BTreeSet<TokenName> {
        self.tokens_used.clone()
    }

    fn diagnostic_state(&self) -> ContextualState {
        self.state.clone()
    }
}
