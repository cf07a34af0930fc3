//! Conditions - Boolean Gates Over One Token

use std::collections::BTreeSet;

use crate::context::Context;
use crate::contextual::Contextual;
use crate::state::ContextualState;
use crate::tokens::{TemplateError, TokenName, TokenString};

/// Matches when any current value of `token` is in the accepted set.
///
/// The accepted set is itself a template, split on commas and compared
/// case-insensitively. A condition is only ready when its token is defined
/// and its accepted values resolved.
#[derive(Debug, Clone)]
pub struct Condition {
    token: TokenName,
    values: TokenString,
    accepted: BTreeSet<String>,
    ready: bool,
    matched: bool,
    state: ContextualState,
}

impl Condition {
    /// `token` may be written bare (`Season`) or as a placeholder (`{{Season}}`).
    pub fn new(token: &str, values: &str) -> Result<Self, TemplateError> {
        let name = token
            .trim()
            .strip_prefix("{{")
            .and_then(|t| t.strip_suffix("}}"))
            .unwrap_or(token);

        Ok(Self {
            token: TokenName::new(name),
            values: TokenString::parse(values)?,
            accepted: BTreeSet::new(),
            ready: false,
            matched: false,
            state: ContextualState::default(),
        })
    }

    pub fn token(&self) -> &TokenName {
        &self.token
    }

    pub fn is_match(&self) -> bool {
        self.matched
    }

    fn split_values(raw: &str) -> BTreeSet<String> {
        raw.split(',')
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

impl Contextual for Condition {
    fn update(&mut self, context: &dyn Context) -> bool {
        let was = (self.ready, self.matched, std::mem::take(&mut self.accepted));
        self.state.reset();

        self.values.update(context);
        self.state.merge(&self.values.diagnostic_state());
        self.accepted = self.values.value().map(Self::split_values).unwrap_or_default();

        let current = context.get_values(&self.token);
        if current.is_none() {
            self.state.add_unready_token(&self.token);
        }

        self.ready = current.is_some() && self.values.is_ready();
        self.matched = self.ready
            && current.is_some_and(|values| {
                values
                    .iter()
                    .any(|v| self.accepted.contains(&v.trim().to_ascii_lowercase()))
            });

        was != (self.ready, self.matched, self.accepted.clone())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn tokens_used(&self) -> BTreeSet<TokenName> {
        let mut used = self.values.tokens_used();
        used.insert(self.token.clone());
        used
    }

    fn diagnostic_state(&self) -> ContextualState {
        self.state.clone()
    }
}
