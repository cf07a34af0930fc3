//! Diagnostic accumulator for one evaluation pass.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::tokens::TokenName;

/// Errors and warnings gathered while updating a contextual value.
///
/// Merging appends messages in order and skips exact duplicates, so
/// `a.merge(b).merge(c)` and `a.merge(b.merge(c))` produce the same lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualState {
    errors: Vec<String>,
    warnings: Vec<String>,
    unready_tokens: BTreeSet<String>,
}

impl ContextualState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Tokens that were undefined during the last pass.
    pub fn unready_tokens(&self) -> &BTreeSet<String> {
        &self.unready_tokens
    }

    pub fn add_error(&mut self, message: impl Into<String>) -> &mut Self {
        push_unique(&mut self.errors, message.into());
        self
    }

    pub fn add_warning(&mut self, message: impl Into<String>) -> &mut Self {
        push_unique(&mut self.warnings, message.into());
        self
    }

    pub fn add_unready_token(&mut self, name: &TokenName) -> &mut Self {
        self.unready_tokens.insert(name.as_str().to_string());
        self
    }

    pub fn merge(&mut self, other: &ContextualState) -> &mut Self {
        for error in &other.errors {
            push_unique(&mut self.errors, error.clone());
        }
        for warning in &other.warnings {
            push_unique(&mut self.warnings, warning.clone());
        }
        self.unready_tokens.extend(other.unready_tokens.iter().cloned());
        self
    }

    pub fn reset(&mut self) {
        self.errors.clear();
        self.warnings.clear();
        self.unready_tokens.clear();
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.unready_tokens.is_empty()
    }
}

fn push_unique(list: &mut Vec<String>, message: String) {
    if !list.contains(&message) {
        list.push(message);
    }
}
