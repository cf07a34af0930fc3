//! Token Contexts - Value Lookup
//!
//! The outer context is supplied by the host; this crate only reads it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tokens::TokenName;

/// Read-only view of token values.
pub trait Context {
    /// Current values of a token, `None` when the token is undefined.
    fn get_values(&self, name: &TokenName) -> Option<&[String]>;

    /// Values joined with `", "`, the form substituted into templates.
    fn get_value(&self, name: &TokenName) -> Option<String> {
        self.get_values(name).map(|values| values.join(", "))
    }

    fn is_defined(&self, name: &TokenName) -> bool {
        self.get_values(name).is_some()
    }
}

/// Serialized form of one token: a single string or a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    One(String),
    Many(Vec<String>),
}

/// Owned token table, usually loaded from JSON like
/// `{"Name": "Abigail", "Season": ["spring", "summer"]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "HashMap<String, RawValue>", into = "HashMap<String, RawValue>")]
pub struct TokenMap {
    values: HashMap<TokenName, Vec<String>>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, vec![value.to_string()]);
        self
    }

    pub fn with_values<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(name, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn set(&mut self, name: impl Into<TokenName>, values: Vec<String>) {
        self.values.insert(name.into(), values);
    }

    pub fn remove(&mut self, name: &TokenName) -> Option<Vec<String>> {
        self.values.remove(name)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Context for TokenMap {
    fn get_values(&self, name: &TokenName) -> Option<&[String]> {
        self.values.get(name).map(Vec::as_slice)
    }
}

impl From<HashMap<String, RawValue>> for TokenMap {
    fn from(raw: HashMap<String, RawValue>) -> Self {
        let values = raw
            .into_iter()
            .map(|(name, value)| {
                let values = match value {
                    RawValue::One(v) => vec![v],
                    RawValue::Many(vs) => vs,
                };
                (TokenName::new(name), values)
            })
            .collect();
        Self { values }
    }
}

impl From<TokenMap> for HashMap<String, RawValue> {
    fn from(map: TokenMap) -> Self {
        map.values
            .into_iter()
            .map(|(name, values)| (name.as_str().to_string(), RawValue::Many(values)))
            .collect()
    }
}
