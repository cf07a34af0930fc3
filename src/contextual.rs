//! Contextual values and their aggregate.
//!
//! Anything that renders against a context implements [`Contextual`]. The
//! aggregate holds a patch's members as tagged variants so the patch can
//! update its derived fields itself, in dependency order, and let the
//! aggregate handle everything else.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::context::Context;
use crate::state::ContextualState;
use crate::tokens::{TokenName, TokenString};

/// A value that is re-evaluated whenever the context changes.
pub trait Contextual {
    /// Re-evaluate against `context`. Returns whether the observable value changed.
    fn update(&mut self, context: &dyn Context) -> bool;

    fn is_ready(&self) -> bool;

    fn tokens_used(&self) -> BTreeSet<TokenName>;

    fn diagnostic_state(&self) -> ContextualState;
}

/// Patch fields whose resolved values are published back as local tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldKind {
    Target,
    FromFile,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Target => f.write_str("Target"),
            FieldKind::FromFile => f.write_str("FromFile"),
        }
    }
}

/// One member of an [`AggregateContextual`].
#[derive(Debug, Clone)]
pub enum Member {
    /// A derived field, updated by the owning patch before the bulk pass.
    Field(FieldKind, TokenString),
    Condition(Condition),
    /// Any other templated value the patch depends on.
    Value(TokenString),
}

impl Member {
    fn field_kind(&self) -> Option<FieldKind> {
        match self {
            Member::Field(kind, _) => Some(*kind),
            _ => None,
        }
    }
}

impl Contextual for Member {
    fn update(&mut self, context: &dyn Context) -> bool {
        match self {
            Member::Field(_, field) | Member::Value(field) => field.update(context),
            Member::Condition(condition) => condition.update(context),
        }
    }

    fn is_ready(&self) -> bool {
        match self {
            Member::Field(_, field) | Member::Value(field) => field.is_ready(),
            Member::Condition(condition) => condition.is_ready(),
        }
    }

    fn tokens_used(&self) -> BTreeSet<TokenName> {
        match self {
            Member::Field(_, field) | Member::Value(field) => field.tokens_used(),
            Member::Condition(condition) => condition.tokens_used(),
        }
    }

    fn diagnostic_state(&self) -> ContextualState {
        match self {
            Member::Field(_, field) | Member::Value(field) => field.diagnostic_state(),
            Member::Condition(condition) => condition.diagnostic_state(),
        }
    }
}

/// A set of contextual members exposing a single readiness flag.
#[derive(Debug, Clone, Default)]
pub struct AggregateContextual {
    members: Vec<Member>,
    ready: bool,
    tokens_used: BTreeSet<TokenName>,
}

impl AggregateContextual {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, member: Member) -> &mut Self {
        self.members.push(member);
        self.refresh();
        self
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn field(&self, kind: FieldKind) -> Option<&TokenString> {
        self.members.iter().find_map(|m| match m {
            Member::Field(k, field) if *k == kind => Some(field),
            _ => None,
        })
    }

    pub fn field_mut(&mut self, kind: FieldKind) -> Option<&mut TokenString> {
        self.members.iter_mut().find_map(|m| match m {
            Member::Field(k, field) if *k == kind => Some(field),
            _ => None,
        })
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.members.iter().filter_map(|m| match m {
            Member::Condition(condition) => Some(condition),
            _ => None,
        })
    }

    /// Update every member except the listed fields, then recompute
    /// readiness and token usage from all members, skipped ones included.
    pub fn update_except(&mut self, context: &dyn Context, skip: &[FieldKind]) -> bool {
        let mut changed = false;
        for member in &mut self.members {
            if member.field_kind().is_some_and(|kind| skip.contains(&kind)) {
                continue;
            }
            changed |= member.update(context);
        }
        self.refresh();
        changed
    }

    fn refresh(&mut self) {
        self.ready = self.members.iter().all(Contextual::is_ready);
        self.tokens_used = self
            .members
            .iter()
            .flat_map(|m| m.tokens_used())
            .collect();
    }
}

impl Contextual for AggregateContextual {
    fn update(&mut self, context: &dyn Context) -> bool {
        self.update_except(context, &[])
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn tokens_used(&self) -> BTreeSet<TokenName> {
        self.tokens_used.clone()
    }

    fn diagnostic_state(&self) -> ContextualState {
        let mut state = ContextualState::new();
        for member in &self.members {
            state.merge(&member.diagnostic_state());
        }
        state
    }
}
