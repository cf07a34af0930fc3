//! Update order for a patch's derived fields.
//!
//! A field that references a token published by another field must be
//! updated after it. The order is fixed at construction from each field's
//! static token set; a cycle is a configuration error.

use std::collections::BTreeMap;

use crate::contextual::{Contextual, FieldKind};
use crate::tokens::{TokenName, TokenString};

/// Local tokens a patch publishes from its own fields.
pub mod local_tokens {
    pub const TARGET: &str = "Target";
    pub const TARGET_PATH_ONLY: &str = "TargetPathOnly";
    pub const TARGET_WITHOUT_PATH: &str = "TargetWithoutPath";
    pub const FROM_FILE: &str = "FromFile";
}

/// Tokens published once `kind` has been resolved.
pub fn published_tokens(kind: FieldKind) -> &'static [&'static str] {
    use local_tokens::*;
    match kind {
        FieldKind::Target => &[TARGET, TARGET_PATH_ONLY, TARGET_WITHOUT_PATH],
        FieldKind::FromFile => &[FROM_FILE],
    }
}

fn depends_on(scope: &str, field: &TokenString, other: FieldKind) -> bool {
    field.tokens_used().iter().any(|used| {
        let bare = match used.as_str().split_once('/') {
            Some((prefix, rest)) if prefix.eq_ignore_ascii_case(scope) => TokenName::new(rest),
            _ => used.clone(),
        };
        published_tokens(other)
            .iter()
            .any(|token| bare == TokenName::new(*token))
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Topologically order `fields` so every field follows the fields it reads.
///
/// Unconstrained fields keep `FieldKind` order. On a cycle, returns the
/// field names along it, first name repeated at the end.
pub fn update_order(
    scope: &str,
    fields: &[(FieldKind, &TokenString)],
) -> Result<Vec<FieldKind>, Vec<String>> {
    let mut edges: BTreeMap<FieldKind, Vec<FieldKind>> = BTreeMap::new();
    for (kind, field) in fields {
        let deps = fields
            .iter()
            .map(|(other, _)| *other)
            .filter(|other| depends_on(scope, field, *other))
            .collect();
        edges.insert(*kind, deps);
    }

    let mut marks = BTreeMap::new();
    let mut stack = Vec::new();
    let mut order = Vec::new();
    for kind in edges.keys() {
        visit(*kind, &edges, &mut marks, &mut stack, &mut order)?;
    }
    Ok(order)
}

fn visit(
    kind: FieldKind,
    edges: &BTreeMap<FieldKind, Vec<FieldKind>>,
    marks: &mut BTreeMap<FieldKind, Mark>,
    stack: &mut Vec<FieldKind>,
    order: &mut Vec<FieldKind>,
) -> Result<(), Vec<String>> {
    match marks.get(&kind) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = stack.iter().position(|k| *k == kind).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..].iter().map(ToString::to_string).collect();
            cycle.push(kind.to_string());
            return Err(cycle);
        }
        None => {}
    }

    marks.insert(kind, Mark::Visiting);
    stack.push(kind);
    for dep in edges.get(&kind).into_iter().flatten() {
        visit(*dep, edges, marks, stack, order)?;
    }
    stack.pop();
    marks.insert(kind, Mark::Done);
    order.push(kind);
    Ok(())
}
