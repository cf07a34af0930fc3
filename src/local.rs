//! Patch-local token overlay.
//!
//! Each patch owns one [`LocalContext`]. During a pass the patch publishes
//! derived values into it (the resolved target, the source file) and reads
//! through a [`LocalView`], which checks the overlay before the outer context.

use std::collections::HashMap;

use crate::context::Context;
use crate::tokens::TokenName;

#[derive(Debug, Clone)]
pub struct LocalContext {
    scope: String,
    /// `None` marks a local token that is known but currently undefined.
    values: HashMap<TokenName, Option<Vec<String>>>,
}

impl LocalContext {
    /// `scope` is the owning content source's unique id.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            values: HashMap::new(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Drop every override from the previous pass.
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Install or overwrite one override. `None` makes the token read as
    /// undefined instead of falling through to the outer context.
    pub fn set_local_value(&mut self, name: &str, value: Option<&str>) {
        self.values
            .insert(TokenName::new(name), value.map(|v| vec![v.to_string()]));
    }

    pub fn view<'a>(&'a self, parent: &'a dyn Context) -> LocalView<'a> {
        LocalView {
            local: self,
            parent,
        }
    }

    /// Strip a `<scope>/` prefix, if present, from a token name.
    fn unscoped(&self, name: &TokenName) -> Option<TokenName> {
        let (prefix, rest) = name.as_str().split_once('/')?;
        prefix
            .eq_ignore_ascii_case(&self.scope)
            .then(|| TokenName::new(rest))
    }
}

/// Read-only lookup through a patch's overlay into the outer context.
pub struct LocalView<'a> {
    local: &'a LocalContext,
    parent: &'a dyn Context,
}

impl Context for LocalView<'_> {
    fn get_values(&self, name: &TokenName) -> Option<&[String]> {
        let local = match self.local.unscoped(name) {
            Some(bare) => self.local.values.get(&bare),
            None => self.local.values.get(name),
        };

        match local {
            Some(values) => values.as_deref(),
            None => self.parent.get_values(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TokenMap;

    #[test]
    fn test_overlay_shadows_parent() {
        let parent = TokenMap::new().with("Target", "outer").with("Name", "Abigail");
        let mut local = LocalContext::new("Example.Pack");
        local.set_local_value("Target", Some("Characters/Abigail"));

        let view = local.view(&parent);
        assert_eq!(view.get_value(&"target".into()), Some("Characters/Abigail".into()));
        assert_eq!(view.get_value(&"Name".into()), Some("Abigail".into()));
    }

    #[test]
    fn test_scoped_name_reads_overlay() {
        let parent = TokenMap::new();
        let mut local = LocalContext::new("Example.Pack");
        local.set_local_value("FromFile", Some("assets/x.png"));

        let view = local.view(&parent);
        assert_eq!(
            view.get_value(&"example.pack/FromFile".into()),
            Some("assets/x.png".into())
        );
        assert!(!view.is_defined(&"Other.Pack/FromFile".into()));
    }

    #[test]
    fn test_unset_value_hides_parent() {
        let parent = TokenMap::new().with("FromFile", "outer.png");
        let mut local = LocalContext::new("Example.Pack");
        local.set_local_value("FromFile", None);
        assert!(!local.view(&parent).is_defined(&"FromFile".into()));

        local.reset();
        assert!(local.view(&parent).is_defined(&"FromFile".into()));
    }

    #[test]
    fn test_overlays_are_private_per_patch() {
        let parent = TokenMap::new();
        let mut first = LocalContext::new("Example.Pack");
        let second = LocalContext::new("Example.Pack");
        first.set_local_value("Target", Some("Maps/Town"));

        assert!(first.view(&parent).is_defined(&"Target".into()));
        assert!(!second.view(&parent).is_defined(&"Target".into()));
    }
}
