//! Patches - Conditional Asset Changes
//!
//! CRITICAL: `update_context` is the only entry point that mutates a patch's
//! resolved state. It must be safe to call on every context change and must
//! only report a change when something observable moved.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::assets::{self, ContentSource};
use crate::condition::Condition;
use crate::context::Context;
use crate::contextual::{AggregateContextual, Contextual, FieldKind, Member};
use crate::error::PatchError;
use crate::graph::{self, local_tokens};
use crate::local::LocalContext;
use crate::state::ContextualState;
use crate::tokens::{TokenName, TokenString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatchKind {
    /// Replace the target asset with a file from the content source.
    Load,
    /// Edit entries of a data asset.
    EditData,
    /// Overlay an image file onto the target asset.
    EditImage,
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl PatchKind {
    fn requires_from_file(self) -> bool {
        matches!(self, PatchKind::Load | PatchKind::EditImage)
    }
}

/// Static patch configuration, as written in a content pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchConfig {
    #[serde(default)]
    pub log_name: Option<String>,
    pub action: PatchKind,
    pub target: String,
    #[serde(default)]
    pub from_file: Option<String>,
    #[serde(default)]
    pub when: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool { true }

impl PatchConfig {
    pub fn new(action: PatchKind, target: &str) -> Self {
        Self {
            log_name: None,
            action,
            target: target.to_string(),
            from_file: None,
            when: BTreeMap::new(),
            enabled: true,
        }
    }

    pub fn from_file(mut self, path: &str) -> Self {
        self.from_file = Some(path.to_string());
        self
    }

    pub fn when(mut self, token: &str, values: &str) -> Self {
        self.when.insert(token.to_string(), values.to_string());
        self
    }

    pub fn log_name(mut self, name: &str) -> Self {
        self.log_name = Some(name.to_string());
        self
    }

    /// Name used in diagnostics when none is configured.
    pub fn display_name(&self) -> String {
        self.log_name
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.action, self.target))
    }
}

/// Loads a file from a content source into an asset value.
pub trait AssetLoader<T> {
    fn load_asset(&self, full_path: &Path) -> Result<T, PatchError>;
}

/// Applies a patch's change to an already-loaded asset.
pub trait AssetEditor<T> {
    fn edit_asset(&self, patch: &Patch, asset: &mut T) -> Result<(), PatchError>;
}

/// A conditional change to one asset, re-resolved on every context change.
#[derive(Debug, Clone)]
pub struct Patch {
    log_name: String,
    kind: PatchKind,
    contextuals: AggregateContextual,
    field_order: Vec<FieldKind>,
    local: LocalContext,
    state: ContextualState,

    target_asset: String,
    from_asset: Option<String>,
    source_exists: bool,
    ready: bool,
    applied: bool,
}

impl Patch {
    /// Build a patch. Fails on malformed templates or paths, and when the
    /// target and source fields read each other.
    pub fn new(config: &PatchConfig, content: &dyn ContentSource) -> Result<Self, PatchError> {
        let log_name = config.display_name();

        let target = parse_path_field(&log_name, &config.target)?;
        let from_file = match &config.from_file {
            Some(raw) => Some(parse_path_field(&log_name, raw)?),
            None if config.action.requires_from_file() => {
                return Err(PatchError::MissingField {
                    log_name,
                    action: config.action.to_string(),
                    field: "FromFile",
                });
            }
            None => None,
        };

        let mut fields = vec![(FieldKind::Target, &target)];
        if let Some(from_file) = &from_file {
            fields.push((FieldKind::FromFile, from_file));
        }
        let field_order = graph::update_order(content.id(), &fields).map_err(|cycle| {
            PatchError::CircularReference {
                log_name: log_name.clone(),
                cycle,
            }
        })?;
        trace!(patch = %log_name, order = ?field_order, "resolved field order");

        let mut contextuals = AggregateContextual::new();
        contextuals.add(Member::Field(FieldKind::Target, target));
        if let Some(from_file) = from_file {
            contextuals.add(Member::Field(FieldKind::FromFile, from_file));
        }
        for (token, values) in &config.when {
            let condition =
                Condition::new(token, values).map_err(|e| PatchError::InvalidTemplate {
                    log_name: log_name.clone(),
                    raw: values.clone(),
                    reason: e.to_string(),
                })?;
            contextuals.add(Member::Condition(condition));
        }

        Ok(Self {
            log_name,
            kind: config.action,
            contextuals,
            field_order,
            local: LocalContext::new(content.id()),
            state: ContextualState::new(),
            target_asset: String::new(),
            from_asset: None,
            source_exists: false,
            ready: false,
            applied: false,
        })
    }

    /// Re-resolve every field and condition against `context`.
    ///
    /// Returns whether anything observable changed, counting a readiness
    /// flip as a change even if no value did.
    pub fn update_context(
        &mut self,
        context: &dyn Context,
        content: &dyn ContentSource,
    ) -> Result<bool, PatchError> {
        let was_ready = self.ready;
        self.state.reset();
        self.local.reset();
        let mut changed = false;

        // derived fields, each publishing its local tokens for the next
        for kind in self.field_order.clone() {
            let view = self.local.view(context);
            if let Some(field) = self.contextuals.field_mut(kind) {
                changed |= field.update(&view);
            }
            if let Err(e) = self.publish(kind) {
                self.clear_resolved();
                warn!(patch = %self.log_name, error = %e, "field failed normalization");
                return Err(e);
            }
        }
        let mut ready = self.field_ready(FieldKind::Target)
            && (!self.has_field(FieldKind::FromFile) || self.field_ready(FieldKind::FromFile));

        // conditions and any other members
        let view = self.local.view(context);
        changed |= self.contextuals.update_except(&view, &self.field_order);
        let conditions_match = self.matches_conditions();
        ready &= self.contextuals.is_ready() && conditions_match;

        self.source_exists = false;
        if ready {
            if let Some(from_asset) = &self.from_asset {
                self.source_exists = content.has_file(from_asset);
                if !self.source_exists && conditions_match {
                    warn!(patch = %self.log_name, file = %from_asset, "source file missing");
                    self.state.add_error(format!(
                        "{}: FromFile '{}' does not exist in content source '{}'",
                        self.log_name,
                        from_asset,
                        content.id()
                    ));
                }
            }
        }

        self.ready = ready;
        let changed = changed || self.ready != was_ready;
        debug!(patch = %self.log_name, changed, ready = self.ready, "updated patch context");
        Ok(changed)
    }

    /// Normalize a freshly updated field and expose it as local tokens.
    fn publish(&mut self, kind: FieldKind) -> Result<(), PatchError> {
        let value = self
            .contextuals
            .field(kind)
            .and_then(|f| f.value())
            .map(|raw| normalize(&self.log_name, raw))
            .transpose()?;

        match kind {
            FieldKind::Target => {
                let target = value.as_deref();
                self.local.set_local_value(local_tokens::TARGET, target);
                self.local.set_local_value(
                    local_tokens::TARGET_PATH_ONLY,
                    target.map(assets::directory),
                );
                self.local.set_local_value(
                    local_tokens::TARGET_WITHOUT_PATH,
                    target.map(assets::file_name),
                );
                self.target_asset = value.unwrap_or_default();
            }
            FieldKind::FromFile => {
                self.local
                    .set_local_value(local_tokens::FROM_FILE, value.as_deref());
                self.from_asset = value;
            }
        }
        Ok(())
    }

    /// Drop every derived value so a failed pass never looks applicable.
    fn clear_resolved(&mut self) {
        self.ready = false;
        self.target_asset.clear();
        self.from_asset = None;
        self.source_exists = false;
    }

    fn has_field(&self, kind: FieldKind) -> bool {
        self.contextuals.field(kind).is_some()
    }

    fn field_ready(&self, kind: FieldKind) -> bool {
        self.contextuals.field(kind).is_some_and(|f| f.is_ready())
    }

    pub fn log_name(&self) -> &str {
        &self.log_name
    }

    pub fn kind(&self) -> PatchKind {
        self.kind
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Normalized target asset name, empty while not ready.
    pub fn target_asset(&self) -> &str {
        &self.target_asset
    }

    pub fn raw_target(&self) -> &str {
        self.contextuals
            .field(FieldKind::Target)
            .map_or("", |f| f.raw())
    }

    /// Normalized source file, `None` when absent or not ready.
    pub fn from_asset(&self) -> Option<&str> {
        self.from_asset.as_deref()
    }

    pub fn source_asset_exists(&self) -> bool {
        self.source_exists
    }

    /// True when there are no conditions or all of them match.
    pub fn matches_conditions(&self) -> bool {
        self.contextuals.conditions().all(Condition::is_match)
    }

    pub fn tokens_used(&self) -> BTreeSet<TokenName> {
        self.contextuals.tokens_used()
    }

    pub fn diagnostic_state(&self) -> ContextualState {
        let mut state = self.state.clone();
        state.merge(&self.contextuals.diagnostic_state());
        state
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Set by whatever applies the patch to the asset, never by `update_context`.
    pub fn set_applied(&mut self, applied: bool) {
        self.applied = applied;
    }

    /// Load the target asset from this patch's source file.
    pub fn load<T>(
        &self,
        asset_name: &str,
        content: &dyn ContentSource,
        loader: &dyn AssetLoader<T>,
    ) -> Result<T, PatchError> {
        if self.kind != PatchKind::Load {
            return Err(self.unsupported("load"));
        }
        self.ensure_targets(asset_name)?;
        let from_asset = self.from_asset.as_deref().ok_or_else(|| PatchError::AssetMismatch {
            log_name: self.log_name.clone(),
            requested: asset_name.to_string(),
            state: "missing its source file".to_string(),
        })?;
        loader.load_asset(&content.resolve_full_path(from_asset))
    }

    /// Apply this patch's edit to an already-loaded asset.
    pub fn edit<T>(
        &self,
        asset_name: &str,
        asset: &mut T,
        editor: &dyn AssetEditor<T>,
    ) -> Result<(), PatchError> {
        if !matches!(self.kind, PatchKind::EditData | PatchKind::EditImage) {
            return Err(self.unsupported("edit"));
        }
        self.ensure_targets(asset_name)?;
        editor.edit_asset(self, asset)
    }

    fn unsupported(&self, operation: &'static str) -> PatchError {
        PatchError::Unsupported {
            log_name: self.log_name.clone(),
            operation,
        }
    }

    fn ensure_targets(&self, asset_name: &str) -> Result<(), PatchError> {
        let mismatch = |state: String| PatchError::AssetMismatch {
            log_name: self.log_name.clone(),
            requested: asset_name.to_string(),
            state,
        };
        if !self.ready {
            return Err(mismatch("not ready".to_string()));
        }
        let requested = normalize(&self.log_name, asset_name)?;
        if !requested.eq_ignore_ascii_case(&self.target_asset) {
            return Err(mismatch(format!("targeting '{}'", self.target_asset)));
        }
        Ok(())
    }
}

fn normalize(log_name: &str, raw: &str) -> Result<String, PatchError> {
    assets::normalize_asset_name(raw).map_err(|issue| PatchError::InvalidPath {
        log_name: log_name.to_string(),
        raw: raw.to_string(),
        reason: issue.to_string(),
    })
}

/// Parse a path template and check its literal parts form a valid path.
fn parse_path_field(log_name: &str, raw: &str) -> Result<TokenString, PatchError> {
    let field = TokenString::parse(raw).map_err(|e| PatchError::InvalidTemplate {
        log_name: log_name.to_string(),
        raw: raw.to_string(),
        reason: e.to_string(),
    })?;
    normalize(log_name, &field.render_with_stub("_"))
        .map_err(|e| match e {
            PatchError::InvalidPath { log_name, reason, .. } => PatchError::InvalidPath {
                log_name,
                raw: raw.to_string(),
                reason,
            },
            other => other,
        })?;
    Ok(field)
}
