//! Content Packs - Patch Collections
//!
//! A pack is a directory with a `content.json` manifest. Patches that fail
//! to build are rejected one by one; the rest of the pack still loads.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assets::{ContentSource, DirectoryContentSource};
use crate::context::Context;
use crate::error::PatchError;
use crate::patch::{Patch, PatchConfig};

/// Newest manifest format this engine understands.
pub const SUPPORTED_FORMAT: &str = "2.0.0";

pub const MANIFEST_FILE: &str = "content.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackManifest {
    pub format: String,
    pub unique_id: String,
    #[serde(default)]
    pub changes: Vec<PatchConfig>,
}

/// Result of one context pass over a pack.
#[derive(Debug, Default)]
pub struct PackUpdate {
    /// Log names of patches whose state changed.
    pub changed: Vec<String>,
    /// Patches whose resolved values could not be normalized.
    pub failed: Vec<(String, PatchError)>,
}

pub struct ContentPack<S: ContentSource = DirectoryContentSource> {
    source: S,
    patches: Vec<Patch>,
    rejected: Vec<(String, PatchError)>,
}

impl ContentPack<DirectoryContentSource> {
    pub fn load_from_dir(dir: &Path) -> Result<Self, PatchError> {
        let content = fs::read_to_string(dir.join(MANIFEST_FILE))?;
        let manifest: PackManifest = serde_json::from_str(&content)?;
        let source = DirectoryContentSource::new(manifest.unique_id.clone(), dir);
        Self::from_manifest(&manifest, source)
    }
}

impl<S: ContentSource> ContentPack<S> {
    pub fn from_manifest(manifest: &PackManifest, source: S) -> Result<Self, PatchError> {
        check_format(&manifest.format)?;

        let mut patches = vec![];
        let mut rejected = vec![];
        for config in manifest.changes.iter().filter(|c| c.enabled) {
            match Patch::new(config, &source) {
                Ok(patch) => patches.push(patch),
                Err(e) => {
                    warn!(pack = source.id(), patch = %config.display_name(), error = %e, "rejected patch");
                    rejected.push((config.display_name(), e));
                }
            }
        }
        info!(
            pack = source.id(),
            loaded = patches.len(),
            rejected = rejected.len(),
            "loaded content pack"
        );

        Ok(Self {
            source,
            patches,
            rejected,
        })
    }

    pub fn id(&self) -> &str {
        self.source.id()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn patches_mut(&mut self) -> &mut [Patch] {
        &mut self.patches
    }

    pub fn patch(&self, log_name: &str) -> Option<&Patch> {
        self.patches.iter().find(|p| p.log_name() == log_name)
    }

    /// Patches that failed to build, with the reason.
    pub fn rejected(&self) -> &[(String, PatchError)] {
        &self.rejected
    }

    /// Update every patch in order against the same outer context.
    pub fn update_context(&mut self, context: &dyn Context) -> PackUpdate {
        let mut update = PackUpdate::default();
        for patch in &mut self.patches {
            match patch.update_context(context, &self.source) {
                Ok(true) => update.changed.push(patch.log_name().to_string()),
                Ok(false) => {}
                Err(e) => update.failed.push((patch.log_name().to_string(), e)),
            }
        }
        debug!(
            pack = self.source.id(),
            changed = update.changed.len(),
            failed = update.failed.len(),
            "updated content pack"
        );
        update
    }
}

fn check_format(format: &str) -> Result<(), PatchError> {
    let pack = semver::Version::parse(format)
        .map_err(|_| PatchError::InvalidFormat(format.to_string()))?;
    let supported = semver::Version::parse(SUPPORTED_FORMAT)
        .map_err(|_| PatchError::InvalidFormat(SUPPORTED_FORMAT.to_string()))?;

    if pack > supported {
        return Err(PatchError::FormatVersion(
            format.to_string(),
            SUPPORTED_FORMAT.to_string(),
        ));
    }
    Ok(())
}
