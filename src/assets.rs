//! Asset Names and Content Sources
//!
//! Normalization turns user-written paths into one canonical form so that
//! `Characters\Abigail` and `Characters//Abigail/` name the same asset.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathIssue {
    #[error("path is empty")]
    Empty,

    #[error("path must be relative")]
    Absolute,

    #[error("path must not climb out of its folder with '..'")]
    ParentTraversal,

    #[error("path contains invalid character {0:?}")]
    InvalidCharacter(char),
}

const INVALID_CHARS: &[char] = &['<', '>', '"', '|', '?', '*', '\0'];

/// Canonical asset name: `/` separators, no empty or `.` segments.
pub fn normalize_asset_name(raw: &str) -> Result<String, PathIssue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathIssue::Empty);
    }
    if let Some(c) = trimmed.chars().find(|c| INVALID_CHARS.contains(c)) {
        return Err(PathIssue::InvalidCharacter(c));
    }

    let unified = trimmed.replace('\\', "/");
    if unified.starts_with('/') || has_drive_prefix(&unified) {
        return Err(PathIssue::Absolute);
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment.trim() {
            "" | "." => {}
            ".." => return Err(PathIssue::ParentTraversal),
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        return Err(PathIssue::Empty);
    }

    Ok(segments.join("/"))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Last segment of a normalized name.
pub fn file_name(normalized: &str) -> &str {
    normalized.rsplit('/').next().unwrap_or(normalized)
}

/// Everything before the last segment, empty for top-level names.
pub fn directory(normalized: &str) -> &str {
    normalized.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// The content pack that owns a set of patches.
pub trait ContentSource {
    /// Unique id, used to scope patch-local tokens.
    fn id(&self) -> &str;

    fn has_file(&self, normalized_path: &str) -> bool;

    fn resolve_full_path(&self, normalized_path: &str) -> PathBuf;
}

/// Content source backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryContentSource {
    id: String,
    root: PathBuf,
}

impl DirectoryContentSource {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for DirectoryContentSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn has_file(&self, normalized_path: &str) -> bool {
        match normalize_asset_name(normalized_path) {
            Ok(path) => self.resolve_full_path(&path).is_file(),
            Err(_) => false,
        }
    }

    fn resolve_full_path(&self, normalized_path: &str) -> PathBuf {
        normalized_path
            .split('/')
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }
}
