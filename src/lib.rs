//! Content Patch Core - Conditional Patch Resolution
//!
//! # Update Rules
//! 1. A field is ready only when every token it references is defined
//! 2. Patch-local fields update in dependency order; cycles are rejected
//! 3. Conditions gate readiness; no conditions means always applicable
//! 4. A readiness flip always counts as a change
//! 5. Missing source files are diagnostics, never failures

pub mod assets;
pub mod condition;
pub mod context;
pub mod contextual;
pub mod error;
pub mod graph;
pub mod local;
pub mod logging;
pub mod pack;
pub mod patch;
pub mod state;
pub mod tokens;

pub use assets::{normalize_asset_name, ContentSource, DirectoryContentSource};
pub use condition::Condition;
pub use context::{Context, TokenMap};
pub use contextual::{AggregateContextual, Contextual, FieldKind, Member};
pub use error::PatchError;
pub use local::LocalContext;
pub use pack::{ContentPack, PackManifest, PackUpdate};
pub use patch::{AssetEditor, AssetLoader, Patch, PatchConfig, PatchKind};
pub use state::ContextualState;
pub use tokens::{TokenName, TokenString};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
