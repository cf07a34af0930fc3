//! Error taxonomy for patch construction and evaluation.
//!
//! Configuration errors abort a single patch. Contract violations mean the
//! orchestrator called an operation the patch kind does not offer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("{log_name}: invalid asset path '{raw}': {reason}")]
    InvalidPath {
        log_name: String,
        raw: String,
        reason: String,
    },

    #[error("{log_name}: invalid token template '{raw}': {reason}")]
    InvalidTemplate {
        log_name: String,
        raw: String,
        reason: String,
    },

    #[error("{log_name}: {action} patches require a {field} field")]
    MissingField {
        log_name: String,
        action: String,
        field: &'static str,
    },

    #[error("{log_name}: circular reference between fields: {}", .cycle.join(" -> "))]
    CircularReference { log_name: String, cycle: Vec<String> },

    #[error("{log_name}: patch does not support {operation}")]
    Unsupported {
        log_name: String,
        operation: &'static str,
    },

    #[error("{log_name}: cannot apply to '{requested}' while patch is {state}")]
    AssetMismatch {
        log_name: String,
        requested: String,
        state: String,
    },

    #[error("Content pack format {0} is newer than supported format {1}")]
    FormatVersion(String, String),

    #[error("Invalid content pack format '{0}'")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PatchError {
    /// True for programming errors: operations a patch kind never supports.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, PatchError::Unsupported { .. })
    }

    /// True for errors that should disable just the offending patch.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PatchError::InvalidPath { .. }
                | PatchError::InvalidTemplate { .. }
                | PatchError::MissingField { .. }
                | PatchError::CircularReference { .. }
        )
    }
}
