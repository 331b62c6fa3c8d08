//! Error handling for the broadband update workflow.
//!
//! Backend failures and precondition violations are surfaced to the operator
//! directly; there is no retry or rollback machinery.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for update operations
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Main error type for update operations
#[derive(Error, Debug)]
pub enum UpdateError {
    // Layer / schema errors
    #[error("Layer not found: {layer}")]
    LayerNotFound { layer: String },

    #[error("Field '{field}' not found in layer {layer}")]
    FieldNotFound { layer: String, field: String },

    #[error("Field '{field}' already exists in layer {layer}")]
    FieldExists { layer: String, field: String },

    #[error("Layer {layer} is locked and cannot be modified")]
    SchemaLocked { layer: String },

    // Precondition violations
    #[error("Layer {layer} has no features")]
    EmptyDataset { layer: String },

    #[error("Provider '{provider}' not found in list of existing providers in {layer}")]
    ProviderNotFound { provider: String, layer: String },

    #[error("Duplicate identifier {identifier} in layer {layer}")]
    DuplicateIdentifier { identifier: String, layer: String },

    // Row operation errors
    #[error("Feature {oid} not found in layer {layer}")]
    FeatureNotFound { layer: String, oid: u64 },

    #[error("Calculation failed for field '{field}' in layer {layer}: {reason}")]
    CalculationError {
        layer: String,
        field: String,
        reason: String,
    },

    // Layer file errors
    #[error("Failed to read layer file {path}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write layer file {path}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl UpdateError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            UpdateError::LayerNotFound { .. } => "LAYER_NOT_FOUND",
            UpdateError::FieldNotFound { .. } => "FIELD_NOT_FOUND",
            UpdateError::FieldExists { .. } => "FIELD_EXISTS",
            UpdateError::SchemaLocked { .. } => "SCHEMA_LOCKED",
            UpdateError::EmptyDataset { .. } => "EMPTY_DATASET",
            UpdateError::ProviderNotFound { .. } => "PROVIDER_NOT_FOUND",
            UpdateError::DuplicateIdentifier { .. } => "DUPLICATE_IDENTIFIER",
            UpdateError::FeatureNotFound { .. } => "FEATURE_NOT_FOUND",
            UpdateError::CalculationError { .. } => "CALCULATION_ERROR",
            UpdateError::FileReadError { .. } => "FILE_READ_ERROR",
            UpdateError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            UpdateError::Io(_) => "IO_ERROR",
            UpdateError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the operator can fix this error and re-run without touching
    /// the layers (as opposed to a backend/storage failure).
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            UpdateError::EmptyDataset { .. }
                | UpdateError::ProviderNotFound { .. }
                | UpdateError::DuplicateIdentifier { .. }
                | UpdateError::FieldNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = UpdateError::ProviderNotFound {
            provider: "Acme".to_string(),
            layer: "ubb".to_string(),
        };
        assert_eq!(err.error_code(), "PROVIDER_NOT_FOUND");
        assert!(err.is_precondition());
    }

    #[test]
    fn test_backend_errors_are_not_preconditions() {
        let err = UpdateError::SchemaLocked {
            layer: "archive".to_string(),
        };
        assert_eq!(err.error_code(), "SCHEMA_LOCKED");
        assert!(!err.is_precondition());
    }
}
