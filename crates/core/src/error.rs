//! Error types for the SalesPulse domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all SalesPulse operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Prompt rendering ---
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    // --- Dataset loading / access ---
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::ModelNotFound(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("No binding for placeholder '{name}' in template '{template}'")]
    UnboundPlaceholder { template: String, name: String },

    #[error("Unterminated placeholder at byte {offset} in template '{template}'")]
    UnterminatedPlaceholder { template: String, offset: usize },

    #[error("Empty placeholder at byte {offset} in template '{template}'")]
    EmptyPlaceholder { template: String, offset: usize },
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("CSV parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Required column '{0}' is missing")]
    MissingColumn(String),

    #[error("Column '{0}' is already defined (duplicate or reserved name)")]
    DuplicateColumn(String),

    #[error("Data frame operation failed: {0}")]
    Frame(String),

    #[error("Row {row}: '{value}' in column '{column}' is not an integer identifier")]
    InvalidIdentifier {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row}: '{value}' in column '{column}' is not a recognised date")]
    InvalidDate {
        row: usize,
        column: String,
        value: String,
    },
}
