//! Error types for stock_reconcile

use thiserror::Error;

/// Unified error type for store and file adapter operations.
///
/// The matching engine itself never fails; only the boundaries do.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Failed to read or deserialize a CSV import file
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to serialize a report
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Caller input that cannot be acted on
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Legacy alias for backwards compatibility
pub type Error = ReconcileError;

/// Result alias for stock_reconcile operations
pub type Result<T> = std::result::Result<T, ReconcileError>;
