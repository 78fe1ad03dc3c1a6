use thiserror::Error;

use crate::models::RecordId;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Generic I/O error (reading or writing the inventory file or a photo).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The inventory file could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No record with this id exists in the collection.
    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),

    /// A photo reference exists but the file behind it does not.
    #[error("Photo not found: {0}")]
    PhotoNotFound(String),

    /// A required field is missing or empty.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A photo reference that does not map to a file inside the photo directory.
    #[error("Invalid photo reference: {0}")]
    InvalidReference(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
