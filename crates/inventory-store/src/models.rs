//! Domain model structs persisted in the inventory file.
//!
//! Records serialize with camelCase keys so the file reads
//! `{id, name, description, photoReference}`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// Opaque identifier of an inventory record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Draw a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// PhotoRef
// ---------------------------------------------------------------------------

/// Opaque token pointing at a stored photo.
///
/// Only [`crate::PhotoStore`] knows how to turn one into a path; everyone
/// else just stores it and hands it back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
    pub(crate) fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub(crate) fn token(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// InventoryRecord
// ---------------------------------------------------------------------------

/// One inventory entry (a registered device).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    /// Unique, immutable identifier assigned at creation.
    pub id: RecordId,
    /// Device name, never empty.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Reference to the attached photo, if any.
    #[serde(default)]
    pub photo_reference: Option<PhotoRef>,
}

impl InventoryRecord {
    pub fn has_photo(&self) -> bool {
        self.photo_reference.is_some()
    }
}

// ---------------------------------------------------------------------------
// PhotoUpload
// ---------------------------------------------------------------------------

/// A decoded multipart file part, as handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// Name of the form field the file arrived in.
    pub field_name: String,
    /// Filename supplied by the client.
    pub file_name: Option<String>,
    /// Raw file contents.
    pub data: Bytes,
}

impl PhotoUpload {
    pub fn new(field_name: impl Into<String>, file_name: Option<String>, data: Bytes) -> Self {
        Self {
            field_name: field_name.into(),
            file_name,
            data,
        }
    }
}
