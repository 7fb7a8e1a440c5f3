//! Annotation record model.
//!
//! # Responsibility
//! - Define the record returned by annotation searches.
//! - Make identifier intent explicit in signatures via `ObjectId`.
//!
//! # Invariants
//! - `id` is storage-assigned; nothing in this crate generates record ids.
//! - `details` holds only columns actually present on the stored row;
//!   absent columns are absent from the map, never null-filled.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Ordered string map for caller-supplied detail fields and search criteria.
pub type FieldMap = BTreeMap<String, String>;

/// Identifier of an annotated instance.
///
/// Stored as text so numeric application ids and fixed conceptual labels
/// (classless annotations) share one column representation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether the identifier carries no usable value.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for ObjectId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// One persisted annotation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Surrogate key assigned by storage.
    pub id: i64,
    /// Logical object-class label.
    pub class: String,
    /// Identifier of the annotated instance, or a fixed conceptual constant.
    pub object_id: ObjectId,
    /// Write timestamp in epoch milliseconds. Present only on destinations
    /// configured with timestamps.
    pub note_time: Option<i64>,
    /// Detail columns present on the row.
    pub details: FieldMap,
}

impl AnnotationRecord {
    /// Returns one detail column value when present.
    pub fn detail(&self, column: &str) -> Option<&str> {
        self.details.get(column).map(String::as_str)
    }
}
