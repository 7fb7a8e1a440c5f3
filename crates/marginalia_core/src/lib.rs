//! Annotation (audit note) persistence for arbitrary application objects.
//!
//! Consumers resolve a destination through an [`AnnotationRegistry`], then
//! build an [`Annotator`] bound to a logical label and an identifier
//! strategy. The annotator records free-form annotation rows and searches
//! them back; SQL execution is delegated to `rusqlite`.

pub mod annotator;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod registry;
pub mod store;

pub use annotator::{derive_label, Annotator, AnnotatorError, AnnotatorResult, IdSource};
pub use config::{ConfigError, DestinationConfig, ResolvedDestination, DSN_ENV, TABLE_ENV};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::columns::{ColumnLayout, LayoutError, DEFAULT_DETAIL_COLUMNS};
pub use model::record::{AnnotationRecord, FieldMap, ObjectId};
pub use registry::{AnnotationRegistry, Destination, RegistryError};
pub use store::annotation_store::{AnnotationStore, StoreError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
