//! Domain model for annotation records and table layouts.
//!
//! # Responsibility
//! - Define the record shape shared by the store and annotator layers.
//! - Own the column layout contract for annotation tables.
//!
//! # Invariants
//! - Column order is a persisted contract; see `columns::ColumnLayout`.

pub mod columns;
pub mod record;
