//! Column layout for annotation tables.
//!
//! # Responsibility
//! - Define which columns an annotation table carries, in which order.
//! - Validate caller-supplied column and table identifiers before they are
//!   interpolated into SQL text.
//! - Generate the idempotent schema statement for a bound table.
//!
//! # Invariants
//! - Column order is a persisted contract: `id` primary key, `class`,
//!   `object_id`, `note_time` (timestamped layouts only), then detail
//!   columns in configured order.
//! - An override detail list replaces the default set; the two are never
//!   merged.
//! - Every column name passes `is_sql_identifier` before layout
//!   construction succeeds.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default free-form detail columns, in persisted order.
pub const DEFAULT_DETAIL_COLUMNS: [&str; 7] = [
    "event",
    "attr",
    "old_val",
    "new_val",
    "via",
    "comment",
    "expire_time",
];

/// Columns owned by the library; never usable as detail columns.
const RESERVED_COLUMNS: [&str; 4] = ["id", "class", "object_id", "note_time"];

static SQL_IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Returns whether `value` is usable as an unquoted SQL identifier.
pub fn is_sql_identifier(value: &str) -> bool {
    SQL_IDENT_RE.is_match(value)
}

pub type LayoutResult<T> = Result<T, LayoutError>;

/// Column layout validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    InvalidColumnName(String),
    ReservedColumnName(String),
    DuplicateColumnName(String),
    EmptyColumnList,
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidColumnName(name) => write!(f, "invalid column name: `{name}`"),
            Self::ReservedColumnName(name) => write!(f, "column name is reserved: `{name}`"),
            Self::DuplicateColumnName(name) => write!(f, "duplicate column name: `{name}`"),
            Self::EmptyColumnList => write!(f, "column override list cannot be empty"),
        }
    }
}

impl Error for LayoutError {}

/// Full column set for one annotation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    timestamps: bool,
    details: Vec<String>,
}

impl ColumnLayout {
    /// Builds a layout carrying the default detail columns.
    pub fn standard(timestamps: bool) -> Self {
        Self {
            timestamps,
            details: DEFAULT_DETAIL_COLUMNS
                .iter()
                .map(|column| (*column).to_string())
                .collect(),
        }
    }

    /// Builds a layout carrying a caller-supplied detail column set.
    ///
    /// The override replaces the default set entirely.
    pub fn with_details(timestamps: bool, details: &[String]) -> LayoutResult<Self> {
        if details.is_empty() {
            return Err(LayoutError::EmptyColumnList);
        }

        let mut seen = BTreeSet::new();
        for column in details {
            if !is_sql_identifier(column) {
                return Err(LayoutError::InvalidColumnName(column.clone()));
            }
            if RESERVED_COLUMNS.contains(&column.as_str()) {
                return Err(LayoutError::ReservedColumnName(column.clone()));
            }
            if !seen.insert(column.as_str()) {
                return Err(LayoutError::DuplicateColumnName(column.clone()));
            }
        }

        Ok(Self {
            timestamps,
            details: details.to_vec(),
        })
    }

    /// Whether the table carries an auto-populated `note_time` column.
    pub fn timestamps(&self) -> bool {
        self.timestamps
    }

    /// Detail columns in persisted order.
    pub fn detail_columns(&self) -> &[String] {
        &self.details
    }

    pub fn is_detail_column(&self, name: &str) -> bool {
        self.details.iter().any(|column| column == name)
    }

    /// Returns whether `name` is a column search criteria may constrain.
    pub fn is_search_column(&self, name: &str) -> bool {
        name == "class"
            || name == "object_id"
            || (self.timestamps && name == "note_time")
            || self.is_detail_column(name)
    }

    /// Generated idempotent schema statement for `table`.
    ///
    /// `table` must already be validated with `is_sql_identifier`.
    pub fn schema_sql(&self, table: &str) -> String {
        let mut columns = vec![
            "id INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            "class TEXT NOT NULL".to_string(),
            "object_id TEXT NOT NULL".to_string(),
        ];
        if self.timestamps {
            columns.push("note_time INTEGER NOT NULL".to_string());
        }
        for column in &self.details {
            columns.push(format!("{column} TEXT"));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {table} (\n    {}\n);",
            columns.join(",\n    ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{is_sql_identifier, ColumnLayout, LayoutError, DEFAULT_DETAIL_COLUMNS};

    fn owned(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|column| (*column).to_string()).collect()
    }

    #[test]
    fn standard_layout_uses_default_detail_columns() {
        let layout = ColumnLayout::standard(false);
        assert_eq!(layout.detail_columns(), owned(&DEFAULT_DETAIL_COLUMNS));
        assert!(!layout.timestamps());
    }

    #[test]
    fn override_replaces_default_set() {
        let layout = ColumnLayout::with_details(false, &owned(&["stage", "remark"])).unwrap();
        assert_eq!(layout.detail_columns(), owned(&["stage", "remark"]));
        assert!(!layout.is_detail_column("event"));
    }

    #[test]
    fn rejects_invalid_reserved_and_duplicate_names() {
        let invalid = ColumnLayout::with_details(false, &owned(&["drop table"]));
        assert!(matches!(invalid, Err(LayoutError::InvalidColumnName(_))));

        let reserved = ColumnLayout::with_details(false, &owned(&["object_id"]));
        assert!(matches!(reserved, Err(LayoutError::ReservedColumnName(_))));

        let duplicate = ColumnLayout::with_details(false, &owned(&["stage", "stage"]));
        assert!(matches!(duplicate, Err(LayoutError::DuplicateColumnName(_))));

        let empty = ColumnLayout::with_details(false, &[]);
        assert!(matches!(empty, Err(LayoutError::EmptyColumnList)));
    }

    #[test]
    fn search_columns_include_note_time_only_when_timestamped() {
        let plain = ColumnLayout::standard(false);
        assert!(!plain.is_search_column("note_time"));
        assert!(plain.is_search_column("class"));
        assert!(plain.is_search_column("event"));
        assert!(!plain.is_search_column("id"));

        let stamped = ColumnLayout::standard(true);
        assert!(stamped.is_search_column("note_time"));
    }

    #[test]
    fn schema_sql_preserves_column_order() {
        let sql = ColumnLayout::standard(true).schema_sql("annotations");
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS annotations"));
        let id_at = sql.find("id INTEGER PRIMARY KEY").unwrap();
        let class_at = sql.find("class TEXT").unwrap();
        let object_id_at = sql.find("object_id TEXT").unwrap();
        let note_time_at = sql.find("note_time INTEGER").unwrap();
        let event_at = sql.find("event TEXT").unwrap();
        assert!(id_at < class_at && class_at < object_id_at);
        assert!(object_id_at < note_time_at && note_time_at < event_at);
    }

    #[test]
    fn identifier_validation_rejects_sql_fragments() {
        assert!(is_sql_identifier("audit_notes"));
        assert!(is_sql_identifier("_private"));
        assert!(!is_sql_identifier("audit-notes"));
        assert!(!is_sql_identifier("notes;--"));
        assert!(!is_sql_identifier("1notes"));
        assert!(!is_sql_identifier(""));
    }
}
