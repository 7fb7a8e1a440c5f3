//! Annotation storage proxy over one bound SQLite destination.
//!
//! # Responsibility
//! - Own the single connection for one (dsn, table) destination.
//! - Issue the insert and search statements for annotation rows.
//!
//! # Invariants
//! - `insert` writes exactly one row with one auto-committed statement.
//! - Detail fields and search criteria are filtered to the bound column
//!   layout; unknown keys never reach SQL.
//! - The bound table exists before the store is handed to callers. A
//!   pre-existing table with a divergent shape is not detected here; it
//!   surfaces as a driver error at statement time.

use crate::db::{open_destination, DbError};
use crate::model::columns::ColumnLayout;
use crate::model::record::{AnnotationRecord, FieldMap, ObjectId};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// A previous holder of the connection lock panicked mid-statement.
    ConnectionPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ConnectionPoisoned => write!(f, "destination connection lock is poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::ConnectionPoisoned => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage proxy for one destination.
///
/// Shared via `Arc` by every annotator bound to the destination; all calls
/// serialize on the one owned connection.
pub struct AnnotationStore {
    name: String,
    table: String,
    layout: ColumnLayout,
    conn: Mutex<Connection>,
}

impl AnnotationStore {
    /// Opens the destination and ensures the bound table exists.
    pub(crate) fn open(
        name: String,
        dsn: &str,
        table: String,
        layout: ColumnLayout,
    ) -> StoreResult<Self> {
        let conn = open_destination(dsn)?;
        let store = Self {
            name,
            table,
            layout,
            conn: Mutex::new(conn),
        };
        store.ensure_table()?;
        Ok(store)
    }

    /// Process-unique generated store name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Creates the bound table when missing. Idempotent.
    pub fn ensure_table(&self) -> StoreResult<()> {
        let sql = self.layout.schema_sql(&self.table);
        self.lock()?.execute_batch(&sql)?;
        Ok(())
    }

    /// Inserts one annotation row and returns the storage-assigned id.
    ///
    /// Detail keys outside the bound layout are dropped silently. When the
    /// layout is timestamped, `note_time` is populated database-side with
    /// the current epoch-millisecond time.
    pub fn insert(
        &self,
        class: &str,
        object_id: &ObjectId,
        details: &FieldMap,
    ) -> StoreResult<i64> {
        let mut columns = vec!["class", "object_id"];
        let mut values = vec!["?".to_string(), "?".to_string()];
        let mut binds: Vec<Value> = vec![
            Value::Text(class.to_string()),
            Value::Text(object_id.as_str().to_string()),
        ];

        if self.layout.timestamps() {
            columns.push("note_time");
            values.push("(strftime('%s', 'now') * 1000)".to_string());
        }

        for column in self.layout.detail_columns() {
            if let Some(value) = details.get(column) {
                columns.push(column.as_str());
                values.push("?".to_string());
                binds.push(Value::Text(value.clone()));
            }
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({});",
            self.table,
            columns.join(", "),
            values.join(", ")
        );

        let conn = self.lock()?;
        conn.execute(&sql, params_from_iter(binds))?;
        let id = conn.last_insert_rowid();
        debug!(
            "event=annotation_insert module=store status=ok store={} table={} row_id={id}",
            self.name, self.table
        );
        Ok(id)
    }

    /// Searches annotation rows by column equality.
    ///
    /// Criteria keys outside the bound layout are dropped silently. No
    /// ordering is imposed on the result.
    pub fn search(&self, criteria: &FieldMap) -> StoreResult<Vec<AnnotationRecord>> {
        let mut sql = format!("{} FROM {}", self.select_clause(), self.table);
        let mut binds: Vec<Value> = Vec::new();

        for (column, value) in criteria {
            if !self.layout.is_search_column(column) {
                continue;
            }
            sql.push_str(if binds.is_empty() { " WHERE " } else { " AND " });
            sql.push_str(column);
            sql.push_str(" = ?");
            binds.push(Value::Text(value.clone()));
        }
        sql.push(';');

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(self.parse_row(row)?);
        }
        Ok(records)
    }

    fn select_clause(&self) -> String {
        let mut columns = vec!["id", "class", "object_id"];
        if self.layout.timestamps() {
            columns.push("note_time");
        }
        for column in self.layout.detail_columns() {
            columns.push(column.as_str());
        }
        format!("SELECT {}", columns.join(", "))
    }

    fn parse_row(&self, row: &Row<'_>) -> StoreResult<AnnotationRecord> {
        let note_time = if self.layout.timestamps() {
            row.get::<_, Option<i64>>("note_time")?
        } else {
            None
        };

        let mut details = FieldMap::new();
        for column in self.layout.detail_columns() {
            if let Some(value) = row.get::<_, Option<String>>(column.as_str())? {
                details.insert(column.clone(), value);
            }
        }

        let object_id: String = row.get("object_id")?;
        Ok(AnnotationRecord {
            id: row.get("id")?,
            class: row.get("class")?,
            object_id: ObjectId::new(object_id),
            note_time,
            details,
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::ConnectionPoisoned)
    }
}
