//! Destination configuration and environment fallback.
//!
//! # Responsibility
//! - Describe where annotations are stored and how the table is shaped.
//! - Resolve omitted dsn/table values from process environment defaults.
//!
//! # Invariants
//! - Blank values count as missing, both inline and from the environment.
//! - Resolution is read-only; nothing here touches the database.

use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Environment variable supplying the default connection string.
pub const DSN_ENV: &str = "MARGINALIA_DSN";
/// Environment variable supplying the default table name.
pub const TABLE_ENV: &str = "MARGINALIA_TABLE";

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Destination resolution error. Fatal to the setup call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingDsn,
    MissingTable,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDsn => write!(
                f,
                "destination dsn missing: set `dsn` or the {DSN_ENV} environment variable"
            ),
            Self::MissingTable => write!(
                f,
                "destination table missing: set `table` or the {TABLE_ENV} environment variable"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Per-destination configuration supplied at setup time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// Connection string; falls back to `MARGINALIA_DSN` when omitted.
    pub dsn: Option<String>,
    /// Annotation table name; falls back to `MARGINALIA_TABLE` when omitted.
    pub table: Option<String>,
    /// Credentials for dsn kinds whose driver takes them. The SQLite driver
    /// has none; non-empty values are ignored with a warning at store build.
    pub db_user: Option<String>,
    pub db_pass: Option<String>,
    /// Identity-source name for backends that require explicit sequence
    /// naming. Inert on SQLite, where rowid is the identity source.
    pub sequence: Option<String>,
    /// Override detail column set. Replaces the default set entirely.
    pub columns: Option<Vec<String>>,
    /// Whether the table carries `note_time`, auto-populated at write time.
    pub timestamps: bool,
}

impl DestinationConfig {
    pub fn new(dsn: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            dsn: Some(dsn.into()),
            table: Some(table.into()),
            ..Self::default()
        }
    }

    /// Resolves dsn and table, falling back to the process environment.
    pub fn resolve(&self) -> ConfigResult<ResolvedDestination> {
        self.resolve_with(|name| env::var(name).ok())
    }

    /// Resolution with an injectable variable lookup.
    ///
    /// The lookup stands in for the process environment; tests use it to
    /// exercise fallback without mutating global state.
    pub fn resolve_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<ResolvedDestination> {
        let dsn = non_blank(self.dsn.clone())
            .or_else(|| non_blank(lookup(DSN_ENV)))
            .ok_or(ConfigError::MissingDsn)?;
        let table = non_blank(self.table.clone())
            .or_else(|| non_blank(lookup(TABLE_ENV)))
            .ok_or(ConfigError::MissingTable)?;

        Ok(ResolvedDestination { dsn, table })
    }
}

/// The (dsn, table) pair after fallback resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDestination {
    pub dsn: String,
    pub table: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
