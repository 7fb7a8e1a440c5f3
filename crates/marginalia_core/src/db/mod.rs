//! SQLite destination bootstrap.
//!
//! # Responsibility
//! - Parse destination connection strings and open configured connections.
//! - Surface driver errors verbatim; this layer adds no retry or fallback.
//!
//! # Invariants
//! - Returned connections are in auto-commit mode; every write elsewhere in
//!   this crate is a single statement.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub use open::{open_destination, parse_dsn, Dsn};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidDsn(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidDsn(value) => write!(f, "unusable destination dsn: `{value}`"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidDsn(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
