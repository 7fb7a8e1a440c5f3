//! Connection bootstrap for annotation destinations.
//!
//! # Responsibility
//! - Parse dsn strings into a connection mode.
//! - Open the connection and apply connection-level settings.
//!
//! # Side effects
//! - Emits `db_open` logging events with duration and status.

use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Parsed destination connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dsn {
    /// Private in-memory database; each open call yields a fresh one.
    Memory,
    /// File-backed database.
    File(PathBuf),
}

/// Parses a destination connection string.
///
/// Accepted forms: `:memory:`, `sqlite::memory:`, `sqlite:<path>`, or a
/// bare filesystem path.
pub fn parse_dsn(dsn: &str) -> DbResult<Dsn> {
    let trimmed = dsn.trim();
    if trimmed.is_empty() {
        return Err(DbError::InvalidDsn(dsn.to_string()));
    }

    let target = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    if target == ":memory:" {
        return Ok(Dsn::Memory);
    }
    if target.is_empty() {
        return Err(DbError::InvalidDsn(dsn.to_string()));
    }

    Ok(Dsn::File(PathBuf::from(target)))
}

/// Opens a destination connection in auto-commit mode.
pub fn open_destination(dsn: &str) -> DbResult<Connection> {
    let started_at = Instant::now();
    let parsed = parse_dsn(dsn)?;
    let mode = match parsed {
        Dsn::Memory => "memory",
        Dsn::File(_) => "file",
    };
    info!("event=db_open module=db status=start mode={mode}");

    let opened = match &parsed {
        Dsn::Memory => Connection::open_in_memory(),
        Dsn::File(path) => Connection::open(path),
    };
    let conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(err.into());
        }
    };

    conn.busy_timeout(BUSY_TIMEOUT)?;
    info!(
        "event=db_open module=db status=ok mode={mode} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::{open_destination, parse_dsn, Dsn};
    use crate::db::DbError;
    use std::path::PathBuf;

    #[test]
    fn parses_memory_forms() {
        assert_eq!(parse_dsn(":memory:").unwrap(), Dsn::Memory);
        assert_eq!(parse_dsn("sqlite::memory:").unwrap(), Dsn::Memory);
    }

    #[test]
    fn parses_file_forms() {
        assert_eq!(
            parse_dsn("sqlite:/var/data/notes.db").unwrap(),
            Dsn::File(PathBuf::from("/var/data/notes.db"))
        );
        assert_eq!(
            parse_dsn("notes.db").unwrap(),
            Dsn::File(PathBuf::from("notes.db"))
        );
    }

    #[test]
    fn rejects_blank_dsn() {
        assert!(matches!(parse_dsn(""), Err(DbError::InvalidDsn(_))));
        assert!(matches!(parse_dsn("   "), Err(DbError::InvalidDsn(_))));
        assert!(matches!(parse_dsn("sqlite:"), Err(DbError::InvalidDsn(_))));
    }

    #[test]
    fn opens_in_memory_destination() {
        let conn = open_destination(":memory:").unwrap();
        let one: i64 = conn.query_row("SELECT 1;", [], |row| row.get(0)).unwrap();
        assert_eq!(one, 1);
    }
}
