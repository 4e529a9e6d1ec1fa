mod schema;
pub mod albums;
pub mod photos;
pub mod search;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OpenFlags, Params, ToSql};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use albums::{Album, AlbumSummary};
pub use photos::{AlbumPhoto, LocalPhoto, Photo, PhotoBase, RemotePhoto};
pub use schema::{REQUIRED_TABLES, SCHEMA};
pub use search::SearchHit;

/// Where a record came from. Both sources share one set of tables and are
/// told apart by the `source` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    Local,
    Remote,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Local => "local",
            Source::Remote => "remote",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "local" => Ok(Source::Local),
            "remote" => Ok(Source::Remote),
            other => Err(format!("unknown source '{}' (expected local or remote)", other)),
        }
    }
}

impl serde::Serialize for Source {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl ToSql for Source {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Source {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        text.parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Handle to the SQLite metadata store.
///
/// Constructed once and passed by reference to the scanner, the remote sync
/// and the reconciliation engine. In dry-run mode every write is logged
/// instead of executed.
pub struct Database {
    pub(crate) conn: Connection,
    dry_run: bool,
}

impl Database {
    pub fn open(path: &Path, dry_run: bool) -> Result<Self> {
        let conn = if dry_run {
            if path.exists() {
                Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?
            } else {
                Connection::open_in_memory()?
            }
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Connection::open(path)?
        };
        Self::from_connection(conn, dry_run)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, false)
    }

    fn from_connection(conn: Connection, dry_run: bool) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn, dry_run })
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn initialize(&self) -> Result<()> {
        if self.dry_run {
            info!("dry run: would create tables and indices");
            return Ok(());
        }
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Fail with [`Error::StoreUninitialized`] unless every table exists.
    pub fn ensure_initialized(&self) -> Result<()> {
        for table in REQUIRED_TABLES {
            let count: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                [table],
                |row| row.get(0),
            )?;
            if count == 0 {
                return Err(Error::StoreUninitialized);
            }
        }
        Ok(())
    }

    /// Drop every row of one source, ahead of a full refresh.
    pub fn clear_source(&self, source: Source) -> Result<()> {
        const CLEAR: [(&str, &str); 3] = [
            ("album_photos", "DELETE FROM album_photos WHERE source = ?"),
            ("photos", "DELETE FROM photos WHERE source = ?"),
            ("albums", "DELETE FROM albums WHERE source = ?"),
        ];
        for (table, sql) in CLEAR {
            self.write(format_args!("clear {} rows from {}", source, table), sql, [source])?;
        }
        Ok(())
    }

    /// Execute a modifying statement, or only log it in dry-run mode.
    fn write<P: Params>(&self, action: fmt::Arguments<'_>, sql: &str, params: P) -> Result<usize> {
        if self.dry_run {
            info!("dry run: would {}", action);
            return Ok(0);
        }
        debug!("{}", action);
        Ok(self.conn.execute(sql, params)?)
    }
}

/// Fresh in-memory store with the schema applied.
#[cfg(test)]
pub(crate) fn test_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    db
}
