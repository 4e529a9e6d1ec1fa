use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("photo store is not initialized; run `scan-local` or `scan-remote` first")]
    StoreUninitialized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote request failed: {0}")]
    Http(Box<ureq::Error>),

    #[error("invalid response from remote library: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("source path does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("source path is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),

    #[error("no access token configured (set remote.access_token, PHOTO_ORGANIZER_TOKEN, or create {})", .0.display())]
    MissingCredentials(PathBuf),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(_, Some(message))
                if message.starts_with("no such table") =>
            {
                Error::StoreUninitialized
            }
            _ => Error::Database(err),
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Error::Http(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_missing_table_maps_to_uninitialized() {
        let conn = Connection::open_in_memory().unwrap();
        let err: Error = conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get::<_, i64>(0))
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::StoreUninitialized));
    }

    #[test]
    fn test_other_sqlite_errors_stay_database_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let err: Error = conn.execute("NOT VALID SQL", []).unwrap_err().into();
        assert!(matches!(err, Error::Database(_)));
    }
}
