//! Album records and membership edges.

use rusqlite::{OptionalExtension, Row};
use serde::Serialize;

use super::{Database, Source};
use crate::error::Result;

/// An album: a directory of the local tree or an album of the remote library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub creation_time: String,
    /// Directory path for local albums, empty for remote ones.
    pub path: String,
}

impl Album {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            creation_time: String::new(),
            path: String::new(),
        }
    }
}

/// An album together with its member count.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumSummary {
    pub album: Album,
    pub photo_count: i64,
}

const ALBUM_COLUMNS: &str = "id, title, creation_time, path";

fn album_from_row(row: &Row<'_>) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        title: row.get(1)?,
        creation_time: row.get(2)?,
        path: row.get(3)?,
    })
}

impl Database {
    /// Insert the album or overwrite every field of the existing row.
    /// Membership edges of an existing album are left untouched.
    pub fn upsert_album(&self, source: Source, album: &Album) -> Result<()> {
        self.write(
            format_args!("upsert {} album {}", source, album.id),
            r#"
            INSERT INTO albums (source, id, title, creation_time, path)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (source, id) DO UPDATE SET
                title = excluded.title,
                creation_time = excluded.creation_time,
                path = excluded.path
            "#,
            rusqlite::params![source, album.id, album.title, album.creation_time, album.path],
        )?;
        Ok(())
    }

    /// Record that `photo_id` belongs to `album_id`. Both must already exist
    /// in the same source.
    pub fn upsert_membership(&self, source: Source, album_id: &str, photo_id: &str) -> Result<()> {
        self.write(
            format_args!("add {} photo {} to album {}", source, photo_id, album_id),
            "INSERT OR IGNORE INTO album_photos (source, album_id, photo_id) VALUES (?1, ?2, ?3)",
            rusqlite::params![source, album_id, photo_id],
        )?;
        Ok(())
    }

    /// Exact, case-sensitive title lookup. When several albums share the
    /// title, the one stored first is returned.
    pub fn find_album_by_title(&self, source: Source, title: &str) -> Result<Option<Album>> {
        let sql = format!(
            "SELECT {} FROM albums WHERE source = ?1 AND title = ?2 ORDER BY rowid LIMIT 1",
            ALBUM_COLUMNS
        );
        let album = self
            .conn
            .query_row(&sql, rusqlite::params![source, title], album_from_row)
            .optional()?;
        Ok(album)
    }

    pub fn list_albums(&self, source: Source) -> Result<Vec<AlbumSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT a.id, a.title, a.creation_time, a.path,
                   (SELECT COUNT(*) FROM album_photos ap
                    WHERE ap.source = a.source AND ap.album_id = a.id) AS photo_count
            FROM albums a
            WHERE a.source = ?
            ORDER BY a.title, a.id
            "#,
        )?;
        let albums = stmt
            .query_map([source], |row| {
                Ok(AlbumSummary {
                    album: album_from_row(row)?,
                    photo_count: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(albums)
    }

    pub fn count_album_photos(&self, source: Source, album_id: &str) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM album_photos WHERE source = ?1 AND album_id = ?2",
            rusqlite::params![source, album_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Titles carried by more than one album, with how many albums carry them.
    pub fn duplicate_album_titles(&self, source: Source) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT title, COUNT(*) FROM albums
            WHERE source = ?
            GROUP BY title
            HAVING COUNT(*) > 1
            ORDER BY title
            "#,
        )?;
        let titles = stmt
            .query_map([source], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(titles)
    }

    /// Titles of every album the photo belongs to, alphabetically.
    pub fn album_titles_for_photo(&self, source: Source, photo_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT a.title
            FROM album_photos ap
            JOIN albums a ON a.source = ap.source AND a.id = ap.album_id
            WHERE ap.source = ?1 AND ap.photo_id = ?2
            ORDER BY a.title
            "#,
        )?;
        let titles = stmt
            .query_map(rusqlite::params![source, photo_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(titles)
    }
}
