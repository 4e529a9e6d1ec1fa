//! Photo records for both sources.

use rusqlite::Row;
use serde::Serialize;

use super::{Database, Source};
use crate::error::Result;
use crate::normalize::normalize;

/// Fields every photo carries, whatever its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoBase {
    pub id: String,
    pub filename: String,
    pub normalized_filename: String,
    pub creation_time: String,
    pub mime_type: String,
    /// 0 when unknown.
    pub width: u32,
    /// 0 when unknown.
    pub height: u32,
    pub path: String,
}

impl PhotoBase {
    /// Base record with the normalized key derived from `filename`.
    pub fn new(id: impl Into<String>, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            id: id.into(),
            normalized_filename: normalize(&filename),
            filename,
            creation_time: String::new(),
            mime_type: String::new(),
            width: 0,
            height: 0,
            path: String::new(),
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// A file found under the local scan root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalPhoto {
    #[serde(flatten)]
    pub base: PhotoBase,
    pub size: u64,
}

/// A media item of the remote library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemotePhoto {
    #[serde(flatten)]
    pub base: PhotoBase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Photo {
    Local(LocalPhoto),
    Remote(RemotePhoto),
}

impl Photo {
    pub fn source(&self) -> Source {
        match self {
            Photo::Local(_) => Source::Local,
            Photo::Remote(_) => Source::Remote,
        }
    }

    pub fn base(&self) -> &PhotoBase {
        match self {
            Photo::Local(p) => &p.base,
            Photo::Remote(p) => &p.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn filename(&self) -> &str {
        &self.base().filename
    }

    pub fn dimensions(&self) -> (u32, u32) {
        let base = self.base();
        (base.width, base.height)
    }

    /// File size in bytes; remote items have none.
    pub fn size(&self) -> Option<u64> {
        match self {
            Photo::Local(p) => Some(p.size),
            Photo::Remote(_) => None,
        }
    }
}

/// A photo listed under one of its albums.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumPhoto {
    pub album_title: String,
    pub photo: Photo,
}

pub(super) const PHOTO_COLUMNS: &str =
    "p.source, p.id, p.filename, p.normalized_filename, p.creation_time, p.mime_type, p.width, p.height, p.path, p.size";

pub(super) fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<Photo> {
    let source: Source = row.get(0)?;
    let base = PhotoBase {
        id: row.get(1)?,
        filename: row.get(2)?,
        normalized_filename: row.get(3)?,
        creation_time: row.get(4)?,
        mime_type: row.get(5)?,
        width: row.get(6)?,
        height: row.get(7)?,
        path: row.get(8)?,
    };
    let photo = match source {
        Source::Local => {
            let size: Option<i64> = row.get(9)?;
            Photo::Local(LocalPhoto {
                base,
                size: size.unwrap_or(0).max(0) as u64,
            })
        }
        Source::Remote => Photo::Remote(RemotePhoto { base }),
    };
    Ok(photo)
}

impl Database {
    /// Insert the photo or overwrite every field of the existing row.
    pub fn upsert_photo(&self, photo: &Photo) -> Result<()> {
        let source = photo.source();
        let base = photo.base();
        let size = photo.size().map(|s| s as i64);
        self.write(
            format_args!("upsert {} photo {}", source, base.id),
            r#"
            INSERT INTO photos (
                source, id, filename, normalized_filename, creation_time,
                mime_type, width, height, path, size
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT (source, id) DO UPDATE SET
                filename = excluded.filename,
                normalized_filename = excluded.normalized_filename,
                creation_time = excluded.creation_time,
                mime_type = excluded.mime_type,
                width = excluded.width,
                height = excluded.height,
                path = excluded.path,
                size = excluded.size
            "#,
            rusqlite::params![
                source,
                base.id,
                base.filename,
                base.normalized_filename,
                base.creation_time,
                base.mime_type,
                base.width,
                base.height,
                base.path,
                size,
            ],
        )?;
        Ok(())
    }

    pub fn photo_exists(&self, source: Source, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM photos WHERE source = ?1 AND id = ?2",
            rusqlite::params![source, id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn count_photos(&self, source: Source) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM photos WHERE source = ?",
            [source],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Members of an album, ordered by filename.
    pub fn photos_in_album(&self, source: Source, album_id: &str) -> Result<Vec<Photo>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM photos p
            JOIN album_photos ap ON ap.source = p.source AND ap.photo_id = p.id
            WHERE p.source = ?1 AND ap.album_id = ?2
            ORDER BY p.filename, p.id
            "#,
            PHOTO_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let photos = stmt
            .query_map(rusqlite::params![source, album_id], photo_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }

    /// Every photo of the source whose stored normalized filename equals `name`.
    pub fn find_photos_by_normalized_name(&self, source: Source, name: &str) -> Result<Vec<Photo>> {
        let sql = format!(
            "SELECT {} FROM photos p WHERE p.source = ?1 AND p.normalized_filename = ?2 ORDER BY p.id",
            PHOTO_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let photos = stmt
            .query_map(rusqlite::params![source, name], photo_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }

    /// Like [`Database::find_photos_by_normalized_name`], restricted to the
    /// members of one album.
    pub fn find_album_photos_by_normalized_name(
        &self,
        source: Source,
        album_id: &str,
        name: &str,
    ) -> Result<Vec<Photo>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM photos p
            JOIN album_photos ap ON ap.source = p.source AND ap.photo_id = p.id
            WHERE p.source = ?1 AND ap.album_id = ?2 AND p.normalized_filename = ?3
            ORDER BY p.id
            "#,
            PHOTO_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let photos = stmt
            .query_map(rusqlite::params![source, album_id, name], photo_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }

    /// Every album member of the source, optionally restricted to albums
    /// whose title matches a SQLite GLOB pattern (`*`, `?`, `[...]`).
    pub fn list_photos(&self, source: Source, album_glob: Option<&str>) -> Result<Vec<AlbumPhoto>> {
        let sql = format!(
            r#"
            SELECT {}, a.title
            FROM photos p
            JOIN album_photos ap ON ap.source = p.source AND ap.photo_id = p.id
            JOIN albums a ON a.source = ap.source AND a.id = ap.album_id
            WHERE p.source = ?1 AND (?2 IS NULL OR a.title GLOB ?2)
            ORDER BY a.title, p.filename, p.id
            "#,
            PHOTO_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let photos = stmt
            .query_map(rusqlite::params![source, album_glob], |row| {
                Ok(AlbumPhoto {
                    photo: photo_from_row(row)?,
                    album_title: row.get(10)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }
}
