use serde::Serialize;

use super::photos::{photo_from_row, PHOTO_COLUMNS};
use super::{Database, Photo, Source};
use crate::error::Result;
use crate::normalize::normalize;

/// One photo matched by [`Database::search`].
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub source: Source,
    pub photo: Photo,
    /// Titles of every album holding the photo, sorted and joined by ` | `.
    pub albums: String,
}

impl Database {
    /// Substring search over both sources. A photo matches when its raw
    /// filename contains `pattern` or its normalized filename contains the
    /// normalized pattern. A pattern that normalizes to nothing only
    /// matches raw filenames. SQL `LIKE` wildcards in `pattern` are honoured.
    pub fn search(&self, pattern: &str) -> Result<Vec<SearchHit>> {
        let raw = format!("%{}%", pattern);
        let key = normalize(pattern);
        let normalized = (!key.is_empty()).then(|| format!("%{}%", key));

        let sql = format!(
            r#"
            SELECT {}
            FROM photos p
            WHERE p.filename LIKE ?1 OR (?2 IS NOT NULL AND p.normalized_filename LIKE ?2)
            ORDER BY p.source, p.filename, p.id
            "#,
            PHOTO_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let photos = stmt
            .query_map(rusqlite::params![raw, normalized], photo_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut hits = Vec::with_capacity(photos.len());
        for photo in photos {
            let source = photo.source();
            let albums = self.album_titles_for_photo(source, photo.id())?.join(" | ");
            hits.push(SearchHit { source, photo, albums });
        }
        Ok(hits)
    }
}
