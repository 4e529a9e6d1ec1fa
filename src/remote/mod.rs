pub mod api;
pub mod auth;
pub mod client;

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::config::RemoteConfig;
use crate::db::{Album, Database, Photo, PhotoBase, RemotePhoto, Source};
use crate::error::{Error, Result};
use crate::scanner::metadata::TIMESTAMP_FORMAT;

pub use api::{LibraryAlbum, LibraryApi, MediaItem, MediaMetadata, Page};
pub use auth::load_access_token;
pub use client::GooglePhotosClient;

pub const UNTITLED_ALBUM: &str = "Untitled Album";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub photos: usize,
    pub albums: usize,
    pub memberships: usize,
    /// Album members that were not stored as photos, e.g. beyond the
    /// `max_photos` cap.
    pub skipped_memberships: usize,
}

/// Pulls the remote library into the store through a [`LibraryApi`].
pub struct RemoteSync<A: LibraryApi> {
    api: A,
    page_size: u32,
    album_page_size: u32,
}

impl<A: LibraryApi> RemoteSync<A> {
    pub fn new(api: A, config: &RemoteConfig) -> Self {
        Self {
            api,
            page_size: config.page_size.max(1),
            album_page_size: config.album_page_size.max(1),
        }
    }

    pub fn fetch_all_photos(&self, page_size: u32) -> Result<Vec<Photo>> {
        self.fetch_photos(page_size, None)
    }

    fn fetch_photos(&self, page_size: u32, limit: Option<usize>) -> Result<Vec<Photo>> {
        let items = drain_pages("media items", limit, |token| {
            self.api.list_media_items(page_size, token)
        })?;
        Ok(items.into_iter().filter_map(photo_from_item).collect())
    }

    pub fn fetch_all_albums(&self) -> Result<Vec<Album>> {
        let albums = drain_pages("albums", None, |token| {
            self.api.list_albums(self.album_page_size, token)
        })?;
        Ok(albums.into_iter().filter_map(album_from_library).collect())
    }

    /// Ids of the media items in one remote album.
    pub fn fetch_album_members(&self, album_id: &str) -> Result<Vec<String>> {
        let items = drain_pages("album items", None, |token| {
            self.api.search_album_items(album_id, self.page_size, token)
        })?;
        Ok(items.into_iter().filter_map(|item| item.id).collect())
    }

    /// Replace the remote source in `db` with the library contents: photos,
    /// then albums, then album membership.
    ///
    /// The whole library is fetched before the store is touched, so a failed
    /// fetch leaves the previous remote snapshot in place.
    pub fn sync_into(&self, db: &Database, max_photos: Option<usize>) -> Result<SyncResult> {
        info!("Syncing remote library from {}", self.api.provider_name());

        let photos = self.fetch_photos(self.page_size, max_photos)?;
        let albums = self.fetch_all_albums()?;
        let mut members = Vec::with_capacity(albums.len());
        for album in &albums {
            members.push(self.fetch_album_members(&album.id)?);
        }

        db.clear_source(Source::Remote)?;

        let mut result = SyncResult::default();
        let mut stored = HashSet::with_capacity(photos.len());
        for photo in &photos {
            db.upsert_photo(photo)?;
            stored.insert(photo.id().to_string());
        }
        result.photos = photos.len();
        info!("Stored {} remote photos", result.photos);

        for (album, album_members) in albums.iter().zip(members) {
            db.upsert_album(Source::Remote, album)?;

            for member in album_members {
                if stored.contains(&member) {
                    db.upsert_membership(Source::Remote, &album.id, &member)?;
                    result.memberships += 1;
                } else {
                    result.skipped_memberships += 1;
                }
            }
        }
        result.albums = albums.len();

        if result.skipped_memberships > 0 {
            warn!(
                "Skipped {} album memberships for photos that were not stored",
                result.skipped_memberships
            );
        }
        info!(
            "Stored {} remote albums with {} memberships",
            result.albums, result.memberships
        );
        Ok(result)
    }
}

/// Follow next-page tokens until the listing ends or `limit` items are in.
fn drain_pages<T, F>(what: &str, limit: Option<usize>, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<&str>) -> Result<Page<T>>,
{
    let mut items = Vec::new();
    let mut seen_tokens = HashSet::new();
    let mut token: Option<String> = None;

    loop {
        let page = fetch(token.as_deref())?;
        items.extend(page.items);

        if let Some(limit) = limit {
            if items.len() >= limit {
                items.truncate(limit);
                info!("Reached limit of {} {}", limit, what);
                break;
            }
        }

        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(next) => {
                if !seen_tokens.insert(next.clone()) {
                    return Err(Error::InvalidResponse(format!(
                        "repeated page token '{}' while listing {}",
                        next, what
                    )));
                }
                token = Some(next);
            }
            None => break,
        }
    }

    Ok(items)
}

fn parse_dimension(value: Option<&str>) -> u32 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// RFC 3339 creation times are stored in the same layout as local ones.
fn normalize_creation_time(value: &str) -> String {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc).format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn photo_from_item(item: MediaItem) -> Option<Photo> {
    let (id, filename) = match (item.id, item.filename) {
        (Some(id), Some(filename)) if !id.is_empty() && !filename.is_empty() => (id, filename),
        (id, _) => {
            warn!("Skipping malformed media item {:?}: missing id or filename", id);
            return None;
        }
    };

    let meta = item.media_metadata.unwrap_or_default();
    let mut base = PhotoBase::new(id.clone(), filename).with_dimensions(
        parse_dimension(meta.width.as_deref()),
        parse_dimension(meta.height.as_deref()),
    );
    base.creation_time = meta
        .creation_time
        .as_deref()
        .map(normalize_creation_time)
        .unwrap_or_default();
    base.mime_type = item.mime_type.unwrap_or_default();
    base.path = item.product_url.unwrap_or(id);

    Some(Photo::Remote(RemotePhoto { base }))
}

fn album_from_library(album: LibraryAlbum) -> Option<Album> {
    let id = match album.id {
        Some(id) if !id.is_empty() => id,
        _ => {
            warn!("Skipping remote album without an id ({:?})", album.title);
            return None;
        }
    };
    let title = album.title.unwrap_or_else(|| UNTITLED_ALBUM.to_string());

    let mut stored = Album::new(id, title);
    stored.creation_time = album
        .creation_time
        .as_deref()
        .map(normalize_creation_time)
        .unwrap_or_default();
    Some(stored)
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::HashMap;

    /// In-memory library. Each listing is split into pages of the requested
    /// size, with the page index as the token.
    #[derive(Default)]
    pub struct FakeLibrary {
        pub items: Vec<MediaItem>,
        pub albums: Vec<LibraryAlbum>,
        pub members: HashMap<String, Vec<String>>,
    }

    pub fn item(id: &str, filename: &str, width: u32, height: u32) -> MediaItem {
        MediaItem {
            id: Some(id.to_string()),
            filename: Some(filename.to_string()),
            product_url: Some(format!("https://photos.example/{}", id)),
            mime_type: Some("image/jpeg".to_string()),
            media_metadata: Some(MediaMetadata {
                creation_time: Some("2024-05-01T10:00:00Z".to_string()),
                width: Some(width.to_string()),
                height: Some(height.to_string()),
            }),
        }
    }

    pub fn album(id: &str, title: &str) -> LibraryAlbum {
        LibraryAlbum {
            id: Some(id.to_string()),
            title: Some(title.to_string()),
            product_url: None,
            creation_time: Some("2023-01-02T03:04:05Z".to_string()),
        }
    }

    fn page_of<T: Clone>(all: &[T], page_size: u32, token: Option<&str>) -> Page<T> {
        let size = page_size as usize;
        let index: usize = token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let start = index * size;
        let items = all.iter().skip(start).take(size).cloned().collect();
        let next_page_token = (start + size < all.len()).then(|| (index + 1).to_string());
        Page {
            items,
            next_page_token,
        }
    }

    impl LibraryApi for FakeLibrary {
        fn list_media_items(&self, page_size: u32, page_token: Option<&str>) -> Result<Page<MediaItem>> {
            Ok(page_of(&self.items, page_size, page_token))
        }

        fn list_albums(&self, page_size: u32, page_token: Option<&str>) -> Result<Page<LibraryAlbum>> {
            Ok(page_of(&self.albums, page_size, page_token))
        }

        fn search_album_items(
            &self,
            album_id: &str,
            page_size: u32,
            page_token: Option<&str>,
        ) -> Result<Page<MediaItem>> {
            let members: Vec<MediaItem> = self
                .members
                .get(album_id)
                .map(|ids| {
                    ids.iter()
                        .map(|id| MediaItem {
                            id: Some(id.clone()),
                            ..Default::default()
                        })
                        .collect()
                })
                .unwrap_or_default();
            Ok(page_of(&members, page_size, page_token))
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{album, item, FakeLibrary};
    use super::*;
    use crate::db::test_db;
    use std::cell::Cell;

    fn config(page_size: u32) -> RemoteConfig {
        RemoteConfig {
            page_size,
            album_page_size: page_size,
            ..Default::default()
        }
    }

    fn library() -> FakeLibrary {
        let mut fake = FakeLibrary {
            items: vec![
                item("m1", "IMG_0001.JPG", 4032, 3024),
                item("m2", "IMG_0002.JPG", 4032, 3024),
                item("m3", "beach.png", 800, 600),
            ],
            albums: vec![
                album("a1", "Summer"),
                LibraryAlbum {
                    title: None,
                    ..album("a2", "")
                },
            ],
            ..Default::default()
        };
        fake.members
            .insert("a1".to_string(), vec!["m1".to_string(), "m3".to_string()]);
        fake.members.insert("a2".to_string(), vec!["m2".to_string()]);
        fake
    }

    #[test]
    fn test_fetch_all_photos_drains_pages() {
        let sync = RemoteSync::new(library(), &config(2));
        let photos = sync.fetch_all_photos(1).unwrap();

        let ids: Vec<&str> = photos.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        let first = photos[0].base();
        assert_eq!((first.width, first.height), (4032, 3024));
        assert_eq!(first.normalized_filename, "img0001");
        assert_eq!(first.creation_time, "2024-05-01T10:00:00");
        assert_eq!(first.path, "https://photos.example/m1");
    }

    #[test]
    fn test_fetch_all_albums_defaults_title() {
        let sync = RemoteSync::new(library(), &config(1));
        let albums = sync.fetch_all_albums().unwrap();
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].title, "Summer");
        assert_eq!(albums[1].title, UNTITLED_ALBUM);
        assert_eq!(sync.fetch_album_members("a1").unwrap(), vec!["m1", "m3"]);
        assert!(sync.fetch_album_members("nope").unwrap().is_empty());
    }

    #[test]
    fn test_empty_album_title_kept_verbatim() {
        let fake = FakeLibrary {
            albums: vec![album("a1", "")],
            ..Default::default()
        };
        let albums = RemoteSync::new(fake, &config(10)).fetch_all_albums().unwrap();
        assert_eq!(albums[0].title, "");
    }

    #[test]
    fn test_album_creation_time_is_stored() {
        let sync = RemoteSync::new(library(), &config(10));
        let albums = sync.fetch_all_albums().unwrap();
        assert_eq!(albums[0].creation_time, "2023-01-02T03:04:05");

        let db = test_db();
        sync.sync_into(&db, None).unwrap();
        let stored = db.find_album_by_title(Source::Remote, "Summer").unwrap().unwrap();
        assert_eq!(stored.creation_time, "2023-01-02T03:04:05");
    }

    /// Wraps [`FakeLibrary`] and fails one kind of listing.
    struct BrokenLibrary {
        inner: FakeLibrary,
        broken: &'static str,
    }

    impl BrokenLibrary {
        fn check(&self, listing: &str) -> Result<()> {
            if self.broken == listing {
                Err(Error::InvalidResponse(format!("{} unavailable", listing)))
            } else {
                Ok(())
            }
        }
    }

    impl LibraryApi for BrokenLibrary {
        fn list_media_items(&self, page_size: u32, page_token: Option<&str>) -> Result<Page<MediaItem>> {
            self.check("media")?;
            self.inner.list_media_items(page_size, page_token)
        }

        fn list_albums(&self, page_size: u32, page_token: Option<&str>) -> Result<Page<LibraryAlbum>> {
            self.check("albums")?;
            self.inner.list_albums(page_size, page_token)
        }

        fn search_album_items(
            &self,
            album_id: &str,
            page_size: u32,
            page_token: Option<&str>,
        ) -> Result<Page<MediaItem>> {
            self.check("members")?;
            self.inner.search_album_items(album_id, page_size, page_token)
        }

        fn provider_name(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn test_failed_sync_keeps_previous_snapshot() {
        let db = test_db();
        RemoteSync::new(library(), &config(2)).sync_into(&db, None).unwrap();

        for broken in ["media", "albums", "members"] {
            let api = BrokenLibrary {
                inner: library(),
                broken,
            };
            let result = RemoteSync::new(api, &config(2)).sync_into(&db, None);

            assert!(matches!(result, Err(Error::InvalidResponse(_))), "{}", broken);
            assert_eq!(db.count_photos(Source::Remote).unwrap(), 3, "{}", broken);
            assert_eq!(db.count_album_photos(Source::Remote, "a1").unwrap(), 2, "{}", broken);
        }
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let mut fake = library();
        fake.items.push(MediaItem::default());
        let mut no_dims = item("m4", "scan.tif", 0, 0);
        no_dims.media_metadata = Some(MediaMetadata {
            width: Some("wide".to_string()),
            ..Default::default()
        });
        no_dims.product_url = None;
        fake.items.push(no_dims);

        let sync = RemoteSync::new(fake, &config(10));
        let photos = sync.fetch_all_photos(10).unwrap();
        assert_eq!(photos.len(), 4);
        assert_eq!(photos[3].dimensions(), (0, 0));
        assert_eq!(photos[3].base().path, "m4");
    }

    #[test]
    fn test_sync_into_stores_everything() {
        let db = test_db();
        let sync = RemoteSync::new(library(), &config(2));
        let result = sync.sync_into(&db, None).unwrap();

        assert_eq!(
            result,
            SyncResult {
                photos: 3,
                albums: 2,
                memberships: 3,
                skipped_memberships: 0,
            }
        );
        assert_eq!(db.count_photos(Source::Remote).unwrap(), 3);
        assert_eq!(db.count_album_photos(Source::Remote, "a1").unwrap(), 2);
    }

    #[test]
    fn test_sync_into_honours_max_photos() {
        let db = test_db();
        let sync = RemoteSync::new(library(), &config(2));
        let result = sync.sync_into(&db, Some(1)).unwrap();

        assert_eq!(result.photos, 1);
        assert_eq!(result.memberships, 1);
        assert_eq!(result.skipped_memberships, 2);
        assert_eq!(db.count_photos(Source::Remote).unwrap(), 1);
    }

    #[test]
    fn test_resync_replaces_remote_source() {
        let db = test_db();
        RemoteSync::new(library(), &config(2)).sync_into(&db, None).unwrap();

        let mut smaller = library();
        smaller.items.truncate(1);
        RemoteSync::new(smaller, &config(2)).sync_into(&db, None).unwrap();

        assert_eq!(db.count_photos(Source::Remote).unwrap(), 1);
    }

    #[test]
    fn test_drain_pages_stops_on_empty_token() {
        let calls = Cell::new(0);
        let items = drain_pages("things", None, |token| {
            calls.set(calls.get() + 1);
            Ok(match token {
                None => Page {
                    items: vec![1, 2],
                    next_page_token: Some("next".to_string()),
                },
                Some(_) => Page {
                    items: vec![],
                    next_page_token: Some(String::new()),
                },
            })
        })
        .unwrap();

        assert_eq!(items, vec![1, 2]);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_drain_pages_rejects_repeated_token() {
        let result: Result<Vec<u8>> = drain_pages("things", None, |_| {
            Ok(Page {
                items: vec![1],
                next_page_token: Some("same".to_string()),
            })
        });
        assert!(matches!(result, Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn test_drain_pages_propagates_failure() {
        let result: Result<Vec<u8>> = drain_pages("things", None, |token| match token {
            None => Ok(Page {
                items: vec![1],
                next_page_token: Some("2".to_string()),
            }),
            Some(_) => Err(Error::InvalidResponse("boom".to_string())),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension(Some("640")), 640);
        assert_eq!(parse_dimension(Some("-1")), 0);
        assert_eq!(parse_dimension(None), 0);
    }
}
