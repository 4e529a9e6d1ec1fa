//! Reconciliation of local albums against the remote library.
//!
//! Everything here reads from the store only. A local photo is matched to
//! remote photos by stored normalized filename; when several remote photos
//! share the name, exact pixel dimensions decide.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::CompareConfig;
use crate::db::{Database, Photo, Source};
use crate::error::Result;

/// Where to look for the remote counterpart of a local photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteScope<'a> {
    /// Members of one remote album.
    Album(&'a str),
    /// Every remote photo.
    Library,
}

/// A local photo with no remote counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingPhoto {
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

impl From<&Photo> for MissingPhoto {
    fn from(photo: &Photo) -> Self {
        let (width, height) = photo.dimensions();
        Self {
            filename: photo.filename().to_string(),
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompareOptions {
    /// Report albums with equal member counts as in sync without a
    /// per-photo diff.
    pub skip_equal_counts: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            skip_equal_counts: true,
        }
    }
}

impl From<&CompareConfig> for CompareOptions {
    fn from(config: &CompareConfig) -> Self {
        Self {
            skip_equal_counts: config.skip_equal_counts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlbumStatus {
    /// No remote album has this title; `missing` is checked against the
    /// whole library.
    ToCreate { missing: Vec<MissingPhoto> },
    InSync { remote_album_id: String },
    NeedsReconcile {
        remote_album_id: String,
        remote_count: i64,
        missing: Vec<MissingPhoto>,
    },
}

impl AlbumStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AlbumStatus::ToCreate { .. } => "to_create",
            AlbumStatus::InSync { .. } => "in_sync",
            AlbumStatus::NeedsReconcile { .. } => "needs_reconcile",
        }
    }

    pub fn missing(&self) -> &[MissingPhoto] {
        match self {
            AlbumStatus::ToCreate { missing } | AlbumStatus::NeedsReconcile { missing, .. } => missing,
            AlbumStatus::InSync { .. } => &[],
        }
    }

    pub fn remote_album_id(&self) -> Option<&str> {
        match self {
            AlbumStatus::ToCreate { .. } => None,
            AlbumStatus::InSync { remote_album_id }
            | AlbumStatus::NeedsReconcile { remote_album_id, .. } => Some(remote_album_id.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumComparison {
    pub local_album_id: String,
    pub title: String,
    pub local_count: i64,
    #[serde(flatten)]
    pub status: AlbumStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateTitle {
    pub title: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompareReport {
    pub albums: Vec<AlbumComparison>,
    /// Remote titles shared by several albums; only the first stored one
    /// takes part in the comparison.
    pub duplicate_remote_titles: Vec<DuplicateTitle>,
}

impl CompareReport {
    pub fn count(&self, label: &str) -> usize {
        self.albums.iter().filter(|a| a.status.label() == label).count()
    }

    pub fn missing_total(&self) -> usize {
        self.albums.iter().map(|a| a.status.missing().len()).sum()
    }
}

/// The remote counterpart of a local photo, if it has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteMatch {
    pub id: String,
    pub filename: String,
    /// First remote album holding the photo, alphabetically.
    pub album_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoMatch {
    pub album_title: String,
    pub local_id: String,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub remote: Option<RemoteMatch>,
}

/// Pick the remote candidate for `local`, or `None` when it is missing.
///
/// A single candidate matches outright. Several candidates are narrowed to
/// those with the same dimensions and the first survivor wins.
pub fn resolve_match<'a>(local: &Photo, candidates: &'a [Photo]) -> Option<&'a Photo> {
    match candidates {
        [] => None,
        [only] => Some(only),
        _ => {
            let dimensions = local.dimensions();
            candidates.iter().find(|c| c.dimensions() == dimensions)
        }
    }
}

fn remote_candidates(db: &Database, photo: &Photo, scope: RemoteScope<'_>) -> Result<Vec<Photo>> {
    let name = &photo.base().normalized_filename;
    match scope {
        RemoteScope::Album(album_id) => {
            db.find_album_photos_by_normalized_name(Source::Remote, album_id, name)
        }
        RemoteScope::Library => db.find_photos_by_normalized_name(Source::Remote, name),
    }
}

/// Local photos of `local_album_id` with no counterpart in `scope`, in
/// filename order.
pub fn find_missing(db: &Database, local_album_id: &str, scope: RemoteScope<'_>) -> Result<Vec<MissingPhoto>> {
    db.ensure_initialized()?;

    let mut missing = Vec::new();
    for photo in db.photos_in_album(Source::Local, local_album_id)? {
        let candidates = remote_candidates(db, &photo, scope)?;
        if resolve_match(&photo, &candidates).is_none() {
            debug!(
                "{} has no remote match among {} candidates",
                photo.filename(),
                candidates.len()
            );
            missing.push(MissingPhoto::from(&photo));
        }
    }
    Ok(missing)
}

/// Compare every local album with the remote album of the same title.
pub fn compare_albums(db: &Database, options: CompareOptions) -> Result<CompareReport> {
    db.ensure_initialized()?;

    let mut report = CompareReport::default();
    for summary in db.list_albums(Source::Local)? {
        let album = summary.album;
        let local_count = summary.photo_count;

        let status = match db.find_album_by_title(Source::Remote, &album.title)? {
            None => AlbumStatus::ToCreate {
                missing: find_missing(db, &album.id, RemoteScope::Library)?,
            },
            Some(remote) => {
                let remote_count = db.count_album_photos(Source::Remote, &remote.id)?;
                if options.skip_equal_counts && remote_count == local_count {
                    AlbumStatus::InSync {
                        remote_album_id: remote.id,
                    }
                } else {
                    let missing = find_missing(db, &album.id, RemoteScope::Album(&remote.id))?;
                    if missing.is_empty() && remote_count == local_count {
                        AlbumStatus::InSync {
                            remote_album_id: remote.id,
                        }
                    } else {
                        AlbumStatus::NeedsReconcile {
                            remote_album_id: remote.id,
                            remote_count,
                            missing,
                        }
                    }
                }
            }
        };

        report.albums.push(AlbumComparison {
            local_album_id: album.id,
            title: album.title,
            local_count,
            status,
        });
    }

    report.duplicate_remote_titles = db
        .duplicate_album_titles(Source::Remote)?
        .into_iter()
        .map(|(title, count)| DuplicateTitle { title, count })
        .collect();

    info!(
        "Compared {} albums: {} to create, {} need reconciling, {} photos missing",
        report.albums.len(),
        report.count("to_create"),
        report.count("needs_reconcile"),
        report.missing_total()
    );
    Ok(report)
}

/// Every local photo, optionally limited to albums whose title matches
/// `album_glob`, with its remote counterpart from anywhere in the library.
pub fn match_photos(db: &Database, album_glob: Option<&str>) -> Result<Vec<PhotoMatch>> {
    db.ensure_initialized()?;

    let mut matches = Vec::new();
    for entry in db.list_photos(Source::Local, album_glob)? {
        let photo = entry.photo;
        let candidates = remote_candidates(db, &photo, RemoteScope::Library)?;
        let remote = match resolve_match(&photo, &candidates) {
            Some(found) => Some(RemoteMatch {
                id: found.id().to_string(),
                filename: found.filename().to_string(),
                album_title: db
                    .album_titles_for_photo(Source::Remote, found.id())?
                    .into_iter()
                    .next(),
            }),
            None => None,
        };

        let (width, height) = photo.dimensions();
        matches.push(PhotoMatch {
            album_title: entry.album_title,
            local_id: photo.id().to_string(),
            filename: photo.filename().to_string(),
            width,
            height,
            remote,
        });
    }
    Ok(matches)
}
