pub mod discovery;
pub mod metadata;

use std::path::{Component, Path};
use tracing::{info, warn};

use crate::config::ScannerConfig;
use crate::db::{Album, Database, LocalPhoto, Photo, PhotoBase, Source};
use crate::error::{Error, Result};

pub use discovery::{discover_media, is_media_file, MediaDirectory};
pub use metadata::{extract_metadata, FileMetadata};

/// Separator between directory levels in a local album title.
pub const TITLE_SEPARATOR: &str = "|";

/// One directory of the tree as an album with its photos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedAlbum {
    pub album: Album,
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone)]
pub enum ScanProgress {
    Started { directories: usize },
    Album { current: usize, total: usize, title: String, photos: usize },
    Skipped { path: String, message: String },
    Completed { albums: usize, photos: usize, skipped: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub albums: usize,
    pub photos: usize,
    pub skipped: usize,
}

pub struct LocalScanner {
    extensions: Vec<String>,
    skip_hidden: bool,
}

impl LocalScanner {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            extensions: config.media_extensions.clone(),
            skip_hidden: config.skip_hidden,
        }
    }

    /// Walk `root` and return every media directory as an album, ordered by
    /// album id. Nothing is stored.
    pub fn scan(&self, root: &Path) -> Result<Vec<ScannedAlbum>> {
        let mut albums = Vec::new();
        self.scan_each(root, &mut |_| {}, |scanned| {
            albums.push(scanned);
            Ok(())
        })?;
        Ok(albums)
    }

    /// Replace the local source in `db` with the contents of `root`.
    ///
    /// Rows are written as they are discovered, so an interrupted scan leaves
    /// the albums scanned so far behind; re-running it converges.
    pub fn scan_into(
        &self,
        root: &Path,
        db: &Database,
        progress: &mut dyn FnMut(ScanProgress),
    ) -> Result<ScanResult> {
        validate_root(root)?;
        db.clear_source(Source::Local)?;

        let mut albums = 0;
        let mut photos = 0;
        let skipped = self.scan_each(root, progress, |scanned| {
            db.upsert_album(Source::Local, &scanned.album)?;
            for photo in &scanned.photos {
                db.upsert_photo(photo)?;
                db.upsert_membership(Source::Local, &scanned.album.id, photo.id())?;
            }
            albums += 1;
            photos += scanned.photos.len();
            Ok(())
        })?;

        let result = ScanResult {
            albums,
            photos,
            skipped,
        };

        progress(ScanProgress::Completed {
            albums: result.albums,
            photos: result.photos,
            skipped: result.skipped,
        });
        info!(
            "Processed {} files across {} albums ({} skipped)",
            result.photos, result.albums, result.skipped
        );
        Ok(result)
    }

    /// Scan every media directory under `root`, handing each album to
    /// `visit`. Returns the number of files skipped.
    fn scan_each(
        &self,
        root: &Path,
        progress: &mut dyn FnMut(ScanProgress),
        mut visit: impl FnMut(ScannedAlbum) -> Result<()>,
    ) -> Result<usize> {
        validate_root(root)?;

        let directories = discover_media(root, &self.extensions, self.skip_hidden);
        let total = directories.len();
        progress(ScanProgress::Started { directories: total });

        let mut skipped = 0;
        for (index, directory) in directories.iter().enumerate() {
            let album = album_for_directory(root, &directory.path);
            let mut photos = Vec::with_capacity(directory.files.len());

            for file in &directory.files {
                match scan_file(root, file) {
                    Ok(photo) => photos.push(photo),
                    Err(e) => {
                        warn!("Skipping file {}: {}", file.display(), e);
                        skipped += 1;
                        progress(ScanProgress::Skipped {
                            path: file.display().to_string(),
                            message: e.to_string(),
                        });
                    }
                }
            }

            let title = album.title.clone();
            let count = photos.len();
            visit(ScannedAlbum { album, photos })?;
            progress(ScanProgress::Album {
                current: index + 1,
                total,
                title,
                photos: count,
            });
        }

        Ok(skipped)
    }
}

fn validate_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(Error::SourceNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(Error::SourceNotDirectory(root.to_path_buf()));
    }
    Ok(())
}

fn relative_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    if relative.as_os_str().is_empty() {
        ".".to_string()
    } else {
        relative.to_string_lossy().to_string()
    }
}

/// Album title for a directory: its relative path with levels joined by
/// [`TITLE_SEPARATOR`], or the root's own name for the root itself.
pub fn album_title(root: &Path, directory: &Path) -> String {
    let relative = directory.strip_prefix(root).unwrap_or(directory);
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();

    if segments.is_empty() {
        root.canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| ".".to_string())
    } else {
        segments.join(TITLE_SEPARATOR)
    }
}

fn album_for_directory(root: &Path, directory: &Path) -> Album {
    Album {
        id: relative_id(root, directory),
        title: album_title(root, directory),
        creation_time: metadata::directory_modified(directory),
        path: directory.display().to_string(),
    }
}

fn scan_file(root: &Path, path: &Path) -> Result<Photo> {
    let meta = extract_metadata(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut base = PhotoBase::new(relative_id(root, path), filename)
        .with_dimensions(meta.width, meta.height);
    base.creation_time = meta.modified;
    base.mime_type = meta.mime_type;
    base.path = path.display().to_string();

    Ok(Photo::Local(LocalPhoto {
        base,
        size: meta.size,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn scanner() -> LocalScanner {
        LocalScanner::new(&ScannerConfig::default())
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn test_scan_builds_albums_from_directories() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("root.png"), 10, 10);
        fs::create_dir_all(dir.path().join("2024/Summer Trip")).unwrap();
        write_png(&dir.path().join("2024/Summer Trip/b.png"), 20, 10);
        write_png(&dir.path().join("2024/Summer Trip/a.png"), 30, 40);
        fs::create_dir(dir.path().join("docs")).unwrap();
        File::create(dir.path().join("docs/readme.txt")).unwrap();

        let albums = scanner().scan(dir.path()).unwrap();
        assert_eq!(albums.len(), 2);

        let root_name = dir.path().canonicalize().unwrap();
        let root_name = root_name.file_name().unwrap().to_string_lossy();
        assert_eq!(albums[0].album.id, ".");
        assert_eq!(albums[0].album.title, root_name);
        assert_eq!(albums[0].photos[0].id(), "root.png");

        let trip = &albums[1];
        assert_eq!(trip.album.title, "2024|Summer Trip");
        assert_eq!(
            trip.album.id,
            Path::new("2024").join("Summer Trip").to_string_lossy()
        );
        let names: Vec<&str> = trip.photos.iter().map(|p| p.filename()).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
        assert_eq!(trip.photos[0].dimensions(), (30, 40));
        assert_eq!(trip.photos[0].base().normalized_filename, "a");
        assert_eq!(
            trip.photos[0].id(),
            Path::new("2024").join("Summer Trip").join("a.png").to_string_lossy()
        );
    }

    #[test]
    fn test_scan_is_idempotent() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("a.png"), 5, 5);
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_png(&dir.path().join("sub/b.png"), 6, 6);

        let first = scanner().scan(dir.path()).unwrap();
        let second = scanner().scan(dir.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_directory_yields_no_album() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nothing")).unwrap();
        File::create(dir.path().join("nothing/list.txt")).unwrap();

        let db = test_db();
        let result = scanner().scan_into(dir.path(), &db, &mut |_| {}).unwrap();
        assert_eq!(result, ScanResult::default());
        assert!(db.list_albums(Source::Local).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("good1.png"), 8, 8);
        write_png(&dir.path().join("good2.png"), 9, 9);
        std::os::unix::fs::symlink(dir.path().join("missing.png"), dir.path().join("broken.png"))
            .unwrap();

        let db = test_db();
        let mut skipped_events = 0;
        let result = scanner()
            .scan_into(dir.path(), &db, &mut |event| {
                if let ScanProgress::Skipped { .. } = event {
                    skipped_events += 1;
                }
            })
            .unwrap();

        assert_eq!(result.photos, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(skipped_events, 1);
        assert_eq!(db.count_photos(Source::Local).unwrap(), 2);
    }

    #[test]
    fn test_scan_into_replaces_previous_scan() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("a.png"), 5, 5);
        write_png(&dir.path().join("b.png"), 5, 5);

        let db = test_db();
        scanner().scan_into(dir.path(), &db, &mut |_| {}).unwrap();
        fs::remove_file(dir.path().join("b.png")).unwrap();
        let result = scanner().scan_into(dir.path(), &db, &mut |_| {}).unwrap();

        assert_eq!(result.photos, 1);
        assert_eq!(db.count_photos(Source::Local).unwrap(), 1);
        assert_eq!(db.count_album_photos(Source::Local, ".").unwrap(), 1);
        let stored = db.find_photos_by_normalized_name(Source::Local, "a").unwrap();
        assert_eq!(stored[0].size(), Some(fs::metadata(dir.path().join("a.png")).unwrap().len()));
    }

    #[test]
    fn test_missing_root_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(scanner().scan(&missing), Err(Error::SourceNotFound(_))));

        let file = dir.path().join("file.jpg");
        File::create(&file).unwrap();
        assert!(matches!(scanner().scan(&file), Err(Error::SourceNotDirectory(_))));
    }

    #[test]
    fn test_album_title_for_nested_directory() {
        let root = Path::new("/photos");
        assert_eq!(album_title(root, Path::new("/photos/a/b/c")), "a|b|c");
    }
}
