use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// A directory holding at least one media file, with those files sorted by
/// name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDirectory {
    pub path: PathBuf,
    pub files: Vec<PathBuf>,
}

pub fn is_media_file(path: &Path, extensions: &[String]) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            extensions.iter().any(|e| e.to_lowercase() == ext_lower)
        }
        None => false,
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Walk `root` and group media files by their parent directory.
///
/// Directories without media files are left out. Entries that cannot be
/// read are logged and skipped.
pub fn discover_media(root: &Path, extensions: &[String], skip_hidden: bool) -> Vec<MediaDirectory> {
    let mut directories: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(skip_hidden && e.depth() > 0 && is_hidden(e)));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        // Symlinks are kept here; a dangling one fails later at metadata time.
        if entry.file_type().is_dir() || !is_media_file(entry.path(), extensions) {
            continue;
        }

        if let Some(parent) = entry.path().parent() {
            directories
                .entry(parent.to_path_buf())
                .or_default()
                .push(entry.path().to_path_buf());
        }
    }

    directories
        .into_iter()
        .map(|(path, mut files)| {
            files.sort();
            MediaDirectory { path, files }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn extensions() -> Vec<String> {
        vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string(), "mp4".to_string()]
    }

    #[test]
    fn test_discover_media_groups_by_directory() {
        let dir = tempdir().unwrap();

        File::create(dir.path().join("photo1.jpg")).unwrap();
        File::create(dir.path().join("photo2.PNG")).unwrap();
        File::create(dir.path().join("document.txt")).unwrap();

        fs::create_dir(dir.path().join("subdir")).unwrap();
        File::create(dir.path().join("subdir/clip.mp4")).unwrap();

        fs::create_dir(dir.path().join("empty")).unwrap();
        File::create(dir.path().join("empty/notes.txt")).unwrap();

        let found = discover_media(dir.path(), &extensions(), true);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, dir.path());
        assert_eq!(found[0].files.len(), 2);
        assert_eq!(found[1].path, dir.path().join("subdir"));
        assert_eq!(found[1].files, vec![dir.path().join("subdir/clip.mp4")]);
    }

    #[test]
    fn test_hidden_entries_skipped() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".thumbnails")).unwrap();
        File::create(dir.path().join(".thumbnails/a.jpg")).unwrap();
        File::create(dir.path().join(".b.jpg")).unwrap();

        assert!(discover_media(dir.path(), &extensions(), true).is_empty());
        assert_eq!(discover_media(dir.path(), &extensions(), false).len(), 2);
    }

    #[test]
    fn test_is_media_file() {
        let exts = extensions();
        assert!(is_media_file(Path::new("a/IMG.JPG"), &exts));
        assert!(!is_media_file(Path::new("a/readme"), &exts));
        assert!(!is_media_file(Path::new("a/notes.txt"), &exts));
    }
}
