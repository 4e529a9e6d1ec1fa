use chrono::{DateTime, Utc};
use std::fs::File;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

use crate::error::Result;

/// Timestamp layout used for every stored creation time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    /// Modification time in UTC, [`TIMESTAMP_FORMAT`].
    pub modified: String,
    pub mime_type: String,
    /// 0 when the file is not a decodable image.
    pub width: u32,
    pub height: u32,
}

/// Read size, modification time, MIME type and pixel dimensions of a file.
///
/// Fails only when the file cannot be stat'ed or opened. Dimension
/// extraction is best-effort.
pub fn extract_metadata(path: &Path) -> Result<FileMetadata> {
    let fs_metadata = std::fs::metadata(path)?;
    // Stat can succeed on files we are not allowed to read.
    File::open(path)?;

    let mime_type = guess_mime_type(path);
    let (width, height) = if mime_type.starts_with("image/") {
        image_dimensions(path).unwrap_or((0, 0))
    } else {
        (0, 0)
    };

    Ok(FileMetadata {
        size: fs_metadata.len(),
        modified: fs_metadata
            .modified()
            .map(format_timestamp)
            .unwrap_or_default(),
        mime_type: mime_type.to_string(),
        width,
        height,
    })
}

/// Modification time of a directory, empty when unavailable.
pub fn directory_modified(path: &Path) -> String {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(format_timestamp)
        .unwrap_or_default()
}

pub fn format_timestamp(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.format(TIMESTAMP_FORMAT).to_string()
}

fn image_dimensions(path: &Path) -> Option<(u32, u32)> {
    let reader = image::ImageReader::open(path).ok()?;
    let reader = reader.with_guessed_format().ok()?;
    match reader.into_dimensions() {
        Ok(dims) => Some(dims),
        Err(e) => {
            debug!("Could not get dimensions for {}: {}", path.display(), e);
            None
        }
    }
}

pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_extract_metadata_from_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        image::RgbImage::new(64, 48).save(&path).unwrap();

        let meta = extract_metadata(&path).unwrap();
        assert_eq!((meta.width, meta.height), (64, 48));
        assert_eq!(meta.mime_type, "image/png");
        assert!(meta.size > 0);
        assert_eq!(meta.modified.len(), "2024-01-01T00:00:00".len());
    }

    #[test]
    fn test_undecodable_image_has_zero_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let meta = extract_metadata(&path).unwrap();
        assert_eq!((meta.width, meta.height), (0, 0));
        assert_eq!(meta.mime_type, "image/jpeg");
        assert_eq!(meta.size, 21);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(extract_metadata(&dir.path().join("gone.jpg")).is_err());
    }

    #[test]
    fn test_format_timestamp() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(86_400);
        assert_eq!(format_timestamp(time), "1970-01-02T00:00:00");
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("a.MOV")), "video/quicktime");
        assert_eq!(guess_mime_type(Path::new("a")), "application/octet-stream");
    }
}
