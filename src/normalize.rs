//! Filename normalization for cross-source matching.
//!
//! The normalized key drops the extension, lower-cases the stem and keeps
//! only ASCII letters and digits. Local and remote photos are normalized
//! with the same function when they are stored, so a `.JPG` original and a
//! `.jpg` re-encode compare equal.

/// Normalize a filename into its comparison key.
///
/// Collisions are expected: `"Photo (1).JPG"` and `"Photo_1.jpg"` both
/// become `"photo1"`.
pub fn normalize(filename: &str) -> String {
    strip_extension(filename)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Drop everything from the last dot, unless that dot belongs to the
/// leading run of dots (`.hidden` has no extension).
fn strip_extension(filename: &str) -> &str {
    let leading_dots = filename.len() - filename.trim_start_matches('.').len();
    match filename.rfind('.') {
        Some(idx) if idx > leading_dots => &filename[..idx],
        _ => filename,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("IMG_1234.JPG"), "img1234");
        assert_eq!(normalize("Summer Trip - Day 2.jpeg"), "summertripday2");
    }

    #[test]
    fn test_normalize_collision() {
        assert_eq!(normalize("Photo (1).JPG"), normalize("Photo_1.jpg"));
        assert_eq!(normalize("Photo (1).JPG"), "photo1");
    }

    #[test]
    fn test_normalize_is_deterministic() {
        for name in ["a.b.c.png", "Ünïcödé.jpg", "", ".", "..", "x"] {
            assert_eq!(normalize(name), normalize(name));
        }
    }

    #[test]
    fn test_extension_handling() {
        assert_eq!(normalize("archive.tar.gz"), "archivetar");
        assert_eq!(normalize("noext"), "noext");
        assert_eq!(normalize(".hidden"), "hidden");
        assert_eq!(normalize("..jpg"), "jpg");
        assert_eq!(normalize("trailing."), "trailing");
    }

    #[test]
    fn test_non_ascii_and_entities_removed() {
        assert_eq!(normalize("Café & Bar.jpg"), "cafbar");
        assert_eq!(normalize("Tom&amp;Jerry.png"), "tomampjerry");
        assert_eq!(normalize(""), "");
    }
}
