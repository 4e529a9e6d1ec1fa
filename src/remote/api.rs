use serde::Deserialize;

use crate::error::Result;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Absent or empty on the last page.
    pub next_page_token: Option<String>,
}

/// A media item as the library API returns it. Every field is optional on
/// the wire; items without an id or filename are dropped during sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub media_metadata: Option<MediaMetadata>,
}

/// Dimensions come over the wire as decimal strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub width: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryAlbum {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub creation_time: Option<String>,
}

/// Read side of a cloud photo library.
pub trait LibraryApi {
    fn list_media_items(&self, page_size: u32, page_token: Option<&str>) -> Result<Page<MediaItem>>;

    fn list_albums(&self, page_size: u32, page_token: Option<&str>) -> Result<Page<LibraryAlbum>>;

    /// Media items belonging to one album.
    fn search_album_items(
        &self,
        album_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<MediaItem>>;

    fn provider_name(&self) -> &'static str;
}
