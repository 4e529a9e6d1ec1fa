use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::api::{LibraryAlbum, LibraryApi, MediaItem, Page};
use super::auth::load_access_token;
use crate::config::RemoteConfig;
use crate::error::{Error, Result};

/// Google Photos Library API over blocking HTTPS.
pub struct GooglePhotosClient {
    agent: ureq::Agent,
    endpoint: String,
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaItemsResponse {
    #[serde(default)]
    media_items: Vec<MediaItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlbumsResponse {
    #[serde(default)]
    albums: Vec<LibraryAlbum>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl GooglePhotosClient {
    pub fn new(endpoint: &str, access_token: &str, timeout_secs: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build();
        Self {
            agent,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    /// Build a client from config, resolving the access token.
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let token = load_access_token(config)?;
        Ok(Self::new(&config.endpoint, &token, config.timeout_secs))
    }

    fn get<T: DeserializeOwned>(&self, path: &str, page_size: u32, page_token: Option<&str>) -> Result<T> {
        let url = format!("{}/{}", self.endpoint, path);
        debug!("GET {} (page token {:?})", url, page_token);

        let mut req = self
            .agent
            .get(&url)
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .query("pageSize", &page_size.to_string());
        if let Some(token) = page_token {
            req = req.query("pageToken", token);
        }

        read_json(req.call()?)
    }
}

fn read_json<T: DeserializeOwned>(response: ureq::Response) -> Result<T> {
    response
        .into_json()
        .map_err(|e| Error::InvalidResponse(e.to_string()))
}

impl LibraryApi for GooglePhotosClient {
    fn list_media_items(&self, page_size: u32, page_token: Option<&str>) -> Result<Page<MediaItem>> {
        let response: MediaItemsResponse = self.get("mediaItems", page_size, page_token)?;
        Ok(Page {
            items: response.media_items,
            next_page_token: response.next_page_token,
        })
    }

    fn list_albums(&self, page_size: u32, page_token: Option<&str>) -> Result<Page<LibraryAlbum>> {
        let response: AlbumsResponse = self.get("albums", page_size, page_token)?;
        Ok(Page {
            items: response.albums,
            next_page_token: response.next_page_token,
        })
    }

    fn search_album_items(
        &self,
        album_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<MediaItem>> {
        let url = format!("{}/mediaItems:search", self.endpoint);
        debug!("POST {} for album {} (page token {:?})", url, album_id, page_token);

        let mut body = serde_json::json!({
            "albumId": album_id,
            "pageSize": page_size,
        });
        if let Some(token) = page_token {
            body["pageToken"] = serde_json::Value::from(token);
        }

        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .set("Content-Type", "application/json")
            .send_json(body)?;
        let response: MediaItemsResponse = read_json(response)?;

        Ok(Page {
            items: response.media_items,
            next_page_token: response.next_page_token,
        })
    }

    fn provider_name(&self) -> &'static str {
        "Google Photos"
    }
}
