use std::fmt;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Sent as a string by the API
    pub media_items_count: Option<String>,
    #[serde(default)]
    pub is_writeable: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub filename: Option<String>,
    pub description: Option<String>,
    pub product_url: Option<String>,
}

/// One page of a paginated listing
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumsPage {
    #[serde(default)]
    pub albums: Vec<Album>,
    pub next_page_token: Option<String>,
}

impl From<AlbumsPage> for Page<Album> {
    fn from(page: AlbumsPage) -> Self {
        let AlbumsPage {
            albums,
            next_page_token,
        } = page;

        Self {
            items: albums,
            next_page_token,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemsPage {
    #[serde(default)]
    pub media_items: Vec<MediaItem>,
    pub next_page_token: Option<String>,
}

impl From<MediaItemsPage> for Page<MediaItem> {
    fn from(page: MediaItemsPage) -> Self {
        let MediaItemsPage {
            media_items,
            next_page_token,
        } = page;

        Self {
            items: media_items,
            next_page_token,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateResponse {
    #[serde(default)]
    pub new_media_item_results: Vec<NewMediaItemResult>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewMediaItemResult {
    #[serde(default)]
    pub status: ItemStatus,
    pub media_item: Option<MediaItem>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ItemStatus {
    pub code: Option<i32>,
    pub message: Option<String>,
}

impl ItemStatus {
    pub fn is_failure(&self) -> bool {
        self.code.is_some_and(|code| code > 0)
    }
}

/// Error payload returned by the API as `{ "error": { ... } }`
#[derive(Deserialize, Debug, Clone)]
pub struct ApiError {
    pub code: i64,
    pub status: String,
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {}; {}; {}", self.code, self.status, self.message)
    }
}

impl std::error::Error for ApiError {}
