mod albums;
mod api;
mod media;
mod pager;
mod types;

#[cfg(test)]
pub mod testing;

pub use albums::{albums, find_album_id, resolve_album};
pub use media::album_items;
pub use pager::Paginated;
pub use types::*;

use anyhow::Result;
use bytes::Bytes;

/// Operations of the Photos Library API used by this tool
pub trait PhotosLibrary {
    /// Fetch a page of the user's albums
    fn list_albums(&mut self, app_created_only: bool, page_token: Option<&str>)
        -> Result<Page<Album>>;

    fn create_album(&mut self, title: &str) -> Result<Album>;

    /// Fetch a page of the media items in an album
    fn search_album(&mut self, album_id: &str, page_token: Option<&str>) -> Result<Page<MediaItem>>;

    /// Send raw bytes, returning the upload token
    ///
    /// Any response other than a 200 with a non-empty body is an error
    fn upload_bytes(&mut self, file_name: &str, mime_type: &str, bytes: Bytes) -> Result<String>;

    /// Turn an upload token into a media item inside an album
    fn create_media_item(
        &mut self,
        album_id: &str,
        upload_token: &str,
    ) -> Result<Vec<NewMediaItemResult>>;

    fn set_description(&mut self, media_item_id: &str, description: &str) -> Result<()>;
}
