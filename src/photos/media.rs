use anyhow::Result;

use super::{MediaItem, Paginated, PhotosLibrary};

/// Iterate over the media items of an album
pub fn album_items<'a, L: PhotosLibrary + ?Sized>(
    library: &'a mut L,
    album_id: &'a str,
) -> impl Iterator<Item = Result<MediaItem>> + 'a {
    Paginated::new(move |page_token: Option<&str>| library.search_album(album_id, page_token))
}
