use anyhow::{Context, Result};
use colored::Colorize;

use super::{Album, Paginated, PhotosLibrary};
use crate::info;

/// Iterate over all albums, optionally only those created by this app
pub fn albums<L: PhotosLibrary + ?Sized>(
    library: &mut L,
    app_created_only: bool,
) -> impl Iterator<Item = Result<Album>> + '_ {
    Paginated::new(move |page_token: Option<&str>| {
        library.list_albums(app_created_only, page_token)
    })
}

/// Find the ID of the first album whose title is exactly the provided one
pub fn find_album_id<L: PhotosLibrary + ?Sized>(
    library: &mut L,
    title: &str,
) -> Result<Option<String>> {
    for album in albums(library, false) {
        let album = album.context("Failed to list albums")?;

        if album.title == title {
            return Ok(Some(album.id));
        }
    }

    Ok(None)
}

/// Get the ID of the app-created album with the provided title (ignoring case),
/// creating the album if it doesn't exist yet
pub fn resolve_album<L: PhotosLibrary + ?Sized>(library: &mut L, title: &str) -> Result<String> {
    let wanted = title.to_lowercase();

    for album in albums(library, true) {
        let album = album.with_context(|| {
            format!(
                "Could not find or create photo album '{}'",
                title.bright_yellow()
            )
        })?;

        if album.title.to_lowercase() == wanted {
            info!(
                "Uploading into EXISTING photo album -- '{}'",
                title.bright_yellow()
            );

            return Ok(album.id);
        }
    }

    let album = library.create_album(title).with_context(|| {
        format!(
            "Could not find or create photo album '{}'",
            title.bright_yellow()
        )
    })?;

    info!(
        "Uploading into NEW photo album -- '{}'",
        title.bright_yellow()
    );

    Ok(album.id)
}
