use std::io::Write;

use anyhow::{bail, Context, Result};

use crate::photos::{album_items, albums, find_album_id, PhotosLibrary};

pub fn print_albums<L: PhotosLibrary + ?Sized>(library: &mut L, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{:<50} | {:>8} | {} ",
        "PHOTO ALBUM", "# PHOTOS", "IS WRITEABLE?"
    )?;

    for album in albums(library, false) {
        let album = album.context("Failed to list albums")?;

        writeln!(
            out,
            "{:<50} | {:>8} | {} ",
            album.title,
            album.media_items_count.as_deref().unwrap_or("0"),
            album.is_writeable
        )?;
    }

    Ok(())
}

pub fn print_album_content<L: PhotosLibrary + ?Sized>(
    library: &mut L,
    album_name: &str,
    out: &mut impl Write,
) -> Result<()> {
    let Some(album_id) = find_album_id(library, album_name)? else {
        bail!("Album not found: {album_name}");
    };

    writeln!(out, "{:<40} | {:>8}", "FILE NAME", "DESCRIPTION")?;

    for item in album_items(library, &album_id) {
        let item = item.context("Failed to list the album's content")?;

        match (item.filename, item.description) {
            (Some(filename), Some(description)) => {
                writeln!(out, "{:<40} | {:>8}", filename, description)?
            }
            (Some(filename), None) => writeln!(out, "{:<40} |", filename)?,
            (None, _) => writeln!(out, "{:<40} |", "????")?,
        }
    }

    Ok(())
}
