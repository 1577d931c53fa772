use std::{
    collections::HashSet,
    fs,
    ops::AddAssign,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};

use crate::{
    error, error_anyhow,
    files::{media_files_in, subdirectories},
    info,
    photos::{album_items, resolve_album, PhotosLibrary},
    success,
    utils::logging::local_offset,
    warn,
};

static DESCRIPTION_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub struct UploadOptions {
    /// Write the file's earliest timestamp into the uploaded item's description
    pub describe: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Albums that could not be found nor created
    pub failed_albums: usize,
}

impl AddAssign for UploadSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.uploaded += rhs.uploaded;
        self.skipped += rhs.skipped;
        self.failed += rhs.failed;
        self.failed_albums += rhs.failed_albums;
    }
}

/// Upload files into an album, creating it if needed
///
/// Files whose name is already present in the album are skipped. Failing files
/// are reported and don't interrupt the upload; the only fatal error is an album
/// that cannot be found nor created.
pub fn upload_photos<L: PhotosLibrary + ?Sized>(
    library: &mut L,
    files: &[PathBuf],
    album_name: &str,
    options: &UploadOptions,
) -> Result<UploadSummary> {
    let album_id = resolve_album(library, album_name)?;

    let existing = existing_filenames(library, &album_id);

    let mut summary = UploadSummary::default();

    for file in files {
        let Some(file_name) = file.file_name().map(|name| name.to_string_lossy().into_owned())
        else {
            warn!(
                "Skipping path without a file name: {}",
                file.display().to_string().bright_magenta()
            );
            summary.failed += 1;
            continue;
        };

        if existing.contains(&file_name) {
            info!(
                "Skipping photo (already exists in album) -- '{}'",
                file.display()
            );
            summary.skipped += 1;
            continue;
        }

        match upload_file(library, file, &file_name, &album_id, album_name, options) {
            Ok(()) => summary.uploaded += 1,
            Err(err) => {
                error!("{:#}", err);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

fn upload_file<L: PhotosLibrary + ?Sized>(
    library: &mut L,
    file: &Path,
    file_name: &str,
    album_id: &str,
    album_name: &str,
    options: &UploadOptions,
) -> Result<()> {
    let bytes = fs::read(file)
        .map(Bytes::from)
        .with_context(|| format!("Could not read file '{}'", file.display()))?;

    info!("Uploading photo -- '{}'", file.display());

    let mime_type = mime_guess::from_path(file).first_or_octet_stream();

    let upload_token = library
        .upload_bytes(file_name, mime_type.essence_str(), bytes)
        .with_context(|| format!("Could not upload '{file_name}'"))?;

    let result = library
        .create_media_item(album_id, &upload_token)
        .with_context(|| format!("Could not add '{file_name}' to library"))?
        .into_iter()
        .next()
        .with_context(|| format!("Could not add '{file_name}' to library -- no result returned"))?;

    if result.status.is_failure() {
        bail!(
            "Could not add '{}' to library -- {}",
            file_name,
            result.status.message.unwrap_or_default()
        );
    }

    let item = result.media_item.with_context(|| {
        format!("Could not add '{file_name}' to library -- no media item returned")
    })?;

    success!(
        "Added '{}' to library and album '{}'",
        file_name,
        album_name.bright_yellow()
    );

    println!(
        "{} URL: {}",
        item.filename.as_deref().unwrap_or(file_name),
        item.product_url.as_deref().unwrap_or("<unknown>")
    );

    if options.describe {
        let described = earliest_timestamp(file).and_then(|date| {
            library.set_description(&item.id, &format!("{album_name} @{date}"))
        });

        if let Err(err) = described {
            warn!("Could not set the description of '{}': {:#}", file_name, err);
        }
    }

    Ok(())
}

fn existing_filenames<L: PhotosLibrary + ?Sized>(
    library: &mut L,
    album_id: &str,
) -> HashSet<String> {
    let pb = ProgressBar::new_spinner().with_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("Invalid template provided for ProgressBar"),
    );

    pb.set_message("Fetching album content...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut names = HashSet::new();

    for item in album_items(library, album_id) {
        match item {
            Ok(item) => {
                if let Some(filename) = item.filename {
                    names.insert(filename);
                }

                pb.set_message(format!("Fetching album content... {} item(s)", names.len()));
            }

            Err(err) => {
                pb.finish_and_clear();

                warn!(
                    "Failed to fetch the album's content, already uploaded files may be uploaded again: {:#}",
                    err
                );

                return names;
            }
        }
    }

    pb.finish_and_clear();

    names
}

/// Earliest of the access, modification and change times, in local time
fn earliest_timestamp(file: &Path) -> Result<String> {
    let metadata = fs::metadata(file)
        .with_context(|| format!("Could not get stat for '{}'", file.display()))?;

    let earliest = [
        metadata.accessed().ok(),
        metadata.modified().ok(),
        change_time(&metadata),
    ]
    .into_iter()
    .flatten()
    .min()
    .context("File has no timestamp")?;

    if earliest <= UNIX_EPOCH {
        bail!("File has 0 creation time");
    }

    OffsetDateTime::from(earliest)
        .to_offset(local_offset())
        .format(DESCRIPTION_DATE_FORMAT)
        .context("Failed to format the file's timestamp")
}

#[cfg(unix)]
fn change_time(metadata: &fs::Metadata) -> Option<SystemTime> {
    use std::os::unix::fs::MetadataExt;

    u64::try_from(metadata.ctime())
        .ok()
        .map(|secs| UNIX_EPOCH + Duration::from_secs(secs))
}

#[cfg(not(unix))]
fn change_time(metadata: &fs::Metadata) -> Option<SystemTime> {
    metadata.created().ok()
}

/// Files to upload into one album
pub struct AlbumPlan {
    pub name: String,
    pub files: Vec<PathBuf>,
}

/// Map each subdirectory of the root to an album containing its media files
///
/// Subdirectories without any media file are left out.
pub fn plan_albums(root: &Path, exclude: Option<&Regex>) -> Result<Vec<AlbumPlan>> {
    Ok(subdirectories(root)?
        .into_iter()
        .filter_map(|name| {
            let files = media_files_in(&root.join(&name), exclude);

            if files.is_empty() {
                None
            } else {
                Some(AlbumPlan { name, files })
            }
        })
        .collect())
}

/// Upload every planned album, continuing after albums that failed
pub fn upload_albums<L: PhotosLibrary + ?Sized>(
    library: &mut L,
    plans: &[AlbumPlan],
    options: &UploadOptions,
) -> UploadSummary {
    let mut total = UploadSummary::default();

    for (i, AlbumPlan { name, files }) in plans.iter().enumerate() {
        info!(
            "|\n| Album {} / {}: {} ({} file(s))\n|",
            (i + 1).to_string().bright_yellow(),
            plans.len().to_string().bright_yellow(),
            name.bright_magenta(),
            files.len()
        );

        match upload_photos(library, files, name, options) {
            Ok(summary) => total += summary,
            Err(err) => {
                error_anyhow!(err);
                total.failed_albums += 1;
            }
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{files::testing::ScratchDir, photos::testing::FakeLibrary};

    fn no_description() -> UploadOptions {
        UploadOptions { describe: false }
    }

    #[test]
    fn uploads_into_a_new_album() {
        let dir = ScratchDir::new("upload-new");
        let files = vec![dir.touch("a.jpg"), dir.touch("b.mp4")];
        let mut library = FakeLibrary::new();

        let summary = upload_photos(&mut library, &files, "Trip", &no_description()).unwrap();

        assert_eq!(
            summary,
            UploadSummary {
                uploaded: 2,
                skipped: 0,
                failed: 0,
                failed_albums: 0,
            }
        );
        assert_eq!(library.created_albums, vec!["Trip"]);
        assert_eq!(library.uploads, vec!["a.jpg", "b.mp4"]);
    }

    #[test]
    fn existing_file_names_are_skipped() {
        let dir = ScratchDir::new("upload-skip");
        let files = vec![dir.touch("a.jpg")];
        let mut library = FakeLibrary::new();

        upload_photos(&mut library, &files, "Trip", &no_description()).unwrap();
        let again = upload_photos(&mut library, &files, "trip", &no_description()).unwrap();

        assert_eq!(again.skipped, 1);
        assert_eq!(again.uploaded, 0);
        assert_eq!(library.uploads, vec!["a.jpg"]);
        assert_eq!(library.created_items.len(), 1);
        assert_eq!(library.created_albums, vec!["Trip"]);
    }

    #[test]
    fn skip_matches_base_name_only() {
        let dir = ScratchDir::new("upload-basename");
        let mut library = FakeLibrary::new();
        let album = library.add_album("Trip", true);
        library.add_item(&album, "a.jpg");

        let files = vec![dir.touch("nested/a.jpg"), dir.touch("nested/b.jpg")];
        let summary = upload_photos(&mut library, &files, "Trip", &no_description()).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(library.uploads, vec!["b.jpg"]);
    }

    #[test]
    fn rejected_upload_does_not_create_an_item() {
        let dir = ScratchDir::new("upload-rejected");
        let files = vec![dir.touch("bad.jpg"), dir.touch("good.jpg")];
        let mut library = FakeLibrary::new();
        library.rejected_uploads.insert("bad.jpg".to_owned());

        let summary = upload_photos(&mut library, &files, "Trip", &no_description()).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.uploaded, 1);
        assert_eq!(library.uploads, vec!["bad.jpg", "good.jpg"]);
        assert_eq!(
            library
                .created_items
                .iter()
                .map(|(_, name)| name.as_str())
                .collect::<Vec<_>>(),
            vec!["good.jpg"]
        );
    }

    #[test]
    fn unreadable_file_is_skipped() {
        let dir = ScratchDir::new("upload-unreadable");
        let files = vec![dir.path().join("missing.jpg"), dir.touch("there.jpg")];
        let mut library = FakeLibrary::new();

        let summary = upload_photos(&mut library, &files, "Trip", &no_description()).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(library.uploads, vec!["there.jpg"]);
    }

    #[test]
    fn failed_item_status_is_reported_without_description() {
        let dir = ScratchDir::new("upload-status");
        let files = vec![dir.touch("broken.jpg")];
        let mut library = FakeLibrary::new();
        library.failing_items.insert("broken.jpg".to_owned());

        let summary =
            upload_photos(&mut library, &files, "Trip", &UploadOptions { describe: true }).unwrap();

        assert_eq!(summary.failed, 1);
        assert!(library.descriptions.is_empty());
    }

    #[test]
    fn description_holds_album_and_date() {
        let dir = ScratchDir::new("upload-description");
        let files = vec![dir.touch("a.jpg")];
        let mut library = FakeLibrary::new();

        upload_photos(&mut library, &files, "Trip", &UploadOptions { describe: true }).unwrap();

        assert_eq!(library.descriptions.len(), 1);

        let (_, description) = &library.descriptions[0];
        let date = description.strip_prefix("Trip @").unwrap();

        // YYYY-MM-DD HH:MM:SS
        assert_eq!(date.len(), 19);
        assert_eq!(&date[4..5], "-");
        assert_eq!(&date[10..11], " ");
    }

    #[test]
    fn unresolved_album_fails_the_upload() {
        let dir = ScratchDir::new("upload-no-album");
        let files = vec![dir.touch("a.jpg")];
        let mut library = FakeLibrary::new();
        library.fail_listing = true;

        assert!(upload_photos(&mut library, &files, "Trip", &no_description()).is_err());
        assert!(library.uploads.is_empty());
    }

    #[test]
    fn each_subdirectory_becomes_one_album() {
        let dir = ScratchDir::new("mapper");
        dir.touch("A/one.jpg");
        dir.touch("B/two.png");
        dir.touch("C/notes.txt");

        let plans = plan_albums(dir.path(), None).unwrap();

        assert_eq!(
            plans.iter().map(|plan| plan.name.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );

        let mut library = FakeLibrary::new();
        let summary = upload_albums(&mut library, &plans, &no_description());

        assert_eq!(summary.uploaded, 2);
        assert_eq!(library.created_albums, vec!["A", "B"]);
        assert_eq!(library.uploads, vec!["one.jpg", "two.png"]);
    }

    #[test]
    fn mapper_reports_unresolved_albums() {
        let dir = ScratchDir::new("mapper-fail");
        dir.touch("A/one.jpg");

        let plans = plan_albums(dir.path(), None).unwrap();

        let mut library = FakeLibrary::new();
        library.fail_listing = true;

        let summary = upload_albums(&mut library, &plans, &no_description());

        assert_eq!(summary.failed_albums, 1);
        assert_eq!(summary.uploaded, 0);
    }

    #[test]
    fn mapper_keeps_counting_after_a_failed_album() {
        let dir = ScratchDir::new("mapper-partial");
        dir.touch("A/one.jpg");
        dir.touch("B/two.jpg");
        dir.touch("C/three.jpg");
        dir.touch("C/four.jpg");

        let plans = plan_albums(dir.path(), None).unwrap();

        let mut library = FakeLibrary::new();
        library.rejected_albums.insert("B".to_owned());

        let summary = upload_albums(&mut library, &plans, &no_description());

        assert_eq!(
            summary,
            UploadSummary {
                uploaded: 3,
                skipped: 0,
                failed: 0,
                failed_albums: 1,
            }
        );
        assert_eq!(library.created_albums, vec!["A", "C"]);
        assert_eq!(library.uploads, vec!["one.jpg", "four.jpg", "three.jpg"]);
    }

    #[test]
    fn earliest_timestamp_is_formatted() {
        let dir = ScratchDir::new("timestamp");
        let file = dir.touch("a.jpg");

        let date = earliest_timestamp(&file).unwrap();

        assert!(date.starts_with("20"));
        assert_eq!(date.len(), 19);
    }
}
