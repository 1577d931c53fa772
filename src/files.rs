use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use colored::Colorize;
use regex::Regex;
use walkdir::WalkDir;

use crate::{debug, utils::regex::MEDIA_FILE, warn};

/// Recursively list the media files under a directory, skipping the excluded ones
pub fn media_files_in(root: &Path, exclude: Option<&Regex>) -> Vec<PathBuf> {
    let mut files = vec![];

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry: {err}");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let path_str = path.to_string_lossy();

        if exclude.is_some_and(|exclude| exclude.is_match(&path_str)) {
            debug!("Excluded: {}", path_str);
            continue;
        }

        if MEDIA_FILE.is_match(&path_str) {
            files.push(entry.into_path());
        }
    }

    files
}

/// Expand directories into the media files they contain, keeping other paths as provided
pub fn expand_paths(paths: &[PathBuf], exclude: Option<&Regex>) -> Vec<PathBuf> {
    let mut files = vec![];

    for path in paths {
        if path.is_dir() {
            files.extend(media_files_in(path, exclude));
        } else {
            files.push(path.clone());
        }
    }

    files
}

/// List the names of the immediate subdirectories of a directory, sorted
pub fn subdirectories(root: &Path) -> Result<Vec<String>> {
    let mut dirs = vec![];

    for entry in fs::read_dir(root)
        .with_context(|| format!("Failed to read directory: {}", root.display()))?
    {
        let entry = entry.context("Failed to iterate over directory content")?;

        if !entry.path().is_dir() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => dirs.push(name),
            Err(name) => warn!(
                "Skipping directory with a non-UTF-8 name: {}",
                name.to_string_lossy().bright_magenta()
            ),
        }
    }

    dirs.sort();

    Ok(dirs)
}
