use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;
use regex::Regex;

use crate::{config::Config, utils::regex::compile_exclusion, warn};

#[derive(Parser)]
#[clap(
    version,
    about = "Upload photos to Google Photos, mirroring a directory structure as albums",
    after_help = "\
Run first with '--auth' to create the auth token from the client ID file
downloaded from the Google Cloud console. The token is saved and '--auth' is
not needed any more.

Examples:
      Create auth token: gphotoup --auth --clientid client_id.json
         Upload a photo: gphotoup --up --album myalbum myphoto.jpeg
  Upload a folder tree: gphotoup --up --path ~/Pictures/albums
        List all albums: gphotoup --ls
    List items in album: gphotoup --ls --album myalbum"
)]
pub struct Cmd {
    #[clap(
        long = "auth",
        help = "Create the authentication token if it does not exist, or try to load it and exit"
    )]
    pub create_auth: bool,

    #[clap(long = "up", help = "Upload photos")]
    pub run_upload: bool,

    #[clap(
        long = "ls",
        help = "List all albums, or the items of an album when combined with '--album'"
    )]
    pub albums_list: bool,

    #[clap(
        long = "clientid",
        value_name = "CLIENT_ID_FILE",
        help = "File where the client ID and secret are stored, used with '--auth'"
    )]
    pub client_id_file: Option<String>,

    #[clap(
        long = "token",
        value_name = "TOKEN_FILE",
        help = "File where the authentication token is stored"
    )]
    pub token_file: Option<String>,

    #[clap(
        long = "album",
        value_name = "ALBUM_NAME",
        help = "Album to upload into (created if it doesn't exist) or to list"
    )]
    pub album_name: Option<String>,

    #[clap(
        long = "path",
        value_name = "ROOT_FOLDER",
        help = "Upload each subdirectory of this folder as an album named after it"
    )]
    pub root_folder: Option<PathBuf>,

    #[clap(
        long,
        value_name = "REGEX",
        help = "Skip files whose path matches this regex (case-insensitive)"
    )]
    pub exclude: Option<String>,

    #[clap(long = "log", value_name = "LOG_FILE", help = "Also write log messages to this file")]
    pub log_file: Option<PathBuf>,

    #[clap(
        long,
        help = "Don't write the file's date into the description of uploaded items"
    )]
    pub no_description: bool,

    #[clap(short, long, help = "Don't ask for confirmation before uploading a folder tree")]
    pub yes: bool,

    #[clap(short, long, help = "Display debug messages")]
    pub verbose: bool,

    #[clap(long = "config", value_name = "CONFIG_FILE", help = "Path to the configuration file")]
    pub config_file: Option<PathBuf>,

    #[clap(value_name = "PHOTO", help = "Photos (or folders of photos) to upload")]
    pub photos: Vec<String>,
}

pub enum Action {
    Authorize,
    ListAlbums,
    ListAlbumContent { album: String },
    UploadFiles { album: String, paths: Vec<PathBuf> },
    UploadTree { root: PathBuf },
}

/// Validated command line
pub struct Invocation {
    pub action: Action,
    pub client_id_file: PathBuf,
    pub token_file: PathBuf,
    pub exclude: Option<Regex>,
    pub describe: bool,
    pub assume_yes: bool,
}

impl Cmd {
    /// Check the arguments' consistency, before anything is sent to the server
    pub fn validate(self, config: &Config, data_dir: &Path) -> Result<Invocation> {
        let actions = [self.create_auth, self.albums_list, self.run_upload]
            .into_iter()
            .filter(|enabled| *enabled)
            .count();

        match actions {
            0 => bail!("Run '{} -h' for help.", env!("CARGO_PKG_NAME")),
            1 => {}
            _ => bail!("Multiple actions specified"),
        }

        let client_id_file = match &self.client_id_file {
            None => config
                .client_id_file
                .clone()
                .unwrap_or_else(|| data_dir.join("client_id.json")),

            Some(path) if path.is_empty() => {
                bail!("argument 'clientid': expected non empty argument")
            }

            Some(path) => {
                if !self.create_auth {
                    warn!("Warning: argument 'clientid' is only used with 'auth'");
                }

                PathBuf::from(path)
            }
        };

        if self.create_auth && !client_id_file.is_file() {
            bail!("No such file: {}", client_id_file.display());
        }

        let token_file = match &self.token_file {
            None => config
                .token_file
                .clone()
                .unwrap_or_else(|| data_dir.join("token.json")),

            Some(path) if path.is_empty() => {
                bail!("argument 'token': expected non empty argument")
            }

            Some(path) => PathBuf::from(path),
        };

        if !self.create_auth && !token_file.exists() {
            bail!(
                "No such file: {} (run with '{}' first)",
                token_file.display(),
                "--auth".bright_yellow()
            );
        }

        let exclude = self
            .exclude
            .as_deref()
            .or(config.exclude.as_deref())
            .map(compile_exclusion)
            .transpose()?;

        let action = if self.create_auth {
            Action::Authorize
        } else if self.albums_list {
            match self.album_name {
                None => Action::ListAlbums,
                Some(album) if album.is_empty() => {
                    bail!("argument 'album': expected non empty argument")
                }
                Some(album) => Action::ListAlbumContent { album },
            }
        } else {
            self.validate_upload()?
        };

        Ok(Invocation {
            action,
            client_id_file,
            token_file,
            exclude,
            describe: !self.no_description && config.describe_uploads.unwrap_or(true),
            assume_yes: self.yes,
        })
    }

    fn validate_upload(&self) -> Result<Action> {
        if let Some(root) = &self.root_folder {
            if self.album_name.is_some() {
                bail!("argument 'album': cannot be combined with 'path', albums are named after the subdirectories");
            }

            if !self.photos.is_empty() {
                bail!("argument 'photos': cannot be combined with 'path'");
            }

            if !root.is_dir() {
                bail!("No such directory: {}", root.display());
            }

            return Ok(Action::UploadTree { root: root.clone() });
        }

        let album = match &self.album_name {
            None => bail!("argument 'album': expected for upload"),
            Some(album) if album.is_empty() => {
                bail!("argument 'album': expected non empty argument for upload")
            }
            Some(album) => album.clone(),
        };

        if self.photos.is_empty() {
            bail!("argument 'photos': expected for upload");
        }

        let mut paths = Vec::with_capacity(self.photos.len());

        for photo in &self.photos {
            if photo.is_empty() {
                bail!("argument 'photos': expected non empty argument for upload");
            }

            let path = PathBuf::from(photo);

            if !path.exists() {
                bail!("No such file: {}", path.display());
            }

            paths.push(path);
        }

        Ok(Action::UploadFiles { album, paths })
    }
}
