#![forbid(unsafe_code)]
#![forbid(unused_must_use)]

mod auth;
mod cmd;
mod config;
mod files;
mod list;
mod photos;
mod upload;
mod utils;

use std::{io, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use dirs::config_dir;
use inquire::Confirm;

use self::{
    auth::authorized_session,
    cmd::{Action, Cmd, Invocation},
    config::Config,
    files::expand_paths,
    list::{print_album_content, print_albums},
    upload::{plan_albums, upload_albums, upload_photos, UploadOptions, UploadSummary},
};

fn main() {
    if let Err(err) = inner_main() {
        error_anyhow!(err);
        std::process::exit(1);
    }
}

fn inner_main() -> Result<()> {
    let args = Cmd::parse();

    let data_dir = config_dir()
        .context("Failed to determine path to the configuration directory")?
        .join(env!("CARGO_PKG_NAME"));

    let config = match &args.config_file {
        Some(path) => {
            if !path.is_file() {
                bail!("Config file was not found at: {}", path.display());
            }

            Config::load_from_disk(path)?
        }

        None => {
            let default_path = data_dir.join("config.json");

            if default_path.is_file() {
                Config::load_from_disk(&default_path)?
            } else {
                Config::default()
            }
        }
    };

    let log_file: Option<PathBuf> = args.log_file.clone().or_else(|| config.log_file.clone());

    utils::logging::init(log_file.as_deref(), args.verbose)?;

    let Invocation {
        action,
        client_id_file,
        token_file,
        exclude,
        describe,
        assume_yes,
    } = args.validate(&config, &data_dir)?;

    let mut session = authorized_session(&client_id_file, &token_file)?;

    let options = UploadOptions { describe };

    match action {
        Action::Authorize => {
            success!("Auth token exists and seems valid.");
        }

        Action::ListAlbums => {
            print_albums(&mut session, &mut io::stdout().lock())?;
        }

        Action::ListAlbumContent { album } => {
            print_album_content(&mut session, &album, &mut io::stdout().lock())?;
        }

        Action::UploadFiles { album, paths } => {
            let files = expand_paths(&paths, exclude.as_ref());

            if files.is_empty() {
                warn!("No media file to upload.");
                return Ok(());
            }

            let summary = upload_photos(&mut session, &files, &album, &options)?;
            display_summary(summary);
        }

        Action::UploadTree { root } => {
            let plans = plan_albums(&root, exclude.as_ref())?;

            if plans.is_empty() {
                warn!("No media file found in the subdirectories of: {}", root.display());
                return Ok(());
            }

            info!(
                "Found {} album(s) to upload:",
                plans.len().to_string().bright_yellow()
            );

            for plan in &plans {
                info!(
                    "| {} ({} file(s))",
                    plan.name.bright_magenta(),
                    plan.files.len().to_string().bright_yellow()
                );
            }

            if !assume_yes {
                let ans = Confirm::new("Do you want to continue?")
                    .with_default(true)
                    .prompt()
                    .context("Failed to setup or retrieve confirmation prompt")?;

                if !ans {
                    warn!("Aborting upload.");
                    return Ok(());
                }
            }

            let summary = upload_albums(&mut session, &plans, &options);
            display_summary(summary);

            if summary.failed_albums > 0 {
                bail!(
                    "Failed to upload into {} album(s)",
                    summary.failed_albums
                );
            }
        }
    }

    Ok(())
}

fn display_summary(summary: UploadSummary) {
    let UploadSummary {
        uploaded,
        skipped,
        failed,
        failed_albums,
    } = summary;

    let message = format!(
        "Done! {} uploaded, {} skipped, {} failed.",
        uploaded.to_string().bright_yellow(),
        skipped.to_string().bright_yellow(),
        failed.to_string().bright_yellow()
    );

    if failed_albums > 0 {
        warn!(
            "{} ({} album(s) could not be found nor created)",
            message,
            failed_albums.to_string().bright_yellow()
        );
    } else if failed > 0 {
        warn!("{}", message);
    } else {
        success!("{}", message);
    }
}
