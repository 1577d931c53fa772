mod credential;
mod flow;
mod session;

#[cfg(test)]
pub mod testing;

pub use credential::Credential;
pub use session::Session;

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::{debug, success};

pub static SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/photoslibrary",
    "https://www.googleapis.com/auth/photoslibrary.sharing",
    "https://www.googleapis.com/auth/photoslibrary.edit.appcreateddata",
];

/// Load the saved credential, or run the authorization flow and save its result
pub fn authorized_session(client_id_file: &Path, token_file: &Path) -> Result<Session> {
    match Credential::load_from_disk(token_file) {
        Ok(credential) => return Session::new(credential, None),
        Err(err) => debug!("{:#}", err),
    }

    let (credential, expires_in) =
        flow::authorize(client_id_file).context("Could not create auth tokens")?;

    credential
        .save_to_disk(token_file)
        .context("Could not save auth tokens")?;

    success!(
        "Auth tokens saved to: {}",
        token_file.display().to_string().bright_magenta()
    );

    Session::new(credential, expires_in)
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    id_token: Option<String>,
    /// Space-separated
    scope: Option<String>,
}

#[derive(Deserialize)]
struct TokenError {
    error: String,
    error_description: Option<String>,
}

fn request_token(http: &Client, token_uri: &str, form: &[(&str, &str)]) -> Result<TokenResponse> {
    let res = http
        .post(token_uri)
        .form(form)
        .send()
        .with_context(|| format!("Could not send post request to '{token_uri}'"))?;

    let status = res.status();
    let body = res.text().context("Failed to read the token endpoint's response")?;

    if !status.is_success() {
        match serde_json::from_str::<TokenError>(&body) {
            Ok(TokenError {
                error,
                error_description,
            }) => bail!(
                "Token endpoint returned {}: {}{}",
                status,
                error.bright_yellow(),
                error_description
                    .map(|desc| format!(" ({desc})"))
                    .unwrap_or_default()
            ),
            Err(_) => bail!("Token endpoint returned {status}: {body}"),
        }
    }

    serde_json::from_str(&body).context("Failed to decode the token endpoint's response")
}
