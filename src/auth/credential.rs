use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Authorized user credential, as persisted in the token file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Credential {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub token_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl Credential {
    pub fn decode(input: &str) -> Result<Self> {
        let credential = serde_json::from_str::<Self>(input)
            .context("Error loading auth tokens - Incorrect format")?;

        for (field, value) in [
            ("refresh_token", &credential.refresh_token),
            ("client_id", &credential.client_id),
            ("client_secret", &credential.client_secret),
        ] {
            if value.is_none() {
                bail!("Error loading auth tokens - Incorrect format (missing '{field}')");
            }
        }

        Ok(credential)
    }

    pub fn load_from_disk(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Error opening auth token file: {}", path.display()))?;

        Self::decode(&content)
    }

    pub fn save_to_disk(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create token directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize auth tokens")?;

        fs::write(path, format!("{json}\n"))
            .with_context(|| format!("Failed to write auth token file: {}", path.display()))
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(GOOGLE_TOKEN_URI)
    }
}
