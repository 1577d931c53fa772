use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Optional settings file; command-line arguments take precedence
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub client_id_file: Option<PathBuf>,
    pub token_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub exclude: Option<String>,
    pub describe_uploads: Option<bool>,
}

impl Config {
    pub fn decode(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Failed to decode config file")
    }

    pub fn load_from_disk(path: &Path) -> Result<Self> {
        let config = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::decode(&config)
    }
}
