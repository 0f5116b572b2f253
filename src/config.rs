use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::translation::DEFAULT_TRANSLATE_URL;

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_url: String,

    // HTTP
    pub port: u16,
    pub accepted_origins: Vec<String>,

    // Translation
    pub translate_url: String,
    pub translation_timeout: Duration,

    // Files
    pub content_dir: PathBuf,
    pub name_overrides_file: Option<PathBuf>,
    pub layout_file: Option<PathBuf>,

    // Import
    pub import_api_key: Option<String>,
}

/// Non-empty value of an environment variable.
fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Storage
            database_url: var("DATABASE_URL").context("DATABASE_URL not set")?,

            // HTTP
            port: match var("PORT") {
                Some(port) => port.parse().context("PORT must be a valid port number")?,
                None => 5000,
            },
            accepted_origins: var("ACCEPTED_ORIGINS")
                .or_else(|| var("ACCEPTED_URI"))
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),

            // Translation
            translate_url: var("TRANSLATE_URL")
                .unwrap_or_else(|| DEFAULT_TRANSLATE_URL.to_string()),
            translation_timeout: Duration::from_secs(
                var("TRANSLATION_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(20),
            ),

            // Files
            content_dir: var("CONTENT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            name_overrides_file: var("NAME_OVERRIDES_FILE").map(PathBuf::from),
            layout_file: var("LAYOUT_FILE").map(PathBuf::from),

            // Import
            import_api_key: var("IMPORT_API_KEY"),
        })
    }
}
