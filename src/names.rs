//! Display names keyed by scientific (latin) name.
//!
//! The list endpoint prefers these over the names stored in the documents.
//! File format:
//!
//! ```json
//! { "translations": [ { "la": "Urtica dioica", "nl": "Brandnetel", "en": "Nettle" } ] }
//! ```

use crate::i18n::Language;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
struct NameEntry {
    la: String,
    nl: Option<String>,
    en: Option<String>,
    sv: Option<String>,
}

impl NameEntry {
    fn get(&self, language: Language) -> Option<&str> {
        let name = match language {
            Language::Nl => self.nl.as_deref(),
            Language::En => self.en.as_deref(),
            Language::Sv => self.sv.as_deref(),
        };
        name.filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct NamesFile {
    translations: Vec<NameEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct NameOverrides {
    entries: Vec<NameEntry>,
}

impl NameOverrides {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: NamesFile = serde_json::from_str(json).context("Invalid name overrides JSON")?;
        Ok(Self {
            entries: file.translations,
        })
    }

    /// Load the override file, or an empty table when no path is configured.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read name overrides {}", path.display()))?;
        let names = Self::from_json(&json)
            .with_context(|| format!("Failed to parse name overrides {}", path.display()))?;

        info!("Loaded {} name overrides from {}", names.len(), path.display());
        Ok(names)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Override for `scientific_name` in `language`. The first entry whose
    /// latin name matches (ignoring case) decides.
    pub fn lookup(&self, scientific_name: &str, language: Language) -> Option<&str> {
        let wanted = scientific_name.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.la.to_lowercase() == wanted)
            .and_then(|entry| entry.get(language))
    }
}
