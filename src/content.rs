//! Static per-language page content.
//!
//! Each storefront language has a `{code}.content.json` file of the form
//! `{ "config": {..}, "data": { "<component>": {..}, .. } }`; clients ask
//! for the components they render.

use crate::error::{ApiError, ContentError};
use crate::i18n::Language;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use tracing::debug;

/// Storefront code used when the request names none.
pub const DEFAULT_CONTENT_LANG: &str = "com";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentResponse {
    pub config: Value,
    pub data: Map<String, Value>,
}

/// Split a `components` query value into trimmed, non-empty names.
pub fn parse_components(raw: Option<&str>) -> Result<Vec<String>, ApiError> {
    let components: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|component| !component.is_empty())
        .map(str::to_string)
        .collect();

    if components.is_empty() {
        return Err(ApiError::BadRequest(
            "Missing 'lang' or 'components' parameter.".to_string(),
        ));
    }
    Ok(components)
}

#[derive(Debug, Clone)]
pub struct ContentStore {
    dir: PathBuf,
}

impl ContentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File for a storefront code. The code goes through the language
    /// resolver, so only the three known file names can ever be produced.
    pub fn path_for(&self, lang: &str) -> PathBuf {
        let language = Language::resolve(lang);
        self.dir.join(format!("{}.content.json", language.code()))
    }

    /// Load the requested components for `lang`.
    ///
    /// Components missing from the file are left out. Without a `config`
    /// block in the file, `{ "lang": <lang as requested> }` is returned.
    pub async fn load(&self, lang: &str, components: &[String]) -> Result<ContentResponse, ContentError> {
        let path = self.path_for(lang);
        let shown = path.display().to_string();
        debug!("Reading content file {}", shown);

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ContentError::Read {
                path: shown.clone(),
                source,
            })?;
        let parsed: Value = serde_json::from_str(&raw).map_err(|source| ContentError::Parse {
            path: shown,
            source,
        })?;

        let mut data = Map::new();
        for component in components {
            match parsed.get("data").and_then(|data| data.get(component)) {
                Some(value) if !value.is_null() => {
                    data.insert(component.clone(), value.clone());
                }
                _ => {}
            }
        }

        let config = match parsed.get("config") {
            Some(config) if !config.is_null() => config.clone(),
            _ => json!({ "lang": lang }),
        };

        Ok(ContentResponse { config, data })
    }
}
