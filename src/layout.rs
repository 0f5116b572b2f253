//! Where each field of an entry is shown on the detail page.
//!
//! The detail view has two panes. Every category has a table saying which
//! pane a field goes to and how it is rendered; the built-in tables can be
//! replaced per category from a JSON file:
//!
//! ```json
//! { "plants": { "facts": { "pane": "left", "render": "facts" } } }
//! ```

use crate::models::Category;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pane {
    Left,
    Right,
}

impl Pane {
    pub fn index(&self) -> usize {
        match self {
            Pane::Left => 0,
            Pane::Right => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Render {
    /// Translated value, or the subkeys of a plain object flattened into the pane.
    Text,
    /// `{ text, isQuote: true }`
    Quote,
    /// Ordered `[{ label, value }]` pairs.
    Facts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FieldRule {
    pub pane: Pane,
    #[serde(default = "default_render")]
    pub render: Render,
}

fn default_render() -> Render {
    Render::Text
}

impl FieldRule {
    const fn new(pane: Pane, render: Render) -> Self {
        Self { pane, render }
    }
}

/// Field rules of one category.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    rules: HashMap<String, FieldRule>,
}

impl Layout {
    fn from_rules(rules: &[(&str, Pane, Render)]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|(field, pane, render)| (field.to_string(), FieldRule::new(*pane, *render)))
                .collect(),
        }
    }

    pub fn rule(&self, field: &str) -> Option<FieldRule> {
        self.rules.get(field).copied()
    }

    /// Built-in layout of `category`.
    pub fn default_for(category: Category) -> Self {
        use Pane::{Left, Right};
        use Render::{Facts, Quote, Text};

        match category {
            Category::Plants => Self::from_rules(&[
                ("facts", Left, Facts),
                ("keyConstituents", Right, Text),
                ("article", Right, Text),
                ("recommendations", Right, Text),
                ("anecdote", Right, Quote),
            ]),
            Category::Oils => Self::from_rules(&[
                ("character", Left, Text),
                ("applications", Left, Text),
                ("constituents", Right, Text),
                ("properties", Right, Text),
                ("healthBenefits", Right, Text),
                ("dosage", Right, Text),
                ("safety", Right, Text),
                ("recommendations", Right, Text),
                ("sustainability", Right, Quote),
            ]),
            Category::BasicOils => Self::from_rules(&[
                ("dryness", Left, Text),
                ("suitableForSkinTypes", Left, Text),
                ("storageAndShelfLife", Left, Text),
                ("keyConstituents", Right, Text),
                ("fattyAcidProfile", Right, Text),
                ("skinBenefits", Right, Text),
                ("ecologicalFootprint", Right, Text),
                ("safety", Right, Text),
                ("oilCombinations", Right, Text),
                ("recommendations", Right, Text),
            ]),
        }
    }
}

/// Layouts for every category.
#[derive(Debug, Clone)]
pub struct LayoutTable {
    plants: Layout,
    oils: Layout,
    basic_oils: Layout,
}

/// Shape of the override file; categories left out keep their defaults.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutFile {
    plants: Option<Layout>,
    oils: Option<Layout>,
    basic_oils: Option<Layout>,
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self {
            plants: Layout::default_for(Category::Plants),
            oils: Layout::default_for(Category::Oils),
            basic_oils: Layout::default_for(Category::BasicOils),
        }
    }
}

impl LayoutTable {
    pub fn get(&self, category: Category) -> &Layout {
        match category {
            Category::Plants => &self.plants,
            Category::Oils => &self.oils,
            Category::BasicOils => &self.basic_oils,
        }
    }

    /// Parse an override document on top of the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: LayoutFile = serde_json::from_str(json).context("Invalid layout JSON")?;
        let mut table = Self::default();
        if let Some(layout) = file.plants {
            table.plants = layout;
        }
        if let Some(layout) = file.oils {
            table.oils = layout;
        }
        if let Some(layout) = file.basic_oils {
            table.basic_oils = layout;
        }
        Ok(table)
    }

    /// Load the override file, or the defaults when no path is configured.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout file {}", path.display()))?;
        let table = Self::from_json(&json)
            .with_context(|| format!("Failed to parse layout file {}", path.display()))?;

        info!("Loaded presentation layout from {}", path.display());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_plant_rules() {
        let layout = Layout::default_for(Category::Plants);
        assert_eq!(layout.rule("facts"), Some(FieldRule::new(Pane::Left, Render::Facts)));
        assert_eq!(layout.rule("anecdote"), Some(FieldRule::new(Pane::Right, Render::Quote)));
        assert_eq!(layout.rule("article").map(|r| r.pane), Some(Pane::Right));
        assert_eq!(layout.rule("name"), None);
    }

    #[test]
    fn test_default_oil_rules() {
        let layout = Layout::default_for(Category::Oils);
        assert_eq!(layout.rule("character").map(|r| r.pane), Some(Pane::Left));
        assert_eq!(layout.rule("sustainability").map(|r| r.render), Some(Render::Quote));
        assert_eq!(layout.rule("facts"), None);
    }

    #[test]
    fn test_default_basic_oil_rules() {
        let layout = Layout::default_for(Category::BasicOils);
        assert_eq!(layout.rule("storageAndShelfLife").map(|r| r.pane), Some(Pane::Left));
        assert_eq!(layout.rule("oilCombinations").map(|r| r.pane), Some(Pane::Right));
    }

    #[test]
    fn test_override_replaces_only_named_category() {
        let table = LayoutTable::from_json(r#"{ "oils": { "character": { "pane": "right" } } }"#)
            .expect("valid layout");

        let oils = table.get(Category::Oils);
        assert_eq!(oils.rule("character"), Some(FieldRule::new(Pane::Right, Render::Text)));
        assert_eq!(oils.rule("applications"), None);

        assert_eq!(table.get(Category::Plants), &Layout::default_for(Category::Plants));
    }

    #[test]
    fn test_override_rejects_unknown_category() {
        assert!(LayoutTable::from_json(r#"{ "trees": {} }"#).is_err());
    }

    #[test]
    fn test_override_rejects_unknown_pane() {
        let result = LayoutTable::from_json(r#"{ "plants": { "facts": { "pane": "middle" } } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let table = LayoutTable::load(None).expect("defaults");
        assert_eq!(table.get(Category::BasicOils), &Layout::default_for(Category::BasicOils));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "plants": {{ "anecdote": {{ "pane": "left", "render": "quote" }} }} }}"#)
            .expect("write");

        let table = LayoutTable::load(Some(file.path())).expect("load");
        assert_eq!(
            table.get(Category::Plants).rule("anecdote"),
            Some(FieldRule::new(Pane::Left, Render::Quote))
        );
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = LayoutTable::load(Some(Path::new("/nonexistent/layout.json")));
        assert!(result.is_err());
    }
}
