//! Typed shapes of the three encyclopedia collections.
//!
//! Documents travel through the pipeline as ordered JSON so that field order
//! survives storage and rendering. These structs are the schema they are
//! checked against: on import, and again after a translation was merged in,
//! before anything is written back.

use crate::i18n::{TranslatedList, TranslatedText};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An encyclopedia collection, as named in URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Plants,
    Oils,
    BasicOils,
}

/// Returned when a URL names a collection that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Category is invalid: {}", Category::valid_list())]
pub struct InvalidCategory(pub String);

impl Category {
    pub const ALL: [Category; 3] = [Category::Plants, Category::Oils, Category::BasicOils];

    /// Path segment used by the HTTP routes.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Plants => "plants",
            Category::Oils => "oils",
            Category::BasicOils => "basic_oils",
        }
    }

    /// Backing table in the document store.
    pub fn table(&self) -> &'static str {
        match self {
            Category::Plants => "plants",
            Category::Oils => "essential_oils",
            Category::BasicOils => "basic_oils",
        }
    }

    /// Comma separated list of valid slugs, for error messages.
    pub fn valid_list() -> String {
        Category::ALL
            .iter()
            .map(Category::slug)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = InvalidCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.slug() == s)
            .ok_or_else(|| InvalidCategory(s.to_string()))
    }
}

/// Why a document does not fit its collection's shape.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("document does not match the {category} schema: {source}")]
    Shape {
        category: Category,
        #[source]
        source: serde_json::Error,
    },

    #[error("field '{0}' needs a value in at least one language")]
    MissingTranslation(&'static str),
}

// ==================== Shared shapes ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: TranslatedText,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub related: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipes: Vec<String>,
}

// ==================== Plants ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facts {
    pub used_parts: TranslatedText,
    pub origin: TranslatedText,
    pub growth: TranslatedText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub applications: TranslatedList,
    pub usage: TranslatedList,
    pub contraindications: TranslatedList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub id: String,
    pub name: TranslatedText,
    pub scientific_name: String,
    pub img: Image,
    pub description: TranslatedText,
    pub key_constituents: TranslatedList,
    pub facts: Facts,
    pub article: Article,
    pub anecdote: TranslatedText,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub recommendations: Recommendations,
    /// Fields newer than this schema are carried along untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ==================== Essential oils ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssentialOil {
    pub id: String,
    pub name: TranslatedText,
    pub scientific_name: String,
    pub img: Image,
    pub description: TranslatedText,
    #[serde(default)]
    pub is_premium: bool,
    pub character: TranslatedText,
    pub applications: TranslatedText,
    pub constituents: TranslatedList,
    pub properties: TranslatedList,
    pub health_benefits: TranslatedList,
    pub dosage: TranslatedList,
    pub safety: TranslatedList,
    pub sustainability: TranslatedText,
    #[serde(default)]
    pub recommendations: Recommendations,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ==================== Basic oils ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicOil {
    pub id: String,
    pub name: TranslatedText,
    pub scientific_name: String,
    pub img: Image,
    pub description: TranslatedText,
    #[serde(default)]
    pub is_premium: bool,
    pub dryness: TranslatedText,
    pub suitable_for_skin_types: TranslatedText,
    pub storage_and_shelf_life: TranslatedText,
    pub key_constituents: TranslatedList,
    pub fatty_acid_profile: TranslatedList,
    pub skin_benefits: TranslatedList,
    pub ecological_footprint: TranslatedText,
    pub safety: TranslatedText,
    pub oil_combinations: TranslatedText,
    #[serde(default)]
    pub recommendations: Recommendations,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A document of any collection, in typed form.
#[derive(Debug, Clone)]
pub enum Entry {
    Plant(Box<Plant>),
    EssentialOil(Box<EssentialOil>),
    BasicOil(Box<BasicOil>),
}

impl Entry {
    /// Check a JSON document against the shape of `category`.
    ///
    /// Beyond the structural check, every required translatable text must
    /// have a value in at least one language.
    pub fn parse(category: Category, body: &Map<String, Value>) -> Result<Entry, ValidationError> {
        let value = Value::Object(body.clone());
        let shape = |source| ValidationError::Shape { category, source };

        let entry = match category {
            Category::Plants => Entry::Plant(Box::new(serde_json::from_value(value).map_err(shape)?)),
            Category::Oils => {
                Entry::EssentialOil(Box::new(serde_json::from_value(value).map_err(shape)?))
            }
            Category::BasicOils => {
                Entry::BasicOil(Box::new(serde_json::from_value(value).map_err(shape)?))
            }
        };

        entry.check_required_texts()?;
        Ok(entry)
    }

    fn required_texts(&self) -> Vec<(&'static str, &TranslatedText)> {
        match self {
            Entry::Plant(p) => vec![
                ("name", &p.name),
                ("description", &p.description),
                ("img.alt", &p.img.alt),
                ("facts.usedParts", &p.facts.used_parts),
                ("facts.origin", &p.facts.origin),
                ("facts.growth", &p.facts.growth),
                ("anecdote", &p.anecdote),
            ],
            Entry::EssentialOil(o) => vec![
                ("name", &o.name),
                ("description", &o.description),
                ("img.alt", &o.img.alt),
                ("character", &o.character),
                ("applications", &o.applications),
                ("sustainability", &o.sustainability),
            ],
            Entry::BasicOil(b) => vec![
                ("name", &b.name),
                ("description", &b.description),
                ("img.alt", &b.img.alt),
                ("dryness", &b.dryness),
                ("suitableForSkinTypes", &b.suitable_for_skin_types),
                ("storageAndShelfLife", &b.storage_and_shelf_life),
                ("ecologicalFootprint", &b.ecological_footprint),
                ("safety", &b.safety),
                ("oilCombinations", &b.oil_combinations),
            ],
        }
    }

    fn check_required_texts(&self) -> Result<(), ValidationError> {
        for (field, text) in self.required_texts() {
            if !text.has_any() {
                return Err(ValidationError::MissingTranslation(field));
            }
        }
        Ok(())
    }
}
