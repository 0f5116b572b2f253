//! Bulk import of a whole category.
//!
//! Accepts either documents already in the stored (nested, per-language)
//! shape, or the flat export format in which every text is Dutch and the
//! page sections sit in a `data` array:
//!
//! ```json
//! { "id": "urtica", "name": "Brandnetel", "img": { "src": "..", "alt": ".." },
//!   "data": [ { "facts": { "usedParts": "Blad", .. } }, { "anecdote": { "text": ".." } } ] }
//! ```

use crate::error::ImportError;
use crate::i18n::Language;
use crate::models::{Category, Entry};
use crate::projection::is_metadata_key;
use crate::store::DocumentStore;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{info, warn};

/// Sections whose value is `{ text, .. }` in the export.
const QUOTE_SECTIONS: [&str; 2] = ["anecdote", "sustainability"];

/// Validate, normalize and store `payload`, replacing the whole category.
/// Returns the number of documents inserted.
pub async fn import(
    store: &dyn DocumentStore,
    category: Category,
    payload: Value,
) -> Result<usize, ImportError> {
    let documents = prepare(category, payload)?;
    let inserted = store.replace_all(category, &documents).await?;
    info!("Imported {} {} entries", inserted, category);
    Ok(inserted)
}

/// Everything but the write: shape checks, dedupe, normalization, validation.
pub fn prepare(category: Category, payload: Value) -> Result<Vec<Map<String, Value>>, ImportError> {
    let items = match payload {
        Value::Array(items) if !items.is_empty() => items,
        _ => return Err(ImportError::NoData),
    };

    let received = items.len();
    let unique = dedupe(items);
    if unique.len() < received {
        warn!(
            "Dropped {} {} entries without an id or with a repeated id",
            received - unique.len(),
            category
        );
    }

    unique
        .into_iter()
        .map(|item| {
            let mut document = if is_flat_export(&item) {
                from_flat_export(&item)
            } else {
                item
            };
            strip_metadata(&mut document);

            Entry::parse(category, &document).map_err(|source| ImportError::Invalid {
                id: document_id(&document).to_string(),
                source,
            })?;
            Ok(document)
        })
        .collect()
}

fn document_id(item: &Map<String, Value>) -> &str {
    item.get("id").and_then(Value::as_str).unwrap_or_default()
}

/// Keep the first object for every non-empty id; drop everything else.
fn dedupe(items: Vec<Value>) -> Vec<Map<String, Value>> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .filter(|item| {
            let id = document_id(item);
            !id.is_empty() && seen.insert(id.to_string())
        })
        .collect()
}

fn is_flat_export(item: &Map<String, Value>) -> bool {
    matches!(item.get("data"), Some(Value::Array(_)))
}

fn dutch(value: Value) -> Value {
    let mut wrapper = Map::new();
    wrapper.insert(Language::Nl.code().to_string(), value);
    Value::Object(wrapper)
}

fn dutch_fields(section: &Value, fields: &[&str]) -> Value {
    let mut out = Map::new();
    for field in fields {
        let value = section.get(field).cloned().unwrap_or(Value::Null);
        out.insert(field.to_string(), dutch(value));
    }
    Value::Object(out)
}

fn copy(from: &Map<String, Value>, to: &mut Map<String, Value>, key: &str, wrap: bool) {
    if let Some(value) = from.get(key) {
        let value = if wrap { dutch(value.clone()) } else { value.clone() };
        to.insert(key.to_string(), value);
    }
}

/// Convert a flat export item into the stored shape.
fn from_flat_export(item: &Map<String, Value>) -> Map<String, Value> {
    let mut document = Map::new();

    copy(item, &mut document, "id", false);
    copy(item, &mut document, "name", true);
    copy(item, &mut document, "scientificName", false);
    if let Some(img) = item.get("img") {
        let mut image = Map::new();
        image.insert(
            "src".to_string(),
            img.get("src").cloned().unwrap_or(Value::Null),
        );
        image.insert(
            "alt".to_string(),
            dutch(img.get("alt").cloned().unwrap_or(Value::Null)),
        );
        document.insert("img".to_string(), Value::Object(image));
    }
    copy(item, &mut document, "description", true);
    copy(item, &mut document, "isPremium", false);

    let sections = item
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for section in sections.iter().filter_map(Value::as_object) {
        for (key, value) in section {
            let converted = match key.as_str() {
                "relatedPlants" => {
                    let recommendations = document
                        .entry("recommendations")
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(recommendations) = recommendations {
                        recommendations.insert("related".to_string(), value.clone());
                    }
                    continue;
                }
                "facts" => dutch_fields(value, &["usedParts", "origin", "growth"]),
                "article" => dutch_fields(value, &["applications", "usage", "contraindications"]),
                quote if QUOTE_SECTIONS.contains(&quote) => {
                    dutch(value.get("text").cloned().unwrap_or_else(|| value.clone()))
                }
                _ => dutch(value.clone()),
            };
            document.insert(key.clone(), converted);
        }
    }

    document
}

/// Remove `_`-prefixed keys at every level.
fn strip_metadata(document: &mut Map<String, Value>) {
    document.retain(|key, _| !is_metadata_key(key));
    for value in document.values_mut() {
        if let Value::Object(nested) = value {
            strip_metadata(nested);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::fixtures::{basic_oil, dutch_plant};
    use crate::store::MemoryDocumentStore;
    use serde_json::json;

    fn flat_plant() -> Value {
        json!({
            "id": "brandnetel",
            "name": "Brandnetel",
            "scientificName": "Urtica dioica",
            "img": { "src": "/img/urtica.jpg", "alt": "Brandnetel in bloei" },
            "description": "Een stekelige plant.",
            "isPremium": false,
            "data": [
                { "facts": { "usedParts": "Blad", "origin": "Europa", "growth": "Wild" } },
                { "keyConstituents": ["Mierenzuur"] },
                { "article": { "applications": ["Thee"], "usage": ["Dagelijks"], "contraindications": [] } },
                { "anecdote": { "text": "Vroeger geweven.", "author": "x" } },
                { "relatedPlants": ["kamille"] }
            ]
        })
    }

    // ==================== prepare Tests ====================

    #[test]
    fn test_prepare_rejects_empty_and_non_array() {
        assert!(matches!(
            prepare(Category::Plants, json!([])),
            Err(ImportError::NoData)
        ));
        assert!(matches!(
            prepare(Category::Plants, json!({ "id": "x" })),
            Err(ImportError::NoData)
        ));
    }

    #[test]
    fn test_prepare_first_duplicate_wins() {
        let mut second = dutch_plant();
        second.insert("name".into(), json!({ "nl": "Tweede" }));

        let docs = prepare(
            Category::Plants,
            json!([dutch_plant(), second, { "name": "no id" }, 42]),
        )
        .expect("valid");

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["name"], json!({ "nl": "Brandnetel" }));
    }

    #[test]
    fn test_prepare_converts_flat_export() {
        let docs = prepare(Category::Plants, json!([flat_plant()])).expect("valid");
        let doc = &docs[0];

        assert_eq!(doc["name"], json!({ "nl": "Brandnetel" }));
        assert_eq!(doc["img"], json!({ "src": "/img/urtica.jpg", "alt": { "nl": "Brandnetel in bloei" } }));
        assert_eq!(doc["facts"]["origin"], json!({ "nl": "Europa" }));
        assert_eq!(doc["article"]["usage"], json!({ "nl": ["Dagelijks"] }));
        assert_eq!(doc["article"]["applications"], json!({ "nl": ["Thee"] }));
        assert_eq!(doc["anecdote"], json!({ "nl": "Vroeger geweven." }));
        assert_eq!(doc["keyConstituents"], json!({ "nl": ["Mierenzuur"] }));
        assert_eq!(doc["recommendations"], json!({ "related": ["kamille"] }));
        assert!(!doc.contains_key("data"));
    }

    #[test]
    fn test_prepare_strips_metadata_keys() {
        let mut plant = dutch_plant();
        plant.insert("_id".into(), json!("5f2a"));
        plant.insert("__v".into(), json!(0));
        if let Some(Value::Object(facts)) = plant.get_mut("facts") {
            facts.insert("_note".into(), json!("internal"));
        }

        let docs = prepare(Category::Plants, json!([plant])).expect("valid");
        assert!(!docs[0].contains_key("_id"));
        assert!(!docs[0].contains_key("__v"));
        assert!(!docs[0]["facts"].as_object().expect("facts").contains_key("_note"));
    }

    #[test]
    fn test_prepare_reports_invalid_entry_id() {
        let mut plant = dutch_plant();
        plant.remove("facts");

        match prepare(Category::Plants, json!([plant])) {
            Err(ImportError::Invalid { id, .. }) => assert_eq!(id, "brandnetel"),
            other => panic!("expected invalid entry, got {:?}", other),
        }
    }

    #[test]
    fn test_prepare_checks_category_shape() {
        let result = prepare(Category::BasicOils, json!([dutch_plant()]));
        assert!(matches!(result, Err(ImportError::Invalid { .. })));

        prepare(Category::BasicOils, json!([basic_oil()])).expect("basic oil is valid");
    }

    // ==================== import Tests ====================

    #[tokio::test]
    async fn test_import_replaces_category() {
        let store = MemoryDocumentStore::new();
        let inserted = import(&store, Category::Plants, json!([flat_plant()]))
            .await
            .expect("import");
        assert_eq!(inserted, 1);

        let inserted = import(&store, Category::Plants, json!([dutch_plant()]))
            .await
            .expect("import");
        assert_eq!(inserted, 1);

        let docs = store.list(Category::Plants).await.expect("list");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].body["anecdote"], dutch_plant()["anecdote"]);
    }

    #[tokio::test]
    async fn test_import_duplicate_scientific_name() {
        let store = MemoryDocumentStore::new();
        let mut twin = dutch_plant();
        twin.insert("id".into(), json!("twin"));

        let result = import(&store, Category::Plants, json!([dutch_plant(), twin])).await;
        assert!(matches!(
            result,
            Err(ImportError::Store(StoreError::Duplicate(_)))
        ));
    }
}
