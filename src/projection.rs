//! Language projections of multilingual documents.
//!
//! A stored document nests translatable fields as `{ "nl": .., "en": .. }`
//! wrappers inside plain structural objects. A projection is the same tree
//! with every wrapper collapsed to the value of one language:
//!
//! ```text
//! document                                   projection (nl)
//! { "facts": { "origin": { "nl": "Europa",   { "facts": { "origin": "Europa" } }
//!                          "en": "Europe" } } }
//! ```
//!
//! [`extract`] goes from document to projection, [`assign`] re-wraps a
//! (translated) projection under one language, and [`merge`] folds that back
//! into the live document without touching any other language.

use crate::i18n::Language;
use serde_json::{Map, Value};

/// Keys starting with this prefix are storage metadata, never content.
const METADATA_PREFIX: char = '_';

pub(crate) fn is_metadata_key(key: &str) -> bool {
    key.starts_with(METADATA_PREFIX)
}

/// True when `value` is a per-language wrapper: a non-empty object whose
/// keys are all canonical language tags.
pub fn is_language_wrapper(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty() && map.keys().all(|key| Language::is_code(key)),
        _ => false,
    }
}

/// True for a non-empty string or a non-empty array.
fn is_present(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

/// Extract the projection of `document` for `language`.
///
/// Only fields that already have a value in `language` appear in the
/// result; structural containers are kept only when something below them
/// contributed. Scalars outside wrappers (ids, flags, image sources, bare
/// arrays such as related-item lists) are never copied. Returns `None` when
/// the document has nothing in `language`.
pub fn extract(document: &Map<String, Value>, language: Language) -> Option<Value> {
    extract_object(document, language).map(Value::Object)
}

fn extract_object(object: &Map<String, Value>, language: Language) -> Option<Map<String, Value>> {
    let mut projection = Map::new();

    for (key, value) in object {
        if is_metadata_key(key) {
            continue;
        }
        let Value::Object(child) = value else {
            continue;
        };

        if is_language_wrapper(value) {
            if let Some(leaf) = child.get(language.code()).filter(|leaf| is_present(leaf)) {
                projection.insert(key.clone(), leaf.clone());
            }
        } else if let Some(nested) = extract_object(child, language) {
            projection.insert(key.clone(), Value::Object(nested));
        }
    }

    (!projection.is_empty()).then_some(projection)
}

/// The part of `source` whose fields are missing from `target`.
///
/// Both arguments are projections of the same document. A field counts as
/// missing when its path is absent from `target`; nested containers recurse.
/// Returns `None` when `target` already covers everything `source` has.
pub fn missing(source: &Value, target: Option<&Value>) -> Option<Value> {
    let Value::Object(source) = source else {
        return None;
    };
    let target = target.and_then(Value::as_object);
    missing_object(source, target).map(Value::Object)
}

fn missing_object(
    source: &Map<String, Value>,
    target: Option<&Map<String, Value>>,
) -> Option<Map<String, Value>> {
    let mut gaps = Map::new();

    for (key, value) in source {
        let existing = target.and_then(|t| t.get(key));
        match (value, existing) {
            (Value::Object(nested), existing) => {
                if let Some(sub) = missing_object(nested, existing.and_then(Value::as_object)) {
                    gaps.insert(key.clone(), Value::Object(sub));
                }
            }
            (leaf, None) => {
                gaps.insert(key.clone(), leaf.clone());
            }
            (_, Some(_)) => {}
        }
    }

    (!gaps.is_empty()).then_some(gaps)
}

/// Re-wrap every leaf of a projection as `{ language: leaf }`.
///
/// Arrays are leaves: a translated list becomes `{ "en": [..] }`. Nested
/// objects recurse; objects that end up empty are dropped.
pub fn assign(projection: &Value, language: Language) -> Value {
    match projection {
        Value::Object(map) => Value::Object(assign_object(map, language)),
        leaf => wrap(language, leaf.clone()),
    }
}

fn assign_object(object: &Map<String, Value>, language: Language) -> Map<String, Value> {
    let mut wrapped = Map::new();

    for (key, value) in object {
        match value {
            Value::Object(nested) => {
                let inner = assign_object(nested, language);
                if !inner.is_empty() {
                    wrapped.insert(key.clone(), Value::Object(inner));
                }
            }
            leaf => {
                wrapped.insert(key.clone(), wrap(language, leaf.clone()));
            }
        }
    }

    wrapped
}

fn wrap(language: Language, leaf: Value) -> Value {
    let mut wrapper = Map::new();
    wrapper.insert(language.code().to_string(), leaf);
    Value::Object(wrapper)
}

/// Deep-merge `patch` into `document` in place.
///
/// For every key of `patch`: arrays replace the destination wholesale,
/// objects recurse (creating the destination object when needed) and
/// scalars overwrite. Keys not in `patch` are left exactly as they were,
/// which is what keeps the other languages intact.
pub fn merge(document: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        match value {
            Value::Object(nested) => {
                let slot = document
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(destination) = slot {
                    merge(destination, nested);
                }
            }
            other => {
                document.insert(key.clone(), other.clone());
            }
        }
    }
}

/// Number of fields present in a projection (array fields count once).
pub fn field_count(projection: Option<&Value>) -> usize {
    match projection {
        Some(Value::Object(map)) => map
            .values()
            .map(|value| match value {
                Value::Object(_) => field_count(Some(value)),
                _ => 1,
            })
            .sum(),
        Some(_) => 1,
        None => 0,
    }
}
