//! Rendering stored documents for clients.
//!
//! [`present`] builds the two-pane detail view, [`summarize`] the list
//! entry. Both read a single language out of the multilingual document and
//! never fail: anything without a value renders as an empty string.

use crate::i18n::Language;
use crate::layout::{Layout, Pane, Render};
use crate::names::NameOverrides;
use crate::projection::{is_language_wrapper, is_metadata_key};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Fields shown in the header rather than in a pane.
const HEADER_FIELDS: [&str; 6] = ["id", "name", "scientificName", "img", "description", "isPremium"];

/// Legacy binary field that may still sit in old documents.
const IGNORED_FIELD: &str = "buffer";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentedImage {
    pub src: String,
    pub alt: Value,
}

/// Detail view of one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Presented {
    pub id: String,
    pub name: Value,
    pub scientific_name: String,
    pub img: PresentedImage,
    pub description: Value,
    pub is_premium: bool,
    /// `[left, right]`
    pub data: [Map<String, Value>; 2],
}

/// List view of one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub id: String,
    pub name: Value,
    pub scientific_name: String,
    pub img: PresentedImage,
    pub description: Value,
    pub is_premium: bool,
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Null => false,
        _ => true,
    }
}

/// Read one language out of a field.
///
/// Strings are returned as they are, arrays item by item (nested lists are
/// flattened), wrappers yield the requested language, then Dutch, then an
/// empty value. Numbers, booleans and null become the empty string.
pub fn translate_leaf(value: &Value, language: Language) -> Value {
    match value {
        Value::String(_) => value.clone(),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match translate_leaf(item, language) {
                    Value::Array(nested) => out.extend(nested),
                    other => out.push(other),
                }
            }
            Value::Array(out)
        }
        Value::Object(map) => {
            let requested = map.get(language.code());
            let fallback = map.get(Language::DISPLAY_FALLBACK.code());
            match (requested, fallback) {
                (Some(v), _) if is_present(v) => v.clone(),
                (_, Some(v)) if is_present(v) => v.clone(),
                (Some(Value::Array(_)), _) | (_, Some(Value::Array(_))) => Value::Array(Vec::new()),
                _ => Value::String(String::new()),
            }
        }
        _ => Value::String(String::new()),
    }
}

/// Arrays are translated item-wise without flattening; everything else as a leaf.
fn translate_field(value: &Value, language: Language) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| translate_leaf(item, language))
                .collect(),
        ),
        other => translate_leaf(other, language),
    }
}

fn is_skipped(key: &str) -> bool {
    is_metadata_key(key) || key == IGNORED_FIELD
}

/// Copy the translated subkeys of a plain object into `pane`.
fn flatten_into(pane: &mut Map<String, Value>, object: &Map<String, Value>, language: Language) {
    for (key, value) in object {
        if is_skipped(key) {
            continue;
        }
        pane.insert(key.clone(), translate_field(value, language));
    }
}

/// `[{label, value}]` in document order; list values are cut to their first item.
fn render_facts(value: &Value, language: Language) -> Value {
    let Value::Object(facts) = value else {
        return translate_field(value, language);
    };

    let pairs = facts
        .iter()
        .filter(|(label, _)| !is_skipped(label))
        .map(|(label, fact)| {
            let value = match translate_leaf(fact, language) {
                Value::Array(items) => items
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| Value::String(String::new())),
                other => other,
            };
            json!({ "label": label, "value": value })
        })
        .collect();

    Value::Array(pairs)
}

fn text(document: &Map<String, Value>, key: &str, language: Language) -> Value {
    document
        .get(key)
        .map(|value| translate_leaf(value, language))
        .unwrap_or_else(|| Value::String(String::new()))
}

fn string_field(document: &Map<String, Value>, key: &str) -> String {
    document
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn image(document: &Map<String, Value>, language: Language) -> PresentedImage {
    let img = document.get("img").and_then(Value::as_object);
    PresentedImage {
        src: img
            .and_then(|img| img.get("src"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        alt: img
            .map(|img| text(img, "alt", language))
            .unwrap_or_else(|| Value::String(String::new())),
    }
}

fn is_premium(document: &Map<String, Value>) -> bool {
    document
        .get("isPremium")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Render `document` as the two-pane detail view in `language`.
pub fn present(document: &Map<String, Value>, layout: &Layout, language: Language) -> Presented {
    let mut panes = [Map::new(), Map::new()];

    for (key, value) in document {
        if HEADER_FIELDS.contains(&key.as_str()) || is_skipped(key) {
            continue;
        }

        match layout.rule(key) {
            Some(rule) => {
                let pane = &mut panes[rule.pane.index()];
                match rule.render {
                    Render::Facts => {
                        pane.insert(key.clone(), render_facts(value, language));
                    }
                    Render::Quote => {
                        pane.insert(
                            key.clone(),
                            json!({ "text": translate_leaf(value, language), "isQuote": true }),
                        );
                    }
                    Render::Text => match value {
                        Value::Object(object) if !is_language_wrapper(value) => {
                            flatten_into(pane, object, language);
                        }
                        _ => {
                            pane.insert(key.clone(), translate_field(value, language));
                        }
                    },
                }
            }
            None => match value {
                _ if is_language_wrapper(value) => {
                    panes[Pane::Right.index()].insert(key.clone(), translate_leaf(value, language));
                }
                Value::Object(object) => {
                    flatten_into(&mut panes[Pane::Right.index()], object, language);
                }
                _ => {
                    panes[Pane::Left.index()].insert(key.clone(), translate_field(value, language));
                }
            },
        }
    }

    Presented {
        id: string_field(document, "id"),
        name: text(document, "name", language),
        scientific_name: string_field(document, "scientificName"),
        img: image(document, language),
        description: text(document, "description", language),
        is_premium: is_premium(document),
        data: panes,
    }
}

/// Render `document` as a list entry in `language`.
///
/// The display name comes from the override table when it has one for this
/// scientific name and language.
pub fn summarize(document: &Map<String, Value>, names: &NameOverrides, language: Language) -> Summary {
    let scientific_name = string_field(document, "scientificName");
    let name = names
        .lookup(&scientific_name, language)
        .map(|name| Value::String(name.to_string()))
        .unwrap_or_else(|| text(document, "name", language));

    Summary {
        id: string_field(document, "id"),
        name,
        scientific_name,
        img: image(document, language),
        description: text(document, "description", language),
        is_premium: is_premium(document),
    }
}
