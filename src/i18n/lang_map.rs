//! Fixed-slot storage for a value that exists once per language.

use crate::i18n::Language;
use serde::{Deserialize, Serialize};

/// One optional value per canonical language.
///
/// Serialized as `{ "nl": ..., "en": ..., "sv": ... }` with absent slots
/// omitted. Keys outside the canonical set are rejected so a typo'd wrapper
/// cannot pass validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LangMap<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nl: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sv: Option<T>,
}

impl<T> Default for LangMap<T> {
    fn default() -> Self {
        Self {
            nl: None,
            en: None,
            sv: None,
        }
    }
}

/// A translatable single string.
pub type TranslatedText = LangMap<String>;

/// A translatable list of strings.
pub type TranslatedList = LangMap<Vec<String>>;

/// Values that can be "empty" even when a slot is filled.
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for Vec<String> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> LangMap<T> {
    pub fn get(&self, language: Language) -> Option<&T> {
        match language {
            Language::Nl => self.nl.as_ref(),
            Language::En => self.en.as_ref(),
            Language::Sv => self.sv.as_ref(),
        }
    }
}

impl<T: Presence> LangMap<T> {
    /// The value for `language`, only if it is non-empty.
    pub fn present(&self, language: Language) -> Option<&T> {
        self.get(language).filter(|value| value.is_present())
    }

    /// True when at least one language carries a non-empty value.
    pub fn has_any(&self) -> bool {
        Language::ALL.iter().any(|lang| self.present(*lang).is_some())
    }
}
