//! Language type: the closed set of languages entries are stored in.
//!
//! Storage uses canonical tags (`nl`, `en`, `sv`). Clients send whatever the
//! storefront uses, including marketing domain codes such as `com` or `se`;
//! [`Language::resolve`] maps those onto the canonical set.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned by the strict [`Language::from_code`] lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown language code: '{0}'")]
pub struct UnknownLanguage(pub String);

/// A canonical storage language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Dutch, the language entries are authored in.
    Nl,
    /// English
    En,
    /// Swedish
    Sv,
}

impl Language {
    /// All languages in storage order.
    pub const ALL: [Language; 3] = [Language::Nl, Language::En, Language::Sv];

    /// Returned by [`Language::resolve`] for codes it does not recognise.
    pub const RESOLVE_DEFAULT: Language = Language::En;

    /// Used by the encyclopedia routes when no language is given at all.
    pub const REQUEST_DEFAULT: Language = Language::Nl;

    /// Second choice when a field has no value in the requested language.
    pub const DISPLAY_FALLBACK: Language = Language::Nl;

    /// Map a user-supplied code onto a canonical language.
    ///
    /// Lenient on purpose: query strings frequently carry missing or
    /// malformed codes, so anything unrecognised resolves to
    /// [`Language::RESOLVE_DEFAULT`] instead of failing the request.
    ///
    /// # Example
    /// ```
    /// use encyclopedia_content_api::i18n::Language;
    ///
    /// assert_eq!(Language::resolve("com"), Language::En);
    /// assert_eq!(Language::resolve("se"), Language::Sv);
    /// assert_eq!(Language::resolve("bogus"), Language::En);
    /// ```
    pub fn resolve(code: &str) -> Language {
        match code.trim().to_ascii_lowercase().as_str() {
            "nl" => Language::Nl,
            "com" | "en" => Language::En,
            "se" | "sv" => Language::Sv,
            _ => Language::RESOLVE_DEFAULT,
        }
    }

    /// Resolve an optional query value, falling back to
    /// [`Language::REQUEST_DEFAULT`] when the parameter is absent or blank.
    pub fn resolve_or_default(code: Option<&str>) -> Language {
        match code.map(str::trim) {
            Some(code) if !code.is_empty() => Language::resolve(code),
            _ => Language::REQUEST_DEFAULT,
        }
    }

    /// Strict lookup of a canonical tag. Only `nl`, `en` and `sv` are accepted.
    pub fn from_code(code: &str) -> Result<Language, UnknownLanguage> {
        match code {
            "nl" => Ok(Language::Nl),
            "en" => Ok(Language::En),
            "sv" => Ok(Language::Sv),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }

    /// Check whether a JSON key is a canonical language tag.
    pub fn is_code(code: &str) -> bool {
        Language::from_code(code).is_ok()
    }

    /// The canonical tag (e.g. "nl").
    pub fn code(&self) -> &'static str {
        match self {
            Language::Nl => "nl",
            Language::En => "en",
            Language::Sv => "sv",
        }
    }

    /// English name of the language.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Nl => "Dutch",
            Language::En => "English",
            Language::Sv => "Swedish",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== resolve Tests ====================

    #[test]
    fn test_resolve_marketing_codes() {
        assert_eq!(Language::resolve("com"), Language::En);
        assert_eq!(Language::resolve("nl"), Language::Nl);
        assert_eq!(Language::resolve("se"), Language::Sv);
    }

    #[test]
    fn test_resolve_canonical_codes() {
        assert_eq!(Language::resolve("en"), Language::En);
        assert_eq!(Language::resolve("sv"), Language::Sv);
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_english() {
        assert_eq!(Language::resolve("bogus"), Language::En);
        assert_eq!(Language::resolve(""), Language::En);
        assert_eq!(Language::resolve("de"), Language::En);
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        assert_eq!(Language::resolve("NL"), Language::Nl);
        assert_eq!(Language::resolve(" Se "), Language::Sv);
    }

    #[test]
    fn test_resolve_or_default_absent_is_dutch() {
        assert_eq!(Language::resolve_or_default(None), Language::Nl);
        assert_eq!(Language::resolve_or_default(Some("  ")), Language::Nl);
        assert_eq!(Language::resolve_or_default(Some("com")), Language::En);
    }

    // ==================== from_code Tests ====================

    #[test]
    fn test_from_code_strict() {
        assert_eq!(Language::from_code("sv"), Ok(Language::Sv));
        assert!(Language::from_code("se").is_err());
        assert!(Language::from_code("com").is_err());
    }

    #[test]
    fn test_from_code_error_message() {
        let err = Language::from_code("fr").unwrap_err();
        assert!(err.to_string().contains("Unknown"));
        assert!(err.to_string().contains("fr"));
    }

    #[test]
    fn test_is_code() {
        assert!(Language::is_code("nl"));
        assert!(!Language::is_code("src"));
        assert!(!Language::is_code("NL"));
    }

    // ==================== Trait Tests ====================

    #[test]
    fn test_display_uses_code() {
        assert_eq!(Language::Sv.to_string(), "sv");
        assert_eq!(format!("{}", Language::Nl), "nl");
    }

    #[test]
    fn test_serde_roundtrip_uses_lowercase_tag() {
        let json = serde_json::to_string(&Language::En).expect("serialize");
        assert_eq!(json, "\"en\"");
        let lang: Language = serde_json::from_str("\"sv\"").expect("deserialize");
        assert_eq!(lang, Language::Sv);
    }

    #[test]
    fn test_all_order() {
        let codes: Vec<_> = Language::ALL.iter().map(Language::code).collect();
        assert_eq!(codes, vec!["nl", "en", "sv"]);
    }
}
