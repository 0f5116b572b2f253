//! Internationalization (i18n) primitives.
//!
//! # Architecture
//!
//! - `language`: the closed `Language` enum and the lenient code resolver
//! - `lang_map`: `LangMap<T>`, the fixed per-language slot type used by the
//!   typed entity models
//! - `metrics`: counters for the on-demand translation pipeline
//!
//! # Example
//!
//! ```rust
//! use encyclopedia_content_api::i18n::{Language, TranslatedText};
//!
//! let language = Language::resolve("se");
//! let name = TranslatedText {
//!     nl: Some("Lavendel".to_string()),
//!     ..Default::default()
//! };
//! assert_eq!(name.present(language), None);
//! assert_eq!(name.present(Language::Nl).map(String::as_str), Some("Lavendel"));
//! ```

mod lang_map;
mod language;
mod metrics;

pub use lang_map::{LangMap, Presence, TranslatedList, TranslatedText};
pub use language::{Language, UnknownLanguage};
pub use metrics::{MetricsReport, TranslationMetrics};
