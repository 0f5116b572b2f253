//! The encyclopedia pipeline: lookup, on-demand translation, rendering.

use crate::error::{ApiError, StoreError, TranslationError};
use crate::i18n::{Language, TranslationMetrics};
use crate::import;
use crate::layout::LayoutTable;
use crate::locks::KeyedLocks;
use crate::models::{Category, Entry, ValidationError};
use crate::names::NameOverrides;
use crate::presentation::{present, summarize, Presented, Summary};
use crate::projection;
use crate::retry::{with_retry_if, RetryConfig};
use crate::store::{DocumentStore, StoredDocument};
use crate::translation::{collect_strings, translate_json, TranslationProvider};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Why bringing a document up to date in one language failed.
#[derive(Debug, Error)]
enum CompletionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("translated document no longer validates: {0}")]
    Invalid(#[from] ValidationError),

    #[error("document {0} disappeared")]
    Gone(String),
}

impl CompletionError {
    fn is_version_conflict(&self) -> bool {
        matches!(self, CompletionError::Store(StoreError::VersionConflict { .. }))
    }

    fn into_api(self, category: Category, name: &str) -> ApiError {
        match self {
            CompletionError::Store(source) => {
                ApiError::store(format!("Error fetching {} data", category), source)
            }
            CompletionError::Translation(source) => ApiError::Translation { category, source },
            CompletionError::Invalid(source) => ApiError::Internal(format!(
                "Error fetching {} data: {} does not validate after translation: {}",
                category, name, source
            )),
            CompletionError::Gone(_) => not_found(category, name),
        }
    }
}

fn not_found(category: Category, name: &str) -> ApiError {
    ApiError::NotFound(format!("{} [{}] is not found", category, name))
}

pub struct EncyclopediaService {
    store: Arc<dyn DocumentStore>,
    translator: Arc<dyn TranslationProvider>,
    metrics: Arc<TranslationMetrics>,
    layouts: LayoutTable,
    names: NameOverrides,
    locks: KeyedLocks,
    conflict_retry: RetryConfig,
}

impl EncyclopediaService {
    pub fn new(store: Arc<dyn DocumentStore>, translator: Arc<dyn TranslationProvider>) -> Self {
        Self {
            store,
            translator,
            metrics: Arc::new(TranslationMetrics::new()),
            layouts: LayoutTable::default(),
            names: NameOverrides::default(),
            locks: KeyedLocks::new(),
            conflict_retry: RetryConfig::store_conflict(),
        }
    }

    pub fn with_layouts(mut self, layouts: LayoutTable) -> Self {
        self.layouts = layouts;
        self
    }

    pub fn with_names(mut self, names: NameOverrides) -> Self {
        self.names = names;
        self
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// Summaries of every entry of `category`. Never translates.
    pub async fn list(&self, category: Category, language: Language) -> Result<Vec<Summary>, ApiError> {
        let documents = self
            .store
            .list(category)
            .await
            .map_err(|e| ApiError::store(format!("Failed to fetch {}", category), e))?;

        Ok(documents
            .iter()
            .map(|doc| summarize(&doc.body, &self.names, language))
            .collect())
    }

    /// Detail view of the entry with this scientific name, translating and
    /// saving whatever is missing in `language` first.
    pub async fn detail(
        &self,
        category: Category,
        scientific_name: &str,
        language: Language,
    ) -> Result<Presented, ApiError> {
        let found = self
            .store
            .find_by_scientific_name(category, scientific_name)
            .await
            .map_err(|e| ApiError::store(format!("Error fetching {} data", category), e))?
            .ok_or_else(|| not_found(category, scientific_name))?;

        let key = format!("{}/{}", category, found.id);
        let _guard = self.locks.lock(&key).await;

        let document = with_retry_if(
            &self.conflict_retry,
            &format!("Completing {} in {}", key, language.name()),
            || self.complete(category, &found.id, language),
            CompletionError::is_version_conflict,
        )
        .await
        .map_err(|e| e.into_api(category, scientific_name))?;

        Ok(present(&document.body, self.layouts.get(category), language))
    }

    /// Replace `category` with the documents in `payload`.
    pub async fn import(&self, category: Category, payload: Value) -> Result<usize, ApiError> {
        Ok(import::import(self.store.as_ref(), category, payload).await?)
    }

    /// Re-read the document and fill in the fields missing in `language`.
    async fn complete(
        &self,
        category: Category,
        id: &str,
        language: Language,
    ) -> Result<StoredDocument, CompletionError> {
        let mut document = self
            .store
            .get(category, id)
            .await?
            .ok_or_else(|| CompletionError::Gone(id.to_string()))?;

        let Some(gaps) = gaps_for(&document, language) else {
            debug!("{}/{} is complete in {}", category, id, language.name());
            self.metrics.record_complete_hit();
            return Ok(document);
        };

        let strings = collect_strings(&gaps).0.len();
        info!(
            "Translating {} fields ({} strings) of {}/{} to {}",
            projection::field_count(Some(&gaps)),
            strings,
            category,
            id,
            language.name()
        );

        if strings > 0 {
            self.metrics.record_provider_call(strings);
        }
        let translated = translate_json(self.translator.as_ref(), &gaps, language)
            .await
            .inspect_err(|_| self.metrics.record_provider_failure())?;

        if let Value::Object(patch) = projection::assign(&translated, language) {
            projection::merge(&mut document.body, &patch);
        }
        Entry::parse(category, &document.body)?;

        document.version = self.store.save(category, &document).await?;
        self.metrics.record_document_translated();
        info!("Saved {} translation of {}/{}", language.name(), category, id);

        Ok(document)
    }
}

/// Projections of the other languages, fullest first.
/// Ties go to the earlier language in [`Language::ALL`].
fn source_projections(document: &StoredDocument, target: Language) -> Vec<(Language, Value)> {
    let mut sources: Vec<(Language, Value, usize)> = Language::ALL
        .into_iter()
        .filter(|lang| *lang != target)
        .filter_map(|language| {
            let projection = projection::extract(&document.body, language)?;
            let count = projection::field_count(Some(&projection));
            Some((language, projection, count))
        })
        .collect();

    // Stable sort keeps `Language::ALL` order among equal counts
    sources.sort_by(|a, b| b.2.cmp(&a.2));
    sources
        .into_iter()
        .map(|(language, projection, _)| (language, projection))
        .collect()
}

/// Every field missing in `target`, valued from the fullest source that has it.
fn gaps_for(document: &StoredDocument, target: Language) -> Option<Value> {
    let mut covered = projection::extract(&document.body, target)
        .unwrap_or_else(|| Value::Object(Map::new()));
    let mut gaps = Map::new();

    for (language, source) in source_projections(document, target) {
        let Some(found) = projection::missing(&source, Some(&covered)) else {
            continue;
        };
        debug!(
            "{} fields missing in {} taken from {}",
            projection::field_count(Some(&found)),
            target.name(),
            language.name()
        );
        if let (Value::Object(found), Value::Object(covered)) = (&found, &mut covered) {
            projection::merge(&mut gaps, found);
            projection::merge(covered, found);
        }
    }

    (!gaps.is_empty()).then_some(Value::Object(gaps))
}
