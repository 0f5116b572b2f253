//! Translation metrics and observability.
//!
//! Counts what the on-demand translation pipeline does so `/health` can show
//! whether the external translator is behaving.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide translation counters, shared through the application state.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Detail requests whose document was already complete in the target language
    complete_hits: AtomicUsize,

    /// Documents that were translated and persisted
    documents_translated: AtomicUsize,

    /// Calls made to the translation provider
    provider_calls: AtomicUsize,

    /// Provider calls that failed (after retries)
    provider_failures: AtomicUsize,

    /// Individual strings sent for translation
    strings_translated: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request that needed no translation.
    pub fn record_complete_hit(&self) {
        self.complete_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a document that was translated and saved.
    pub fn record_document_translated(&self) {
        self.documents_translated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a provider call carrying `strings` strings.
    pub fn record_provider_call(&self, strings: usize) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
        self.strings_translated.fetch_add(strings, Ordering::Relaxed);
    }

    /// Record a failed provider call.
    pub fn record_provider_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn complete_hits(&self) -> usize {
        self.complete_hits.load(Ordering::Relaxed)
    }

    pub fn documents_translated(&self) -> usize {
        self.documents_translated.load(Ordering::Relaxed)
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::Relaxed)
    }

    pub fn provider_failures(&self) -> usize {
        self.provider_failures.load(Ordering::Relaxed)
    }

    pub fn strings_translated(&self) -> usize {
        self.strings_translated.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.provider_calls();
        let failures = self.provider_failures();
        let provider_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            complete_hits: self.complete_hits(),
            documents_translated: self.documents_translated(),
            provider_calls: calls,
            provider_failures: failures,
            provider_success_rate,
            strings_translated: self.strings_translated(),
        }
    }
}

/// Snapshot of the translation counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub complete_hits: usize,
    pub documents_translated: usize,
    pub provider_calls: usize,
    pub provider_failures: usize,
    /// Provider success rate as a percentage (0-100)
    pub provider_success_rate: f64,
    pub strings_translated: usize,
}
