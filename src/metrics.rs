//! Per-process bot counters.
//!
//! Owned by the `Bot` rather than a global, so every test gets fresh counts.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct BotMetrics {
    messages_handled: AtomicUsize,
    translations_succeeded: AtomicUsize,
    translations_rejected: AtomicUsize,
    translations_failed: AtomicUsize,
    transcriptions_succeeded: AtomicUsize,
    transcriptions_failed: AtomicUsize,
    vendor_failures: AtomicUsize,
}

impl BotMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_message(&self) {
        self.messages_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_translation_success(&self) {
        self.translations_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Vendor answered but the output failed validation.
    pub fn record_translation_rejected(&self) {
        self.translations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Vendor call itself failed.
    pub fn record_translation_failure(&self) {
        self.translations_failed.fetch_add(1, Ordering::Relaxed);
        self.vendor_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transcription_success(&self) {
        self.transcriptions_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transcription_failure(&self) {
        self.transcriptions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self) -> MetricsReport {
        let succeeded = self.translations_succeeded.load(Ordering::Relaxed);
        let rejected = self.translations_rejected.load(Ordering::Relaxed);
        let failed = self.translations_failed.load(Ordering::Relaxed);
        let attempts = succeeded + rejected + failed;
        let translation_success_rate = if attempts > 0 {
            (succeeded as f64 / attempts as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            messages_handled: self.messages_handled.load(Ordering::Relaxed),
            translations_succeeded: succeeded,
            translations_rejected: rejected,
            translations_failed: failed,
            translation_success_rate,
            transcriptions_succeeded: self.transcriptions_succeeded.load(Ordering::Relaxed),
            transcriptions_failed: self.transcriptions_failed.load(Ordering::Relaxed),
            vendor_failures: self.vendor_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of the counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub messages_handled: usize,
    pub translations_succeeded: usize,
    pub translations_rejected: usize,
    pub translations_failed: usize,
    /// Percentage (0-100) of translation attempts that were delivered
    pub translation_success_rate: f64,
    pub transcriptions_succeeded: usize,
    pub transcriptions_failed: usize,
    pub vendor_failures: usize,
}
