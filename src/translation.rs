//! Translation wrapper: one vendor call plus validation of what came back.
//!
//! A vendor answering with an empty string, the input unchanged, or a
//! suspiciously short fragment is treated as a failure distinct from a
//! vendor error, so callers never show a non-translation to the user.

use crate::languages::Language;
use crate::vendor::{LanguageVendor, VendorError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Shown to the user whenever a translation cannot be delivered.
pub const TRANSLATION_FAILED_MESSAGE: &str = "❌ Translation failed - please try again";

/// Minimum translated/source length ratio before a result counts as truncated.
pub const MIN_LENGTH_RATIO: f64 = 0.3;

/// Dense scripts need far fewer characters for the same content.
pub const DENSE_SCRIPT_MIN_LENGTH_RATIO: f64 = 0.1;
const DENSE_SCRIPT_TARGETS: &[&str] = &["zh", "ja", "ko", "th"];

/// Why a successful vendor answer was not accepted as a translation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("vendor returned empty text")]
    Empty,

    #[error("vendor returned the input unchanged")]
    Unchanged,

    #[error("translation looks truncated ({translated_chars} chars for {source_chars} source chars)")]
    Truncated {
        translated_chars: usize,
        source_chars: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslationFailure {
    #[error("translation rejected: {0}")]
    Rejected(Rejection),

    #[error(transparent)]
    Vendor(#[from] VendorError),
}

impl TranslationFailure {
    /// The text the user sees instead of a translation.
    pub fn user_message(&self) -> &'static str {
        TRANSLATION_FAILED_MESSAGE
    }
}

/// Collapse all whitespace runs into single spaces.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn min_length_ratio(target: Language) -> f64 {
    if DENSE_SCRIPT_TARGETS.contains(&target.code()) {
        DENSE_SCRIPT_MIN_LENGTH_RATIO
    } else {
        MIN_LENGTH_RATIO
    }
}

/// Check a vendor answer against the cleaned source text.
pub fn validate_translation(
    cleaned_source: &str,
    translated: &str,
    target: Language,
) -> Result<(), Rejection> {
    let translated = translated.trim();
    if translated.is_empty() {
        return Err(Rejection::Empty);
    }
    if translated == cleaned_source {
        return Err(Rejection::Unchanged);
    }

    let source_chars = cleaned_source.chars().count();
    let translated_chars = translated.chars().count();
    if (translated_chars as f64) < source_chars as f64 * min_length_ratio(target) {
        return Err(Rejection::Truncated {
            translated_chars,
            source_chars,
        });
    }
    Ok(())
}

/// Calls the translation vendor and validates its output.
#[derive(Clone)]
pub struct Translator {
    vendor: Arc<dyn LanguageVendor>,
}

impl Translator {
    pub fn new(vendor: Arc<dyn LanguageVendor>) -> Self {
        Self { vendor }
    }

    /// Translate `text` into `target`; `source` of `None` lets the vendor auto-detect.
    pub async fn translate(
        &self,
        text: &str,
        target: Language,
        source: Option<Language>,
    ) -> Result<String, TranslationFailure> {
        let cleaned = clean_text(text);
        info!(
            "Translating {} chars from {} to {} via {}",
            cleaned.chars().count(),
            source.map_or("auto", |l| l.code()),
            target.code(),
            self.vendor.name()
        );

        let translation = self
            .vendor
            .translate(&cleaned, target.code(), source.map(|l| l.code()))
            .await
            .map_err(|e| {
                warn!("Translation vendor {} failed: {}", self.vendor.name(), e);
                TranslationFailure::Vendor(e)
            })?;

        if let Err(rejection) = validate_translation(&cleaned, &translation.text, target) {
            warn!("Rejected translation to {}: {}", target.code(), rejection);
            return Err(TranslationFailure::Rejected(rejection));
        }

        Ok(translation.text.trim().to_string())
    }
}
