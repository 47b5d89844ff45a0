//! Adapter over a vendor's auto-detect call.

use crate::detection::{DetectionMethod, DetectionResult};
use crate::vendor::LanguageVendor;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Confidence assumed when the vendor does not report one.
pub const DEFAULT_VENDOR_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("language detection unavailable: {0}")]
pub struct DetectionUnavailable(pub String);

/// Legacy or alternate codes some vendors still emit.
const CODE_ALIASES: &[(&str, &str)] = &[
    ("iw", "he"),
    ("ji", "yi"),
    ("jw", "jv"),
    ("in", "id"),
    ("fil", "tl"),
    ("nb", "no"),
    ("nn", "no"),
];

/// Map a raw vendor code onto the canonical lowercase primary code.
///
/// Region and script subtags are dropped, so "zh-CN", "zh-TW" and
/// "zh_Hant" all become "zh".
pub fn normalize_vendor_code(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let primary = lower.split(['-', '_']).next().unwrap_or_default();
    CODE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == primary)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| primary.to_string())
}

/// Calls the vendor's detector and normalizes what comes back.
#[derive(Clone)]
pub struct VendorDetector {
    vendor: Arc<dyn LanguageVendor>,
}

impl VendorDetector {
    pub fn new(vendor: Arc<dyn LanguageVendor>) -> Self {
        Self { vendor }
    }

    pub async fn detect(&self, text: &str) -> Result<DetectionResult, DetectionUnavailable> {
        if !text.chars().any(char::is_alphabetic) {
            return Err(DetectionUnavailable("no textual content".to_string()));
        }

        let detection = self
            .vendor
            .detect(text)
            .await
            .map_err(|e| DetectionUnavailable(format!("{}: {}", self.vendor.name(), e)))?;

        let code = normalize_vendor_code(&detection.code);
        if code.is_empty() || code == "und" {
            return Err(DetectionUnavailable(format!(
                "{} returned no language",
                self.vendor.name()
            )));
        }

        let confidence = detection
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_VENDOR_CONFIDENCE);

        debug!(
            "{} detected '{}' (raw '{}') with confidence {:.2}",
            self.vendor.name(),
            code,
            detection.code,
            confidence
        );

        Ok(DetectionResult {
            language_code: code,
            confidence,
            method: DetectionMethod::Vendor,
        })
    }

    /// Source language the vendor reports when asked to translate `text` into `target`.
    ///
    /// Used for targeted re-detection; failures are folded into `None`.
    pub async fn source_of_translation(&self, text: &str, target: &str) -> Option<String> {
        match self.vendor.translate(text, target, None).await {
            Ok(translation) => translation
                .detected_source
                .map(|code| normalize_vendor_code(&code))
                .filter(|code| !code.is_empty()),
            Err(e) => {
                debug!(
                    "Re-detection via {} toward '{}' failed: {}",
                    self.vendor.name(),
                    target,
                    e
                );
                None
            }
        }
    }
}
