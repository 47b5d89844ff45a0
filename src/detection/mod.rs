//! Language detection: script histogram, vendor auto-detect, and the resolver
//! that merges the two (optionally biased toward a chat's language pair).

mod resolver;
mod script;
mod vendor;

pub use resolver::{
    DetectionResolver, REDETECTION_CONFIDENCE_CUTOFF, ROMANIZATION_CONFIDENCE_CUTOFF,
    VENDOR_HIGH_CONFIDENCE, VENDOR_LOW_CONFIDENCE, VENDOR_WEAK_LANGUAGES,
};
pub use script::{
    contains_script, detect_by_script, is_latin_only, ScriptDetection, SCRIPT_RATIO_THRESHOLD,
};
pub use vendor::{
    normalize_vendor_code, DetectionUnavailable, VendorDetector, DEFAULT_VENDOR_CONFIDENCE,
};

use std::fmt;

/// Sentinel code for "cannot safely act".
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Which detector produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    Vendor,
    Script,
    /// Corrected or biased using both signals (or the chat's pair)
    Merged,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectionMethod::Vendor => "vendor",
            DetectionMethod::Script => "script",
            DetectionMethod::Merged => "merged",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub language_code: String,
    /// 0.0..=1.0
    pub confidence: f64,
    pub method: DetectionMethod,
}

impl DetectionResult {
    pub fn unknown() -> Self {
        Self {
            language_code: UNKNOWN_LANGUAGE.to_string(),
            confidence: 0.0,
            method: DetectionMethod::Merged,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.language_code == UNKNOWN_LANGUAGE
    }
}

impl From<ScriptDetection> for DetectionResult {
    fn from(script: ScriptDetection) -> Self {
        Self {
            language_code: script.code.to_string(),
            confidence: script.ratio,
            method: DetectionMethod::Script,
        }
    }
}

impl fmt::Display for DetectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.2}, {})",
            self.language_code, self.confidence, self.method
        )
    }
}
