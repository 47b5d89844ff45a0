//! Transcription candidates, confidence bands and best-candidate selection.

use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;
use tracing::info;

pub const HIGH_CONFIDENCE: f64 = 0.8;
pub const MEDIUM_CONFIDENCE: f64 = 0.6;

/// Top-two gap at or below which the preferred vendor wins.
pub const CLOSE_CALL_GAP: f64 = 0.1;

/// Speech-specialized vendor trusted on close calls.
pub const PREFERRED_VENDOR: &str = "whisper";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandidateError {
    #[error("transcription text cannot be empty")]
    EmptyText,
    #[error("vendor name cannot be empty")]
    EmptyVendor,
    #[error("confidence must be between 0.0 and 1.0, got {0}")]
    ConfidenceOutOfRange(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no transcription candidates to compare")]
pub struct NoCandidates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        })
    }
}

/// One vendor's transcript. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionCandidate {
    text: String,
    vendor: String,
    confidence: f64,
    language_code: Option<String>,
    raw: Option<Value>,
}

impl TranscriptionCandidate {
    pub fn new(
        text: impl Into<String>,
        vendor: impl Into<String>,
        confidence: f64,
        language_code: Option<String>,
        raw: Option<Value>,
    ) -> Result<Self, CandidateError> {
        let text = text.into();
        let vendor = vendor.into();

        if text.trim().is_empty() {
            return Err(CandidateError::EmptyText);
        }
        if vendor.trim().is_empty() {
            return Err(CandidateError::EmptyVendor);
        }
        // Written so NaN fails too
        if !(0.0..=1.0).contains(&confidence) {
            return Err(CandidateError::ConfidenceOutOfRange(confidence));
        }

        Ok(Self {
            text,
            vendor,
            confidence,
            language_code,
            raw,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn language_code(&self) -> Option<&str> {
        self.language_code.as_deref()
    }

    pub fn raw(&self) -> Option<&Value> {
        self.raw.as_ref()
    }

    pub fn is_high_confidence(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }

    pub fn is_medium_confidence(&self, low: f64, high: f64) -> bool {
        low <= self.confidence && self.confidence < high
    }

    pub fn is_low_confidence(&self, threshold: f64) -> bool {
        self.confidence < threshold
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        if self.is_high_confidence(HIGH_CONFIDENCE) {
            ConfidenceLevel::High
        } else if self.is_medium_confidence(MEDIUM_CONFIDENCE, HIGH_CONFIDENCE) {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    fn is_preferred(&self) -> bool {
        self.vendor == PREFERRED_VENDOR
    }
}

impl fmt::Display for TranscriptionCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(50).collect();
        write!(
            f,
            "'{}' via {} (confidence {:.3})",
            preview, self.vendor, self.confidence
        )
    }
}

fn is_basic_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | '!' | '?')
}

/// Number of runs of three or more identical consecutive characters.
fn repeated_runs(text: &str) -> usize {
    let mut runs = 0;
    let mut prev: Option<char> = None;
    let mut run_len = 0;

    for c in text.chars() {
        if Some(c) == prev {
            run_len += 1;
            if run_len == 3 {
                runs += 1;
            }
        } else {
            prev = Some(c);
            run_len = 1;
        }
    }
    runs
}

/// Heuristic 0.0..=1.0 quality of a transcript, for vendors without native confidence.
pub fn quality_score_from_text(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let mut score: f64 = 1.0;

    if trimmed.chars().count() < 3 {
        score -= 0.3;
    }

    let runs = repeated_runs(text);
    if runs > 0 {
        score -= (runs as f64 * 0.05).min(0.2);
    }

    let total = text.chars().count();
    // Letters of any script are normal text, not only ASCII ones
    let special = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !is_basic_punctuation(*c))
        .count();
    if special as f64 / total as f64 > 0.3 {
        score -= 0.2;
    }

    if trimmed.ends_with(['.', '!', '?']) {
        score += 0.1;
    }

    let words = trimmed.split_whitespace().count();
    if (2..=50).contains(&words) {
        score += 0.1;
    }

    score.clamp(0.0, 1.0)
}

/// Total order: confidence descending, then preferred vendor, vendor name, text.
fn ranking(a: &TranscriptionCandidate, b: &TranscriptionCandidate) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.is_preferred().cmp(&a.is_preferred()))
        .then_with(|| a.vendor.cmp(&b.vendor))
        .then_with(|| a.text.cmp(&b.text))
        .then_with(|| a.language_code.cmp(&b.language_code))
}

/// Pick the best candidate; the result does not depend on input order.
///
/// A clear winner (gap above [`CLOSE_CALL_GAP`]) is returned outright. On a
/// close call the [`PREFERRED_VENDOR`]'s candidate wins if there is one.
pub fn select_best(
    candidates: &[TranscriptionCandidate],
) -> Result<TranscriptionCandidate, NoCandidates> {
    let mut sorted: Vec<&TranscriptionCandidate> = candidates.iter().collect();
    sorted.sort_by(|a, b| ranking(a, b));

    let top = *sorted.first().ok_or(NoCandidates)?;

    if let Some(runner_up) = sorted.get(1) {
        if top.confidence - runner_up.confidence > CLOSE_CALL_GAP {
            info!(
                "Using {} ({:.3}) over {} ({:.3})",
                top.vendor, top.confidence, runner_up.vendor, runner_up.confidence
            );
            return Ok(top.clone());
        }
    }

    if let Some(preferred) = sorted.iter().find(|c| c.is_preferred()) {
        if sorted.len() > 1 {
            info!(
                "Using {} ({:.3}) on a close call",
                preferred.vendor, preferred.confidence
            );
        }
        return Ok((*preferred).clone());
    }

    Ok(top.clone())
}
