//! Voice transcription across several speech vendors.
//!
//! - `candidate`: transcript value type, confidence bands, `select_best`
//! - `orchestrator`: sequential fallback across vendors
//! - `rate_limit`: per-vendor call spacing
//! - `whisper`, `assemblyai`, `google_speech`: vendor adapters

mod assemblyai;
mod candidate;
mod google_speech;
mod orchestrator;
mod rate_limit;
mod whisper;

pub use assemblyai::AssemblyAiVendor;
pub use candidate::{
    quality_score_from_text, select_best, CandidateError, ConfidenceLevel, NoCandidates,
    TranscriptionCandidate, CLOSE_CALL_GAP, HIGH_CONFIDENCE, MEDIUM_CONFIDENCE, PREFERRED_VENDOR,
};
pub use google_speech::GoogleSpeechVendor;
pub use orchestrator::{TranscriptionOrchestrator, DEFAULT_CONFIDENCE_THRESHOLD};
pub use rate_limit::RateLimiter;
pub use whisper::WhisperVendor;

use crate::languages::Language;
use crate::vendor::VendorError;
use async_trait::async_trait;
use std::path::Path;

/// One speech-to-text vendor, tried by the orchestrator in priority order.
#[async_trait]
pub trait TranscriptionVendor: Send + Sync {
    fn name(&self) -> &'static str;

    /// False when credentials are missing; the vendor is then skipped silently.
    fn is_configured(&self) -> bool;

    /// Transcribe the audio at `audio_path`. `hints` are the chat's languages, if known.
    async fn attempt(
        &self,
        audio_path: &Path,
        hints: &[Language],
    ) -> Result<TranscriptionCandidate, VendorError>;
}

/// Where voice messages are fetched from.
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn download_audio(&self, file_id: &str) -> anyhow::Result<Vec<u8>>;
}

/// Candidate built from adapter output; a contract violation means the
/// vendor sent something unusable.
pub(crate) fn candidate_from_vendor(
    text: &str,
    vendor: &'static str,
    confidence: f64,
    language_code: Option<String>,
    raw: Option<serde_json::Value>,
) -> Result<TranscriptionCandidate, VendorError> {
    TranscriptionCandidate::new(text.trim(), vendor, confidence, language_code, raw)
        .map_err(|e| VendorError::MalformedResponse(format!("{}: {}", vendor, e)))
}
