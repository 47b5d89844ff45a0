use crate::languages::Language;
use crate::transcription::{
    select_best, AudioSource, RateLimiter, TranscriptionCandidate, TranscriptionVendor,
};
use crate::vendor::VendorError;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A candidate at or above this confidence ends the vendor sequence early.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Tries speech vendors strictly one after another.
pub struct TranscriptionOrchestrator {
    vendors: Vec<Box<dyn TranscriptionVendor>>,
    confidence_threshold: f64,
    attempt_timeout: Duration,
    rate_limiter: RateLimiter,
}

impl TranscriptionOrchestrator {
    /// `vendors` in priority order.
    pub fn new(vendors: Vec<Box<dyn TranscriptionVendor>>) -> Self {
        Self {
            vendors,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            rate_limiter: RateLimiter::new(DEFAULT_MIN_INTERVAL),
        }
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.rate_limiter = RateLimiter::new(interval);
        self
    }

    /// Names of vendors that have credentials, in priority order.
    pub fn configured_vendors(&self) -> Vec<&'static str> {
        self.vendors
            .iter()
            .filter(|v| v.is_configured())
            .map(|v| v.name())
            .collect()
    }

    /// Download a voice message once and transcribe it.
    ///
    /// Returns `None` when the download fails or no vendor produced a transcript.
    pub async fn transcribe_file(
        &self,
        source: &dyn AudioSource,
        file_id: &str,
        hints: &[Language],
    ) -> Option<TranscriptionCandidate> {
        let audio = match tokio::time::timeout(self.attempt_timeout, source.download_audio(file_id))
            .await
        {
            Ok(Ok(audio)) => audio,
            Ok(Err(e)) => {
                warn!("Failed to download voice file {}: {:#}", file_id, e);
                return None;
            }
            Err(_) => {
                warn!(
                    "Downloading voice file {} timed out after {:?}",
                    file_id, self.attempt_timeout
                );
                return None;
            }
        };

        info!("Downloaded voice file {}, {} bytes", file_id, audio.len());
        self.transcribe(&audio, hints).await
    }

    /// Transcribe raw audio bytes.
    ///
    /// The audio lives in a temporary file for the duration of the vendor
    /// sequence; the file is removed when this returns, whichever way.
    pub async fn transcribe(
        &self,
        audio: &[u8],
        hints: &[Language],
    ) -> Option<TranscriptionCandidate> {
        let temp = match tempfile::Builder::new()
            .prefix("voice-")
            .suffix(".ogg")
            .tempfile()
        {
            Ok(temp) => temp,
            Err(e) => {
                warn!("Failed to create temporary audio file: {}", e);
                return None;
            }
        };

        if let Err(e) = tokio::fs::write(temp.path(), audio).await {
            warn!("Failed to write temporary audio file: {}", e);
            return None;
        }

        // Dropping `temp` deletes the file
        self.transcribe_path(temp.path(), hints).await
    }

    async fn transcribe_path(
        &self,
        audio_path: &Path,
        hints: &[Language],
    ) -> Option<TranscriptionCandidate> {
        let mut candidates = Vec::new();

        for vendor in &self.vendors {
            if !vendor.is_configured() {
                debug!("Skipping {}: not configured", vendor.name());
                continue;
            }

            self.rate_limiter.wait_turn(vendor.name()).await;
            info!("Trying {} transcription", vendor.name());

            match self.attempt(vendor.as_ref(), audio_path, hints).await {
                Ok(candidate) => {
                    info!(
                        "{} transcription: {} [{}]",
                        vendor.name(),
                        candidate,
                        candidate.confidence_level()
                    );
                    if candidate.is_high_confidence(self.confidence_threshold) {
                        return Some(candidate);
                    }
                    candidates.push(candidate);
                }
                Err(VendorError::Unavailable(reason)) => {
                    debug!("Skipping {}: {}", vendor.name(), reason);
                }
                Err(e) => {
                    warn!("{} transcription failed: {}", vendor.name(), e);
                }
            }
        }

        match select_best(&candidates) {
            Ok(best) => Some(best),
            Err(e) => {
                warn!("All transcription vendors failed: {}", e);
                None
            }
        }
    }

    async fn attempt(
        &self,
        vendor: &dyn TranscriptionVendor,
        audio_path: &Path,
        hints: &[Language],
    ) -> Result<TranscriptionCandidate, VendorError> {
        tokio::time::timeout(self.attempt_timeout, vendor.attempt(audio_path, hints))
            .await
            .map_err(|_| VendorError::Timeout(self.attempt_timeout))?
    }
}
