use crate::detection::normalize_vendor_code;
use crate::languages::Language;
use crate::transcription::{candidate_from_vendor, TranscriptionCandidate, TranscriptionVendor};
use crate::vendor::{check_status, VendorError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const ASSEMBLYAI_VENDOR: &str = "assemblyai";

/// Languages AssemblyAI accepts as an explicit `language_code`.
const SUPPORTED_LANGUAGE_CODES: &[&str] = &[
    "de", "en", "es", "fi", "fr", "hi", "it", "ja", "ko", "nl", "pl", "pt", "ru", "tr", "uk",
    "vi", "zh",
];

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_MAX_POLLS: u32 = 60;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<&'static str>,
    language_detection: bool,
    punctuate: bool,
    format_text: bool,
}

#[derive(Debug, Deserialize)]
struct TranscriptStatus {
    id: String,
    status: String,
    text: Option<String>,
    confidence: Option<f64>,
    language_code: Option<String>,
    error: Option<String>,
}

fn build_request<'a>(audio_url: &'a str, hints: &[Language]) -> TranscriptRequest<'a> {
    let language_code = match hints {
        [only] if SUPPORTED_LANGUAGE_CODES.contains(&only.code()) => Some(only.code()),
        _ => None,
    };
    TranscriptRequest {
        audio_url,
        language_code,
        language_detection: language_code.is_none(),
        punctuate: true,
        format_text: true,
    }
}

/// AssemblyAI: upload, create a transcript job, poll until it settles.
pub struct AssemblyAiVendor {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl AssemblyAiVendor {
    pub fn new(http: reqwest::Client, api_key: Option<String>, base_url: &str) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls.max(1);
        self
    }

    async fn upload(&self, api_key: &str, audio: Vec<u8>) -> Result<String, VendorError> {
        let response = self
            .http
            .post(format!("{}/v2/upload", self.base_url))
            .header("authorization", api_key)
            .body(audio)
            .send()
            .await?;
        let upload: UploadResponse = check_status(response).await?.json().await?;
        Ok(upload.upload_url)
    }

    async fn create(
        &self,
        api_key: &str,
        request: &TranscriptRequest<'_>,
    ) -> Result<TranscriptStatus, VendorError> {
        let response = self
            .http
            .post(format!("{}/v2/transcript", self.base_url))
            .header("authorization", api_key)
            .json(request)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn poll(
        &self,
        api_key: &str,
        id: &str,
    ) -> Result<(TranscriptStatus, serde_json::Value), VendorError> {
        for poll in 0..self.max_polls {
            let response = self
                .http
                .get(format!("{}/v2/transcript/{}", self.base_url, id))
                .header("authorization", api_key)
                .send()
                .await?;
            let raw: serde_json::Value = check_status(response).await?.json().await?;
            let status: TranscriptStatus = serde_json::from_value(raw.clone())
                .map_err(|e| VendorError::MalformedResponse(format!("assemblyai: {}", e)))?;

            match status.status.as_str() {
                "completed" => return Ok((status, raw)),
                "error" => {
                    return Err(VendorError::CallFailed(format!(
                        "assemblyai transcript {} failed: {}",
                        id,
                        status.error.unwrap_or_default()
                    )))
                }
                other => {
                    debug!("AssemblyAI transcript {} is {} (poll {})", id, other, poll + 1);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        Err(VendorError::Timeout(self.poll_interval * self.max_polls))
    }
}

#[async_trait]
impl TranscriptionVendor for AssemblyAiVendor {
    fn name(&self) -> &'static str {
        ASSEMBLYAI_VENDOR
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn attempt(
        &self,
        audio_path: &Path,
        hints: &[Language],
    ) -> Result<TranscriptionCandidate, VendorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| VendorError::Unavailable("ASSEMBLYAI_API_KEY not set".into()))?;

        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|e| VendorError::CallFailed(format!("failed to read audio: {}", e)))?;

        let upload_url = self.upload(api_key, audio).await?;
        let created = self.create(api_key, &build_request(&upload_url, hints)).await?;
        let (done, raw) = self.poll(api_key, &created.id).await?;

        let text = done.text.unwrap_or_default();
        let confidence = done
            .confidence
            .ok_or_else(|| VendorError::MalformedResponse("assemblyai: missing confidence".into()))?;
        let language = done.language_code.map(|c| normalize_vendor_code(&c));

        candidate_from_vendor(&text, ASSEMBLYAI_VENDOR, confidence, language, Some(raw))
    }
}
