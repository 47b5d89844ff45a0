use crate::languages::{Language, LanguageRegistry};
use crate::transcription::{
    candidate_from_vendor, quality_score_from_text, TranscriptionCandidate, TranscriptionVendor,
};
use crate::vendor::{check_status, VendorError};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;

pub const WHISPER_VENDOR: &str = "whisper";

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    /// Full English name in verbose_json ("hebrew"), sometimes a code
    language: Option<String>,
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    avg_logprob: Option<f64>,
}

/// Mean per-segment token probability.
fn confidence_from_segments(segments: &[Segment]) -> Option<f64> {
    let probs: Vec<f64> = segments
        .iter()
        .filter_map(|s| s.avg_logprob)
        .map(f64::exp)
        .collect();
    if probs.is_empty() {
        return None;
    }
    let mean = probs.iter().sum::<f64>() / probs.len() as f64;
    Some(mean.clamp(0.0, 1.0))
}

fn language_code(reported: &str) -> Option<String> {
    if let Ok(language) = Language::from_code(reported) {
        return Some(language.code().to_string());
    }
    LanguageRegistry::get()
        .get_by_name(reported)
        .map(|config| config.code.to_string())
}

/// OpenAI Whisper (`/audio/transcriptions`).
pub struct WhisperVendor {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl WhisperVendor {
    pub fn new(http: reqwest::Client, api_key: Option<String>, base_url: &str, model: &str) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TranscriptionVendor for WhisperVendor {
    fn name(&self) -> &'static str {
        WHISPER_VENDOR
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
            .ok_or_else(|| VendorError::Unavailable("OPENAI_API_KEY not set".into()))?;

        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|e| VendorError::CallFailed(format!("failed to read audio: {}", e)))?;

        let audio_part = multipart::Part::bytes(audio)
            .file_name("voice.ogg")
            .mime_str("audio/ogg")?;

        let mut form = multipart::Form::new()
            .part("file", audio_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");
        // Whisper takes a single language; with two candidates let it auto-detect
        if let [only] = hints {
            form = form.text("language", only.code());
        }

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;
        let raw: serde_json::Value = check_status(response).await?.json().await?;

        let parsed: VerboseTranscription = serde_json::from_value(raw.clone())
            .map_err(|e| VendorError::MalformedResponse(format!("whisper: {}", e)))?;

        let confidence = confidence_from_segments(&parsed.segments)
            .unwrap_or_else(|| quality_score_from_text(&parsed.text));
        let language = parsed.language.as_deref().and_then(language_code);

        candidate_from_vendor(&parsed.text, WHISPER_VENDOR, confidence, language, Some(raw))
    }
}
