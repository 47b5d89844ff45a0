use crate::detection::normalize_vendor_code;
use crate::languages::Language;
use crate::transcription::{
    candidate_from_vendor, quality_score_from_text, TranscriptionCandidate, TranscriptionVendor,
};
use crate::vendor::{check_status, VendorError};
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const GOOGLE_SPEECH_VENDOR: &str = "google_speech";

/// Telegram voice notes are Opus in Ogg at 48 kHz.
const SAMPLE_RATE_HERTZ: u32 = 48_000;
const DEFAULT_LOCALE: &str = "he-IL";
const FALLBACK_LOCALES: &[&str] = &["en-US", "ru-RU", "ar-IL"];
/// The API accepts at most three alternative languages.
const MAX_ALTERNATIVES: usize = 3;

const LOCALES: &[(&str, &str)] = &[
    ("he", "he-IL"),
    ("ru", "ru-RU"),
    ("en", "en-US"),
    ("ar", "ar-IL"),
    ("fr", "fr-FR"),
    ("es", "es-ES"),
    ("de", "de-DE"),
    ("it", "it-IT"),
    ("pt", "pt-PT"),
    ("ja", "ja-JP"),
    ("ko", "ko-KR"),
    ("zh", "zh-CN"),
    ("th", "th-TH"),
    ("hi", "hi-IN"),
    ("bn", "bn-IN"),
    ("ta", "ta-IN"),
    ("te", "te-IN"),
    ("kn", "kn-IN"),
    ("ml", "ml-IN"),
    ("gu", "gu-IN"),
    ("mr", "mr-IN"),
    ("si", "si-LK"),
    ("uk", "uk-UA"),
    ("bg", "bg-BG"),
    ("sr", "sr-RS"),
    ("el", "el-GR"),
    ("fa", "fa-IR"),
    ("ur", "ur-PK"),
    ("vi", "vi-VN"),
    ("id", "id-ID"),
    ("ms", "ms-MY"),
    ("tl", "fil-PH"),
    ("cs", "cs-CZ"),
    ("sk", "sk-SK"),
    ("hu", "hu-HU"),
    ("ro", "ro-RO"),
    ("hr", "hr-HR"),
    ("sl", "sl-SI"),
    ("et", "et-EE"),
    ("lv", "lv-LV"),
    ("lt", "lt-LT"),
    ("pl", "pl-PL"),
    ("nl", "nl-NL"),
    ("sv", "sv-SE"),
    ("da", "da-DK"),
    ("no", "nb-NO"),
    ("fi", "fi-FI"),
    ("tr", "tr-TR"),
];

fn locale_for(language: Language) -> Option<&'static str> {
    LOCALES
        .iter()
        .find(|(code, _)| language == *code)
        .map(|(_, locale)| *locale)
}

/// Primary locale plus alternatives: the other hints first, then fixed fallbacks.
fn locales_for(hints: &[Language]) -> (&'static str, Vec<&'static str>) {
    let mut hinted = hints.iter().filter_map(|l| locale_for(*l));
    let primary = hinted.next().unwrap_or(DEFAULT_LOCALE);

    let mut alternatives: Vec<&'static str> = Vec::new();
    for locale in hinted.chain(FALLBACK_LOCALES.iter().copied()) {
        if locale != primary && !alternatives.contains(&locale) {
            alternatives.push(locale);
        }
    }
    alternatives.truncate(MAX_ALTERNATIVES);
    (primary, alternatives)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'static str,
    alternative_language_codes: Vec<&'static str>,
    enable_automatic_punctuation: bool,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
    language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    confidence: Option<f64>,
}

/// Google Cloud Speech-to-Text REST (`speech:recognize`), API-key auth.
pub struct GoogleSpeechVendor {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GoogleSpeechVendor {
    pub fn new(http: reqwest::Client, api_key: Option<String>, base_url: &str) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TranscriptionVendor for GoogleSpeechVendor {
    fn name(&self) -> &'static str {
        GOOGLE_SPEECH_VENDOR
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
            .ok_or_else(|| VendorError::Unavailable("GOOGLE_SPEECH_API_KEY not set".into()))?;

        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|e| VendorError::CallFailed(format!("failed to read audio: {}", e)))?;

        let (primary, alternatives) = locales_for(hints);
        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "OGG_OPUS",
                sample_rate_hertz: SAMPLE_RATE_HERTZ,
                language_code: primary,
                alternative_language_codes: alternatives,
                enable_automatic_punctuation: true,
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(audio),
            },
        };

        let response = self
            .http
            .post(format!("{}/v1p1beta1/speech:recognize", self.base_url))
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;
        let raw: serde_json::Value = check_status(response).await?.json().await?;
        let parsed: RecognizeResponse = serde_json::from_value(raw.clone())
            .map_err(|e| VendorError::MalformedResponse(format!("google_speech: {}", e)))?;

        let best: Vec<&Alternative> = parsed
            .results
            .iter()
            .filter_map(|r| r.alternatives.first())
            .collect();
        let text = best
            .iter()
            .map(|a| a.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let reported: Vec<f64> = best.iter().filter_map(|a| a.confidence).collect();
        let confidence = if reported.is_empty() {
            quality_score_from_text(&text)
        } else {
            reported.iter().sum::<f64>() / reported.len() as f64
        };

        let language = parsed
            .results
            .iter()
            .find_map(|r| r.language_code.as_deref())
            .map(normalize_vendor_code);

        candidate_from_vendor(&text, GOOGLE_SPEECH_VENDOR, confidence, language, Some(raw))
    }
}
