use crate::languages::LanguagePair;
use crate::transcription::DEFAULT_CONFIDENCE_THRESHOLD;
use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_webhook_secret: Option<String>,
    pub telegram_api_url: String,

    // Server
    pub api_key: Option<String>,
    pub port: u16,
    pub database_url: String,

    // Translation / detection
    pub google_translate_url: String,
    pub default_language_pair: LanguagePair,

    // Speech vendors
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
    pub whisper_model: String,
    pub assemblyai_api_key: Option<String>,
    pub assemblyai_api_url: String,
    pub google_speech_api_key: Option<String>,
    pub google_speech_api_url: String,

    // Transcription tuning
    pub transcription_confidence_threshold: f64,
    pub vendor_timeout: Duration,
    pub vendor_min_interval: Duration,
}

/// Non-empty value of an optional variable.
fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn with_default(name: &str, default: &str) -> String {
    optional(name).unwrap_or_else(|| default.to_string())
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    optional(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_language_pair = with_default("DEFAULT_LANGUAGE_PAIR", "en,ru")
            .parse::<LanguagePair>()
            .context("DEFAULT_LANGUAGE_PAIR is invalid")?;

        let transcription_confidence_threshold = parsed(
            "TRANSCRIPTION_CONFIDENCE_THRESHOLD",
            DEFAULT_CONFIDENCE_THRESHOLD,
        );
        if !(0.0..=1.0).contains(&transcription_confidence_threshold) {
            anyhow::bail!(
                "TRANSCRIPTION_CONFIDENCE_THRESHOLD must be between 0 and 1, got {}",
                transcription_confidence_threshold
            );
        }

        Ok(Self {
            // Telegram
            telegram_bot_token: optional("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN not set")?,
            telegram_webhook_secret: optional("TELEGRAM_WEBHOOK_SECRET"),
            telegram_api_url: with_default("TELEGRAM_API_URL", "https://api.telegram.org"),

            // Server
            api_key: optional("API_KEY"),
            port: parsed("PORT", 8080),
            database_url: with_default("DATABASE_URL", "sqlite://bot_data.db?mode=rwc"),

            // Translation / detection
            google_translate_url: with_default(
                "GOOGLE_TRANSLATE_URL",
                "https://translate.googleapis.com",
            ),
            default_language_pair,

            // Speech vendors (missing keys just leave the vendor unconfigured)
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_api_url: with_default("OPENAI_API_URL", "https://api.openai.com/v1"),
            whisper_model: with_default("WHISPER_MODEL", "whisper-1"),
            assemblyai_api_key: optional("ASSEMBLYAI_API_KEY"),
            assemblyai_api_url: with_default("ASSEMBLYAI_API_URL", "https://api.assemblyai.com"),
            google_speech_api_key: optional("GOOGLE_SPEECH_API_KEY"),
            google_speech_api_url: with_default(
                "GOOGLE_SPEECH_API_URL",
                "https://speech.googleapis.com",
            ),

            // Transcription tuning
            transcription_confidence_threshold,
            vendor_timeout: Duration::from_secs(parsed("VENDOR_TIMEOUT_SECS", 30)),
            vendor_min_interval: Duration::from_millis(parsed("VENDOR_MIN_INTERVAL_MS", 1000)),
        })
    }
}
