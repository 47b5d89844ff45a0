use anyhow::{Context, Result};
use language_buddy::bot::Bot;
use language_buddy::config::Config;
use language_buddy::db::Database;
use language_buddy::detection::{DetectionResolver, VendorDetector};
use language_buddy::google_translate::GoogleTranslateClient;
use language_buddy::server::{self, AppState};
use language_buddy::telegram::TelegramClient;
use language_buddy::transcription::{
    AssemblyAiVendor, GoogleSpeechVendor, TranscriptionOrchestrator, TranscriptionVendor,
    WhisperVendor,
};
use language_buddy::translation::Translator;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Translate, detect and Telegram API calls.
const API_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("language_buddy=info".parse()?),
        )
        .init();

    info!("Starting Language Buddy bot");

    let config = Config::from_env()?;

    let api_http = reqwest::Client::builder()
        .timeout(API_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;
    // Voice downloads and speech vendors move whole audio files
    let media_http = reqwest::Client::builder()
        .timeout(config.vendor_timeout)
        .build()
        .context("Failed to build media HTTP client")?;

    let db = Database::connect(&config.database_url).await?;

    let telegram = Arc::new(TelegramClient::new(
        media_http.clone(),
        &config.telegram_api_url,
        &config.telegram_bot_token,
    ));

    let language_vendor = Arc::new(GoogleTranslateClient::new(
        api_http,
        &config.google_translate_url,
    ));

    // Priority order: Whisper, AssemblyAI, Google Speech
    let speech_vendors: Vec<Box<dyn TranscriptionVendor>> = vec![
        Box::new(WhisperVendor::new(
            media_http.clone(),
            config.openai_api_key.clone(),
            &config.openai_api_url,
            &config.whisper_model,
        )),
        Box::new(AssemblyAiVendor::new(
            media_http.clone(),
            config.assemblyai_api_key.clone(),
            &config.assemblyai_api_url,
        )),
        Box::new(GoogleSpeechVendor::new(
            media_http,
            config.google_speech_api_key.clone(),
            &config.google_speech_api_url,
        )),
    ];
    let orchestrator = TranscriptionOrchestrator::new(speech_vendors)
        .with_confidence_threshold(config.transcription_confidence_threshold)
        .with_attempt_timeout(config.vendor_timeout)
        .with_min_interval(config.vendor_min_interval);
    info!(
        "Speech vendors configured: {:?}",
        orchestrator.configured_vendors()
    );

    let bot = Bot::new(
        telegram.clone(),
        telegram.clone(),
        db,
        DetectionResolver::new(VendorDetector::new(language_vendor.clone())),
        Translator::new(language_vendor),
        orchestrator,
        config.default_language_pair,
    );

    let state = AppState {
        bot: Arc::new(bot),
        telegram,
        webhook_secret: config.telegram_webhook_secret.clone(),
        api_key: config.api_key.clone(),
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(
        "Listening on {} (default pair {})",
        addr, config.default_language_pair
    );

    axum::serve(listener, server::router(state))
        .await
        .context("HTTP server failed")?;

    Ok(())
}
