//! Inbound HTTP: the Telegram webhook plus a few operator endpoints.

use crate::bot::Bot;
use crate::db::UsageReport;
use crate::languages::{plan_translation, LanguagePair, TranslationPlan};
use crate::metrics::MetricsReport;
use crate::security::verify_secret;
use crate::telegram::{TelegramClient, Update};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub const WEBHOOK_SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";
pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<Bot>,
    pub telegram: Arc<TelegramClient>,
    pub webhook_secret: Option<String>,
    pub api_key: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .route("/translate", post(translate))
        .route("/set-webhook", post(set_webhook))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Operator endpoints require the API key; with none configured they are closed.
fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    match state.api_key.as_deref() {
        Some(key) => verify_secret(Some(key), header(headers, API_KEY_HEADER)),
        None => false,
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    if !verify_secret(
        state.webhook_secret.as_deref(),
        header(&headers, WEBHOOK_SECRET_HEADER),
    ) {
        warn!("Rejected webhook call with a missing or wrong secret token");
        return StatusCode::UNAUTHORIZED;
    }

    let update_id = update.update_id;
    // Telegram redelivers on non-2xx, so failures are logged and acknowledged
    if let Err(e) = state.bot.handle_update(update).await {
        error!("Failed to handle update {}: {:#}", update_id, e);
    }
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    /// "en,ru"; the default pair when omitted
    pub pair: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub detected_language: String,
    pub confidence: f64,
    pub method: String,
    pub source: Option<String>,
    pub target: Option<String>,
    pub translation: Option<String>,
    pub error: Option<String>,
}

async fn translate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TranslateRequest>,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let pair = match request.pair.as_deref() {
        Some(raw) => match raw.parse::<LanguagePair>() {
            Ok(pair) => pair,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        },
        None => state.bot.default_pair(),
    };

    let detection = state.bot.resolver().resolve(&request.text, Some(&pair)).await;
    let mut response = TranslateResponse {
        detected_language: detection.language_code.clone(),
        confidence: detection.confidence,
        method: detection.method.to_string(),
        source: None,
        target: None,
        translation: None,
        error: None,
    };

    match plan_translation(&detection.language_code, &pair) {
        TranslationPlan::Translate { source, target } => {
            response.source = Some(source.code().to_string());
            response.target = Some(target.code().to_string());
            match state
                .bot
                .translator()
                .translate(&request.text, target, Some(source))
                .await
            {
                Ok(translated) => response.translation = Some(translated),
                Err(failure) => response.error = Some(failure.to_string()),
            }
        }
        TranslationPlan::AlreadyInTarget(_) | TranslationPlan::NoAction => {
            response.error = Some(format!(
                "detected '{}' has no translation direction in {}",
                detection.language_code, pair
            ));
        }
    }

    Json(response).into_response()
}

#[derive(Debug, Deserialize)]
pub struct SetWebhookRequest {
    pub url: String,
}

async fn set_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SetWebhookRequest>,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match state
        .telegram
        .set_webhook(&request.url, state.webhook_secret.as_deref())
        .await
    {
        Ok(()) => {
            info!("Webhook set to {}", request.url);
            (StatusCode::OK, "Webhook set").into_response()
        }
        Err(e) => {
            error!("Failed to set webhook: {:#}", e);
            (StatusCode::BAD_GATEWAY, "Failed to set webhook").into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub bot: MetricsReport,
    pub usage: UsageReport,
}

async fn stats(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match state.bot.db().usage_report().await {
        Ok(usage) => Json(StatsResponse {
            bot: state.bot.metrics().report(),
            usage,
        })
        .into_response(),
        Err(e) => {
            error!("Failed to build usage report: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
