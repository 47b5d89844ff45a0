//! Integration tests for the Language Buddy bot
//!
//! These tests run the real HTTP server with real vendor clients, pointed at
//! wiremock servers standing in for Telegram, Google Translate and Whisper.
//! The database is an in-memory SQLite pool.

use language_buddy::{
    bot::Bot,
    db::Database,
    detection::{DetectionResolver, VendorDetector},
    google_translate::GoogleTranslateClient,
    languages::LanguagePair,
    retry::RetryConfig,
    server::{router, AppState, TranslateResponse, API_KEY_HEADER, WEBHOOK_SECRET_HEADER},
    telegram::TelegramClient,
    transcription::{
        AssemblyAiVendor, GoogleSpeechVendor, TranscriptionOrchestrator, TranscriptionVendor,
        WhisperVendor,
    },
    translation::Translator,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const TOKEN: &str = "123:abc";
const API_KEY: &str = "test-api-key";
const CHAT: i64 = 42;

// ==================== Test Helpers ====================

struct TestApp {
    url: String,
    http: reqwest::Client,
    telegram: MockServer,
    google: MockServer,
    speech: MockServer,
    bot: Arc<Bot>,
}

async fn spawn_app(webhook_secret: Option<&str>) -> TestApp {
    let telegram = MockServer::start().await;
    let google = MockServer::start().await;
    let speech = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})),
        )
        .mount(&telegram)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/answerCallbackQuery", TOKEN)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})),
        )
        .mount(&telegram)
        .await;

    let http = reqwest::Client::new();
    let telegram_client = Arc::new(
        TelegramClient::new(http.clone(), &telegram.uri(), TOKEN)
            .with_retry(RetryConfig::none()),
    );
    let language_vendor = Arc::new(
        GoogleTranslateClient::new(http.clone(), &google.uri())
            .with_retry(RetryConfig::none()),
    );
    let speech_vendors: Vec<Box<dyn TranscriptionVendor>> = vec![
        Box::new(WhisperVendor::new(
            http.clone(),
            Some("sk-test".to_string()),
            &speech.uri(),
            "whisper-1",
        )),
        Box::new(AssemblyAiVendor::new(http.clone(), None, &speech.uri())),
        Box::new(GoogleSpeechVendor::new(http.clone(), None, &speech.uri())),
    ];
    let orchestrator = TranscriptionOrchestrator::new(speech_vendors)
        .with_min_interval(Duration::ZERO)
        .with_attempt_timeout(Duration::from_secs(5));

    let bot = Arc::new(Bot::new(
        telegram_client.clone(),
        telegram_client.clone(),
        Database::in_memory().await.unwrap(),
        DetectionResolver::new(VendorDetector::new(language_vendor.clone())),
        Translator::new(language_vendor),
        orchestrator,
        LanguagePair::from_codes("en", "ru").unwrap(),
    ));

    let state = AppState {
        bot: bot.clone(),
        telegram: telegram_client,
        webhook_secret: webhook_secret.map(str::to_string),
        api_key: Some(API_KEY.to_string()),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    TestApp {
        url: format!("http://{}", addr),
        http,
        telegram,
        google,
        speech,
        bot,
    }
}

/// gtx response: one segment, detected source and confidence.
fn gtx_body(translated: &str, original: &str, source: &str, confidence: f64) -> Value {
    json!([[[translated, original, null, null, 10]], null, source, null, null, null, confidence])
}

async fn mount_gtx(server: &MockServer, target: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .and(query_param("tl", target))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn text_update(message_id: i64, text: &str) -> Value {
    json!({
        "update_id": message_id,
        "message": {
            "message_id": message_id,
            "from": {"id": 7, "is_bot": false, "first_name": "Anna"},
            "chat": {"id": CHAT, "type": "private"},
            "date": 1700000000,
            "text": text
        }
    })
}

fn callback_update(update_id: i64, data: &str) -> Value {
    json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cb-{}", update_id),
            "from": {"id": 7, "is_bot": false, "first_name": "Anna"},
            "message": {
                "message_id": 1,
                "chat": {"id": CHAT, "type": "private"},
                "date": 1700000000,
                "text": "Choose"
            },
            "chat_instance": "1",
            "data": data
        }
    })
}

/// Bodies of every `sendMessage` call Telegram received, in order.
async fn sent_messages(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path().ends_with("/sendMessage"))
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

impl TestApp {
    async fn post_update(&self, update: &Value) -> reqwest::Response {
        self.http
            .post(format!("{}/webhook", self.url))
            .json(update)
            .send()
            .await
            .unwrap()
    }
}

// ==================== Health and Auth ====================

#[tokio::test]
async fn test_health() {
    let app = spawn_app(None).await;
    let response = app.http.get(format!("{}/health", app.url)).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_webhook_rejects_wrong_secret() {
    let app = spawn_app(Some("hook-secret")).await;

    let missing = app.post_update(&text_update(1, "/start")).await;
    assert_eq!(missing.status(), 401);

    let wrong = app
        .http
        .post(format!("{}/webhook", app.url))
        .header(WEBHOOK_SECRET_HEADER, "not-the-secret")
        .json(&text_update(2, "/start"))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);

    assert!(sent_messages(&app.telegram).await.is_empty());
}

#[tokio::test]
async fn test_webhook_accepts_matching_secret() {
    let app = spawn_app(Some("hook-secret")).await;

    let response = app
        .http
        .post(format!("{}/webhook", app.url))
        .header(WEBHOOK_SECRET_HEADER, "hook-secret")
        .json(&text_update(1, "/start"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let sent = sent_messages(&app.telegram).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["chat_id"], CHAT);
    assert_eq!(sent[0]["parse_mode"], "MarkdownV2");
    assert!(sent[0]["text"].as_str().unwrap().contains("Welcome"));
}

#[tokio::test]
async fn test_operator_endpoints_require_api_key() {
    let app = spawn_app(None).await;

    let stats = app.http.get(format!("{}/stats", app.url)).send().await.unwrap();
    assert_eq!(stats.status(), 401);

    let translate = app
        .http
        .post(format!("{}/translate", app.url))
        .header(API_KEY_HEADER, "wrong")
        .json(&json!({"text": "Good morning"}))
        .send()
        .await
        .unwrap();
    assert_eq!(translate.status(), 401);
}

// ==================== Conversation Flows ====================

#[tokio::test]
async fn test_text_message_translated_end_to_end() {
    let app = spawn_app(None).await;
    mount_gtx(
        &app.google,
        "en",
        gtx_body("Good morning everyone", "Good morning everyone", "en", 0.98),
    )
    .await;
    mount_gtx(
        &app.google,
        "ru",
        gtx_body("Доброе утро всем", "Good morning everyone", "en", 0.98),
    )
    .await;

    let response = app.post_update(&text_update(10, "Good morning everyone")).await;
    assert_eq!(response.status(), 200);

    let sent = sent_messages(&app.telegram).await;
    assert_eq!(sent.len(), 1);
    let text = sent[0]["text"].as_str().unwrap();
    assert!(text.contains("Доброе утро всем"));
    assert!(text.contains("en → ru"));

    let record = app
        .bot
        .db()
        .get_previous_translation(CHAT, 10)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.translated_text, "Доброе утро всем");
}

#[tokio::test]
async fn test_setpair_flow_through_webhook() {
    let app = spawn_app(None).await;

    app.post_update(&text_update(1, "/setpair")).await;
    app.post_update(&callback_update(2, "he")).await;
    app.post_update(&callback_update(3, "en")).await;

    let sent = sent_messages(&app.telegram).await;
    assert_eq!(sent.len(), 3);
    let first_keyboard = sent[0]["reply_markup"]["inline_keyboard"].as_array().unwrap();
    assert_eq!(first_keyboard[0].as_array().unwrap().len(), 3);
    assert_eq!(first_keyboard[0][0]["callback_data"], "en");
    assert!(sent[2]["text"].as_str().unwrap().contains("Hebrew"));

    let answered = app
        .telegram
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().ends_with("/answerCallbackQuery"))
        .count();
    assert_eq!(answered, 2);

    let pair = app.bot.db().get_pair(CHAT).await.unwrap().unwrap();
    assert_eq!(pair, LanguagePair::from_codes("he", "en").unwrap());
}

#[tokio::test]
async fn test_voice_message_transcribed_and_translated() {
    let app = spawn_app(None).await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{}/getFile", TOKEN)))
        .and(body_partial_json(json!({"file_id": "voice-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"file_id": "voice-1", "file_path": "voice/file_1.oga"}
        })))
        .expect(1)
        .mount(&app.telegram)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/file/bot{}/voice/file_1.oga", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"OggS fake audio".to_vec()))
        .expect(1)
        .mount(&app.telegram)
        .await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "Привет, как дела?",
            "language": "russian",
            "segments": [{"avg_logprob": -0.05}]
        })))
        .expect(1)
        .mount(&app.speech)
        .await;
    mount_gtx(
        &app.google,
        "en",
        gtx_body("Hello, how are you?", "Привет, как дела?", "ru", 0.99),
    )
    .await;

    let update = json!({
        "update_id": 20,
        "message": {
            "message_id": 20,
            "from": {"id": 7, "is_bot": false, "first_name": "Anna"},
            "chat": {"id": CHAT, "type": "private"},
            "date": 1700000000,
            "voice": {"file_id": "voice-1", "file_unique_id": "u1", "duration": 2, "mime_type": "audio/ogg"}
        }
    });
    let response = app.post_update(&update).await;
    assert_eq!(response.status(), 200);

    let sent = sent_messages(&app.telegram).await;
    assert_eq!(sent.len(), 1);
    let text = sent[0]["text"].as_str().unwrap();
    assert!(text.contains("Voice Translation"));
    assert!(text.contains("ru → en"));
    assert!(text.contains("Hello, how are you"));
}

// ==================== Operator Endpoints ====================

#[tokio::test]
async fn test_translate_endpoint() {
    let app = spawn_app(None).await;
    mount_gtx(
        &app.google,
        "en",
        gtx_body("Good morning", "Good morning", "en", 0.98),
    )
    .await;
    mount_gtx(
        &app.google,
        "ru",
        gtx_body("Доброе утро", "Good morning", "en", 0.98),
    )
    .await;

    let response = app
        .http
        .post(format!("{}/translate", app.url))
        .header(API_KEY_HEADER, API_KEY)
        .json(&json!({"text": "Good morning", "pair": "en,ru"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: TranslateResponse = response.json().await.unwrap();
    assert_eq!(body.detected_language, "en");
    assert_eq!(body.target.as_deref(), Some("ru"));
    assert_eq!(body.translation.as_deref(), Some("Доброе утро"));
    assert!(body.error.is_none());
}

#[tokio::test]
async fn test_translate_endpoint_rejects_bad_pair() {
    let app = spawn_app(None).await;
    let response = app
        .http
        .post(format!("{}/translate", app.url))
        .header(API_KEY_HEADER, API_KEY)
        .json(&json!({"text": "Good morning", "pair": "en,en"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let app = spawn_app(None).await;
    app.post_update(&text_update(1, "/help")).await;

    let response = app
        .http
        .get(format!("{}/stats", app.url))
        .header(API_KEY_HEADER, API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["bot"]["messages_handled"], 1);
    assert_eq!(body["usage"]["total_translations"], 0);
}

#[tokio::test]
async fn test_set_webhook_passes_secret() {
    let app = spawn_app(Some("hook-secret")).await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/setWebhook", TOKEN)))
        .and(body_partial_json(json!({
            "url": "https://bot.example.com/webhook",
            "secret_token": "hook-secret"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})),
        )
        .expect(1)
        .mount(&app.telegram)
        .await;

    let response = app
        .http
        .post(format!("{}/set-webhook", app.url))
        .header(API_KEY_HEADER, API_KEY)
        .json(&json!({"url": "https://bot.example.com/webhook"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}
