//! Telegram Bot API: webhook update types and an HTTP client for the few
//! methods the bot uses.

use crate::bot::Messenger;
use crate::retry::{with_vendor_retry, RetryConfig};
use crate::transcription::AudioSource;
use crate::vendor::{check_status, VendorError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

// Telegram webhook types
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub edited_message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub voice: Option<Voice>,
}

impl Message {
    /// Name shown in replies; Telegram always sends `first_name` for users.
    pub fn sender_name(&self) -> &str {
        self.from
            .as_ref()
            .map(|u| u.first_name.as_str())
            .unwrap_or("User")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[allow(dead_code)]
    pub r#type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Voice {
    pub file_id: String,
    pub duration: Option<u32>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardMarkup {
    inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardButton {
    text: String,
    callback_data: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    result: Option<Value>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct File {
    file_path: Option<String>,
}

/// Escape the MarkdownV2 special characters (and backslash) so `text` renders literally.
///
/// Reference: https://core.telegram.org/bots/api#markdownv2-style
pub fn escape_markdownv2(text: &str) -> String {
    const SPECIAL_CHARS: [char; 19] = [
        '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.',
        '!',
    ];

    let mut result = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if SPECIAL_CHARS.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Telegram Bot API client.
pub struct TelegramClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    retry: RetryConfig,
}

impl TelegramClient {
    pub fn new(http: reqwest::Client, api_url: &str, token: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            retry: RetryConfig::telegram_api(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// POST a Bot API method, retrying rate limits and server errors.
    async fn call<T: Serialize + Sync>(&self, method: &str, payload: &T) -> Result<Value> {
        let url = self.method_url(method);
        let body: ApiResponse = with_vendor_retry(
            &self.retry,
            &format!("Telegram {}", method),
            || async {
                let response = self.http.post(&url).json(payload).send().await?;
                Ok::<_, VendorError>(check_status(response).await?.json::<ApiResponse>().await?)
            },
        )
        .await
        .with_context(|| format!("Telegram {} request failed", method))?;

        if !body.ok {
            anyhow::bail!(
                "Telegram {} returned ok=false: {}",
                method,
                body.description.unwrap_or_default()
            );
        }
        Ok(body.result.unwrap_or(Value::Null))
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send(chat_id, text, None).await
    }

    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "MarkdownV2",
            reply_markup,
        };
        self.call("sendMessage", &request).await?;
        debug!("Sent message to chat {}", chat_id);
        Ok(())
    }

    pub async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        self.call(
            "answerCallbackQuery",
            &serde_json::json!({ "callback_query_id": callback_id }),
        )
        .await?;
        Ok(())
    }

    /// Resolve a file id to its download path.
    pub async fn get_file_path(&self, file_id: &str) -> Result<String> {
        let result = self
            .call("getFile", &serde_json::json!({ "file_id": file_id }))
            .await?;
        let file: File = serde_json::from_value(result).context("Failed to parse getFile result")?;
        file.file_path
            .with_context(|| format!("Telegram returned no file_path for {}", file_id))
    }

    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/file/bot{}/{}", self.api_url, self.token, file_path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to download file from Telegram")?;
        let response = check_status(response)
            .await
            .context("Telegram file download failed")?;
        let bytes = response
            .bytes()
            .await
            .context("Failed to read Telegram file body")?;
        Ok(bytes.to_vec())
    }

    /// Point Telegram at our webhook, optionally with a secret token header.
    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<()> {
        let mut payload = serde_json::json!({
            "url": url,
            "allowed_updates": ["message", "edited_message", "callback_query"],
        });
        if let Some(secret) = secret_token {
            payload["secret_token"] = Value::String(secret.to_string());
        }
        self.call("setWebhook", &payload).await?;
        info!("Webhook registered at {}", url);
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await
    }

    async fn send_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        rows: Vec<Vec<(String, String)>>,
    ) -> Result<()> {
        let inline_keyboard = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(text, callback_data)| InlineKeyboardButton {
                        text,
                        callback_data,
                    })
                    .collect()
            })
            .collect();
        self.send(chat_id, text, Some(InlineKeyboardMarkup { inline_keyboard }))
            .await
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.answer_callback_query(callback_id).await
    }
}

#[async_trait]
impl AudioSource for TelegramClient {
    async fn download_audio(&self, file_id: &str) -> Result<Vec<u8>> {
        let file_path = self.get_file_path(file_id).await?;
        self.download_file(&file_path).await
    }
}
