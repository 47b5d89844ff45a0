//! Conversation layer: turns Telegram updates into replies.

use crate::db::{Database, MessageTranslationRecord, SelectionState};
use crate::detection::DetectionResolver;
use crate::languages::{plan_translation, Language, LanguagePair, TranslationPlan};
use crate::messages::{self, EditOutcome};
use crate::metrics::BotMetrics;
use crate::telegram::{CallbackQuery, Message, Update};
use crate::transcription::{AudioSource, TranscriptionOrchestrator};
use crate::translation::{TranslationFailure, Translator};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outgoing side of the chat. Texts are MarkdownV2-ready.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Send `text` with an inline keyboard of `(label, callback data)` rows.
    async fn send_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        rows: Vec<Vec<(String, String)>>,
    ) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str) -> Result<()>;
}

/// Where a translation request came from; decides the reply layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Text,
    Voice,
}

pub struct Bot {
    messenger: Arc<dyn Messenger>,
    audio: Arc<dyn AudioSource>,
    db: Database,
    resolver: DetectionResolver,
    translator: Translator,
    orchestrator: TranscriptionOrchestrator,
    metrics: BotMetrics,
    default_pair: LanguagePair,
}

impl Bot {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        audio: Arc<dyn AudioSource>,
        db: Database,
        resolver: DetectionResolver,
        translator: Translator,
        orchestrator: TranscriptionOrchestrator,
        default_pair: LanguagePair,
    ) -> Self {
        Self {
            messenger,
            audio,
            db,
            resolver,
            translator,
            orchestrator,
            metrics: BotMetrics::new(),
            default_pair,
        }
    }

    pub fn metrics(&self) -> &BotMetrics {
        &self.metrics
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn resolver(&self) -> &DetectionResolver {
        &self.resolver
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn default_pair(&self) -> LanguagePair {
        self.default_pair
    }

    pub async fn handle_update(&self, update: Update) -> Result<()> {
        if let Some(callback) = update.callback_query {
            return self.handle_callback(callback).await;
        }
        if let Some(message) = update.edited_message {
            self.metrics.record_message();
            return self.handle_edited(message).await;
        }
        if let Some(message) = update.message {
            self.metrics.record_message();
            return self.handle_message(message).await;
        }
        debug!("Ignoring update {} with no supported payload", update.update_id);
        Ok(())
    }

    /// Stored pair for the chat, else the configured default.
    async fn pair_for(&self, chat_id: i64) -> Result<LanguagePair> {
        Ok(self.db.get_pair(chat_id).await?.unwrap_or(self.default_pair))
    }

    async fn handle_message(&self, message: Message) -> Result<()> {
        let chat_id = message.chat.id;

        if let Some(text) = message.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            if text.starts_with('/') {
                let user_id = message.from.as_ref().map_or(chat_id, |u| u.id);
                return self.handle_command(chat_id, user_id, text).await;
            }
            return self.handle_text(&message, text).await;
        }

        if message.voice.is_some() {
            return self.handle_voice(&message).await;
        }

        debug!("Ignoring message {} in chat {} with no text or voice", message.message_id, chat_id);
        Ok(())
    }

    // ==================== Commands ====================

    async fn handle_command(&self, chat_id: i64, user_id: i64, text: &str) -> Result<()> {
        // "/setpair@LanguageBuddyBot extra" -> "/setpair"
        let command = text
            .split_whitespace()
            .next()
            .and_then(|word| word.split('@').next())
            .unwrap_or_default()
            .to_lowercase();

        info!("Received command {} in chat {}", command, chat_id);

        match command.as_str() {
            "/start" => {
                self.messenger.send_text(chat_id, messages::WELCOME).await?;
            }
            "/help" => {
                self.messenger.send_text(chat_id, messages::HELP).await?;
            }
            "/setpair" => {
                let started = match self.db.clear_selection_state(chat_id).await {
                    Ok(()) => {
                        self.db
                            .set_selection_state(chat_id, SelectionState::AwaitingFirst)
                            .await
                    }
                    Err(e) => Err(e),
                };

                match started {
                    Ok(()) => {
                        self.messenger
                            .send_keyboard(
                                chat_id,
                                messages::SETPAIR_PROMPT,
                                messages::language_keyboard(None),
                            )
                            .await?;
                    }
                    Err(e) => {
                        warn!("Failed to start language selection for chat {}: {:#}", chat_id, e);
                        self.messenger
                            .send_text(chat_id, messages::ERROR_START_SELECTION)
                            .await?;
                    }
                }
            }
            "/languages" => {
                self.messenger
                    .send_text(chat_id, &messages::languages_list())
                    .await?;
            }
            "/stats" => {
                let stats = self.db.get_user_stats(user_id).await?;
                let pair = self.pair_for(chat_id).await?;
                let text = messages::stats(
                    stats.as_ref().map_or(0, |s| s.translations),
                    &pair,
                    stats.map(|s| s.joined_at),
                );
                self.messenger.send_text(chat_id, &text).await?;
            }
            _ => {
                self.messenger
                    .send_text(chat_id, messages::UNKNOWN_COMMAND)
                    .await?;
            }
        }
        Ok(())
    }

    // ==================== Pair selection ====================

    async fn handle_callback(&self, callback: CallbackQuery) -> Result<()> {
        // Stop the client's spinner before anything can fail
        if let Err(e) = self.messenger.answer_callback(&callback.id).await {
            warn!("Failed to answer callback {}: {:#}", callback.id, e);
        }

        // In private chats the chat id is the user id
        let chat_id = callback
            .message
            .as_ref()
            .map_or(callback.from.id, |m| m.chat.id);
        let data = callback.data.as_deref().unwrap_or_default();

        if let Err(e) = self.select_language(chat_id, data).await {
            warn!("Language selection failed in chat {}: {:#}", chat_id, e);
            self.messenger
                .send_text(chat_id, messages::ERROR_USE_SETPAIR)
                .await?;
        }
        Ok(())
    }

    /// One step of the two-step pair selection.
    async fn select_language(&self, chat_id: i64, data: &str) -> Result<()> {
        let Some(state) = self.db.get_selection_state(chat_id).await? else {
            info!("Callback '{}' in chat {} without a selection in progress", data, chat_id);
            self.messenger
                .send_text(chat_id, messages::ERROR_INVALID_CALLBACK)
                .await?;
            return Ok(());
        };

        let language = match Language::from_code(data) {
            Ok(language) => language,
            Err(e) => {
                warn!("Invalid language selection in chat {}: {}", chat_id, e);
                self.messenger
                    .send_text(chat_id, messages::ERROR_INVALID_SELECTION)
                    .await?;
                return Ok(());
            }
        };

        match state {
            SelectionState::AwaitingFirst => {
                self.db
                    .set_selection_state(chat_id, SelectionState::AwaitingSecond { first: language })
                    .await?;
                self.messenger
                    .send_keyboard(
                        chat_id,
                        &messages::first_language_selected(language),
                        messages::language_keyboard(Some(language)),
                    )
                    .await?;
            }
            SelectionState::AwaitingSecond { first } => {
                let pair = match LanguagePair::new(first, language) {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("Rejected pair selection in chat {}: {}", chat_id, e);
                        self.messenger
                            .send_text(chat_id, messages::ERROR_INVALID_SELECTION)
                            .await?;
                        return Ok(());
                    }
                };

                if let Err(e) = self.db.set_pair(chat_id, &pair).await {
                    warn!("Failed to store pair for chat {}: {:#}", chat_id, e);
                    self.messenger
                        .send_text(chat_id, messages::ERROR_FAILED_SET_PAIR)
                        .await?;
                    return Ok(());
                }

                info!("Chat {} now uses pair {}", chat_id, pair);
                self.db.clear_selection_state(chat_id).await?;
                self.messenger
                    .send_text(chat_id, &messages::pair_set(&pair))
                    .await?;
            }
        }
        Ok(())
    }

    // ==================== Translation ====================

    async fn handle_text(&self, message: &Message, text: &str) -> Result<()> {
        let chat_id = message.chat.id;
        let pair = self.pair_for(chat_id).await?;
        let detection = self.resolver.resolve(text, Some(&pair)).await;

        match plan_translation(&detection.language_code, &pair) {
            TranslationPlan::Translate { source, target } => {
                self.translate_and_reply(message, text, source, target, Origin::Text)
                    .await
            }
            TranslationPlan::AlreadyInTarget(language) => {
                debug!("Message in chat {} already in {}", chat_id, language.code());
                Ok(())
            }
            TranslationPlan::NoAction => {
                info!(
                    "No translation for chat {}: detected '{}' outside {}",
                    chat_id, detection.language_code, pair
                );
                Ok(())
            }
        }
    }

    /// Translate, then count and remember the result on success.
    async fn translate_and_record(
        &self,
        message: &Message,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslationFailure> {
        let result = self.translator.translate(text, target, Some(source)).await;

        match &result {
            Ok(translated) => {
                self.metrics.record_translation_success();
                self.remember(message, text, translated, source, target).await;
            }
            Err(TranslationFailure::Rejected(_)) => self.metrics.record_translation_rejected(),
            Err(TranslationFailure::Vendor(_)) => self.metrics.record_translation_failure(),
        }
        result
    }

    /// Persist stats and the translation record; failures here never block the reply.
    async fn remember(
        &self,
        message: &Message,
        original: &str,
        translated: &str,
        source: Language,
        target: Language,
    ) {
        let user_id = message.from.as_ref().map_or(message.chat.id, |u| u.id);

        if let Err(e) = self.db.record_translation(user_id).await {
            warn!("Failed to update stats for user {}: {:#}", user_id, e);
        }

        let record = MessageTranslationRecord {
            chat_id: message.chat.id,
            message_id: message.message_id,
            user_id,
            original_text: original.to_string(),
            translated_text: translated.to_string(),
            source_lang: source,
            target_lang: target,
        };
        if let Err(e) = self.db.store_translation(&record).await {
            warn!(
                "Failed to store translation for message {}: {:#}",
                message.message_id, e
            );
        }
    }

    async fn translate_and_reply(
        &self,
        message: &Message,
        text: &str,
        source: Language,
        target: Language,
        origin: Origin,
    ) -> Result<()> {
        let sender = message.sender_name();
        let reply = match self.translate_and_record(message, text, source, target).await {
            Ok(translated) => match origin {
                Origin::Text => messages::translation(sender, source, target, text, &translated),
                Origin::Voice => {
                    messages::voice_translation(sender, source, target, text, &translated)
                }
            },
            Err(failure) => messages::translation_failed(sender, text, failure.user_message()),
        };
        self.messenger.send_text(message.chat.id, &reply).await
    }

    // ==================== Voice ====================

    async fn handle_voice(&self, message: &Message) -> Result<()> {
        let Some(voice) = message.voice.as_ref() else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        let pair = self.pair_for(chat_id).await?;

        info!(
            "Transcribing voice message {} in chat {} ({:?}s)",
            message.message_id, chat_id, voice.duration
        );

        let Some(candidate) = self
            .orchestrator
            .transcribe_file(self.audio.as_ref(), &voice.file_id, &pair.languages())
            .await
        else {
            self.metrics.record_transcription_failure();
            self.messenger
                .send_text(chat_id, &messages::voice_failed(message.sender_name()))
                .await?;
            return Ok(());
        };

        self.metrics.record_transcription_success();
        info!(
            "Voice message {} transcribed by {} (confidence {:.2})",
            message.message_id,
            candidate.vendor(),
            candidate.confidence()
        );

        let transcript = candidate.text();
        let detection = self.resolver.resolve(transcript, Some(&pair)).await;

        match plan_translation(&detection.language_code, &pair) {
            TranslationPlan::Translate { source, target } => {
                self.translate_and_reply(message, transcript, source, target, Origin::Voice)
                    .await
            }
            TranslationPlan::AlreadyInTarget(_) | TranslationPlan::NoAction => {
                let detected = Language::from_code(&detection.language_code).ok();
                let reply = messages::voice_transcription_only(
                    message.sender_name(),
                    transcript,
                    detected,
                );
                self.messenger.send_text(chat_id, &reply).await
            }
        }
    }

    // ==================== Edits ====================

    async fn handle_edited(&self, message: Message) -> Result<()> {
        let Some(text) = message.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(());
        };
        if text.starts_with('/') {
            return self.handle_message(message.clone()).await;
        }

        let chat_id = message.chat.id;
        let Some(previous) = self
            .db
            .get_previous_translation(chat_id, message.message_id)
            .await?
        else {
            debug!(
                "Edited message {} has no stored translation, handling as new",
                message.message_id
            );
            return self.handle_message(message.clone()).await;
        };

        let pair = self.pair_for(chat_id).await?;
        let detection = self.resolver.resolve(text, Some(&pair)).await;

        let fresh = match plan_translation(&detection.language_code, &pair) {
            TranslationPlan::Translate { source, target } => {
                Some(self.translate_and_record(&message, text, source, target).await)
            }
            TranslationPlan::AlreadyInTarget(_) | TranslationPlan::NoAction => None,
        };

        let reply = match &fresh {
            Some(Ok(translated)) => messages::edited(
                message.sender_name(),
                text,
                &previous.translated_text,
                EditOutcome::Translated(translated),
            ),
            Some(Err(_)) => messages::edited(
                message.sender_name(),
                text,
                &previous.translated_text,
                EditOutcome::Failed,
            ),
            None => messages::edited(
                message.sender_name(),
                text,
                &previous.translated_text,
                EditOutcome::NotInPair,
            ),
        };
        self.messenger.send_text(chat_id, &reply).await
    }
}
