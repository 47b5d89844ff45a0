use crate::languages::{Language, LanguagePair};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{info, warn};

/// Progress through the two-step `/setpair` flow for one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SelectionState {
    AwaitingFirst,
    AwaitingSecond { first: Language },
}

/// A delivered translation, kept so an edited message can show what it replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTranslationRecord {
    pub chat_id: i64,
    pub message_id: i64,
    pub user_id: i64,
    pub original_text: String,
    pub translated_text: String,
    pub source_lang: Language,
    pub target_lang: Language,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub translations: i64,
    pub joined_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Aggregate usage across all chats, for the `/stats` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    pub chats_with_pairs: i64,
    pub users: i64,
    pub total_translations: i64,
    /// (language code, number of chat pairs that include it), most used first
    pub language_distribution: Vec<(String, i64)>,
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS language_pairs (
        chat_id INTEGER PRIMARY KEY,
        language1 TEXT NOT NULL,
        language2 TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS selection_states (
        chat_id INTEGER PRIMARY KEY,
        state TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS user_stats (
        user_id INTEGER PRIMARY KEY,
        translations INTEGER NOT NULL DEFAULT 0,
        joined_at TEXT NOT NULL,
        last_activity TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS message_translations (
        chat_id INTEGER NOT NULL,
        message_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        original_text TEXT NOT NULL,
        translated_text TEXT NOT NULL,
        source_lang TEXT NOT NULL,
        target_lang TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (chat_id, message_id)
    )",
];

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and create tables if they do not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with(database_url, 5).await
    }

    /// Private in-memory database; a single connection keeps it alive.
    pub async fn in_memory() -> Result<Self> {
        Self::connect_with("sqlite::memory:", 1).await
    }

    async fn connect_with(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to open database at {}", database_url))?;

        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&pool)
                .await
                .context("Failed to create tables")?;
        }

        info!("Database ready");
        Ok(Self { pool })
    }

    // ==================== Language pairs ====================

    pub async fn get_pair(&self, chat_id: i64) -> Result<Option<LanguagePair>> {
        let row = sqlx::query("SELECT language1, language2 FROM language_pairs WHERE chat_id = ?1")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load language pair")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let first: String = row.try_get("language1")?;
        let second: String = row.try_get("language2")?;

        // A pair that no longer validates (e.g. a language was dropped) counts as unset
        match LanguagePair::from_codes(&first, &second) {
            Ok(pair) => Ok(Some(pair)),
            Err(e) => {
                warn!("Ignoring invalid stored pair for chat {}: {}", chat_id, e);
                Ok(None)
            }
        }
    }

    pub async fn set_pair(&self, chat_id: i64, pair: &LanguagePair) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO language_pairs (chat_id, language1, language2, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(chat_id) DO UPDATE SET
                language1 = excluded.language1,
                language2 = excluded.language2,
                updated_at = excluded.updated_at",
        )
        .bind(chat_id)
        .bind(pair.first().code())
        .bind(pair.second().code())
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to save language pair")?;
        Ok(())
    }

    // ==================== Selection state ====================

    pub async fn get_selection_state(&self, chat_id: i64) -> Result<Option<SelectionState>> {
        let state: Option<String> =
            sqlx::query_scalar("SELECT state FROM selection_states WHERE chat_id = ?1")
                .bind(chat_id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to load selection state")?;

        match state {
            Some(json) => match serde_json::from_str(&json) {
                Ok(state) => Ok(Some(state)),
                Err(e) => {
                    warn!("Discarding unreadable selection state for chat {}: {}", chat_id, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub async fn set_selection_state(&self, chat_id: i64, state: SelectionState) -> Result<()> {
        let json = serde_json::to_string(&state).context("Failed to serialize selection state")?;
        sqlx::query(
            "INSERT INTO selection_states (chat_id, state, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(chat_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
        )
        .bind(chat_id)
        .bind(json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to save selection state")?;
        Ok(())
    }

    pub async fn clear_selection_state(&self, chat_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM selection_states WHERE chat_id = ?1")
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .context("Failed to clear selection state")?;
        Ok(())
    }

    // ==================== Translation records ====================

    /// Store a translation, replacing any earlier one for the same message.
    pub async fn store_translation(&self, record: &MessageTranslationRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO message_translations
                (chat_id, message_id, user_id, original_text, translated_text, source_lang, target_lang, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(chat_id, message_id) DO UPDATE SET
                user_id = excluded.user_id,
                original_text = excluded.original_text,
                translated_text = excluded.translated_text,
                source_lang = excluded.source_lang,
                target_lang = excluded.target_lang,
                created_at = excluded.created_at",
        )
        .bind(record.chat_id)
        .bind(record.message_id)
        .bind(record.user_id)
        .bind(&record.original_text)
        .bind(&record.translated_text)
        .bind(record.source_lang.code())
        .bind(record.target_lang.code())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to store translation")?;
        Ok(())
    }

    pub async fn get_previous_translation(
        &self,
        chat_id: i64,
        message_id: i64,
    ) -> Result<Option<MessageTranslationRecord>> {
        let row = sqlx::query(
            "SELECT chat_id, message_id, user_id, original_text, translated_text, source_lang, target_lang
             FROM message_translations WHERE chat_id = ?1 AND message_id = ?2",
        )
        .bind(chat_id)
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load previous translation")?;

        row.map(|row| record_from_row(&row)).transpose()
    }

    // ==================== Usage statistics ====================

    /// Count one delivered translation for `user_id`.
    pub async fn record_translation(&self, user_id: i64) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO user_stats (user_id, translations, joined_at, last_activity)
             VALUES (?1, 1, ?2, ?2)
             ON CONFLICT(user_id) DO UPDATE SET
                translations = translations + 1,
                last_activity = excluded.last_activity",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to update user stats")?;
        Ok(())
    }

    pub async fn get_user_stats(&self, user_id: i64) -> Result<Option<UserStats>> {
        let row = sqlx::query(
            "SELECT translations, joined_at, last_activity FROM user_stats WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load user stats")?;

        row.map(|row| -> Result<UserStats> {
            Ok(UserStats {
                translations: row.try_get("translations")?,
                joined_at: row.try_get("joined_at")?,
                last_activity: row.try_get("last_activity")?,
            })
        })
        .transpose()
    }

    pub async fn usage_report(&self) -> Result<UsageReport> {
        let chats_with_pairs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM language_pairs")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count language pairs")?;

        let (users, total_translations): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(translations), 0) FROM user_stats",
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum user stats")?;

        let language_distribution: Vec<(String, i64)> = sqlx::query_as(
            "SELECT code, COUNT(*) AS chats FROM (
                SELECT language1 AS code FROM language_pairs
                UNION ALL
                SELECT language2 AS code FROM language_pairs
             )
             GROUP BY code
             ORDER BY chats DESC, code ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute language distribution")?;

        Ok(UsageReport {
            chats_with_pairs,
            users,
            total_translations,
            language_distribution,
        })
    }
}

fn record_from_row(row: &SqliteRow) -> Result<MessageTranslationRecord> {
    let source: String = row.try_get("source_lang")?;
    let target: String = row.try_get("target_lang")?;
    Ok(MessageTranslationRecord {
        chat_id: row.try_get("chat_id")?,
        message_id: row.try_get("message_id")?,
        user_id: row.try_get("user_id")?,
        original_text: row.try_get("original_text")?,
        translated_text: row.try_get("translated_text")?,
        source_lang: Language::from_code(&source)?,
        target_lang: Language::from_code(&target)?,
    })
}
