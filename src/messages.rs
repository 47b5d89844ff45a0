//! User-facing bot messages.
//!
//! Static texts are stored pre-escaped for Telegram's MarkdownV2 parse mode.
//! Anything coming from a user or a vendor goes through `escape_markdownv2`
//! before it is spliced in.

use crate::languages::{Language, LanguagePair, LanguageRegistry};
use crate::telegram::escape_markdownv2;
use chrono::{DateTime, Utc};

/// Buttons per keyboard row.
pub const KEYBOARD_COLUMNS: usize = 3;

/// Longest message `sendMessage` accepts, in UTF-16 code units.
pub const TELEGRAM_CHAR_LIMIT: usize = 4096;

const ELLIPSIS: char = '…';

// ==================== Errors ====================

pub const ERROR_USE_SETPAIR: &str = "❌ An error occurred\\. Please use /setpair to start over\\.";
pub const ERROR_INVALID_SELECTION: &str = "❌ Invalid language selection\\. Please try again\\.";
pub const ERROR_FAILED_SET_PAIR: &str = "❌ Failed to set language pair\\. Please try again\\.";
pub const ERROR_INVALID_CALLBACK: &str = "❌ Invalid callback data\\. Please try again\\.";
pub const ERROR_START_SELECTION: &str =
    "❌ Failed to start language selection\\. Please try again\\.";
pub const UNKNOWN_COMMAND: &str = "❓ Unknown command\\. Use /help to see available commands\\.";

// ==================== Static texts ====================

pub const WELCOME: &str = "🤖 *Welcome to Language Buddy Bot\\!*\n\n\
I help you communicate between two languages\\! Set up your language pair once and I'll translate messages bidirectionally\\.\n\n\
*Commands:*\n\
/setpair \\- Choose your language pair\n\
/stats \\- View your translation statistics\n\
/help \\- Show help information\n\
/languages \\- List all supported languages\n\n\
*Quick Start:*\n\
1\\. Use /setpair to choose your two languages\n\
2\\. Send me any text or voice message\n\
3\\. I'll translate between your languages automatically\\!\n\n\
Language pairs are saved per chat, so every group keeps its own pair\\.\n\n\
_Just send me a message to get started\\!_ 🚀";

pub const HELP: &str = "🆘 *Language Buddy Bot Help*\n\n\
*How it works:*\n\
• Set up a language pair \\(e\\.g\\. Thai ↔ Russian\\)\n\
• Send any text or voice message and I'll translate between your languages\n\
• I detect which of the two languages you're using, no need to specify direction\n\
• Edit a message and I'll show the old and the new translation\n\n\
*Commands:*\n\
• /start \\- Welcome message\n\
• /setpair \\- Choose your language pair\n\
• /stats \\- View your translation statistics\n\
• /languages \\- List all supported languages\n\
• /help \\- Show this help\n\n\
_Need help? Just ask\\!_ 💬";

pub const SETPAIR_PROMPT: &str = "🌍 *Step 1: Choose your first language*\n\n\
Select the first language for your translation pair:";

const SECOND_LANGUAGE_PROMPT: &str = "Now choose your second language:";

// ==================== Length limit ====================

fn telegram_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// First `keep` characters of `text`, with an ellipsis when anything was cut.
fn truncate_at_limit(text: &str, keep: usize) -> String {
    match text.char_indices().nth(keep) {
        Some((end, _)) => {
            let mut cut = text[..end].trim_end().to_string();
            cut.push(ELLIPSIS);
            cut
        }
        None => text.to_string(),
    }
}

/// Renders a message from raw user or vendor texts, shortening them in order
/// until the result fits in one Telegram message.
///
/// Texts are cut before `render` escapes them, so an escape sequence is
/// never split. An earlier text is cut down to its ellipsis before a later
/// one is touched.
fn fit_to_limit(texts: &[&str], render: impl Fn(&[&str]) -> String) -> String {
    let mut parts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
    let render_parts = |parts: &[String]| {
        let borrowed: Vec<&str> = parts.iter().map(String::as_str).collect();
        render(&borrowed)
    };

    let message = render_parts(&parts);
    if telegram_len(&message) <= TELEGRAM_CHAR_LIMIT {
        return message;
    }

    for (i, text) in texts.iter().enumerate() {
        parts[i] = truncate_at_limit(text, 0);
        if telegram_len(&render_parts(&parts)) > TELEGRAM_CHAR_LIMIT {
            continue;
        }

        // Largest prefix that still fits
        let (mut lo, mut hi) = (0, text.chars().count());
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            parts[i] = truncate_at_limit(text, mid);
            if telegram_len(&render_parts(&parts)) <= TELEGRAM_CHAR_LIMIT {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        parts[i] = truncate_at_limit(text, lo);
        break;
    }

    render_parts(&parts)
}

// ==================== Builders ====================

fn flagged(language: Language) -> String {
    format!("{} {}", language.flag(), language.name())
}

/// Language keyboard rows of `(label, callback data)`, optionally leaving one out.
pub fn language_keyboard(exclude: Option<Language>) -> Vec<Vec<(String, String)>> {
    let buttons: Vec<(String, String)> = LanguageRegistry::get()
        .list()
        .iter()
        .filter(|config| exclude.map_or(true, |l| l.code() != config.code))
        .map(|config| {
            (
                format!("{} {}", config.flag, config.name),
                config.code.to_string(),
            )
        })
        .collect();

    buttons
        .chunks(KEYBOARD_COLUMNS)
        .map(|row| row.to_vec())
        .collect()
}

pub fn first_language_selected(first: Language) -> String {
    format!(
        "✅ *First language selected: {}*\n\n{}",
        escape_markdownv2(&flagged(first)),
        SECOND_LANGUAGE_PROMPT
    )
}

pub fn pair_set(pair: &LanguagePair) -> String {
    format!(
        "✅ *Language pair set to {} ↔ {}*\n\n\
         Now send me any message and I'll translate between these languages\\!",
        escape_markdownv2(&flagged(pair.first())),
        escape_markdownv2(&flagged(pair.second()))
    )
}

/// `/languages`: one "`code` - Name" line per language, sorted by code.
pub fn languages_list() -> String {
    let lines: Vec<String> = LanguageRegistry::get()
        .list_sorted()
        .into_iter()
        .map(|config| format!("`{}` \\- {}", config.code, escape_markdownv2(config.name)))
        .collect();
    format!(
        "🌍 *Supported Languages:*\n\n{}\n\nUse /setpair to choose your language pair\\!",
        lines.join("\n")
    )
}

pub fn stats(translations: i64, pair: &LanguagePair, member_since: Option<DateTime<Utc>>) -> String {
    let joined = member_since
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    format!(
        "📊 *Your Translation Stats:*\n\n\
         🔤 *Translations:* {}\n\
         🌍 *Language Pair:* {} ↔ {}\n\
         📅 *Member Since:* {}\n\n\
         _Keep translating to increase your stats\\!_ 🚀",
        translations,
        escape_markdownv2(pair.first().name()),
        escape_markdownv2(pair.second().name()),
        escape_markdownv2(&joined)
    )
}

pub fn translation(
    user_name: &str,
    source: Language,
    target: Language,
    original: &str,
    translated: &str,
) -> String {
    fit_to_limit(&[original, translated], |parts| {
        format!(
            "🔤 *Translation* \\({} → {}\\)\n\n👤 *{}:*\n_{}_\n\n🔄 *Translation:*\n_{}_",
            source.code(),
            target.code(),
            escape_markdownv2(user_name),
            escape_markdownv2(parts[0]),
            escape_markdownv2(parts[1])
        )
    })
}

pub fn translation_failed(user_name: &str, original: &str, failure_notice: &str) -> String {
    fit_to_limit(&[original], |parts| {
        format!(
            "👤 *{}:*\n_{}_\n\n⚠️ {}",
            escape_markdownv2(user_name),
            escape_markdownv2(parts[0]),
            escape_markdownv2(failure_notice)
        )
    })
}

pub fn voice_translation(
    user_name: &str,
    source: Language,
    target: Language,
    transcript: &str,
    translated: &str,
) -> String {
    fit_to_limit(&[transcript, translated], |parts| {
        format!(
            "🎤 *Voice Translation* \\({} → {}\\)\n\n👤 *{}:*\n_{}_\n\n🔄 *Translation:*\n_{}_",
            source.code(),
            target.code(),
            escape_markdownv2(user_name),
            escape_markdownv2(parts[0]),
            escape_markdownv2(parts[1])
        )
    })
}

/// Transcript shown on its own when no translation direction could be decided.
pub fn voice_transcription_only(
    user_name: &str,
    transcript: &str,
    detected: Option<Language>,
) -> String {
    fit_to_limit(&[transcript], |parts| {
        let mut text = format!(
            "🎤 *Voice Transcription*\n\n👤 *{}:*\n📝 *Transcription:*\n_{}_",
            escape_markdownv2(user_name),
            escape_markdownv2(parts[0])
        );
        if let Some(language) = detected {
            text.push_str(&format!(
                "\n\n🌍 *Detected Language:* {}",
                escape_markdownv2(language.name())
            ));
        }
        text.push_str(
            "\n\n💡 *Tip:* Use /setpair to configure languages for automatic translation\\.",
        );
        text
    })
}

pub fn voice_failed(user_name: &str) -> String {
    format!(
        "❌ *Voice transcription failed*\n\n👤 *{}:*\n\
         ⚠️ Unable to transcribe this voice message\\.\n\n\
         🔧 *Possible reasons:*\n\
         • Audio quality is too low\n\
         • No speech detected\n\
         • All transcription services are temporarily unavailable\n\n\
         💡 *Tip:* Try sending a text message instead\\.",
        escape_markdownv2(user_name)
    )
}

/// What happened to the new text of an edited message.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome<'a> {
    Translated(&'a str),
    Failed,
    NotInPair,
}

pub fn edited(user_name: &str, text: &str, previous_translation: &str, outcome: EditOutcome<'_>) -> String {
    let new_translation = match outcome {
        EditOutcome::Translated(translated) => translated,
        _ => "",
    };
    fit_to_limit(&[text, previous_translation, new_translation], |parts| {
        let tail = match &outcome {
            EditOutcome::Translated(_) => {
                format!("🔄 *New Translation:*\n_{}_", escape_markdownv2(parts[2]))
            }
            EditOutcome::Failed => "❌ *New translation failed*".to_string(),
            EditOutcome::NotInPair => {
                "⚠️ *Note:* New text language not in your language pair".to_string()
            }
        };
        format!(
            "✏️ *Message Edited*\n\n👤 *{}:*\n_{}_\n\n📝 *Previous Translation:*\n_{}_\n\n{}",
            escape_markdownv2(user_name),
            escape_markdownv2(parts[0]),
            escape_markdownv2(parts[1]),
            tail
        )
    })
}
