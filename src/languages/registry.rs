//! Language registry: single source of truth for every supported language.
//!
//! The registry is built once on first access (`OnceLock`) and is immutable
//! afterwards. Pair validation, keyboards, the `/languages` listing and the
//! romanization bias in detection all read from here.

use std::sync::OnceLock;

/// Broad writing-system class of a language.
///
/// Only the Latin / non-Latin split matters to detection: a non-Latin
/// language can be romanized into Latin letters, the reverse does not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptClass {
    Latin,
    NonLatin,
}

/// Metadata for one supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 code (e.g., "en", "he")
    pub code: &'static str,

    /// English name (e.g., "Hebrew")
    pub name: &'static str,

    /// Flag emoji shown on keyboard buttons
    pub flag: &'static str,

    /// Writing system the language is normally written in
    pub script: ScriptClass,
}

/// Global registry of supported languages.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global registry, initializing it on first call.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Look up a language by its exact (lowercase) code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Look up a language by its English name, ignoring case.
    ///
    /// Some speech vendors report "hebrew" instead of "he".
    pub fn get_by_name(&self, name: &str) -> Option<&LanguageConfig> {
        let name = name.trim();
        self.languages
            .iter()
            .find(|lang| lang.name.eq_ignore_ascii_case(name))
    }

    /// All languages in registry order.
    pub fn list(&self) -> &[LanguageConfig] {
        &self.languages
    }

    /// All languages sorted by code, for user-facing listings.
    pub fn list_sorted(&self) -> Vec<&LanguageConfig> {
        let mut sorted: Vec<_> = self.languages.iter().collect();
        sorted.sort_by_key(|lang| lang.code);
        sorted
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

fn lang(
    code: &'static str,
    name: &'static str,
    flag: &'static str,
    script: ScriptClass,
) -> LanguageConfig {
    LanguageConfig {
        code,
        name,
        flag,
        script,
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    use ScriptClass::{Latin, NonLatin};

    vec![
        lang("en", "English", "🇺🇸", Latin),
        lang("es", "Spanish", "🇪🇸", Latin),
        lang("fr", "French", "🇫🇷", Latin),
        lang("de", "German", "🇩🇪", Latin),
        lang("it", "Italian", "🇮🇹", Latin),
        lang("pt", "Portuguese", "🇵🇹", Latin),
        lang("ru", "Russian", "🇷🇺", NonLatin),
        lang("zh", "Chinese", "🇨🇳", NonLatin),
        lang("ja", "Japanese", "🇯🇵", NonLatin),
        lang("ko", "Korean", "🇰🇷", NonLatin),
        lang("ar", "Arabic", "🇸🇦", NonLatin),
        lang("hi", "Hindi", "🇮🇳", NonLatin),
        lang("tr", "Turkish", "🇹🇷", Latin),
        lang("pl", "Polish", "🇵🇱", Latin),
        lang("nl", "Dutch", "🇳🇱", Latin),
        lang("sv", "Swedish", "🇸🇪", Latin),
        lang("da", "Danish", "🇩🇰", Latin),
        lang("no", "Norwegian", "🇳🇴", Latin),
        lang("fi", "Finnish", "🇫🇮", Latin),
        lang("el", "Greek", "🇬🇷", NonLatin),
        lang("he", "Hebrew", "🇮🇱", NonLatin),
        lang("th", "Thai", "🇹🇭", NonLatin),
        lang("vi", "Vietnamese", "🇻🇳", Latin),
        lang("id", "Indonesian", "🇮🇩", Latin),
        lang("ms", "Malay", "🇲🇾", Latin),
        lang("tl", "Filipino", "🇵🇭", Latin),
        lang("uk", "Ukrainian", "🇺🇦", NonLatin),
        lang("cs", "Czech", "🇨🇿", Latin),
        lang("sk", "Slovak", "🇸🇰", Latin),
        lang("hu", "Hungarian", "🇭🇺", Latin),
        lang("ro", "Romanian", "🇷🇴", Latin),
        lang("bg", "Bulgarian", "🇧🇬", NonLatin),
        lang("hr", "Croatian", "🇭🇷", Latin),
        lang("sr", "Serbian", "🇷🇸", NonLatin),
        lang("sl", "Slovenian", "🇸🇮", Latin),
        lang("et", "Estonian", "🇪🇪", Latin),
        lang("lv", "Latvian", "🇱🇻", Latin),
        lang("lt", "Lithuanian", "🇱🇹", Latin),
        lang("fa", "Persian", "🇮🇷", NonLatin),
        lang("ur", "Urdu", "🇵🇰", NonLatin),
        lang("bn", "Bengali", "🇧🇩", NonLatin),
        lang("ta", "Tamil", "🇮🇳", NonLatin),
        lang("te", "Telugu", "🇮🇳", NonLatin),
        lang("mr", "Marathi", "🇮🇳", NonLatin),
        lang("gu", "Gujarati", "🇮🇳", NonLatin),
        lang("kn", "Kannada", "🇮🇳", NonLatin),
        lang("ml", "Malayalam", "🇮🇳", NonLatin),
        lang("si", "Sinhala", "🇱🇰", NonLatin),
    ]
}
