//! Language type: a code validated against the registry.

use crate::languages::{LanguageConfig, LanguageRegistry, ScriptClass};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    #[error("Unknown language code: '{0}'")]
    UnknownCode(String),

    #[error("Language pair must contain two different languages, got '{0}' twice")]
    SameLanguage(&'static str),

    #[error("Invalid language pair '{0}', expected two codes like 'en,ru'")]
    MalformedPair(String),
}

/// A supported language.
///
/// Can only be constructed from a code present in the registry, so holders
/// never need to re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };
    pub const RUSSIAN: Language = Language { code: "ru" };
    pub const HEBREW: Language = Language { code: "he" };
    pub const SPANISH: Language = Language { code: "es" };

    /// Create a Language from a code string.
    ///
    /// Leading/trailing whitespace and letter case are ignored, so
    /// `" HE "` resolves to Hebrew.
    pub fn from_code(code: &str) -> Result<Language, LanguageError> {
        let normalized = code.trim().to_lowercase();
        LanguageRegistry::get()
            .get_by_code(&normalized)
            .map(|config| Language { code: config.code })
            .ok_or_else(|| LanguageError::UnknownCode(code.to_string()))
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// # Panics
    /// Never in practice: a `Language` can only be built from a registry code.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn flag(&self) -> &'static str {
        self.config().flag
    }

    pub fn script(&self) -> ScriptClass {
        self.config().script
    }

    pub fn is_latin(&self) -> bool {
        self.script() == ScriptClass::Latin
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl PartialEq<str> for Language {
    fn eq(&self, other: &str) -> bool {
        self.code == other
    }
}

impl PartialEq<&str> for Language {
    fn eq(&self, other: &&str) -> bool {
        self.code == *other
    }
}

impl Serialize for Language {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code)
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        Language::from_code(&code).map_err(serde::de::Error::custom)
    }
}
