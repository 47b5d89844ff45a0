//! A chat's two-language pair and the direction rule between them.

use crate::languages::{Language, LanguageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered pair of two different supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    first: Language,
    second: Language,
}

impl LanguagePair {
    pub fn new(first: Language, second: Language) -> Result<Self, LanguageError> {
        if first == second {
            return Err(LanguageError::SameLanguage(first.code()));
        }
        Ok(Self { first, second })
    }

    /// Build a pair from two raw codes (as stored or typed by users).
    pub fn from_codes(first: &str, second: &str) -> Result<Self, LanguageError> {
        Self::new(Language::from_code(first)?, Language::from_code(second)?)
    }

    pub fn first(&self) -> Language {
        self.first
    }

    pub fn second(&self) -> Language {
        self.second
    }

    pub fn languages(&self) -> [Language; 2] {
        [self.first, self.second]
    }

    pub fn contains(&self, code: &str) -> bool {
        self.first == code || self.second == code
    }

    /// The pair member written in a non-Latin script, when exactly one is.
    pub fn sole_non_latin(&self) -> Option<Language> {
        match (self.first.is_latin(), self.second.is_latin()) {
            (true, false) => Some(self.second),
            (false, true) => Some(self.first),
            _ => None,
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ↔ {}", self.first.code(), self.second.code())
    }
}

impl FromStr for LanguagePair {
    type Err = LanguageError;

    /// Parse "en,ru" (also accepts "en-ru" and "en ru").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split(|c: char| c == ',' || c == '-' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        match parts.as_slice() {
            [first, second] => Self::from_codes(first, second),
            _ => Err(LanguageError::MalformedPair(s.to_string())),
        }
    }
}

/// Decide the translation target for text detected as `detected`.
///
/// Returns `None` when the detected language is not a pair member: an
/// unsolicited translation in a guessed direction is worse than none.
pub fn resolve_direction(detected: &str, pair: &LanguagePair) -> Option<Language> {
    if pair.first == detected {
        Some(pair.second)
    } else if pair.second == detected {
        Some(pair.first)
    } else {
        None
    }
}

/// What the caller should do with a message after detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationPlan {
    Translate { source: Language, target: Language },
    AlreadyInTarget(Language),
    NoAction,
}

/// Combine detection and direction into an action for the caller.
pub fn plan_translation(detected: &str, pair: &LanguagePair) -> TranslationPlan {
    match resolve_direction(detected, pair) {
        Some(target) if target == detected => TranslationPlan::AlreadyInTarget(target),
        Some(target) => match Language::from_code(detected) {
            Ok(source) => TranslationPlan::Translate { source, target },
            Err(_) => TranslationPlan::NoAction,
        },
        None => TranslationPlan::NoAction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::LanguageRegistry;
    use proptest::prelude::*;

    fn pair(a: &str, b: &str) -> LanguagePair {
        LanguagePair::from_codes(a, b).unwrap()
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_rejects_same_language() {
        let result = LanguagePair::new(Language::ENGLISH, Language::ENGLISH);
        assert_eq!(result, Err(LanguageError::SameLanguage("en")));
    }

    #[test]
    fn test_from_codes_rejects_unknown() {
        assert!(LanguagePair::from_codes("en", "xx").is_err());
    }

    #[test]
    fn test_parse_from_str_variants() {
        assert_eq!("en,ru".parse::<LanguagePair>().unwrap(), pair("en", "ru"));
        assert_eq!("HE-en".parse::<LanguagePair>().unwrap(), pair("he", "en"));
        assert_eq!(" th ru ".parse::<LanguagePair>().unwrap(), pair("th", "ru"));
        assert!(matches!(
            "en".parse::<LanguagePair>(),
            Err(LanguageError::MalformedPair(_))
        ));
        assert!("en,ru,fr".parse::<LanguagePair>().is_err());
    }

    #[test]
    fn test_sole_non_latin() {
        assert_eq!(pair("he", "en").sole_non_latin(), Some(Language::HEBREW));
        assert_eq!(pair("en", "ru").sole_non_latin(), Some(Language::RUSSIAN));
        assert_eq!(pair("en", "es").sole_non_latin(), None);
        assert_eq!(pair("he", "ru").sole_non_latin(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(pair("he", "en").to_string(), "he ↔ en");
    }

    // ==================== Direction Tests ====================

    #[test]
    fn test_resolve_direction_both_ways() {
        let p = pair("th", "ru");
        assert_eq!(resolve_direction("th", &p), Some(Language::RUSSIAN));
        assert_eq!(resolve_direction("ru", &p).unwrap().code(), "th");
    }

    #[test]
    fn test_resolve_direction_outside_pair() {
        let p = pair("th", "ru");
        assert_eq!(resolve_direction("en", &p), None);
        assert_eq!(resolve_direction("unknown", &p), None);
    }

    #[test]
    fn test_plan_translation() {
        let p = pair("he", "en");
        assert_eq!(
            plan_translation("he", &p),
            TranslationPlan::Translate {
                source: Language::HEBREW,
                target: Language::ENGLISH
            }
        );
        assert_eq!(plan_translation("fr", &p), TranslationPlan::NoAction);
    }

    fn any_language() -> impl Strategy<Value = Language> {
        let codes: Vec<&'static str> = LanguageRegistry::get()
            .list()
            .iter()
            .map(|l| l.code)
            .collect();
        proptest::sample::select(codes).prop_map(|c| Language::from_code(c).unwrap())
    }

    proptest! {
        #[test]
        fn prop_direction_is_symmetric(a in any_language(), b in any_language(), c in any_language()) {
            prop_assume!(a != b);
            let p = LanguagePair::new(a, b).unwrap();
            prop_assert_eq!(resolve_direction(a.code(), &p), Some(b));
            prop_assert_eq!(resolve_direction(b.code(), &p), Some(a));
            if c != a && c != b {
                prop_assert_eq!(resolve_direction(c.code(), &p), None);
            }
        }
    }
}
