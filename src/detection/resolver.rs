//! Merges script and vendor detection into one language code.

use crate::detection::script::{contains_script, detect_by_script, is_latin_only, ScriptDetection};
use crate::detection::{DetectionMethod, DetectionResult, VendorDetector};
use crate::languages::{Language, LanguagePair};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, info};

// Empirically tuned; keep as-is without new data.
pub const VENDOR_HIGH_CONFIDENCE: f64 = 0.8;
pub const VENDOR_LOW_CONFIDENCE: f64 = 0.6;
pub const ROMANIZATION_CONFIDENCE_CUTOFF: f64 = 0.90;
pub const REDETECTION_CONFIDENCE_CUTOFF: f64 = 0.85;

/// Languages the vendor systematically confuses; script evidence wins on disagreement.
pub const VENDOR_WEAK_LANGUAGES: &[&str] = &["he", "ar", "th", "ko", "ja", "zh"];

/// (vendor says, text actually shows) pairs of visually confusable scripts.
const VENDOR_CONFUSIONS: &[(&str, &str)] = &[("hi", "he")];

/// Re-detection target when only one candidate language is in play.
const NEUTRAL_TARGET: Language = Language::ENGLISH;
const NEUTRAL_FALLBACK_TARGET: Language = Language::SPANISH;

fn noise_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // URLs, @mentions and leading /commands carry no language signal
    RE.get_or_init(|| {
        Regex::new(r"(?i)https?://\S+|www\.\S+|@\w+|(^|\s)/\w+").expect("valid regex")
    })
}

/// Strip URLs, mentions and commands, then collapse whitespace.
fn clean_for_detection(text: &str) -> String {
    let stripped = noise_regex().replace_all(text, " ");
    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        text.trim().to_string()
    } else {
        cleaned
    }
}

/// Apply the fixed conflict-resolution order to the two detector outputs.
fn merge(
    script: Option<ScriptDetection>,
    vendor: Option<&DetectionResult>,
    text: &str,
) -> DetectionResult {
    let resolved = match (vendor, script) {
        (None, None) => return DetectionResult::unknown(),
        (None, Some(script)) => script.into(),
        (Some(vendor), script) => {
            let agrees = script.map_or(true, |s| s.code == vendor.language_code);
            if vendor.confidence > VENDOR_HIGH_CONFIDENCE && agrees {
                vendor.clone()
            } else if let Some(s) = script.filter(|_| vendor.confidence < VENDOR_LOW_CONFIDENCE) {
                s.into()
            } else if let Some(s) = script
                .filter(|s| s.code != vendor.language_code && VENDOR_WEAK_LANGUAGES.contains(&s.code))
            {
                s.into()
            } else {
                vendor.clone()
            }
        }
    };
    correct_vendor_confusion(resolved, text)
}

fn correct_vendor_confusion(mut result: DetectionResult, text: &str) -> DetectionResult {
    if let Some((_, actual)) = VENDOR_CONFUSIONS
        .iter()
        .find(|(wrong, actual)| result.language_code == *wrong && contains_script(text, actual))
    {
        debug!(
            "Correcting confusable detection '{}' to '{}'",
            result.language_code, actual
        );
        result.language_code = actual.to_string();
        result.method = DetectionMethod::Merged;
    }
    result
}

/// Final language decision for one message.
#[derive(Clone)]
pub struct DetectionResolver {
    vendor: VendorDetector,
}

impl DetectionResolver {
    pub fn new(vendor: VendorDetector) -> Self {
        Self { vendor }
    }

    /// Resolve the language of `text`, optionally biased toward `pair`.
    ///
    /// Never fails: returns the `unknown` sentinel when neither detector
    /// produces anything.
    pub async fn resolve(&self, text: &str, pair: Option<&LanguagePair>) -> DetectionResult {
        let cleaned = clean_for_detection(text);
        let script = detect_by_script(&cleaned);
        let vendor = match self.vendor.detect(&cleaned).await {
            Ok(result) => Some(result),
            Err(e) => {
                debug!("Vendor detection skipped: {}", e);
                None
            }
        };
        // An unavailable vendor counts as zero confidence for the pair cutoffs
        let vendor_confidence = vendor.as_ref().map_or(0.0, |v| v.confidence);

        let unbiased = merge(script, vendor.as_ref(), &cleaned);
        let result = match pair {
            Some(pair) => {
                self.bias_toward_pair(&cleaned, unbiased, script, vendor_confidence, pair)
                    .await
            }
            None => unbiased,
        };

        debug!("Resolved language for {:?}: {}", truncate(&cleaned), result);
        result
    }

    async fn bias_toward_pair(
        &self,
        text: &str,
        unbiased: DetectionResult,
        script: Option<ScriptDetection>,
        vendor_confidence: f64,
        pair: &LanguagePair,
    ) -> DetectionResult {
        // Known limitation: a short genuine sentence in the Latin pair language
        // with a hesitant vendor is read as romanized text too.
        if let Some(non_latin) = pair.sole_non_latin() {
            if unbiased.language_code != non_latin.code()
                && is_latin_only(text)
                && vendor_confidence < ROMANIZATION_CONFIDENCE_CUTOFF
            {
                info!(
                    "Treating Latin-only text as romanized {} (was '{}', vendor confidence {:.2})",
                    non_latin.name(),
                    unbiased.language_code,
                    vendor_confidence
                );
                return DetectionResult {
                    language_code: non_latin.code().to_string(),
                    confidence: vendor_confidence,
                    method: DetectionMethod::Merged,
                };
            }
        }

        if pair.contains(&unbiased.language_code) {
            return unbiased;
        }

        if let Some(s) = script.filter(|s| pair.contains(s.code)) {
            return s.into();
        }

        if vendor_confidence < REDETECTION_CONFIDENCE_CUTOFF {
            if let Some(result) = self.redetect_within(text, &pair.languages()).await {
                return result;
            }
        }

        unbiased
    }

    /// Ask the vendor to translate toward each candidate's counterpart and
    /// tally which candidate it reports as the source.
    async fn redetect_within(&self, text: &str, candidates: &[Language]) -> Option<DetectionResult> {
        let mut votes: HashMap<&'static str, usize> = HashMap::new();

        for candidate in candidates {
            let target = redetection_target(*candidate, candidates);
            if let Some(source) = self.vendor.source_of_translation(text, target.code()).await {
                if let Some(hit) = candidates.iter().find(|c| **c == source.as_str()) {
                    *votes.entry(hit.code()).or_default() += 1;
                }
            }
        }

        // Candidate order breaks ties
        let (winner, count) = candidates
            .iter()
            .filter_map(|c| votes.get(c.code()).map(|n| (*c, *n)))
            .fold(None, |best: Option<(Language, usize)>, (c, n)| match best {
                Some((_, best_n)) if best_n >= n => best,
                _ => Some((c, n)),
            })?;

        info!(
            "Re-detection settled on '{}' with {}/{} votes",
            winner.code(),
            count,
            candidates.len()
        );
        Some(DetectionResult {
            language_code: winner.code().to_string(),
            confidence: count as f64 / candidates.len() as f64,
            method: DetectionMethod::Merged,
        })
    }
}

fn redetection_target(candidate: Language, candidates: &[Language]) -> Language {
    candidates
        .iter()
        .copied()
        .find(|other| *other != candidate)
        .unwrap_or(if candidate == NEUTRAL_TARGET {
            NEUTRAL_FALLBACK_TARGET
        } else {
            NEUTRAL_TARGET
        })
}

fn truncate(text: &str) -> String {
    text.chars().take(40).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLanguageVendor;
    use crate::vendor::VendorError;
    use std::sync::Arc;

    fn resolver(vendor: ScriptedLanguageVendor) -> (DetectionResolver, Arc<ScriptedLanguageVendor>) {
        let vendor = Arc::new(vendor);
        let resolver = DetectionResolver::new(VendorDetector::new(vendor.clone()));
        (resolver, vendor)
    }

    fn pair(a: &str, b: &str) -> LanguagePair {
        LanguagePair::from_codes(a, b).unwrap()
    }

    fn vendor_result(code: &str, confidence: f64) -> DetectionResult {
        DetectionResult {
            language_code: code.to_string(),
            confidence,
            method: DetectionMethod::Vendor,
        }
    }

    // ==================== Merge Rule Tests ====================

    #[test]
    fn test_high_confidence_vendor_wins_without_script() {
        let result = merge(None, Some(&vendor_result("fr", 0.95)), "Bonjour");
        assert_eq!(result.language_code, "fr");
        assert_eq!(result.method, DetectionMethod::Vendor);
    }

    #[test]
    fn test_high_confidence_vendor_wins_when_script_agrees() {
        let script = detect_by_script("Привет");
        let result = merge(script, Some(&vendor_result("ru", 0.99)), "Привет");
        assert_eq!(result.method, DetectionMethod::Vendor);
    }

    #[test]
    fn test_script_beats_low_confidence_vendor() {
        let script = detect_by_script("Привет");
        let result = merge(script, Some(&vendor_result("uk", 0.55)), "Привет");
        assert_eq!(result.language_code, "ru");
        assert_eq!(result.method, DetectionMethod::Script);
    }

    #[test]
    fn test_script_beats_vendor_on_weak_language_disagreement() {
        // 0.7 is neither high nor low, but Thai is vendor-weak
        let script = detect_by_script("สวัสดี");
        let result = merge(script, Some(&vendor_result("lo", 0.7)), "สวัสดี");
        assert_eq!(result.language_code, "th");
    }

    #[test]
    fn test_vendor_wins_mid_confidence_disagreement_outside_weak_set() {
        // Cyrillic maps to "ru" by script, but Ukrainian is a legitimate reading
        let script = detect_by_script("Привіт");
        let result = merge(script, Some(&vendor_result("uk", 0.7)), "Привіт");
        assert_eq!(result.language_code, "uk");
    }

    #[test]
    fn test_high_confidence_vendor_overridden_by_disagreeing_weak_script() {
        let script = detect_by_script("こんにちは");
        let result = merge(script, Some(&vendor_result("zh", 0.9)), "こんにちは");
        assert_eq!(result.language_code, "ja");
    }

    #[test]
    fn test_script_only_and_nothing() {
        let script = detect_by_script("שלום");
        assert_eq!(merge(script, None, "שלום").language_code, "he");
        assert!(merge(None, None, "").is_unknown());
    }

    #[test]
    fn test_hindi_confusion_corrected_to_hebrew() {
        // Vendor confident, no script signal because the Hebrew part is short
        let text = "namaste to everyone here ש";
        let result = merge(detect_by_script(text), Some(&vendor_result("hi", 0.85)), text);
        assert_eq!(result.language_code, "he");
        assert_eq!(result.method, DetectionMethod::Merged);
    }

    #[test]
    fn test_clean_for_detection() {
        assert_eq!(
            clean_for_detection("/start @buddy_bot see https://example.com/x привет"),
            "see привет"
        );
        assert_eq!(clean_for_detection("https://example.com"), "https://example.com");
    }

    // ==================== Resolver Scenario Tests ====================

    #[tokio::test]
    async fn test_hebrew_misdetected_as_hindi() {
        let (resolver, _) = resolver(ScriptedLanguageVendor::detecting("hi", Some(0.5)));
        let result = resolver.resolve("שלום", None).await;
        assert_eq!(result.language_code, "he");
    }

    #[tokio::test]
    async fn test_romanized_hebrew_in_hebrew_english_chat() {
        let (resolver, _) = resolver(ScriptedLanguageVendor::detecting("en", Some(0.4)));
        let result = resolver.resolve("ma shlomcha", Some(&pair("he", "en"))).await;
        assert_eq!(result.language_code, "he");
        assert_eq!(result.method, DetectionMethod::Merged);
    }

    #[tokio::test]
    async fn test_confident_english_not_treated_as_romanized() {
        let (resolver, _) = resolver(ScriptedLanguageVendor::detecting("en", Some(0.98)));
        let result = resolver
            .resolve("Hello, how are you today?", Some(&pair("he", "en")))
            .await;
        assert_eq!(result.language_code, "en");
    }

    #[tokio::test]
    async fn test_romanization_needs_one_non_latin_member() {
        let (resolver, vendor) = resolver(ScriptedLanguageVendor::detecting("de", Some(0.95)));
        let result = resolver.resolve("Guten Tag", Some(&pair("en", "es"))).await;
        assert_eq!(result.language_code, "de");
        // Confident vendor: no re-detection either
        assert_eq!(vendor.translate_calls(), 0);
    }

    #[tokio::test]
    async fn test_both_unavailable_is_unknown() {
        let (resolver, _) = resolver(ScriptedLanguageVendor::failing_detection(
            VendorError::CallFailed("offline".into()),
        ));
        assert!(resolver.resolve("Bonjour", None).await.is_unknown());
        assert!(resolver.resolve("", None).await.is_unknown());
    }

    #[tokio::test]
    async fn test_unavailable_vendor_falls_back_to_script() {
        let (resolver, _) = resolver(ScriptedLanguageVendor::failing_detection(
            VendorError::Unavailable("no key".into()),
        ));
        let result = resolver.resolve("Привет, как дела?", None).await;
        assert_eq!(result.language_code, "ru");
        assert_eq!(result.method, DetectionMethod::Script);
    }

    #[tokio::test]
    async fn test_script_in_pair_preferred_over_outside_vendor() {
        // Mixed text: vendor sides with the Latin part, script sees enough Cyrillic
        let (resolver, vendor) = resolver(ScriptedLanguageVendor::detecting("fr", Some(0.7)));
        let result = resolver
            .resolve("merci beaucoup привет друзья", Some(&pair("ru", "he")))
            .await;
        assert_eq!(result.language_code, "ru");
        assert_eq!(result.method, DetectionMethod::Script);
        assert_eq!(vendor.translate_calls(), 0);
    }

    #[tokio::test]
    async fn test_redetection_without_votes_in_pair_falls_through() {
        let vendor = ScriptedLanguageVendor::detecting("mk", Some(0.6))
            .with_translation_source("uk", "ru")
            .with_translation_source("ru", "ru");
        let (resolver, vendor) = resolver(vendor);

        let result = resolver
            .resolve("Добрий день", Some(&pair("uk", "bg")))
            .await;
        assert_eq!(vendor.translate_calls(), 2);
        assert_eq!(result.language_code, "mk");
    }

    #[tokio::test]
    async fn test_redetection_picks_majority() {
        let vendor = ScriptedLanguageVendor::detecting("sk", Some(0.5))
            .with_translation_source("pl", "cs")
            .with_translation_source("cs", "cs");
        let (resolver, vendor) = resolver(vendor);

        let result = resolver.resolve("Dobrý den", Some(&pair("cs", "pl"))).await;
        assert_eq!(vendor.translate_calls(), 2);
        assert_eq!(result.language_code, "cs");
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.method, DetectionMethod::Merged);
    }

    #[tokio::test]
    async fn test_no_redetection_above_cutoff() {
        let (resolver, vendor) = resolver(
            ScriptedLanguageVendor::detecting("sk", Some(0.88)).with_translation_source("pl", "cs"),
        );
        let result = resolver.resolve("Dobrý den", Some(&pair("cs", "pl"))).await;
        assert_eq!(vendor.translate_calls(), 0);
        assert_eq!(result.language_code, "sk");
    }

    #[test]
    fn test_redetection_target_for_single_candidate() {
        assert_eq!(
            redetection_target(Language::HEBREW, &[Language::HEBREW]),
            Language::ENGLISH
        );
        assert_eq!(
            redetection_target(Language::ENGLISH, &[Language::ENGLISH]),
            Language::SPANISH
        );
    }
}
