//! Supported languages and chat language pairs.
//!
//! - `registry`: the canonical set of supported languages and their metadata
//! - `language`: validated `Language` type
//! - `pair`: `LanguagePair` and the bidirectional direction rule

mod language;
mod pair;
mod registry;

pub use language::{Language, LanguageError};
pub use pair::{plan_translation, resolve_direction, LanguagePair, TranslationPlan};
pub use registry::{LanguageConfig, LanguageRegistry, ScriptClass};
