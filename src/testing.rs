//! In-process fakes shared by unit tests.

use crate::bot::Messenger;
use crate::languages::Language;
use crate::transcription::{AudioSource, TranscriptionCandidate, TranscriptionVendor};
use crate::vendor::{LanguageVendor, VendorDetection, VendorError, VendorTranslation};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ==================== Language vendor ====================

#[derive(Debug, Clone)]
pub enum TranslateBehavior {
    /// "[target] text"
    Prefix,
    Fixed(String),
    Echo,
    Fail(VendorError),
}

/// Translation/detection vendor with scripted answers and call counters.
pub struct ScriptedLanguageVendor {
    detection: Result<VendorDetection, VendorError>,
    translate: TranslateBehavior,
    /// target code -> source code the vendor reports
    sources: HashMap<String, String>,
    detect_calls: AtomicUsize,
    translate_calls: AtomicUsize,
}

impl ScriptedLanguageVendor {
    pub fn detecting(code: &str, confidence: Option<f64>) -> Self {
        Self {
            detection: Ok(VendorDetection {
                code: code.to_string(),
                confidence,
            }),
            translate: TranslateBehavior::Prefix,
            sources: HashMap::new(),
            detect_calls: AtomicUsize::new(0),
            translate_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_detection(error: VendorError) -> Self {
        Self {
            detection: Err(error),
            ..Self::detecting("", None)
        }
    }

    pub fn with_translation_source(mut self, target: &str, source: &str) -> Self {
        self.sources.insert(target.to_string(), source.to_string());
        self
    }

    pub fn with_translate(mut self, behavior: TranslateBehavior) -> Self {
        self.translate = behavior;
        self
    }

    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    pub fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageVendor for ScriptedLanguageVendor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn translate(
        &self,
        text: &str,
        target: &str,
        _source: Option<&str>,
    ) -> Result<VendorTranslation, VendorError> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        let translated = match &self.translate {
            TranslateBehavior::Prefix => format!("[{}] {}", target, text),
            TranslateBehavior::Fixed(text) => text.clone(),
            TranslateBehavior::Echo => text.to_string(),
            TranslateBehavior::Fail(e) => return Err(e.clone()),
        };
        Ok(VendorTranslation {
            text: translated,
            detected_source: self.sources.get(target).cloned(),
            confidence: None,
        })
    }

    async fn detect(&self, _text: &str) -> Result<VendorDetection, VendorError> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        self.detection.clone()
    }
}

// ==================== Speech vendor ====================

#[derive(Debug, Clone)]
pub enum SpeechBehavior {
    Returns { text: String, confidence: f64 },
    Fails(VendorError),
    Hangs,
}

/// Speech vendor with a scripted answer; records every attempt.
pub struct ScriptedSpeechVendor {
    name: &'static str,
    configured: bool,
    behavior: SpeechBehavior,
    calls: AtomicUsize,
}

impl ScriptedSpeechVendor {
    pub fn returning(name: &'static str, text: &str, confidence: f64) -> Self {
        Self {
            name,
            configured: true,
            behavior: SpeechBehavior::Returns {
                text: text.to_string(),
                confidence,
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &'static str, error: VendorError) -> Self {
        Self {
            behavior: SpeechBehavior::Fails(error),
            ..Self::returning(name, "", 0.0)
        }
    }

    pub fn hanging(name: &'static str) -> Self {
        Self {
            behavior: SpeechBehavior::Hangs,
            ..Self::returning(name, "", 0.0)
        }
    }

    pub fn unconfigured(name: &'static str) -> Self {
        Self {
            configured: false,
            ..Self::returning(name, "never used", 1.0)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionVendor for ScriptedSpeechVendor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn attempt(
        &self,
        audio_path: &Path,
        _hints: &[Language],
    ) -> Result<TranscriptionCandidate, VendorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !audio_path.exists() {
            return Err(VendorError::CallFailed("audio file missing".into()));
        }
        match &self.behavior {
            SpeechBehavior::Returns { text, confidence } => {
                TranscriptionCandidate::new(text, self.name, *confidence, None, None)
                    .map_err(|e| VendorError::MalformedResponse(e.to_string()))
            }
            SpeechBehavior::Fails(e) => Err(e.clone()),
            SpeechBehavior::Hangs => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(VendorError::CallFailed("unreachable".into()))
            }
        }
    }
}

// ==================== Messenger ====================

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat_id: i64,
        text: String,
    },
    Keyboard {
        chat_id: i64,
        text: String,
        rows: Vec<Vec<(String, String)>>,
    },
    CallbackAnswer {
        callback_id: String,
    },
}

/// Messenger that records everything instead of sending it.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } | Sent::Keyboard { text, .. } => Some(text),
                Sent::CallbackAnswer { .. } => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        rows: Vec<Vec<(String, String)>>,
    ) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Keyboard {
            chat_id,
            text: text.to_string(),
            rows,
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::CallbackAnswer {
            callback_id: callback_id.to_string(),
        });
        Ok(())
    }
}

// ==================== Audio source ====================

/// Serves fixed bytes for known file ids.
#[derive(Default)]
pub struct FakeAudioSource {
    files: HashMap<String, Vec<u8>>,
    downloads: AtomicUsize,
}

impl FakeAudioSource {
    pub fn with_file(mut self, file_id: &str, bytes: &[u8]) -> Self {
        self.files.insert(file_id.to_string(), bytes.to_vec());
        self
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioSource for FakeAudioSource {
    async fn download_audio(&self, file_id: &str) -> Result<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        match self.files.get(file_id) {
            Some(bytes) => Ok(bytes.clone()),
            None => bail!("file {} not found", file_id),
        }
    }
}
