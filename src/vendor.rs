//! Shared vocabulary for external vendors (translation, detection, speech).
//!
//! Every adapter returns `Result<_, VendorError>`; nothing vendor-specific
//! escapes past the orchestration layers.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VendorError {
    /// Missing credentials or configuration. Expected, not worth an error log.
    #[error("vendor unavailable: {0}")]
    Unavailable(String),

    /// Non-success HTTP status from the vendor.
    #[error("vendor API error ({status}): {body}")]
    Http { status: u16, body: String },

    /// Network failure or other transport-level error.
    #[error("vendor call failed: {0}")]
    CallFailed(String),

    #[error("vendor call timed out after {0:?}")]
    Timeout(Duration),

    /// The vendor answered but the payload was unusable.
    #[error("malformed vendor response: {0}")]
    MalformedResponse(String),
}

impl VendorError {
    /// Whether another attempt against the same vendor could succeed.
    ///
    /// Rate limits (429), server errors (5xx), transport failures and
    /// timeouts are transient; other 4xx and bad payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            VendorError::Http { status, .. } => *status == 429 || *status >= 500,
            VendorError::CallFailed(_) | VendorError::Timeout(_) => true,
            VendorError::Unavailable(_) | VendorError::MalformedResponse(_) => false,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, VendorError::Unavailable(_))
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            VendorError::Unavailable(_) => "unavailable",
            VendorError::Http { status: 429, .. } => "rate limited",
            VendorError::Http { status, .. } if *status >= 500 => "server error",
            VendorError::Http { .. } => "client error",
            VendorError::CallFailed(_) => "transport",
            VendorError::Timeout(_) => "timeout",
            VendorError::MalformedResponse(_) => "malformed response",
        }
    }
}

impl From<reqwest::Error> for VendorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            VendorError::MalformedResponse(e.to_string())
        } else {
            VendorError::CallFailed(e.to_string())
        }
    }
}

/// Turn a non-success response into `VendorError::Http`, passing success through.
pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, VendorError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
    Err(VendorError::Http { status, body })
}

/// A language the vendor believes a text is written in.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorDetection {
    /// Raw vendor code, not yet normalized (e.g., "iw", "zh-CN")
    pub code: String,
    /// Confidence if the vendor reports one
    pub confidence: Option<f64>,
}

/// A completed vendor translation.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorTranslation {
    pub text: String,
    /// Source language the vendor detected or used, raw vendor code
    pub detected_source: Option<String>,
    pub confidence: Option<f64>,
}

/// Translation + auto-detection capability.
#[async_trait]
pub trait LanguageVendor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Translate `text` into `target`; `source` of `None` means auto-detect.
    async fn translate(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> Result<VendorTranslation, VendorError>;

    /// Auto-detect the language of `text`.
    async fn detect(&self, text: &str) -> Result<VendorDetection, VendorError>;
}
