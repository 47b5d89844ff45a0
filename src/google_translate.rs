//! Google Translate public endpoint (`translate_a/single?client=gtx`).
//!
//! One call both translates and reports the detected source language, so the
//! same client serves as the detection vendor.

use crate::retry::{with_vendor_retry, RetryConfig};
use crate::vendor::{check_status, LanguageVendor, VendorDetection, VendorError, VendorTranslation};
use async_trait::async_trait;
use serde_json::Value;

/// Target used when a call only exists to detect the source.
const DETECTION_TARGET: &str = "en";

/// Pull the pieces out of the positional gtx response.
///
/// `[0]` holds sentence segments (`[translated, original, ...]`), `[2]` the
/// detected source code, `[6]` the detection confidence.
fn parse_gtx_response(body: &Value) -> Result<VendorTranslation, VendorError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| VendorError::MalformedResponse("gtx: missing segments".into()))?;

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    let detected_source = body
        .get(2)
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .map(String::from);

    let confidence = body
        .get(6)
        .and_then(Value::as_f64)
        .filter(|c| (0.0..=1.0).contains(c));

    Ok(VendorTranslation {
        text,
        detected_source,
        confidence,
    })
}

pub struct GoogleTranslateClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl GoogleTranslateClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::vendor_call(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn request(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> Result<VendorTranslation, VendorError> {
        let response = self
            .http
            .get(format!("{}/translate_a/single", self.base_url))
            .query(&[
                ("client", "gtx"),
                ("sl", source.unwrap_or("auto")),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;
        let body: Value = check_status(response).await?.json().await?;
        parse_gtx_response(&body)
    }
}

#[async_trait]
impl LanguageVendor for GoogleTranslateClient {
    fn name(&self) -> &'static str {
        "google_translate"
    }

    async fn translate(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> Result<VendorTranslation, VendorError> {
        with_vendor_retry(
            &self.retry,
            &format!("Google Translate to {}", target),
            || self.request(text, target, source),
        )
        .await
    }

    async fn detect(&self, text: &str) -> Result<VendorDetection, VendorError> {
        let translation = with_vendor_retry(
            &self.retry,
            "Google Translate detection",
            || self.request(text, DETECTION_TARGET, None),
        )
        .await?;

        let code = translation.detected_source.ok_or_else(|| {
            VendorError::MalformedResponse("gtx: no detected source language".into())
        })?;
        Ok(VendorDetection {
            code,
            confidence: translation.confidence,
        })
    }
}
