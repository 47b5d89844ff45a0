//! Detect binary - runs the full language resolver on a piece of text
//!
//! Usage:
//!   cargo run --bin detect -- "ma shlomcha"
//!   cargo run --bin detect -- --pair he,en "ma shlomcha"
//!
//! Optional environment variables:
//! - GOOGLE_TRANSLATE_URL (defaults to https://translate.googleapis.com)

use anyhow::{bail, Context, Result};
use language_buddy::detection::{detect_by_script, DetectionResolver, VendorDetector};
use language_buddy::google_translate::GoogleTranslateClient;
use language_buddy::languages::{plan_translation, LanguagePair, TranslationPlan};
use std::sync::Arc;
use std::time::Duration;

struct Args {
    pair: Option<LanguagePair>,
    text: String,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut pair = None;
    let mut words = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--pair" => {
                let raw = iter.next().context("--pair needs a value like en,ru")?;
                pair = Some(
                    raw.parse::<LanguagePair>()
                        .with_context(|| format!("invalid pair '{}'", raw))?,
                );
            }
            _ => words.push(arg.as_str()),
        }
    }

    if words.is_empty() {
        bail!("usage: detect [--pair xx,yy] <text>");
    }
    Ok(Args {
        pair,
        text: words.join(" "),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("language_buddy=debug".parse()?),
        )
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&raw)?;

    let base_url = std::env::var("GOOGLE_TRANSLATE_URL")
        .unwrap_or_else(|_| "https://translate.googleapis.com".to_string());
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .context("Failed to build HTTP client")?;
    let vendor = Arc::new(GoogleTranslateClient::new(http, &base_url));
    let resolver = DetectionResolver::new(VendorDetector::new(vendor));

    println!("Text:     {}", args.text);
    match detect_by_script(&args.text) {
        Some(script) => println!("Script:   {} ({:.0}%)", script.code, script.ratio * 100.0),
        None => println!("Script:   none"),
    }

    let result = resolver.resolve(&args.text, args.pair.as_ref()).await;
    println!(
        "Resolved: {} (confidence {:.2}, via {})",
        result.language_code, result.confidence, result.method
    );

    if let Some(pair) = args.pair {
        let plan = match plan_translation(&result.language_code, &pair) {
            TranslationPlan::Translate { source, target } => {
                format!("translate {} -> {}", source.code(), target.code())
            }
            TranslationPlan::AlreadyInTarget(language) => {
                format!("already in {}", language.code())
            }
            TranslationPlan::NoAction => "no action".to_string(),
        };
        println!("Pair:     {} => {}", pair, plan);
    }

    Ok(())
}
