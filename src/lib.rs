//! Language Buddy: a Telegram bot that translates between each chat's two
//! chosen languages and transcribes voice messages before translating them.

pub mod bot;
pub mod config;
pub mod db;
pub mod detection;
pub mod google_translate;
pub mod languages;
pub mod messages;
pub mod metrics;
pub mod retry;
pub mod security;
pub mod server;
pub mod telegram;
pub mod transcription;
pub mod translation;
pub mod vendor;

#[cfg(test)]
mod testing;
