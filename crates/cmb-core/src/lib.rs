//! Core domain + application logic for the community moderation bot.
//!
//! This crate is framework-agnostic. Telegram, OpenAI and the market-data API
//! live behind ports (traits) implemented in adapter crates.

pub mod cache;
pub mod config;
pub mod domain;
pub mod enrichment;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod market;
pub mod messaging;
pub mod model;
pub mod onboarding;
pub mod orchestrator;
pub mod prompts;
pub mod ratelimit;
pub mod ticker;
pub mod triggers;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
