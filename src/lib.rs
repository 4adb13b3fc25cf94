//! Scam Guard: email scam analysis for seniors.

pub mod analysis;
pub mod auth;
pub mod config;
pub mod contacts;
pub mod error;
pub mod llm;
pub mod server;
pub mod store;
