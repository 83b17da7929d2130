//! Core domain + application logic for the process-manager Telegram bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and pm2 live
//! behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod pipeline;
pub mod ports;
pub mod router;
pub mod sink;

pub use errors::{Error, Result, TransportErrorKind};
