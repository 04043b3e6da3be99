//! Core domain + application logic for the expense tracker bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and PostgreSQL
//! live behind ports (traits) implemented in adapter crates.

pub mod budget;
pub mod config;
pub mod dialogue;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod logging;
pub mod messaging;
pub mod money;
pub mod replies;

pub use errors::{Error, Result};
