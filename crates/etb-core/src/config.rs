use std::{env, fs, path::Path, str::FromStr};

use rust_decimal::Decimal;
use tracing::warn;

use crate::{budget::BudgetTargets, errors::Error, Result};

/// How updates reach the bot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunMode {
    Polling,
    /// Listen on `0.0.0.0:port`; Telegram posts to `<public_url>/<token>`.
    Webhook { public_url: String, port: u16 },
}

/// Where entries are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { url: String, max_connections: u32 },
    /// Volatile, process-local store for development runs.
    Memory,
}

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub storage: StorageBackend,
    pub run_mode: RunMode,
    pub targets: BudgetTargets,
}

const DEFAULT_PORT: u16 = 10_000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const MEMORY_URL_PREFIX: &str = "memory:";

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        // Required env vars
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        let database_url = get("DATABASE_URL").ok_or_else(|| {
            Error::Config("DATABASE_URL environment variable is required".to_string())
        })?;

        let storage = if database_url.starts_with(MEMORY_URL_PREFIX) {
            StorageBackend::Memory
        } else {
            StorageBackend::Postgres {
                url: database_url,
                max_connections: parse_or(get("DB_MAX_CONNECTIONS"), DEFAULT_MAX_CONNECTIONS)
                    .max(1),
            }
        };

        let run_mode = parse_run_mode(
            get("RUN_MODE").as_deref(),
            get("PUBLIC_URL"),
            parse_or(get("PORT"), DEFAULT_PORT),
        );

        let defaults = BudgetTargets::default();
        let targets = BudgetTargets {
            needs: parse_target(get("NEEDS_TARGET"), defaults.needs),
            wants: parse_target(get("WANTS_TARGET"), defaults.wants),
        };

        Ok(Self {
            telegram_bot_token,
            storage,
            run_mode,
            targets,
        })
    }
}

/// Anything other than a usable webhook setup runs in polling mode.
fn parse_run_mode(mode: Option<&str>, public_url: Option<String>, port: u16) -> RunMode {
    match mode.map(|m| m.trim().to_lowercase()).as_deref() {
        None | Some("polling") => RunMode::Polling,
        Some("webhook") => match public_url {
            Some(url) => RunMode::Webhook {
                public_url: url.trim_end_matches('/').to_string(),
                port,
            },
            None => {
                warn!("RUN_MODE=webhook but PUBLIC_URL is not set; falling back to polling");
                RunMode::Polling
            }
        },
        Some(other) => {
            warn!(run_mode = other, "unknown RUN_MODE; falling back to polling");
            RunMode::Polling
        }
    }
}

fn parse_target(raw: Option<String>, default: Decimal) -> Decimal {
    raw.and_then(|s| Decimal::from_str(s.trim()).ok())
        .filter(|d| *d > Decimal::ZERO)
        .unwrap_or(default)
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, strip_quotes(v.trim()));
    }
}

fn strip_quotes(val: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = val.strip_prefix(q).and_then(|v| v.strip_suffix(q)) {
            return inner;
        }
    }
    val
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
