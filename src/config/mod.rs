//! Configuration module for the exchange.
//!
//! Values come from environment variables (optionally seeded from `.env` by
//! the binary). Unset variables fall back to defaults; malformed ones are an
//! error naming the variable.

use anyhow::{Context, Result};
use chrono::Duration;
use std::env;

pub const PRICE_WINDOW_VAR: &str = "SSSM_PRICE_WINDOW_SECS";
pub const INDEX_WINDOW_VAR: &str = "SSSM_INDEX_WINDOW_SECS";

const DEFAULT_PRICE_WINDOW_SECS: u64 = 300;
const DEFAULT_INDEX_WINDOW_SECS: u64 = 0;

/// Exchange configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Window used for per-stock volume weighted prices
    pub price_window: Duration,
    /// Window used for the all-share index; `None` means all time
    pub index_window: Option<Duration>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            price_window: Duration::seconds(DEFAULT_PRICE_WINDOW_SECS as i64),
            index_window: None,
        }
    }
}

impl ExchangeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            env::var(PRICE_WINDOW_VAR).ok(),
            env::var(INDEX_WINDOW_VAR).ok(),
        )
    }

    /// Build from raw variable values, as read from the environment.
    pub fn from_vars(price_window: Option<String>, index_window: Option<String>) -> Result<Self> {
        let price_secs = parse_secs(PRICE_WINDOW_VAR, price_window, DEFAULT_PRICE_WINDOW_SECS)?;
        let index_secs = parse_secs(INDEX_WINDOW_VAR, index_window, DEFAULT_INDEX_WINDOW_SECS)?;

        Ok(Self {
            price_window: to_duration(PRICE_WINDOW_VAR, price_secs)?,
            // Zero means all time
            index_window: match index_secs {
                0 => None,
                secs => Some(to_duration(INDEX_WINDOW_VAR, secs)?),
            },
        })
    }
}

fn parse_secs(var: &str, raw: Option<String>, default: u64) -> Result<u64> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Failed to parse {}: '{}'", var, value)),
        None => Ok(default),
    }
}

fn to_duration(var: &str, secs: u64) -> Result<Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .with_context(|| format!("{} out of range: {} seconds", var, secs))
}
