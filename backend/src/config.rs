// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

use crate::render::DEFAULT_PLACEHOLDER;
use crate::trending::{DEFAULT_TRENDING_LIMIT, DEFAULT_WINDOW_DAYS};

/// Per-client request budget for the governor layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Seconds between replenished requests, as the governor builder reads it.
    pub per_second: u64,
    pub burst: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rust_log: String,
    pub bind_addr: String,
    pub log_dir: String,
    pub allowed_origins: Vec<String>,
    /// `None` disables rate limiting.
    pub rate_limit: Option<RateLimit>,
    pub placeholder_text: String,
    pub trending_window_days: i64,
    pub trending_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rust_log: "info".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            log_dir: "logs".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            rate_limit: None,
            placeholder_text: DEFAULT_PLACEHOLDER.to_string(),
            trending_window_days: DEFAULT_WINDOW_DAYS,
            trending_limit: DEFAULT_TRENDING_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.allowed_origins);

        let rate_limit = parse_var::<u64>("RATE_LIMIT_PER_SECOND")
            .filter(|per_second| *per_second > 0)
            .map(|per_second| RateLimit {
                per_second,
                burst: parse_var("RATE_LIMIT_BURST").unwrap_or(5),
            });

        Self {
            rust_log: env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            log_dir: env::var("LOG_DIR").unwrap_or(defaults.log_dir),
            allowed_origins,
            rate_limit,
            placeholder_text: env::var("PLACEHOLDER_TEXT").unwrap_or(defaults.placeholder_text),
            trending_window_days: parse_var("TRENDING_WINDOW_DAYS")
                .filter(|days| *days > 0)
                .unwrap_or(defaults.trending_window_days),
            trending_limit: parse_var("TRENDING_LIMIT")
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.trending_limit),
        }
    }
}

/// Reads and parses an env var; unset or unparsable values yield `None`.
fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}
