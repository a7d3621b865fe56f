use std::{env, str::FromStr, time::Duration as StdDuration};

use ceg_common::Secret;
use chrono::Duration;
use log::*;
use thiserror::Error;

use crate::{
    aggregates::DEFAULT_SHIP_TIME_SCALE,
    audit::DEFAULT_CHAIN_TIMEOUT,
    tokens::{TokenSettings, DEFAULT_TOKEN_TTL_MINUTES},
};

const DEFAULT_CHAIN_ID: u64 = 1337;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set. The engine cannot sign links without it.")]
    MissingSecret(&'static str),
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// HMAC key for pay and track tokens. Required.
    pub token_secret: Secret<String>,
    pub chain_id: u64,
    /// The escrow contract address embedded in pay tokens.
    pub escrow_contract: String,
    pub token_ttl: Duration,
    /// Multiplier applied to elapsed shipping time before display.
    pub ship_time_scale: u32,
    /// Upper bound on any single chain call made while reconciling.
    pub chain_timeout: StdDuration,
    pub event_buffer_size: usize,
    /// Prefix for generated pay and track links. Empty means relative links.
    pub base_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            token_secret: Secret::default(),
            chain_id: DEFAULT_CHAIN_ID,
            escrow_contract: String::default(),
            token_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
            ship_time_scale: DEFAULT_SHIP_TIME_SCALE,
            chain_timeout: DEFAULT_CHAIN_TIMEOUT,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            base_url: String::default(),
        }
    }
}

impl EngineConfig {
    pub fn new<S: Into<String>>(token_secret: S) -> Self {
        Self { token_secret: Secret::new(token_secret.into()), ..Default::default() }
    }

    /// Reads the `CEG_*` environment variables. A missing token secret is fatal; every other setting falls back to its
    /// default with a warning when it is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where F: Fn(&str) -> Option<String> {
        let token_secret = lookup("CEG_TOKEN_SECRET").filter(|s| !s.trim().is_empty()).ok_or_else(|| {
            error!("🪛️ CEG_TOKEN_SECRET is not set. Please set it to a long random string.");
            ConfigError::MissingSecret("CEG_TOKEN_SECRET")
        })?;
        let chain_id = parse_or_default(&lookup, "CEG_CHAIN_ID", DEFAULT_CHAIN_ID);
        let escrow_contract = lookup("CEG_ESCROW_CONTRACT").unwrap_or_else(|| {
            warn!("🪛️ CEG_ESCROW_CONTRACT is not set. Pay links will not name a contract.");
            String::default()
        });
        let ttl_minutes = parse_or_default(&lookup, "CEG_TOKEN_TTL_MINUTES", DEFAULT_TOKEN_TTL_MINUTES);
        let token_ttl = if ttl_minutes > 0 {
            Duration::minutes(ttl_minutes)
        } else {
            warn!("🪛️ CEG_TOKEN_TTL_MINUTES must be positive. Using {DEFAULT_TOKEN_TTL_MINUTES} minutes.");
            Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES)
        };
        let ship_time_scale = parse_or_default(&lookup, "CEG_SHIP_TIME_SCALE", DEFAULT_SHIP_TIME_SCALE);
        let default_timeout_ms = DEFAULT_CHAIN_TIMEOUT.as_millis() as u64;
        let chain_timeout =
            StdDuration::from_millis(parse_or_default(&lookup, "CEG_CHAIN_TIMEOUT_MS", default_timeout_ms));
        let event_buffer_size = parse_or_default(&lookup, "CEG_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let base_url = lookup("CEG_BASE_URL").unwrap_or_default();
        let config = Self {
            token_secret: Secret::new(token_secret),
            chain_id,
            escrow_contract,
            token_ttl,
            ship_time_scale,
            chain_timeout,
            event_buffer_size,
            base_url,
        };
        info!(
            "🪛️ Engine configured for chain {} with {}-minute link tokens and a {}ms chain timeout",
            config.chain_id,
            config.token_ttl.num_minutes(),
            config.chain_timeout.as_millis()
        );
        Ok(config)
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            chain_id: self.chain_id,
            contract_address: self.escrow_contract.clone(),
            ttl: self.token_ttl,
        }
    }
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {key}. {e} Using the default, {default}, instead.");
            default
        }),
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn secret_is_required() {
        let err = EngineConfig::from_lookup(lookup(&[("CEG_CHAIN_ID", "5")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret("CEG_TOKEN_SECRET"));
        assert!(EngineConfig::from_lookup(lookup(&[("CEG_TOKEN_SECRET", "  ")])).is_err());
    }

    #[test]
    fn defaults_apply() {
        let config = EngineConfig::from_lookup(lookup(&[("CEG_TOKEN_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.token_secret.reveal(), "s3cret");
        assert_eq!(config.chain_id, 1337);
        assert_eq!(config.token_ttl, Duration::minutes(15));
        assert_eq!(config.ship_time_scale, 10);
        assert_eq!(config.chain_timeout, StdDuration::from_secs(5));
        assert_eq!(config.event_buffer_size, 25);
        assert_eq!(config.base_url, "");
    }

    #[test]
    fn bad_values_fall_back() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("CEG_TOKEN_SECRET", "s3cret"),
            ("CEG_CHAIN_ID", "mainnet"),
            ("CEG_TOKEN_TTL_MINUTES", "-3"),
            ("CEG_SHIP_TIME_SCALE", "60"),
            ("CEG_CHAIN_TIMEOUT_MS", "250"),
            ("CEG_BASE_URL", "https://market.example"),
        ]))
        .unwrap();
        assert_eq!(config.chain_id, 1337);
        assert_eq!(config.token_ttl, Duration::minutes(15));
        assert_eq!(config.ship_time_scale, 60);
        assert_eq!(config.chain_timeout, StdDuration::from_millis(250));
        let settings = config.token_settings();
        assert_eq!(settings.ttl, Duration::minutes(15));
        assert_eq!(settings.chain_id, 1337);
    }
}
