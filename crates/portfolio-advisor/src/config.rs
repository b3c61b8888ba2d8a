//! Advisor Configuration
//!
//! Read from the process environment (the binary loads `.env` first).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{AdvisorError, Result};

#[derive(Clone, Debug)]
pub struct AdvisorConfig {
    /// Model used by the specialist agents
    pub default_model: String,

    /// Model used for intent classification
    pub classifier_model: String,

    /// Sampling temperature for agent rounds
    pub temperature: f32,

    /// Completion rounds per agent invocation
    pub max_iterations: usize,

    /// Persisted chat messages kept on disk
    pub max_chat_messages: usize,

    /// Language every answer is written in
    pub response_language: String,

    /// Directory holding the JSON stores
    pub data_dir: PathBuf,

    /// How long a fetched exchange rate stays fresh
    pub fx_cache_ttl: Duration,

    /// USD→EUR rate used when no live rate was ever fetched
    pub fx_fallback_rate: Decimal,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            default_model: "gpt-4o".into(),
            classifier_model: "gpt-4o-mini".into(),
            temperature: 0.3,
            max_iterations: 15,
            max_chat_messages: 50,
            response_language: "German".into(),
            data_dir: PathBuf::from("."),
            fx_cache_ttl: Duration::from_secs(3600),
            fx_fallback_rate: dec!(0.92),
        }
    }
}

impl AdvisorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, map in tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            default_model: get("DEFAULT_MODEL").unwrap_or(defaults.default_model),
            classifier_model: get("CLASSIFIER_MODEL").unwrap_or(defaults.classifier_model),
            temperature: parse_or(get("TEMPERATURE"), "TEMPERATURE", defaults.temperature)?,
            max_iterations: parse_or(get("MAX_ITERATIONS"), "MAX_ITERATIONS", defaults.max_iterations)?,
            max_chat_messages: parse_or(
                get("MAX_CHAT_MESSAGES"),
                "MAX_CHAT_MESSAGES",
                defaults.max_chat_messages,
            )?,
            response_language: get("RESPONSE_LANGUAGE").unwrap_or(defaults.response_language),
            data_dir: get("DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            fx_cache_ttl: Duration::from_secs(parse_or(
                get("FX_CACHE_TTL_SECS"),
                "FX_CACHE_TTL_SECS",
                defaults.fx_cache_ttl.as_secs(),
            )?),
            fx_fallback_rate: parse_or(
                get("FX_FALLBACK_RATE"),
                "FX_FALLBACK_RATE",
                defaults.fx_fallback_rate,
            )?,
        })
    }

    pub fn portfolio_path(&self) -> PathBuf {
        self.data_dir.join("portfolio.json")
    }

    pub fn profile_path(&self) -> PathBuf {
        self.data_dir.join("investment_profile.json")
    }

    pub fn chat_history_path(&self) -> PathBuf {
        self.data_dir.join("chat_history.json")
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    raw.map_or(Ok(default), |value| {
        value
            .trim()
            .parse()
            .map_err(|_| AdvisorError::Config(format!("{key} has invalid value '{value}'")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AdvisorConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.max_iterations, 15);
        assert_eq!(config.max_chat_messages, 50);
        assert_eq!(config.fx_fallback_rate, dec!(0.92));
        assert_eq!(config.chat_history_path(), PathBuf::from("./chat_history.json"));
    }

    #[test]
    fn test_overrides() {
        let config = AdvisorConfig::from_lookup(lookup(&[
            ("DEFAULT_MODEL", "gpt-4o-mini"),
            ("MAX_ITERATIONS", "4"),
            ("DATA_DIR", "/var/lib/advisor"),
            ("FX_FALLBACK_RATE", "0.9"),
        ]))
        .unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.portfolio_path(), PathBuf::from("/var/lib/advisor/portfolio.json"));
        assert_eq!(config.fx_fallback_rate, dec!(0.9));
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = AdvisorConfig::from_lookup(lookup(&[("TEMPERATURE", "warm")])).unwrap_err();
        assert!(matches!(err, AdvisorError::Config(msg) if msg.contains("TEMPERATURE")));
    }
}
