//! Currency Conversion
//!
//! USD→EUR conversion with a TTL cache. A failed refresh serves the last
//! fetched rate, and a process that never fetched one uses a static fallback.
//! Time comes from an injected [`Clock`] so the TTL is testable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};

pub const EXCHANGE_RATE_API_URL: &str = "https://api.exchangerate-api.com/v4/latest";

/// Monotonic time source
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: StdMutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: StdMutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().map_or(Duration::ZERO, |o| *o);
        self.start + offset
    }
}

/// Where exchange rates come from
#[async_trait]
pub trait RateSource: Send + Sync {
    /// How many EUR one unit of `base` buys
    async fn eur_rate(&self, base: &str) -> Result<Decimal>;
}

/// exchangerate-api.com (no API key required)
pub struct ExchangeRateApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct RatesResponse {
    rates: HashMap<String, Decimal>,
}

impl ExchangeRateApi {
    pub fn new() -> Result<Self> {
        Self::with_base_url(EXCHANGE_RATE_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RateSource for ExchangeRateApi {
    async fn eur_rate(&self, base: &str) -> Result<Decimal> {
        let url = format!("{}/{}", self.base_url, base.trim().to_uppercase());
        let body: RatesResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match body.rates.get("EUR") {
            Some(rate) if *rate > Decimal::ZERO => Ok(*rate),
            _ => Err(AdvisorError::MarketData(format!("no EUR rate for {base}"))),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct CachedRate {
    rate: Decimal,
    fetched_at: Instant,
}

/// Snapshot of the converter state
#[derive(Clone, Debug, Serialize)]
pub struct FxStatus {
    #[serde(with = "rust_decimal::serde::float")]
    pub usd_to_eur: Decimal,
    pub using_fallback: bool,
}

/// Converts amounts into EUR
pub struct FxConverter {
    source: Arc<dyn RateSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    fallback_rate: Decimal,
    cache: Mutex<Option<CachedRate>>,
}

impl FxConverter {
    pub fn new(source: Arc<dyn RateSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            ttl: Duration::from_secs(3600),
            fallback_rate: dec!(0.92),
            cache: Mutex::new(None),
        }
    }

    /// Live exchange-rate API with TTL and fallback from configuration
    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(ExchangeRateApi::new()?), Arc::new(SystemClock))
            .with_ttl(config.fx_cache_ttl)
            .with_fallback_rate(config.fx_fallback_rate))
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub const fn with_fallback_rate(mut self, rate: Decimal) -> Self {
        self.fallback_rate = rate;
        self
    }

    /// Current USD→EUR rate
    pub async fn rate(&self) -> Decimal {
        let now = self.clock.now();
        let mut cache = self.cache.lock().await;

        if let Some(cached) = *cache {
            if now.saturating_duration_since(cached.fetched_at) < self.ttl {
                return cached.rate;
            }
        }

        match self.source.eur_rate("USD").await {
            Ok(rate) => {
                info!(rate = %rate, "Live USD→EUR rate fetched");
                *cache = Some(CachedRate { rate, fetched_at: now });
                rate
            }
            Err(e) => {
                warn!(error = %e, "Exchange rate refresh failed");
                if let Some(cached) = *cache {
                    info!(rate = %cached.rate, "Using stale cached rate");
                    cached.rate
                } else {
                    warn!(rate = %self.fallback_rate, "Using fallback rate");
                    self.fallback_rate
                }
            }
        }
    }

    pub async fn usd_to_eur(&self, amount: Decimal) -> Decimal {
        amount * self.rate().await
    }

    /// Convert from any currency. Non-USD currencies are looked up directly
    /// (uncached); if that fails the USD rate is applied.
    pub async fn to_eur(&self, amount: Decimal, currency: &str) -> Decimal {
        match currency.trim().to_uppercase().as_str() {
            "EUR" => amount,
            "USD" | "" => self.usd_to_eur(amount).await,
            other => match self.source.eur_rate(other).await {
                Ok(rate) => amount * rate,
                Err(e) => {
                    warn!(currency = other, error = %e, "Direct conversion failed, using USD rate");
                    self.usd_to_eur(amount).await
                }
            },
        }
    }

    /// True while no live rate was ever fetched
    pub async fn is_using_fallback(&self) -> bool {
        self.cache.lock().await.is_none()
    }

    pub async fn status(&self) -> FxStatus {
        let usd_to_eur = self.rate().await;
        FxStatus {
            usd_to_eur,
            using_fallback: self.is_using_fallback().await,
        }
    }
}

/// Format as Euro in European style: `€1.234,56`, `€2,50 Mio.`, `-€12,00`
pub fn format_eur(amount: Option<Decimal>) -> String {
    let Some(amount) = amount else {
        return "N/A".into();
    };

    let abs = amount.abs();
    let (scaled, suffix) = if abs >= dec!(1_000_000_000) {
        (abs / dec!(1_000_000_000), " Mrd.")
    } else if abs >= dec!(1_000_000) {
        (abs / dec!(1_000_000), " Mio.")
    } else {
        (abs, "")
    };

    let fixed = format!("{:.2}", scaled.round_dp(2));
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{sign}€{grouped},{frac_part}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays rates (or failures) and counts lookups
    struct ScriptedRates {
        script: StdMutex<VecDeque<Option<Decimal>>>,
        calls: AtomicUsize,
    }

    impl ScriptedRates {
        fn new(script: Vec<Option<Decimal>>) -> Arc<Self> {
            Arc::new(Self {
                script: StdMutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for ScriptedRates {
        async fn eur_rate(&self, _base: &str) -> Result<Decimal> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .flatten()
                .ok_or_else(|| AdvisorError::MarketData("offline".into()))
        }
    }

    #[tokio::test]
    async fn test_rate_is_cached_within_ttl() {
        let source = ScriptedRates::new(vec![Some(dec!(0.90)), Some(dec!(0.95))]);
        let clock = Arc::new(ManualClock::new());
        let fx = FxConverter::new(source.clone(), clock.clone());

        assert_eq!(fx.rate().await, dec!(0.90));
        clock.advance(Duration::from_secs(3599));
        assert_eq!(fx.rate().await, dec!(0.90));
        assert_eq!(source.calls(), 1);

        clock.advance(Duration::from_secs(1));
        assert_eq!(fx.rate().await, dec!(0.95));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_rate() {
        let source = ScriptedRates::new(vec![Some(dec!(0.91)), None]);
        let clock = Arc::new(ManualClock::new());
        let fx = FxConverter::new(source, clock.clone());

        assert_eq!(fx.rate().await, dec!(0.91));
        clock.advance(Duration::from_secs(7200));
        assert_eq!(fx.rate().await, dec!(0.91));
        assert!(!fx.is_using_fallback().await);
    }

    #[tokio::test]
    async fn test_fallback_when_never_fetched() {
        let fx = FxConverter::new(ScriptedRates::new(vec![]), Arc::new(ManualClock::new()));
        assert_eq!(fx.rate().await, dec!(0.92));
        assert!(fx.is_using_fallback().await);
        assert_eq!(fx.usd_to_eur(dec!(100)).await, dec!(92.00));
    }

    #[tokio::test]
    async fn test_to_eur_by_currency() {
        // USD fetch, then GBP direct lookup, then a failed CHF lookup (USD path, cached)
        let source = ScriptedRates::new(vec![Some(dec!(0.9)), Some(dec!(1.2)), None]);
        let fx = FxConverter::new(source.clone(), Arc::new(ManualClock::new()));

        assert_eq!(fx.to_eur(dec!(10), "eur").await, dec!(10));
        assert_eq!(fx.to_eur(dec!(10), "USD").await, dec!(9.0));
        assert_eq!(fx.to_eur(dec!(10), "GBP").await, dec!(12.0));
        assert_eq!(fx.to_eur(dec!(10), "CHF").await, dec!(9.0));
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn test_format_eur() {
        assert_eq!(format_eur(None), "N/A");
        assert_eq!(format_eur(Some(dec!(1234.56))), "€1.234,56");
        assert_eq!(format_eur(Some(dec!(0.5))), "€0,50");
        assert_eq!(format_eur(Some(dec!(-12))), "-€12,00");
        assert_eq!(format_eur(Some(dec!(2500000))), "€2,50 Mio.");
        assert_eq!(format_eur(Some(dec!(1234567890123))), "€1.234,57 Mrd.");
    }
}
