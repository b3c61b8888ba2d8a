//! Portfolio Valuation
//!
//! Prices every holding, converts into EUR, and aggregates gain/loss.
//! Shared by the `calculate_returns` tool and the dashboard overview.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, warn};

use crate::currency::FxConverter;
use crate::market::MarketData;
use crate::model::Holding;

/// One priced position. Monetary values in EUR, rounded to 2 dp.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PositionValue {
    pub ticker: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub shares: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost_basis: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gain_loss: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub return_pct: Decimal,
}

/// Holding whose price could not be fetched
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnpricedPosition {
    pub ticker: String,
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValuationSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_invested: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_current_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_gain_loss: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_return_pct: Decimal,
}

#[derive(Clone, Debug, Serialize)]
pub struct Valuation {
    pub positions: Vec<PositionValue>,
    pub unpriced: Vec<UnpricedPosition>,
    pub summary: ValuationSummary,
    pub currency: &'static str,
    pub as_of: DateTime<Utc>,
}

impl Valuation {
    /// Position with the highest return
    pub fn best(&self) -> Option<&PositionValue> {
        self.positions.iter().max_by(|a, b| a.return_pct.cmp(&b.return_pct))
    }

    /// Position with the lowest return
    pub fn worst(&self) -> Option<&PositionValue> {
        self.positions.iter().min_by(|a, b| a.return_pct.cmp(&b.return_pct))
    }
}

fn percent(gain: Decimal, base: Decimal) -> Decimal {
    if base > Decimal::ZERO {
        (gain / base * dec!(100)).round_dp(2)
    } else {
        Decimal::ZERO
    }
}

/// Price and aggregate the given holdings. Positions that cannot be priced
/// are reported in `unpriced` and excluded from the totals.
pub async fn value_portfolio(holdings: &[Holding], market: &dyn MarketData, fx: &FxConverter) -> Valuation {
    let mut positions = Vec::with_capacity(holdings.len());
    let mut unpriced = Vec::new();
    let mut total_cost = Decimal::ZERO;
    let mut total_current = Decimal::ZERO;

    for holding in holdings {
        let quote = match market.price(&holding.ticker).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!(ticker = %holding.ticker, error = %e, "Could not fetch price");
                unpriced.push(UnpricedPosition {
                    ticker: holding.ticker.clone(),
                    error: format!("Could not fetch price: {e}"),
                });
                continue;
            }
        };

        let price_eur = fx.to_eur(quote.price, &quote.currency).await;
        let cost_total = holding.total_cost();
        let current_total = holding.shares * price_eur;
        let gain_loss = current_total - cost_total;

        total_cost += cost_total;
        total_current += current_total;

        debug!(ticker = %holding.ticker, price_eur = %price_eur, "Position priced");
        positions.push(PositionValue {
            ticker: holding.ticker.clone(),
            shares: holding.shares,
            cost_basis: holding.cost_basis.round_dp(2),
            current_price: price_eur.round_dp(2),
            cost_total: cost_total.round_dp(2),
            current_total: current_total.round_dp(2),
            gain_loss: gain_loss.round_dp(2),
            return_pct: percent(price_eur - holding.cost_basis, holding.cost_basis),
        });
    }

    let total_gain = total_current - total_cost;
    Valuation {
        positions,
        unpriced,
        summary: ValuationSummary {
            total_invested: total_cost.round_dp(2),
            total_current_value: total_current.round_dp(2),
            total_gain_loss: total_gain.round_dp(2),
            total_return_pct: percent(total_gain, total_cost),
        },
        currency: "EUR",
        as_of: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{ManualClock, RateSource};
    use crate::error::{AdvisorError, Result};
    use crate::market::MockMarketData;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedRate(Decimal);

    #[async_trait]
    impl RateSource for FixedRate {
        async fn eur_rate(&self, base: &str) -> Result<Decimal> {
            if base == "USD" {
                Ok(self.0)
            } else {
                Err(AdvisorError::MarketData("unsupported".into()))
            }
        }
    }

    fn fx(rate: Decimal) -> FxConverter {
        FxConverter::new(Arc::new(FixedRate(rate)), Arc::new(ManualClock::new()))
    }

    #[tokio::test]
    async fn test_values_in_eur_and_skips_unpriced() {
        let market = MockMarketData::empty()
            .with_quote("AAA", dec!(20), "USD")
            .with_quote("BBB", dec!(50), "EUR");
        let holdings = vec![
            Holding::new("AAA", dec!(10), dec!(10)),
            Holding::new("BBB", dec!(2), dec!(100)),
            Holding::new("GONE", dec!(1), dec!(5)),
        ];

        let valuation = value_portfolio(&holdings, &market, &fx(dec!(0.5))).await;

        assert_eq!(valuation.positions.len(), 2);
        assert_eq!(valuation.unpriced.len(), 1);
        assert_eq!(valuation.unpriced[0].ticker, "GONE");

        let aaa = &valuation.positions[0];
        assert_eq!(aaa.current_price, dec!(10));
        assert_eq!(aaa.gain_loss, dec!(0));
        assert_eq!(aaa.return_pct, dec!(0));

        let bbb = &valuation.positions[1];
        assert_eq!(bbb.current_total, dec!(100));
        assert_eq!(bbb.return_pct, dec!(-50));

        assert_eq!(valuation.summary.total_invested, dec!(300));
        assert_eq!(valuation.summary.total_current_value, dec!(200));
        assert_eq!(valuation.summary.total_return_pct, dec!(-33.33));

        assert_eq!(valuation.best().unwrap().ticker, "AAA");
        assert_eq!(valuation.worst().unwrap().ticker, "BBB");
    }

    #[tokio::test]
    async fn test_empty_portfolio_has_zero_return() {
        let valuation = value_portfolio(&[], &MockMarketData::new(), &fx(dec!(0.9))).await;
        assert!(valuation.positions.is_empty());
        assert_eq!(valuation.summary.total_return_pct, Decimal::ZERO);
        assert!(valuation.best().is_none());
    }
}
