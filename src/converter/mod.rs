//! Fiat ↔ Sats Converter
//!
//! Keeps the last good BTC exchange rate and converts operator input in both
//! directions. A failed refresh reports the error and leaves the cached rate
//! in place.

pub mod coingecko;

pub use coingecko::CoinGeckoFeed;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::types::{AppError, AppResult};

const SATS_PER_BTC: f64 = 100_000_000.0;

/// Source of the current BTC price in one fiat currency
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fiat units per BTC
    async fn fetch_rate(&self) -> AppResult<f64>;

    /// Lowercase currency code, e.g. "usd"
    fn currency(&self) -> &str;
}

#[derive(Debug, Clone, Default)]
pub struct Converter {
    rate: Option<f64>,
    updated_at: Option<DateTime<Utc>>,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(rate: f64) -> AppResult<Self> {
        let mut converter = Self::new();
        converter.apply(Ok(rate))?;
        Ok(converter)
    }

    /// Fiat per BTC, if a price has ever been fetched
    pub fn rate(&self) -> Option<f64> {
        self.rate
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Fiat value of a single sat
    pub fn sat_price(&self) -> Option<f64> {
        self.rate.map(|rate| rate / SATS_PER_BTC)
    }

    pub async fn refresh(&mut self, feed: &dyn PriceFeed) -> AppResult<f64> {
        let result = feed.fetch_rate().await;
        self.apply(result)
    }

    /// Record the outcome of a price fetch made elsewhere
    pub fn apply(&mut self, result: AppResult<f64>) -> AppResult<f64> {
        match result {
            Ok(rate) if rate.is_finite() && rate > 0.0 => {
                info!("BTC price updated: {}", rate);
                self.rate = Some(rate);
                self.updated_at = Some(Utc::now());
                Ok(rate)
            }
            Ok(rate) => {
                warn!("Ignoring invalid BTC price {}", rate);
                Err(AppError::PriceFeed(format!("invalid price {}", rate)))
            }
            Err(err) => {
                warn!("Failed to fetch BTC price: {}", err);
                Err(err)
            }
        }
    }

    /// `None` for empty input or while no price is known
    pub fn fiat_to_sats(&self, input: &str) -> AppResult<Option<u64>> {
        let trimmed = input.trim();
        let Some(rate) = self.rate.filter(|_| !trimmed.is_empty()) else {
            return Ok(None);
        };
        let fiat: f64 = trimmed
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("'{}' is not a number", trimmed)))?;
        if !fiat.is_finite() || fiat < 0.0 {
            return Err(AppError::InvalidInput("amount must not be negative".to_string()));
        }
        Ok(Some((fiat / rate * SATS_PER_BTC).round() as u64))
    }

    /// Fiat value with two decimals; `None` for empty input or no price
    pub fn sats_to_fiat(&self, input: &str) -> AppResult<Option<String>> {
        let trimmed = input.trim();
        let Some(rate) = self.rate.filter(|_| !trimmed.is_empty()) else {
            return Ok(None);
        };
        let sats: u64 = trimmed
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("'{}' is not a whole number of sats", trimmed)))?;
        Ok(Some(format!("{:.2}", sats as f64 / SATS_PER_BTC * rate)))
    }

    /// Approximate fiat value of a sat balance
    pub fn value_of(&self, sats: u64) -> Option<f64> {
        self.rate.map(|rate| sats as f64 / SATS_PER_BTC * rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFeed(AppResult<f64>);

    #[async_trait]
    impl PriceFeed for FixedFeed {
        async fn fetch_rate(&self) -> AppResult<f64> {
            match &self.0 {
                Ok(rate) => Ok(*rate),
                Err(e) => Err(AppError::PriceFeed(e.to_string())),
            }
        }

        fn currency(&self) -> &str {
            "usd"
        }
    }

    #[test]
    fn test_conversion_both_ways() {
        let converter = Converter::with_rate(50_000.0).unwrap();

        assert_eq!(converter.fiat_to_sats("10").unwrap(), Some(20_000));
        assert_eq!(converter.fiat_to_sats("0.015").unwrap(), Some(30));
        assert_eq!(converter.sats_to_fiat("20000").unwrap().as_deref(), Some("10.00"));
        assert_eq!(converter.sats_to_fiat("1").unwrap().as_deref(), Some("0.00"));
        assert_eq!(converter.sat_price(), Some(0.0005));
        assert!((converter.value_of(150_000).unwrap() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_and_missing_rate() {
        let converter = Converter::with_rate(50_000.0).unwrap();
        assert_eq!(converter.fiat_to_sats("  ").unwrap(), None);
        assert_eq!(converter.sats_to_fiat("").unwrap(), None);

        let empty = Converter::new();
        assert_eq!(empty.fiat_to_sats("10").unwrap(), None);
        assert_eq!(empty.sat_price(), None);
    }

    #[test]
    fn test_malformed_input() {
        let converter = Converter::with_rate(50_000.0).unwrap();
        assert!(converter.fiat_to_sats("ten").unwrap_err().is_validation());
        assert!(converter.fiat_to_sats("-1").unwrap_err().is_validation());
        assert!(converter.sats_to_fiat("1.5").unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cached_rate() {
        let mut converter = Converter::new();
        converter.refresh(&FixedFeed(Ok(60_000.0))).await.unwrap();
        let updated = converter.updated_at();

        let failing = FixedFeed(Err(AppError::PriceFeed("rate limited".to_string())));
        assert!(converter.refresh(&failing).await.is_err());
        assert_eq!(converter.rate(), Some(60_000.0));
        assert_eq!(converter.updated_at(), updated);

        assert!(converter.apply(Ok(0.0)).is_err());
        assert_eq!(converter.rate(), Some(60_000.0));
    }
}
