// CoinGecko simple price adapter
// API Reference: https://docs.coingecko.com/reference/simple-price

use crate::config::PriceFeedConfig;
use crate::converter::PriceFeed;
use crate::types::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub struct CoinGeckoFeed {
    client: Client,
    base_url: String,
    currency: String,
}

// {"bitcoin":{"usd":67012.5}}
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

impl CoinGeckoFeed {
    pub fn new(base_url: &str, currency: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            currency: currency.to_lowercase(),
        }
    }

    pub fn from_config(config: &PriceFeedConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            ..Self::new(&config.url, &config.currency)
        }
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoFeed {
    async fn fetch_rate(&self) -> AppResult<f64> {
        let url = format!("{}/simple/price", self.base_url);
        debug!("Fetching BTC/{} from {}", self.currency, url);

        let response = self
            .client
            .get(&url)
            .query(&[("ids", "bitcoin"), ("vs_currencies", self.currency.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::PriceFeed(format!(
                "price request failed with status {}",
                response.status()
            )));
        }

        let prices: SimplePriceResponse = response
            .json()
            .await
            .map_err(|e| AppError::PriceFeed(format!("unexpected response: {}", e)))?;

        prices
            .get("bitcoin")
            .and_then(|quotes| quotes.get(&self.currency))
            .copied()
            .ok_or_else(|| AppError::PriceFeed(format!("no BTC price for {}", self.currency)))
    }

    fn currency(&self) -> &str {
        &self.currency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_fetch_rate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/price")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ids".into(), "bitcoin".into()),
                Matcher::UrlEncoded("vs_currencies".into(), "eur".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"bitcoin":{"eur":61234.5}}"#)
            .create_async()
            .await;

        let feed = CoinGeckoFeed::new(&server.url(), "EUR");
        assert_eq!(feed.currency(), "eur");
        assert_eq!(feed.fetch_rate().await.unwrap(), 61234.5);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limited_response_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/simple/price")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let feed = CoinGeckoFeed::new(&server.url(), "usd");
        let err = feed.fetch_rate().await.unwrap_err();
        assert!(matches!(err, AppError::PriceFeed(_)));
    }

    #[tokio::test]
    async fn test_missing_currency_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/simple/price")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"bitcoin":{}}"#)
            .create_async()
            .await;

        let feed = CoinGeckoFeed::new(&server.url(), "usd");
        assert!(feed.fetch_rate().await.is_err());
    }
}
