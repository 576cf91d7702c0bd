// LNbits wallet adapter
// API Reference: https://demo.lnbits.com/docs
//
// Uses a wallet's admin key (X-Api-Key header). Amounts are sats except the
// wallet balance and LNURL payments, which are millisatoshis.

use crate::types::{AppError, AppResult};
use crate::wallet::provider::{Invoice, InvoiceRequest, NodeInfo, PaymentReceipt, WalletProvider};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub struct LnbitsProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct LnbitsWallet {
    name: Option<String>,
    /// msat
    balance: i64,
}

#[derive(Serialize)]
struct CreateInvoiceRequest<'a> {
    out: bool,
    amount: u64,
    memo: &'a str,
}

#[derive(Serialize)]
struct PayInvoiceRequest<'a> {
    out: bool,
    bolt11: &'a str,
}

#[derive(Deserialize)]
struct PaymentResponse {
    payment_hash: Option<String>,
    #[serde(alias = "bolt11")]
    payment_request: Option<String>,
    #[serde(default)]
    preimage: Option<String>,
}

#[derive(Deserialize)]
struct LnurlScan {
    kind: Option<String>,
    callback: Option<String>,
    description_hash: Option<String>,
    description: Option<String>,
    #[serde(rename = "minSendable")]
    min_sendable: Option<u64>,
    #[serde(rename = "maxSendable")]
    max_sendable: Option<u64>,
}

#[derive(Serialize)]
struct LnurlPayRequest<'a> {
    callback: &'a str,
    description_hash: &'a str,
    description: &'a str,
    amount: u64,
}

#[derive(Deserialize)]
struct LnbitsErrorResponse {
    detail: serde_json::Value,
}

impl LnbitsProvider {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = request.header("X-Api-Key", &self.api_key).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<LnbitsErrorResponse>(&body) {
                Ok(err) => match err.detail {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
                Err(_) if body.is_empty() => status.to_string(),
                Err(_) => body,
            };
            warn!("LNbits request failed ({}): {}", status, message);
            return Err(AppError::Provider(message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Provider(format!("Unexpected LNbits response: {}", e)))
    }
}

#[async_trait]
impl WalletProvider for LnbitsProvider {
    async fn enable(&self) -> AppResult<()> {
        let _: LnbitsWallet = self.send(self.client.get(self.url("/wallet"))).await?;
        Ok(())
    }

    async fn get_info(&self) -> AppResult<NodeInfo> {
        let wallet: LnbitsWallet = self.send(self.client.get(self.url("/wallet"))).await?;
        Ok(NodeInfo {
            alias: wallet.name,
            // LNbits wallets do not expose the backing node key
            pubkey: None,
            balance_sats: (wallet.balance.max(0) as u64) / 1000,
        })
    }

    async fn make_invoice(&self, request: &InvoiceRequest) -> AppResult<Invoice> {
        let body = CreateInvoiceRequest {
            out: false,
            amount: request.amount_sats,
            memo: &request.memo,
        };
        let response: PaymentResponse = self
            .send(self.client.post(self.url("/payments")).json(&body))
            .await?;

        let payment_request = response
            .payment_request
            .ok_or_else(|| AppError::Provider("LNbits did not return a payment request".to_string()))?;
        Ok(Invoice { payment_request })
    }

    async fn send_payment(&self, payment_request: &str) -> AppResult<PaymentReceipt> {
        let body = PayInvoiceRequest { out: true, bolt11: payment_request };
        let response: PaymentResponse = self
            .send(self.client.post(self.url("/payments")).json(&body))
            .await?;
        Ok(PaymentReceipt {
            payment_hash: response.payment_hash,
            preimage: response.preimage,
        })
    }

    async fn keysend(&self, _destination: &str, _amount_sats: u64) -> AppResult<PaymentReceipt> {
        Err(AppError::Provider("keysend is not supported by LNbits".to_string()))
    }

    async fn pay_to_identifier(&self, identifier: &str, amount_msat: u64) -> AppResult<PaymentReceipt> {
        let scan: LnurlScan = self
            .send(self.client.get(self.url(&format!("/lnurlscan/{}", identifier))))
            .await?;

        if scan.kind.as_deref() != Some("pay") {
            return Err(AppError::Provider(format!("{} does not accept payments", identifier)));
        }
        let (Some(callback), Some(description_hash)) = (scan.callback, scan.description_hash) else {
            return Err(AppError::Provider("LNURL-pay response is incomplete".to_string()));
        };
        let min = scan.min_sendable.unwrap_or(0);
        let max = scan.max_sendable.unwrap_or(u64::MAX);
        if amount_msat < min || amount_msat > max {
            return Err(AppError::Provider(format!(
                "{} accepts between {} and {} sats",
                identifier,
                min / 1000,
                max / 1000
            )));
        }

        debug!("Paying {} msat to {}", amount_msat, identifier);
        let body = LnurlPayRequest {
            callback: &callback,
            description_hash: &description_hash,
            description: scan.description.as_deref().unwrap_or_default(),
            amount: amount_msat,
        };
        let response: PaymentResponse = self
            .send(self.client.post(self.url("/payments/lnurl")).json(&body))
            .await?;
        Ok(PaymentReceipt {
            payment_hash: response.payment_hash,
            preimage: response.preimage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_get_info_converts_msat_balance() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/wallet")
            .match_header("x-api-key", "admin-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"w1","name":"Dashboard","balance":2100500}"#)
            .create_async()
            .await;

        let provider = LnbitsProvider::new(&server.url(), "admin-key", 5);
        let info = provider.get_info().await.unwrap();

        assert_eq!(info.alias.as_deref(), Some("Dashboard"));
        assert_eq!(info.balance_sats, 2100);
        assert!(info.pubkey.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_make_invoice_accepts_bolt11_field() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/payments")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "out": false,
                "amount": 250,
                "memo": "coffee"
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"payment_hash":"abc","bolt11":"lnbc2500n1test"}"#)
            .create_async()
            .await;

        let provider = LnbitsProvider::new(&server.url(), "admin-key", 5);
        let invoice = provider
            .make_invoice(&InvoiceRequest { amount_sats: 250, memo: "coffee".to_string() })
            .await
            .unwrap();

        assert_eq!(invoice.payment_request, "lnbc2500n1test");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/payments")
            .with_status(520)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"Insufficient balance."}"#)
            .create_async()
            .await;

        let provider = LnbitsProvider::new(&server.url(), "admin-key", 5);
        let err = assert_err!(provider.send_payment("lnbc1test").await);

        assert_eq!(err.to_string(), "Wallet provider error: Insufficient balance.");
    }

    #[tokio::test]
    async fn test_pay_to_identifier_scans_then_pays() {
        let mut server = mockito::Server::new_async().await;
        let scan = server
            .mock("GET", "/api/v1/lnurlscan/alice@example.com")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"kind":"pay","callback":"https://example.com/cb","description_hash":"dh",
                    "description":"Pay alice","minSendable":1000,"maxSendable":100000000}"#,
            )
            .create_async()
            .await;
        let pay = server
            .mock("POST", "/api/v1/payments/lnurl")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "callback": "https://example.com/cb",
                "amount": 5000
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"payment_hash":"hash123"}"#)
            .create_async()
            .await;

        let provider = LnbitsProvider::new(&server.url(), "admin-key", 5);
        let receipt = assert_ok!(provider.pay_to_identifier("alice@example.com", 5000).await);

        assert_eq!(receipt.payment_hash.as_deref(), Some("hash123"));
        scan.assert_async().await;
        pay.assert_async().await;
    }

    #[tokio::test]
    async fn test_pay_to_identifier_rejects_out_of_range_amount() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/lnurlscan/alice@example.com")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"kind":"pay","callback":"https://example.com/cb","description_hash":"dh",
                    "minSendable":10000,"maxSendable":20000}"#,
            )
            .create_async()
            .await;
        let pay = server
            .mock("POST", "/api/v1/payments/lnurl")
            .expect(0)
            .create_async()
            .await;

        let provider = LnbitsProvider::new(&server.url(), "admin-key", 5);
        let err = provider.pay_to_identifier("alice@example.com", 1000).await.unwrap_err();

        assert!(err.to_string().contains("between 10 and 20 sats"));
        pay.assert_async().await;
    }

    #[tokio::test]
    async fn test_keysend_unsupported() {
        let provider = LnbitsProvider::new("http://127.0.0.1:1", "admin-key", 1);
        assert!(matches!(provider.keysend("02ab", 1).await, Err(AppError::Provider(_))));
    }
}
