use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::WalletConfig;
use crate::types::{AppError, AppResult};
use crate::wallet::validate;

/// Node details returned by `get_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub alias: Option<String>,
    pub pubkey: Option<String>,
    pub balance_sats: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub amount_sats: u64,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub payment_request: String,
}

/// Result metadata for an outgoing payment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preimage: Option<String>,
}

/// Wallet operations a provider exposes once authorized
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// One-time authorization handshake
    async fn enable(&self) -> AppResult<()>;

    async fn get_info(&self) -> AppResult<NodeInfo>;

    async fn make_invoice(&self, request: &InvoiceRequest) -> AppResult<Invoice>;

    async fn send_payment(&self, payment_request: &str) -> AppResult<PaymentReceipt>;

    async fn keysend(&self, destination: &str, amount_sats: u64) -> AppResult<PaymentReceipt>;

    /// Pay a Lightning Address or LNURL-pay identifier
    async fn pay_to_identifier(&self, identifier: &str, amount_msat: u64) -> AppResult<PaymentReceipt>;
}

/// Entry point for every wallet action.
///
/// The provider is optional: its absence is only discovered when an
/// operation runs, and is reported as `AppError::ProviderUnavailable`.
/// Each operation performs the `enable` handshake before the call itself.
#[derive(Clone, Default)]
pub struct Wallet {
    provider: Option<Arc<dyn WalletProvider>>,
}

impl Wallet {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self { provider: Some(provider) }
    }

    /// A wallet with no provider registered
    pub fn unavailable() -> Self {
        Self { provider: None }
    }

    /// Build from configuration, selecting the adapter by name
    pub fn from_config(config: &WalletConfig) -> Self {
        match (config.provider.as_str(), &config.lnbits_api_key) {
            ("lnbits", Some(key)) => {
                info!("Using LNbits wallet at {}", config.lnbits_url);
                Self::new(Arc::new(crate::wallet::lnbits::LnbitsProvider::new(
                    &config.lnbits_url,
                    key,
                    config.http_timeout_secs,
                )))
            }
            ("lnbits", None) => {
                warn!("LNBITS_API_KEY not set, wallet features are unavailable");
                Self::unavailable()
            }
            ("none", _) => Self::unavailable(),
            (other, _) => {
                warn!("Unknown wallet provider '{}', wallet features are unavailable", other);
                Self::unavailable()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    async fn enabled(&self) -> AppResult<&Arc<dyn WalletProvider>> {
        let provider = self.provider.as_ref().ok_or(AppError::ProviderUnavailable)?;
        provider.enable().await?;
        Ok(provider)
    }

    pub async fn get_info(&self) -> AppResult<NodeInfo> {
        self.enabled().await?.get_info().await
    }

    /// Create an invoice from the operator's raw amount and memo fields
    pub async fn make_invoice(&self, amount: &str, memo: &str) -> AppResult<Invoice> {
        let request = InvoiceRequest {
            amount_sats: validate::parse_sats(amount)?,
            memo: memo.trim().to_string(),
        };
        let invoice = self.enabled().await?.make_invoice(&request).await?;
        debug!("Created invoice for {} sats", request.amount_sats);
        Ok(invoice)
    }

    /// Pay a BOLT11 request, accepting `lightning:` URIs as scanned from QR codes
    pub async fn send_payment(&self, input: &str) -> AppResult<PaymentReceipt> {
        let payment_request = validate::payment_request(input)?;
        self.enabled().await?.send_payment(payment_request).await
    }

    pub async fn keysend(&self, destination: &str, amount: &str) -> AppResult<PaymentReceipt> {
        let destination = validate::node_pubkey(destination)?;
        let amount_sats = validate::parse_sats(amount)?;
        self.enabled().await?.keysend(destination, amount_sats).await
    }

    /// Pay `amount_sats` to a Lightning Address or LNURL.
    ///
    /// The provider receives millisatoshis.
    pub async fn pay_to_identifier(&self, identifier: &str, amount_sats: u64) -> AppResult<PaymentReceipt> {
        let identifier = validate::payable_identifier(identifier)?;
        if amount_sats == 0 {
            return Err(AppError::InvalidInput("amount must be at least 1 sat".to_string()));
        }
        let amount_msat = amount_sats
            .checked_mul(1000)
            .ok_or_else(|| AppError::InvalidInput("amount is too large".to_string()))?;
        self.enabled().await?.pay_to_identifier(identifier, amount_msat).await
    }
}
