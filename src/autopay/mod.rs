//! Auto-pay on Scroll
//!
//! Converts a continuous position signal (scroll offset) into discrete,
//! rate-limited payments to a Lightning Address or LNURL.
//!
//! ```text
//!  raw scroll events ──► SampleThrottle ──► AutoPay::on_sample ──► TriggerState
//!                                                 │ fires
//!                                                 ▼
//!                                     tokio task: Wallet::pay_to_identifier
//!                                                 │ completion (mpsc)
//!                                                 ▼
//!                              AutoPay::poll_completions ──► PaymentHistory
//! ```
//!
//! All state is mutated by the task that owns `AutoPay`; payment tasks only
//! send their result back over the channel. `TriggerState::in_flight` keeps a
//! second payment from starting while one is outstanding.

pub mod history;
pub mod throttle;
pub mod trigger;

pub use history::{PaymentHistory, PaymentOutcome, PaymentRecord};
pub use throttle::SampleThrottle;
pub use trigger::{TriggerConfig, TriggerState};

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::types::{AppError, AppResult, Status};
use crate::wallet::{PaymentReceipt, Wallet};

/// Result of one payment task
#[derive(Debug)]
struct Completion {
    amount_sats: u64,
    recipient: String,
    result: AppResult<PaymentReceipt>,
}

pub struct AutoPay {
    config: TriggerConfig,
    state: TriggerState,
    history: PaymentHistory,
    status: Option<Status>,
    wallet: Wallet,
    payment_timeout: Option<Duration>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl AutoPay {
    pub fn new(config: TriggerConfig, wallet: Wallet) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            config,
            state: TriggerState::new(),
            history: PaymentHistory::default(),
            status: None,
            wallet,
            payment_timeout: None,
            completion_tx,
            completion_rx,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = PaymentHistory::new(limit);
        self
    }

    /// Bound each payment call. Without this a hung provider blocks further
    /// triggers until it resolves.
    pub fn with_payment_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.payment_timeout = timeout;
        self
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn state(&self) -> &TriggerState {
        &self.state
    }

    pub fn history(&self) -> &PaymentHistory {
        &self.history
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    pub fn is_processing(&self) -> bool {
        self.state.in_flight()
    }

    /// Apply operator changes; the current session state is kept.
    pub fn update_config(&mut self, config: TriggerConfig) -> AppResult<()> {
        config.validate()?;
        info!(
            "Auto-pay settings: {} sats to {} every {} units, {}s cooldown",
            config.amount_sats,
            config.recipient,
            config.distance_threshold,
            config.cooldown.as_secs()
        );
        self.config = config;
        Ok(())
    }

    pub fn enable(&mut self, position: f64) {
        self.state.enable(position);
        self.status = Some(Status::info(
            "Auto-payment on scroll is active. Scroll to trigger payments.",
        ));
        info!("Auto-pay enabled at position {}", position);
    }

    pub fn disable(&mut self) {
        self.state.disable();
        self.status = None;
        info!("Auto-pay disabled");
    }

    /// Flip enabled state; `position` is the baseline used when enabling
    pub fn toggle(&mut self, position: f64) {
        if self.is_enabled() {
            self.disable();
        } else {
            self.enable(position);
        }
    }

    /// Feed one position sample. Returns true if it started a payment.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_sample(&mut self, position: f64, now: Instant) -> bool {
        if !self.state.on_sample(&self.config, position, now) {
            return false;
        }

        let amount_sats = self.config.amount_sats;
        let recipient = self.config.recipient.clone();
        debug!("Scroll threshold reached, paying {} sats to {}", amount_sats, recipient);
        self.status = Some(Status::info("Processing payment..."));

        let wallet = self.wallet.clone();
        let timeout = self.payment_timeout;
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            // A panicking provider still has to clear `in_flight`
            let payment = AssertUnwindSafe(wallet.pay_to_identifier(&recipient, amount_sats))
                .catch_unwind()
                .map(|outcome| outcome.unwrap_or_else(|panic| Err(AppError::from_panic(panic))));
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, payment)
                    .await
                    .unwrap_or(Err(AppError::Timeout(limit))),
                None => payment.await,
            };
            tx.send(Completion { amount_sats, recipient, result }).ok();
        });

        true
    }

    /// Apply every finished payment without blocking. Returns how many were applied.
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Wait for the outstanding payment to finish and apply it
    pub async fn wait_for_completion(&mut self) {
        if !self.state.in_flight() {
            return;
        }
        if let Some(completion) = self.completion_rx.recv().await {
            self.apply(completion);
        }
    }

    fn apply(&mut self, completion: Completion) {
        self.state.complete();

        let Completion { amount_sats, recipient, result } = completion;
        let record = match result {
            Ok(_) => {
                info!("Auto-payment of {} sats to {} succeeded", amount_sats, recipient);
                if self.is_enabled() {
                    self.status = Some(Status::success(format!(
                        "Payment of {} sats sent to {}!",
                        amount_sats, recipient
                    )));
                }
                PaymentRecord::success(amount_sats, recipient)
            }
            Err(err) => {
                warn!("Auto-payment of {} sats to {} failed: {}", amount_sats, recipient, err);
                let detail = err.to_string();
                if self.is_enabled() {
                    self.status = Some(Status::error(detail.clone()));
                }
                PaymentRecord::failure(amount_sats, recipient, detail)
            }
        };
        self.history.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::provider::tests::RecordingProvider;
    use crate::wallet::{Invoice, InvoiceRequest, NodeInfo, WalletProvider};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Provider whose payments block until released
    struct GatedProvider {
        gate: Notify,
    }

    #[async_trait]
    impl WalletProvider for GatedProvider {
        async fn enable(&self) -> AppResult<()> {
            Ok(())
        }

        async fn get_info(&self) -> AppResult<NodeInfo> {
            Err(AppError::Provider("unused".to_string()))
        }

        async fn make_invoice(&self, _request: &InvoiceRequest) -> AppResult<Invoice> {
            Err(AppError::Provider("unused".to_string()))
        }

        async fn send_payment(&self, _payment_request: &str) -> AppResult<PaymentReceipt> {
            Err(AppError::Provider("unused".to_string()))
        }

        async fn keysend(&self, _destination: &str, _amount_sats: u64) -> AppResult<PaymentReceipt> {
            Err(AppError::Provider("unused".to_string()))
        }

        async fn pay_to_identifier(&self, _identifier: &str, _amount_msat: u64) -> AppResult<PaymentReceipt> {
            self.gate.notified().await;
            Ok(PaymentReceipt::default())
        }
    }

    /// Provider whose payments panic
    struct PanickingProvider;

    #[async_trait]
    impl WalletProvider for PanickingProvider {
        async fn enable(&self) -> AppResult<()> {
            Ok(())
        }

        async fn get_info(&self) -> AppResult<NodeInfo> {
            Err(AppError::Provider("unused".to_string()))
        }

        async fn make_invoice(&self, _request: &InvoiceRequest) -> AppResult<Invoice> {
            Err(AppError::Provider("unused".to_string()))
        }

        async fn send_payment(&self, _payment_request: &str) -> AppResult<PaymentReceipt> {
            Err(AppError::Provider("unused".to_string()))
        }

        async fn keysend(&self, _destination: &str, _amount_sats: u64) -> AppResult<PaymentReceipt> {
            Err(AppError::Provider("unused".to_string()))
        }

        async fn pay_to_identifier(&self, _identifier: &str, _amount_msat: u64) -> AppResult<PaymentReceipt> {
            panic!("node connection dropped")
        }
    }

    fn trigger_config() -> TriggerConfig {
        TriggerConfig::new(1, "x@y", 300.0, Duration::from_secs(5)).unwrap()
    }

    fn at(t0: Instant, secs: u64) -> Instant {
        t0 + Duration::from_secs(secs)
    }

    #[tokio::test]
    async fn test_scenario_records_each_trigger() {
        let provider = Arc::new(RecordingProvider::default());
        let mut autopay = AutoPay::new(trigger_config(), Wallet::new(provider.clone()));
        let t0 = Instant::now();
        autopay.enable(0.0);

        assert!(autopay.on_sample(310.0, t0));
        autopay.wait_for_completion().await;

        let record = autopay.history().latest().unwrap();
        assert_eq!(record.amount_sats, 1);
        assert_eq!(record.recipient, "x@y");
        assert!(record.is_success());

        assert!(!autopay.on_sample(620.0, at(t0, 2)));
        assert!(autopay.on_sample(930.0, at(t0, 6)));
        autopay.wait_for_completion().await;

        assert_eq!(autopay.history().len(), 2);
        assert_eq!(autopay.history().total_paid_sats(), 2);
        assert_eq!(
            provider.payments.lock().unwrap().as_slice(),
            &[("x@y".to_string(), 1000), ("x@y".to_string(), 1000)]
        );
        assert_eq!(
            autopay.status(),
            Some(&Status::success("Payment of 1 sats sent to x@y!"))
        );
    }

    #[tokio::test]
    async fn test_failed_payment_keeps_reset() {
        let provider = Arc::new(RecordingProvider::failing("Insufficient balance"));
        let mut autopay = AutoPay::new(trigger_config(), Wallet::new(provider));
        let t0 = Instant::now();
        autopay.enable(0.0);

        assert!(autopay.on_sample(400.0, t0));
        autopay.wait_for_completion().await;

        assert_eq!(autopay.state().accumulated_distance(), 0.0);
        assert_eq!(autopay.state().last_trigger(), Some(t0));
        assert!(!autopay.is_processing());

        let record = autopay.history().latest().unwrap();
        assert_eq!(record.outcome, PaymentOutcome::Failure);
        assert_eq!(
            record.error_detail.as_deref(),
            Some("Wallet provider error: Insufficient balance")
        );
        assert_eq!(autopay.history().total_paid_sats(), 0);

        // Still armed, but only after the cooldown
        assert!(!autopay.on_sample(800.0, at(t0, 1)));
        assert!(autopay.on_sample(1200.0, at(t0, 5)));
    }

    #[tokio::test]
    async fn test_missing_provider_records_failure() {
        let mut autopay = AutoPay::new(trigger_config(), Wallet::unavailable());
        autopay.enable(0.0);

        assert!(autopay.on_sample(300.0, Instant::now()));
        autopay.wait_for_completion().await;

        let record = autopay.history().latest().unwrap();
        assert!(!record.is_success());
        assert!(record.error_detail.as_deref().unwrap().contains("not available"));
    }

    #[tokio::test]
    async fn test_malformed_recipient_records_failure_without_provider_call() {
        let provider = Arc::new(RecordingProvider::default());
        let config = TriggerConfig::new(3, "not an address", 300.0, Duration::ZERO).unwrap();
        let mut autopay = AutoPay::new(config, Wallet::new(provider.clone()));
        autopay.enable(0.0);

        assert!(autopay.on_sample(300.0, Instant::now()));
        autopay.wait_for_completion().await;

        assert!(!autopay.history().latest().unwrap().is_success());
        assert!(provider.payments.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_provider_records_failure_and_rearms() {
        let config = TriggerConfig::new(1, "x@y", 300.0, Duration::ZERO).unwrap();
        let mut autopay = AutoPay::new(config, Wallet::new(Arc::new(PanickingProvider)));
        let t0 = Instant::now();
        autopay.enable(0.0);

        assert!(autopay.on_sample(300.0, t0));
        autopay.wait_for_completion().await;

        assert!(!autopay.is_processing());
        let record = autopay.history().latest().unwrap();
        assert!(!record.is_success());
        assert!(record.error_detail.as_deref().unwrap().contains("node connection dropped"));

        // Still armed
        assert!(autopay.on_sample(600.0, at(t0, 1)));
    }

    #[tokio::test]
    async fn test_non_ascii_recipient_records_failure() {
        let provider = Arc::new(RecordingProvider::default());
        let config = TriggerConfig::new(1, "a€€", 300.0, Duration::ZERO).unwrap();
        let mut autopay = AutoPay::new(config, Wallet::new(provider.clone()));
        autopay.enable(0.0);

        assert!(autopay.on_sample(300.0, Instant::now()));
        autopay.wait_for_completion().await;

        assert!(!autopay.is_processing());
        assert_eq!(autopay.history().len(), 1);
        assert!(!autopay.history().latest().unwrap().is_success());
        assert!(provider.payments.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_second_payment_while_in_flight() {
        let provider = Arc::new(GatedProvider { gate: Notify::new() });
        let config = TriggerConfig::new(1, "x@y", 300.0, Duration::ZERO).unwrap();
        let mut autopay = AutoPay::new(config, Wallet::new(provider.clone()));
        let t0 = Instant::now();
        autopay.enable(0.0);

        assert!(autopay.on_sample(300.0, t0));
        let frozen = autopay.state().clone();
        for step in 1..50u64 {
            assert!(!autopay.on_sample(300.0 + step as f64 * 500.0, at(t0, step)));
        }
        assert_eq!(autopay.state(), &frozen);
        assert_eq!(autopay.poll_completions(), 0);

        provider.gate.notify_one();
        autopay.wait_for_completion().await;
        assert!(!autopay.is_processing());
        assert_eq!(autopay.history().len(), 1);
    }

    #[tokio::test]
    async fn test_disable_lets_in_flight_payment_finish() {
        let provider = Arc::new(GatedProvider { gate: Notify::new() });
        let mut autopay = AutoPay::new(trigger_config(), Wallet::new(provider.clone()));
        autopay.enable(0.0);

        assert!(autopay.on_sample(300.0, Instant::now()));
        autopay.disable();
        assert!(autopay.status().is_none());
        assert!(autopay.is_processing());

        provider.gate.notify_one();
        autopay.wait_for_completion().await;
        assert_eq!(autopay.history().len(), 1);
        assert!(autopay.history().latest().unwrap().is_success());
    }

    #[tokio::test]
    async fn test_payment_timeout_records_failure() {
        let provider = Arc::new(GatedProvider { gate: Notify::new() });
        let mut autopay = AutoPay::new(trigger_config(), Wallet::new(provider))
            .with_payment_timeout(Some(Duration::from_millis(50)));
        autopay.enable(0.0);

        assert!(autopay.on_sample(300.0, Instant::now()));
        autopay.wait_for_completion().await;

        let record = autopay.history().latest().unwrap();
        assert!(!record.is_success());
        assert!(record.error_detail.as_deref().unwrap().contains("timed out"));
        assert!(!autopay.is_processing());
    }

    #[tokio::test]
    async fn test_update_config_rejects_invalid_values() {
        let mut autopay = AutoPay::new(trigger_config(), Wallet::unavailable());
        let mut bad = trigger_config();
        bad.amount_sats = 0;

        assert!(autopay.update_config(bad).unwrap_err().is_validation());
        assert_eq!(autopay.config(), &trigger_config());

        let mut good = trigger_config();
        good.recipient = "alice@example.com".to_string();
        autopay.update_config(good.clone()).unwrap();
        assert_eq!(autopay.config(), &good);
    }
}
