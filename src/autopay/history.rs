use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Success,
    Failure,
}

/// One completed auto-payment attempt. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub amount_sats: u64,
    pub recipient: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: PaymentOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl PaymentRecord {
    pub fn success(amount_sats: u64, recipient: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount_sats,
            recipient: recipient.into(),
            timestamp: Utc::now(),
            outcome: PaymentOutcome::Success,
            error_detail: None,
        }
    }

    pub fn failure(amount_sats: u64, recipient: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount_sats,
            recipient: recipient.into(),
            timestamp: Utc::now(),
            outcome: PaymentOutcome::Failure,
            error_detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == PaymentOutcome::Success
    }

    /// Local wall-clock time, e.g. "14:05"
    pub fn time_label(&self) -> String {
        self.timestamp
            .with_timezone(&chrono::Local)
            .format("%H:%M")
            .to_string()
    }
}

/// Bounded log of recent attempts, newest first
#[derive(Debug, Clone)]
pub struct PaymentHistory {
    records: VecDeque<PaymentRecord>,
    limit: usize,
    total_paid_sats: u64,
}

impl PaymentHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(limit),
            limit: limit.max(1),
            total_paid_sats: 0,
        }
    }

    pub fn push(&mut self, record: PaymentRecord) {
        if record.is_success() {
            self.total_paid_sats = self.total_paid_sats.saturating_add(record.amount_sats);
        }
        self.records.push_front(record);
        self.records.truncate(self.limit);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaymentRecord> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&PaymentRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of successful payments, including ones evicted from the log
    pub fn total_paid_sats(&self) -> u64 {
        self.total_paid_sats
    }
}

impl Default for PaymentHistory {
    fn default() -> Self {
        Self::new(10)
    }
}
