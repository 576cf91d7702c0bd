//! Distance/cooldown trigger state machine.
//!
//! Clock-free: callers pass the sample time in, so the same sequence of
//! samples always produces the same decisions.

use std::time::{Duration, Instant};

use crate::config::AutoPayConfig;
use crate::types::{AppError, AppResult};

/// Per-session trigger settings
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerConfig {
    pub amount_sats: u64,
    pub recipient: String,
    pub distance_threshold: f64,
    pub cooldown: Duration,
}

impl TriggerConfig {
    pub fn new(
        amount_sats: u64,
        recipient: impl Into<String>,
        distance_threshold: f64,
        cooldown: Duration,
    ) -> AppResult<Self> {
        let config = Self {
            amount_sats,
            recipient: recipient.into(),
            distance_threshold,
            cooldown,
        };
        config.validate()?;
        Ok(config)
    }

    /// The recipient is deliberately not checked here; a malformed identifier
    /// surfaces as a failed payment record when the trigger fires.
    pub fn validate(&self) -> AppResult<()> {
        if self.amount_sats == 0 {
            return Err(AppError::InvalidInput("sats per trigger must be at least 1".to_string()));
        }
        if !self.distance_threshold.is_finite() || self.distance_threshold <= 0.0 {
            return Err(AppError::InvalidInput("scroll threshold must be positive".to_string()));
        }
        Ok(())
    }
}

impl TryFrom<&AutoPayConfig> for TriggerConfig {
    type Error = AppError;

    fn try_from(config: &AutoPayConfig) -> AppResult<Self> {
        Self::new(
            config.sats_per_trigger,
            config.recipient.clone(),
            config.scroll_threshold,
            config.cooldown(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerState {
    enabled: bool,
    last_position: f64,
    accumulated_distance: f64,
    last_trigger: Option<Instant>,
    in_flight: bool,
}

impl TriggerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-baseline on the current position so distance covered while
    /// disabled cannot fire a payment.
    pub fn enable(&mut self, position: f64) {
        self.enabled = true;
        self.last_position = position;
        self.accumulated_distance = 0.0;
        self.last_trigger = None;
    }

    /// An in-flight payment is left to resolve.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Feed one position sample. Returns true when a payment should start;
    /// the caller must then call `complete` once it resolves.
    pub fn on_sample(&mut self, config: &TriggerConfig, position: f64, now: Instant) -> bool {
        if !self.enabled || self.in_flight {
            return false;
        }

        self.accumulated_distance += (position - self.last_position).abs();
        self.last_position = position;

        let cooled_down = match self.last_trigger {
            Some(last) => now.saturating_duration_since(last) >= config.cooldown,
            None => true,
        };

        if self.accumulated_distance >= config.distance_threshold && cooled_down {
            // Reset before the payment resolves; failures keep the reset.
            self.accumulated_distance = 0.0;
            self.last_trigger = Some(now);
            self.in_flight = true;
            return true;
        }

        false
    }

    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn accumulated_distance(&self) -> f64 {
        self.accumulated_distance
    }

    pub fn last_position(&self) -> f64 {
        self.last_position
    }

    pub fn last_trigger(&self) -> Option<Instant> {
        self.last_trigger
    }

    /// Time left before another trigger is allowed
    pub fn cooldown_remaining(&self, config: &TriggerConfig, now: Instant) -> Duration {
        self.last_trigger
            .map(|last| config.cooldown.saturating_sub(now.saturating_duration_since(last)))
            .unwrap_or_default()
    }
}
