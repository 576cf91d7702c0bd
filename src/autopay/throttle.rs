// Leading-edge throttle for raw scroll events, backed by governor.
// A sample passes when no other sample passed within the last period.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::time::Duration;

pub struct SampleThrottle {
    limiter: Option<DefaultDirectRateLimiter>,
}

impl SampleThrottle {
    /// A zero period lets every sample through
    pub fn new(period: Duration) -> Self {
        Self {
            limiter: Quota::with_period(period).map(RateLimiter::direct),
        }
    }

    pub fn admit(&self) -> bool {
        self.limiter.as_ref().map_or(true, |limiter| limiter.check().is_ok())
    }
}
