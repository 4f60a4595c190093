//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter allowing `burst` messages per `period`.
pub fn create_limiter(period: Duration, burst: u32) -> Arc<Limiter> {
    let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
    let per_message = period
        .checked_div(burst.get())
        .filter(|d| !d.is_zero())
        .unwrap_or(Duration::from_nanos(1));
    let quota = Quota::with_period(per_message)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst);
    Arc::new(RateLimiter::direct(quota))
}

/// Per-connection inbound message budget: a fine-grained cap per tick
/// period and a coarser cap per second. A message is admitted only when
/// both budgets have room; the budget is consumed before decoding, so
/// malformed traffic counts too.
#[derive(Clone)]
pub struct SessionRateLimiter {
    per_tick: Arc<Limiter>,
    per_second: Arc<Limiter>,
}

impl SessionRateLimiter {
    pub fn new(tick_interval: Duration, max_per_tick: u32, max_per_second: u32) -> Self {
        Self {
            per_tick: create_limiter(tick_interval, max_per_tick),
            per_second: create_limiter(Duration::from_secs(1), max_per_second),
        }
    }

    /// Check whether the next inbound message fits the budget.
    pub fn check(&self) -> bool {
        self.per_tick.check().is_ok() && self.per_second.check().is_ok()
    }
}
