//! Rate limiting utilities

use governor::{Quota, RateLimiter};
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Per-player keyed rate limiter type alias
pub type PlayerLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Create a per-player rate limiter with the specified requests per second
pub fn create_player_limiter(requests_per_second: u32) -> Arc<PlayerLimiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::keyed(quota))
}
