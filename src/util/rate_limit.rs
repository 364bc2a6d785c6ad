//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Default cap on local-state writes to the room document
pub const SYNC_WRITE_RATE_LIMIT: u32 = 20;

/// Outbound write limiter for the local actor's slot
#[derive(Clone)]
pub struct WriteLimiter {
    limiter: Arc<Limiter>,
}

impl WriteLimiter {
    pub fn new(writes_per_second: u32) -> Self {
        Self {
            limiter: create_limiter(writes_per_second),
        }
    }

    /// Check if a write is allowed now (returns true if allowed)
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for WriteLimiter {
    fn default() -> Self {
        Self::new(SYNC_WRITE_RATE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_is_capped_at_quota() {
        let limiter = WriteLimiter::new(3);
        let allowed = (0..10).filter(|_| limiter.check()).count();
        assert_eq!(allowed, 3);
    }

    #[test]
    fn zero_rate_still_allows_one() {
        let limiter = WriteLimiter::new(0);
        assert!(limiter.check());
    }
}
