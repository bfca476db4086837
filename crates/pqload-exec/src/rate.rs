//! Token-bucket admission for the producer.

use std::num::NonZeroU32;
use std::thread;

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};

use crate::error::{LoadError, Result};

/// Admits at most `rate` rows per second with a burst of one, so admissions
/// are spaced evenly at `1 / rate` seconds.
pub struct RateLimiter {
    bucket: Governor<NotKeyed, InMemoryState, DefaultClock>,
    clock: DefaultClock,
    rate: NonZeroU32,
}

impl RateLimiter {
    pub fn per_second(rate: u32) -> Result<Self> {
        let rate = NonZeroU32::new(rate)
            .ok_or_else(|| LoadError::Config("rate limit must be greater than zero".into()))?;
        let quota = Quota::per_second(rate).allow_burst(NonZeroU32::MIN);
        Ok(Self {
            bucket: Governor::direct(quota),
            clock: DefaultClock::default(),
            rate,
        })
    }

    pub fn rate(&self) -> u32 {
        self.rate.get()
    }

    /// Block the calling thread until one token is available, then take it.
    pub fn acquire(&self) {
        while let Err(not_until) = self.bucket.check() {
            thread::sleep(not_until.wait_time_from(self.clock.now()));
        }
    }
}
