use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Minimum spacing between calls to the same vendor.
///
/// A leaky bucket of one: no burst allowance, each call reserves the next
/// free slot and sleeps until it arrives.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<HashMap<&'static str, Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Wait until `vendor` may be called again, then claim the slot.
    pub async fn wait_turn(&self, vendor: &'static str) {
        let wait = self.reserve(vendor, Instant::now());
        if !wait.is_zero() {
            debug!("Rate limiting {}, sleeping for {:?}", vendor, wait);
            tokio::time::sleep(wait).await;
        }
    }

    fn reserve(&self, vendor: &'static str, now: Instant) -> Duration {
        let mut slots = self
            .next_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let start = match slots.get(vendor) {
            Some(&slot) if slot > now => slot,
            _ => now,
        };
        slots.insert(vendor, start + self.min_interval);
        start - now
    }
}
