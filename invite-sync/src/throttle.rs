//! Process-wide write throttle.
//!
//! A token bucket holding at most one token that refills once per
//! `interval`. Every record update from every sync run acquires a token
//! first, so writes are spaced by at least `interval` even when two runs
//! overlap.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

pub struct WriteThrottle {
    interval: Duration,
    /// Earliest instant at which the next token is available.
    next_token: Mutex<Instant>,
}

impl WriteThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_token: Mutex::new(Instant::now()),
        }
    }

    /// A throttle that never waits.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Wait until a token is available and take it.
    ///
    /// Waiters queue on the mutex in FIFO order, so tokens are handed out in
    /// request order.
    pub async fn acquire(&self) {
        let mut next = self.next_token.lock().await;
        let slot = (*next).max(Instant::now());
        if slot > Instant::now() {
            sleep_until(slot).await;
        }
        *next = slot + self.interval;
    }
}
