use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::error::ShareError;

// Sliding window limiter - keeps the instants of admitted calls
// that are still inside the window, oldest first.
pub struct RateLimiter {
    calls: VecDeque<Instant>,
    max_calls: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            calls: VecDeque::with_capacity(max_calls),
            max_calls,
            window,
        }
    }

    /// Admit one call now, or report how many seconds to wait.
    pub fn admit(&mut self) -> Result<(), ShareError> {
        self.admit_at(Instant::now())
    }

    // Same as admit() but with an explicit clock reading
    pub fn admit_at(&mut self, now: Instant) -> Result<(), ShareError> {
        // drop everything that fell out of the window
        while let Some(&oldest) = self.calls.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.calls.pop_front();
            } else {
                break;
            }
        }

        if self.calls.len() >= self.max_calls {
            let wait_secs = match self.calls.front() {
                Some(&oldest) => {
                    let remaining = self
                        .window
                        .saturating_sub(now.saturating_duration_since(oldest));
                    ceil_secs(remaining)
                }
                // max_calls == 0, nothing will ever be admitted
                None => ceil_secs(self.window),
            };
            tracing::warn!(wait_secs, "rate limit exceeded");
            return Err(ShareError::RateLimitExceeded { wait_secs });
        }

        self.calls.push_back(now);
        Ok(())
    }

    // number of admitted calls still inside the window
    pub fn in_window(&self) -> usize {
        self.calls.len()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
