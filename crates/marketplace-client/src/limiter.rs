use std::time::{Duration, Instant};

/// A simple "at most N calls per window" limiter plus an explicit block-until
/// deadline for 429 backoff. Each marketplace task owns one instance sized to
/// its own rate limit (e.g. 3 calls/60s for NmReportDetail, 1 call/70s for
/// the fullstats endpoint).
pub struct RequestLimiter {
    max_calls: usize,
    window: Duration,
    calls: Vec<Instant>,
    blocked_until: Option<Instant>,
}

impl RequestLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self { max_calls, window, calls: Vec::with_capacity(max_calls), blocked_until: None }
    }

    /// `None` if a call is allowed right now; `Some(remaining)` otherwise.
    pub fn check(&mut self, now: Instant) -> Option<Duration> {
        if let Some(until) = self.blocked_until {
            if now < until {
                return Some(until - now);
            }
            self.blocked_until = None;
        }

        self.calls.retain(|&t| now.duration_since(t) < self.window);
        if self.calls.len() >= self.max_calls {
            let oldest = self.calls[0];
            return Some(self.window - now.duration_since(oldest));
        }
        None
    }

    pub fn record_call(&mut self, now: Instant) {
        self.calls.push(now);
    }

    /// Called on a 429 response to force a cooldown, per spec.md §7's
    /// "rate-limit self for 60s if 429".
    pub fn block_for(&mut self, now: Instant, duration: Duration) {
        self.blocked_until = Some(now + duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_calls_then_blocks() {
        let mut limiter = RequestLimiter::new(2, Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(limiter.check(t0).is_none());
        limiter.record_call(t0);
        assert!(limiter.check(t0).is_none());
        limiter.record_call(t0);
        assert!(limiter.check(t0).is_some());
    }

    #[test]
    fn block_for_forces_cooldown_regardless_of_call_count() {
        let mut limiter = RequestLimiter::new(5, Duration::from_secs(60));
        let t0 = Instant::now();
        limiter.block_for(t0, Duration::from_secs(60));
        let remaining = limiter.check(t0 + Duration::from_secs(30));
        assert!(remaining.is_some());
        assert!(limiter.check(t0 + Duration::from_secs(61)).is_none());
    }
}
