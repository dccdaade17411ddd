use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Sliding-window limiter for generation requests, shared by the whole process.
///
/// Only admitted calls are recorded; a rejected call does not extend the wait.
/// `max_calls == 0` disables the limit.
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            calls: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }

    /// Admits the call, or returns how long until a slot frees up.
    pub fn check(&self) -> Result<(), Duration> {
        self.check_at(Instant::now())
    }

    fn check_at(&self, now: Instant) -> Result<(), Duration> {
        if self.max_calls == 0 {
            return Ok(());
        }

        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(&oldest) = calls.front() {
            if now.duration_since(oldest) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }

        if calls.len() < self.max_calls {
            calls.push_back(now);
            return Ok(());
        }

        let oldest = calls.front().copied().unwrap_or(now);
        Err(self.window.saturating_sub(now.duration_since(oldest)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();
        for i in 0..5 {
            assert!(limiter.check_at(start + Duration::from_secs(i)).is_ok());
        }
        let wait = limiter
            .check_at(start + Duration::from_secs(10))
            .unwrap_err();
        assert_eq!(wait, Duration::from_secs(50));
    }

    #[test]
    fn test_slot_frees_after_window() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.check_at(start).is_ok());
        assert!(limiter.check_at(start + Duration::from_secs(59)).is_err());
        assert!(limiter.check_at(start + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn test_rejected_calls_are_not_recorded() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();
        limiter.check_at(start).unwrap();
        for s in 1..10 {
            assert!(limiter.check_at(start + Duration::from_secs(s)).is_err());
        }
        assert!(limiter.check_at(start + Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn test_zero_disables_limit() {
        let limiter = RateLimiter::new(0, Duration::from_secs(60));
        let now = Instant::now();
        for _ in 0..100 {
            assert!(limiter.check_at(now).is_ok());
        }
    }
}
