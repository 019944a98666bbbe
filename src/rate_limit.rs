use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Per-email sign-in brute force limiter.
pub struct LoginRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if a sign-in attempt is allowed. 5 failures per 15 minutes.
    /// Does NOT increment the counter — call `record_failure()` on invalid password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let window = Duration::from_secs(15 * 60);
        let now = Instant::now();

        let entry = self.entries.get(&email.to_lowercase());
        let Some(entry) = entry else {
            return Ok(());
        };

        let (count, start) = entry.value();

        if now.duration_since(*start) > window {
            return Ok(());
        }

        if *count >= 5 {
            let elapsed = now.duration_since(*start).as_secs();
            return Err((15 * 60u64).saturating_sub(elapsed));
        }

        Ok(())
    }

    /// Record a failed sign-in attempt. Increments the counter for the given email.
    pub fn record_failure(&self, email: &str) {
        let window = Duration::from_secs(15 * 60);
        let now = Instant::now();

        let mut entry = self.entries.entry(email.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_until_fifth_failure() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..4 {
            limiter.record_failure("user@example.com");
        }
        assert!(limiter.check("user@example.com").is_ok());

        limiter.record_failure("user@example.com");
        assert!(limiter.check("user@example.com").is_err());
    }

    #[test]
    fn emails_are_tracked_case_insensitively() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..5 {
            limiter.record_failure("User@Example.com");
        }
        assert!(limiter.check("user@example.com").is_err());
    }

    #[test]
    fn unrelated_emails_are_unaffected() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..5 {
            limiter.record_failure("locked@example.com");
        }
        assert!(limiter.check("other@example.com").is_ok());
    }
}
