use std::time::Duration;

/// Capped exponential backoff: `initial * 2^(attempt - 1)`, at most `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u32,
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn new(max_attempts: u32, initial: Duration, max: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial,
            max,
        }
    }

    /// Delay to wait after the given 1-based failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_capped() {
        let backoff = Backoff::new(5, Duration::from_millis(200), Duration::from_secs(1));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(2), Duration::from_millis(400));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
        assert_eq!(backoff.delay(40), Duration::from_secs(1));
    }

    #[test]
    fn at_least_one_attempt() {
        let backoff = Backoff::new(0, Duration::ZERO, Duration::ZERO);
        assert_eq!(backoff.max_attempts, 1);
    }
}
