use std::time::Duration;

/// Retries after the first failed load (three attempts in total).
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Fixed pause before a failed load is restarted.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Whether a load failure still has budget left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Attempts remain; recovered by a scheduled retry and never surfaced.
    Transient,
    /// Budget exhausted; the element is removed.
    Terminal,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Restart the load after the given delay.
    RetryAfter(Duration),
    /// Stop retrying.
    GiveUp,
}

impl RetryDecision {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            RetryDecision::RetryAfter(_) => FailureKind::Transient,
            RetryDecision::GiveUp => FailureKind::Terminal,
        }
    }
}

/// Bounded retry with a fixed delay (no backoff).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Total load attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Decide what to do after a failed load.
    ///
    /// `retries_used` is 0 for the first attempt, 1 after one retry, and so on.
    pub fn decide(&self, retries_used: u32) -> RetryDecision {
        if retries_used < self.max_retries {
            RetryDecision::RetryAfter(self.delay)
        } else {
            RetryDecision::GiveUp
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_two_retries_at_500ms() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_retries, 2);
        assert_eq!(p.max_attempts(), 3);
        assert_eq!(p.delay, Duration::from_millis(500));
    }

    #[test]
    fn fixed_delay_until_budget_is_spent() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(0), RetryDecision::RetryAfter(Duration::from_millis(500)));
        assert_eq!(p.decide(1), RetryDecision::RetryAfter(Duration::from_millis(500)));
        assert_eq!(p.decide(2), RetryDecision::GiveUp);
        assert_eq!(p.decide(7), RetryDecision::GiveUp);
    }

    #[test]
    fn zero_retries_gives_up_immediately() {
        let p = RetryPolicy {
            max_retries: 0,
            delay: Duration::from_millis(10),
        };
        assert_eq!(p.max_attempts(), 1);
        assert_eq!(p.decide(0).failure_kind(), FailureKind::Terminal);
    }

    #[test]
    fn failure_kind_follows_decision() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(0).failure_kind(), FailureKind::Transient);
        assert_eq!(p.decide(2).failure_kind(), FailureKind::Terminal);
    }
}
