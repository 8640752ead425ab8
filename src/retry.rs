//! Retry policy, backoff strategies and predicates for transient failures.
//!
//! A [`RetryPolicy`] bounds one logical call: how many attempts it may make,
//! how long to wait between them, which HTTP statuses count as transient and
//! how long the whole call may keep retrying. Whether a particular error is
//! retried is decided by a [`RetryPredicate`]; by default one is derived from
//! the policy with [`RetryPolicy::predicate`].

use crate::Error;
use rand::Rng;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// HTTP statuses retried by default.
pub const DEFAULT_RETRIABLE_STATUSES: [u16; 3] = [500, 503, 504];

/// Randomization applied to a computed backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jitter {
    /// Use the computed delay as is.
    None,
    /// Scale the delay by a random factor in `[0.5, 1.0]`.
    Down,
    /// Scale the delay by a random factor in `[0.5, 1.5]`.
    #[default]
    Spread,
}

impl Jitter {
    fn apply(self, delay: Duration) -> Duration {
        let factor = match self {
            Jitter::None => return delay,
            Jitter::Down => rand::thread_rng().gen_range(0.5..=1.0),
            Jitter::Spread => rand::thread_rng().gen_range(0.5..=1.5),
        };
        Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }
}

/// Defines how long to wait before each retry.
///
/// # Examples
///
/// ```
/// use async_googlemaps::{Jitter, RetryStrategy};
/// use std::time::Duration;
///
/// // 100ms, 200ms, 400ms, 800ms...
/// let exponential = RetryStrategy::ExponentialBackoff {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(30),
///     multiplier: 2.0,
///     jitter: Jitter::None,
/// };
/// assert_eq!(exponential.delay_for_retry(3), Some(Duration::from_millis(400)));
///
/// // 1s, 1s, 1s...
/// let linear = RetryStrategy::Linear {
///     delay: Duration::from_secs(1),
/// };
/// assert_eq!(linear.delay_for_retry(7), Some(Duration::from_secs(1)));
/// ```
#[derive(Debug, Clone)]
pub enum RetryStrategy {
    /// Do not retry failed requests.
    None,

    /// Retry with exponentially increasing delays.
    ///
    /// The n-th retry waits `initial_delay * multiplier^(n-1)`, capped at
    /// `max_delay`, then jittered.
    ExponentialBackoff {
        /// The delay before the first retry.
        initial_delay: Duration,
        /// The maximum delay between retries, applied before jitter.
        max_delay: Duration,
        /// Growth factor per retry. Values below `1.0` are treated as `1.0`.
        multiplier: f64,
        /// Randomization applied to each delay.
        jitter: Jitter,
    },

    /// Retry with a fixed delay between attempts.
    Linear {
        /// The delay between retry attempts.
        delay: Duration,
    },

    /// Custom retry logic.
    ///
    /// Takes the retry number (1 = first retry) and returns the delay before
    /// that retry, or `None` to stop retrying.
    Custom {
        /// Function that determines retry delay.
        delay_fn: fn(retry: usize) -> Option<Duration>,
    },
}

impl Default for RetryStrategy {
    /// 500ms growing by 1.5x per retry, jittered by ±50%.
    fn default() -> Self {
        RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            multiplier: 1.5,
            jitter: Jitter::Spread,
        }
    }
}

impl RetryStrategy {
    /// Returns the delay before the given retry, or `None` to stop retrying.
    ///
    /// `retry` is 1-indexed: `1` is the wait between the first and second
    /// attempt.
    pub fn delay_for_retry(&self, retry: usize) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                multiplier,
                jitter,
            } => {
                let exponent = retry.saturating_sub(1).min(i32::MAX as usize) as i32;
                let factor = multiplier.max(1.0).powi(exponent);
                let base_delay = if factor.is_finite() {
                    Duration::try_from_secs_f64(initial_delay.as_secs_f64() * factor)
                        .unwrap_or(*max_delay)
                } else {
                    *max_delay
                };
                Some(jitter.apply(base_delay.min(*max_delay)))
            }
            RetryStrategy::Linear { delay } => Some(*delay),
            RetryStrategy::Custom { delay_fn } => delay_fn(retry),
        }
    }
}

/// Bounds for the retry loop of a single logical call.
///
/// # Examples
///
/// ```
/// use async_googlemaps::{RetryPolicy, RetryStrategy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default()
///     .max_attempts(3)
///     .strategy(RetryStrategy::Linear { delay: Duration::from_millis(250) })
///     .retriable_status(429);
///
/// assert!(policy.is_retriable_status(429));
/// assert!(policy.is_retriable_status(503));
/// assert!(!policy.is_retriable_status(404));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    strategy: RetryStrategy,
    retriable_statuses: BTreeSet<u16>,
    retry_over_query_limit: bool,
    retry_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            strategy: RetryStrategy::default(),
            retriable_statuses: DEFAULT_RETRIABLE_STATUSES.into_iter().collect(),
            retry_over_query_limit: true,
            retry_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            strategy: RetryStrategy::None,
            ..Self::default()
        }
    }

    /// Sets the total number of attempts, including the first. Clamped to at
    /// least one.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the backoff strategy.
    pub fn strategy(mut self, strategy: RetryStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replaces the set of retriable HTTP statuses.
    pub fn retriable_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retriable_statuses = statuses.into_iter().collect();
        self
    }

    /// Adds one retriable HTTP status.
    pub fn retriable_status(mut self, status: u16) -> Self {
        self.retriable_statuses.insert(status);
        self
    }

    /// Sets whether over-query-limit responses are retried.
    pub fn retry_over_query_limit(mut self, enabled: bool) -> Self {
        self.retry_over_query_limit = enabled;
        self
    }

    /// Sets the time budget across all attempts of one call. `None` removes
    /// the budget so only `max_attempts` applies.
    pub fn retry_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.retry_timeout = timeout;
        self
    }

    /// The total number of attempts permitted.
    pub fn get_max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// The configured backoff strategy.
    pub fn get_strategy(&self) -> &RetryStrategy {
        &self.strategy
    }

    /// The configured retry time budget.
    pub fn get_retry_timeout(&self) -> Option<Duration> {
        self.retry_timeout
    }

    /// Returns `true` if `status` is in the retriable set.
    pub fn is_retriable_status(&self, status: u16) -> bool {
        self.retriable_statuses.contains(&status)
    }

    /// Builds the default predicate for this policy.
    ///
    /// Retries network errors, timeouts, the retriable statuses and, when
    /// enabled, over-query-limit responses.
    pub fn predicate(&self) -> Arc<dyn RetryPredicate> {
        let mut predicates: Vec<Box<dyn RetryPredicate>> = vec![
            Box::new(RetryOnStatus::new(self.retriable_statuses.iter().copied())),
            Box::new(RetryOnTimeout),
            Box::new(RetryOnConnectionError),
        ];
        if self.retry_over_query_limit {
            predicates.push(Box::new(RetryOnOverQueryLimit));
        }
        Arc::new(OrPredicate::new(predicates))
    }
}

/// Trait for determining whether a failed attempt should be retried.
///
/// The retry loop consults the predicate first and the policy's attempt and
/// time budgets second, so a predicate never needs to count attempts itself
/// unless it wants to stop earlier.
///
/// # Examples
///
/// ```
/// use async_googlemaps::{Error, RetryPredicate};
///
/// struct RetryOnRequestDenied;
///
/// impl RetryPredicate for RetryOnRequestDenied {
///     fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
///         matches!(error, Error::Api { status, .. } if status == "REQUEST_DENIED")
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` if the attempt that produced `error` should be retried.
    ///
    /// `attempt` is the 1-indexed number of the attempt that failed.
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;
}

/// Retry when the response status is in a given set.
#[derive(Debug, Clone)]
pub struct RetryOnStatus {
    statuses: BTreeSet<u16>,
}

impl RetryOnStatus {
    /// Creates a predicate for the given statuses.
    pub fn new(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
        }
    }
}

impl RetryPredicate for RetryOnStatus {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::HttpError { status, .. } if self.statuses.contains(&status.as_u16()))
    }
}

/// Retry only on timeout errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnTimeout;

impl RetryPredicate for RetryOnTimeout {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::Timeout)
    }
}

/// Retry only on network/connection errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnConnectionError;

impl RetryPredicate for RetryOnConnectionError {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::Network(_))
    }
}

/// Retry when the service reports the query quota was exceeded.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnOverQueryLimit;

impl RetryPredicate for RetryOnOverQueryLimit {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::OverQueryLimit { .. })
    }
}

/// Combine multiple retry predicates with OR logic.
///
/// # Examples
///
/// ```
/// use async_googlemaps::retry::{OrPredicate, RetryOnStatus, RetryOnTimeout};
///
/// let predicate = OrPredicate::new(vec![
///     Box::new(RetryOnStatus::new([502, 503])),
///     Box::new(RetryOnTimeout),
/// ]);
/// ```
pub struct OrPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl OrPredicate {
    /// Creates a new `OrPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for OrPredicate {
    fn should_retry(&self, error: &Error, attempt: usize) -> bool {
        self.predicates
            .iter()
            .any(|p| p.should_retry(error, attempt))
    }
}

/// Combine multiple retry predicates with AND logic.
pub struct AndPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl AndPredicate {
    /// Creates a new `AndPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for AndPredicate {
    fn should_retry(&self, error: &Error, attempt: usize) -> bool {
        self.predicates
            .iter()
            .all(|p| p.should_retry(error, attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, StatusCode};

    fn http_error(code: u16) -> Error {
        Error::HttpError {
            status: StatusCode::from_u16(code).unwrap(),
            raw_response: String::new(),
            headers: HeaderMap::new(),
        }
    }

    #[test]
    fn test_exponential_backoff_doubles() {
        let strategy = RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: Jitter::None,
        };

        assert_eq!(strategy.delay_for_retry(1), Some(Duration::from_millis(100)));
        assert_eq!(strategy.delay_for_retry(2), Some(Duration::from_millis(200)));
        assert_eq!(strategy.delay_for_retry(3), Some(Duration::from_millis(400)));
        assert_eq!(strategy.delay_for_retry(4), Some(Duration::from_millis(800)));
        assert_eq!(strategy.delay_for_retry(8), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_unjittered_backoff_is_non_decreasing() {
        let strategy = RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(20),
            multiplier: 1.5,
            jitter: Jitter::None,
        };

        let delays: Vec<Duration> = (1..=64)
            .map(|n| strategy.delay_for_retry(n).unwrap())
            .collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*delays.last().unwrap(), Duration::from_secs(20));
    }

    #[test]
    fn test_huge_retry_numbers_saturate_at_max_delay() {
        let strategy = RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 10.0,
            jitter: Jitter::None,
        };

        assert_eq!(strategy.delay_for_retry(usize::MAX), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_jitter_bounds() {
        let base = Duration::from_millis(1000);
        for _ in 0..200 {
            let down = Jitter::Down.apply(base);
            assert!(down >= Duration::from_millis(500) && down <= base);

            let spread = Jitter::Spread.apply(base);
            assert!(spread >= Duration::from_millis(500) && spread <= Duration::from_millis(1500));
        }
        assert_eq!(Jitter::None.apply(base), base);
    }

    #[test]
    fn test_jitter_saturates_near_max_duration() {
        for _ in 0..50 {
            assert!(Jitter::Spread.apply(Duration::MAX) >= Duration::MAX / 2);
            assert!(Jitter::Down.apply(Duration::MAX) >= Duration::MAX / 2);
        }

        let strategy = RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::MAX,
            multiplier: 2.0,
            jitter: Jitter::Spread,
        };
        assert!(strategy.delay_for_retry(usize::MAX).is_some());
    }

    #[test]
    fn test_linear_and_none() {
        let linear = RetryStrategy::Linear {
            delay: Duration::from_secs(1),
        };
        assert_eq!(linear.delay_for_retry(1), Some(Duration::from_secs(1)));
        assert_eq!(linear.delay_for_retry(5), Some(Duration::from_secs(1)));
        assert_eq!(RetryStrategy::None.delay_for_retry(1), None);
    }

    #[test]
    fn test_custom_strategy_can_stop() {
        let strategy = RetryStrategy::Custom {
            delay_fn: |retry| (retry < 3).then(|| Duration::from_millis(retry as u64 * 10)),
        };
        assert_eq!(strategy.delay_for_retry(2), Some(Duration::from_millis(20)));
        assert_eq!(strategy.delay_for_retry(3), None);
    }

    #[test]
    fn test_default_policy_predicate() {
        let policy = RetryPolicy::default();
        let predicate = policy.predicate();

        assert!(predicate.should_retry(&http_error(500), 1));
        assert!(predicate.should_retry(&http_error(503), 1));
        assert!(predicate.should_retry(&http_error(504), 1));
        assert!(!predicate.should_retry(&http_error(502), 1));
        assert!(!predicate.should_retry(&http_error(404), 1));
        assert!(predicate.should_retry(&Error::Timeout, 1));
        assert!(predicate.should_retry(&Error::network("connection reset"), 1));
        assert!(predicate.should_retry(
            &Error::OverQueryLimit {
                status: "OVER_QUERY_LIMIT".into(),
                message: None
            },
            1
        ));
        assert!(!predicate.should_retry(
            &Error::Api {
                status: "ZERO_RESULTS".into(),
                message: None
            },
            1
        ));
    }

    #[test]
    fn test_over_query_limit_can_be_disabled() {
        let predicate = RetryPolicy::default()
            .retry_over_query_limit(false)
            .predicate();
        let err = Error::OverQueryLimit {
            status: "OVER_QUERY_LIMIT".into(),
            message: None,
        };
        assert!(!predicate.should_retry(&err, 1));
    }

    #[test]
    fn test_and_predicate() {
        struct FirstTwo;
        impl RetryPredicate for FirstTwo {
            fn should_retry(&self, _error: &Error, attempt: usize) -> bool {
                attempt <= 2
            }
        }

        let predicate = AndPredicate::new(vec![
            Box::new(RetryOnStatus::new([503])),
            Box::new(FirstTwo),
        ]);
        assert!(predicate.should_retry(&http_error(503), 2));
        assert!(!predicate.should_retry(&http_error(503), 3));
        assert!(!predicate.should_retry(&http_error(500), 1));
    }

    #[test]
    fn test_max_attempts_clamped() {
        assert_eq!(RetryPolicy::default().max_attempts(0).get_max_attempts(), 1);
        assert_eq!(RetryPolicy::no_retry().get_max_attempts(), 1);
    }
}
