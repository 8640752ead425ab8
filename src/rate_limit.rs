//! Client-side query throttling and server rate-limit hints.
//!
//! [`QueryThrottle`] keeps the client under a queries-per-second budget by
//! delaying attempts that would exceed it. [`retry_after`] reads the
//! `Retry-After` header that accompanies some 429/503 responses so the retry
//! loop can wait at least as long as the server asked.

use http::HeaderMap;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};
use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(1);

/// Limits how many attempts may start within any one-second window.
///
/// Shared by all clones of a [`Client`](crate::Client). Waiting happens
/// outside the lock, so a throttled call never blocks unrelated calls from
/// reserving their own slots. A caller cancelled while waiting gives its slot
/// back.
#[derive(Debug)]
pub struct QueryThrottle {
    queries_per_second: usize,
    sent: Mutex<VecDeque<Instant>>,
}

impl QueryThrottle {
    /// Creates a throttle allowing `queries_per_second` starts per second.
    /// Zero is treated as one.
    pub fn new(queries_per_second: usize) -> Self {
        let queries_per_second = queries_per_second.max(1);
        Self {
            queries_per_second,
            sent: Mutex::new(VecDeque::with_capacity(queries_per_second)),
        }
    }

    /// The configured budget.
    pub fn queries_per_second(&self) -> usize {
        self.queries_per_second
    }

    /// Waits until another query may start, then records its start time.
    ///
    /// Returns how long the caller was delayed. Dropping the future before
    /// the wait ends releases the reserved slot.
    pub async fn acquire(&self) -> Duration {
        let now = Instant::now();
        let mut reservation = {
            let mut sent = self.lock_sent();
            let (start_at, replaced) = if sent.len() == self.queries_per_second {
                let earliest = sent.pop_front().unwrap_or(now);
                ((earliest + WINDOW).max(now), Some(earliest))
            } else {
                (now, None)
            };
            sent.push_back(start_at);
            Reservation {
                throttle: self,
                start_at,
                replaced,
                completed: false,
            }
        };

        let wait = reservation.start_at.saturating_duration_since(now);
        if !wait.is_zero() {
            tracing::debug!(
                wait_ms = wait.as_millis(),
                queries_per_second = self.queries_per_second,
                "Throttling query to stay under rate limit"
            );
            tokio::time::sleep_until(reservation.start_at).await;
        }
        reservation.completed = true;
        wait
    }

    fn lock_sent(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        match self.sent.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// A slot taken in [`QueryThrottle::acquire`], undone unless the wait
/// completed.
struct Reservation<'a> {
    throttle: &'a QueryThrottle,
    start_at: Instant,
    replaced: Option<Instant>,
    completed: bool,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let mut sent = self.throttle.lock_sent();
        if let Some(index) = sent.iter().rposition(|t| *t == self.start_at) {
            sent.remove(index);
            // The evicted start still counts against the current window.
            if let Some(replaced) = self.replaced {
                sent.push_front(replaced);
            }
        }
        tracing::debug!("Released throttle slot of cancelled query");
    }
}

/// Parses the `Retry-After` header.
///
/// Supports both delay-seconds and HTTP-date forms. Dates in the past yield
/// `None`.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get(http::header::RETRY_AFTER)?.to_str().ok()?;

    if let Ok(seconds) = header.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date_time = httpdate::parse_http_date(header).ok()?;
    date_time.duration_since(SystemTime::now()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("60"));

        assert_eq!(retry_after(&headers), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_retry_after_http_date() {
        let mut headers = HeaderMap::new();
        let future = SystemTime::now() + Duration::from_secs(120);
        headers.insert(
            "retry-after",
            HeaderValue::from_str(&httpdate::fmt_http_date(future)).unwrap(),
        );

        let delay = retry_after(&headers).expect("future date should parse");
        assert!(delay > Duration::from_secs(100) && delay <= Duration::from_secs(120));
    }

    #[test]
    fn test_retry_after_missing_or_past() {
        assert_eq!(retry_after(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(
            "retry-after",
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_delays_queries_over_budget() {
        let throttle = QueryThrottle::new(2);
        let start = Instant::now();

        assert_eq!(throttle.acquire().await, Duration::ZERO);
        assert_eq!(throttle.acquire().await, Duration::ZERO);

        let waited = throttle.acquire().await;
        assert_eq!(waited, WINDOW);
        assert!(start.elapsed() >= WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_releases_its_slot() {
        let throttle = QueryThrottle::new(1);
        throttle.acquire().await;

        // Would start at 1s, but is cancelled at 500ms.
        let cancelled =
            tokio::time::timeout(Duration::from_millis(500), throttle.acquire()).await;
        assert!(cancelled.is_err());

        // Without the release this caller would be pushed back to 2s.
        assert_eq!(throttle.acquire().await, Duration::from_millis(500));
        assert_eq!(throttle.lock_sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_does_not_wait_after_window_passes() {
        let throttle = QueryThrottle::new(1);

        throttle.acquire().await;
        tokio::time::advance(Duration::from_millis(1500)).await;

        assert_eq!(throttle.acquire().await, Duration::ZERO);
    }
}
