//! Metric names, label keys and recorders for the book service.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `bookapi_book_requests_total` | Counter | `operation`, `outcome` |
//! | `bookapi_book_request_duration_seconds` | Histogram | `operation` |
//! | `bookapi_db_calls_total` | Counter | `operation`, `outcome` |
//! | `bookapi_db_call_duration_seconds` | Histogram | `operation` |

use std::time::{Duration, Instant};

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    /// Counter: `/books` requests by operation and outcome.
    pub const BOOK_REQUESTS_TOTAL: &str = "bookapi_book_requests_total";
    /// Histogram: `/books` request latency in seconds.
    pub const BOOK_REQUEST_DURATION_SECONDS: &str = "bookapi_book_request_duration_seconds";
    /// Counter: database calls by operation and outcome.
    pub const DB_CALLS_TOTAL: &str = "bookapi_db_calls_total";
    /// Histogram: database call latency in seconds.
    pub const DB_CALL_DURATION_SECONDS: &str = "bookapi_db_call_duration_seconds";
}

/// Label keys used across metrics.
pub mod labels {
    /// Book operation (`get_all`, `get_by_id`, `create`, `update`, `delete`).
    pub const OPERATION: &str = "operation";
    /// `success` or a specific failure reason.
    pub const OUTCOME: &str = "outcome";
}

/// Record one `/books` request outcome.
pub fn record_book_request(operation: &'static str, outcome: &'static str) {
    counter!(
        names::BOOK_REQUESTS_TOTAL,
        labels::OPERATION => operation,
        labels::OUTCOME => outcome,
    )
    .increment(1);
}

/// Record how long a `/books` request took.
pub fn observe_book_request_duration(operation: &'static str, duration: Duration) {
    histogram!(
        names::BOOK_REQUEST_DURATION_SECONDS,
        labels::OPERATION => operation,
    )
    .record(duration.as_secs_f64());
}

/// Record one database call outcome.
pub fn record_db_call(operation: &'static str, outcome: &'static str) {
    counter!(
        names::DB_CALLS_TOTAL,
        labels::OPERATION => operation,
        labels::OUTCOME => outcome,
    )
    .increment(1);
}

/// Record how long a database call took.
pub fn observe_db_call_duration(operation: &'static str, duration: Duration) {
    histogram!(
        names::DB_CALL_DURATION_SECONDS,
        labels::OPERATION => operation,
    )
    .record(duration.as_secs_f64());
}

/// Calls `on_drop` with the elapsed time when dropped.
///
/// Dropping also happens when a request future is cancelled, so latency is
/// recorded for aborted requests too.
pub struct TimingGuard<F>
where
    F: FnOnce(Duration),
{
    start: Instant,
    on_drop: Option<F>,
}

impl<F> TimingGuard<F>
where
    F: FnOnce(Duration),
{
    /// Creates a new timing guard that will call `on_drop` with the elapsed duration.
    pub fn new(on_drop: F) -> Self {
        Self {
            start: Instant::now(),
            on_drop: Some(on_drop),
        }
    }

    /// Returns the elapsed time since the guard was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl<F> Drop for TimingGuard<F>
where
    F: FnOnce(Duration),
{
    fn drop(&mut self) {
        if let Some(on_drop) = self.on_drop.take() {
            on_drop(self.start.elapsed());
        }
    }
}
