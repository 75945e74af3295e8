//! Deadline enforcement for arbitrary async work.
//!
//! # Responsibilities
//! - Race a unit of work against a wall-clock budget
//! - Report a lost race as [`DeadlineExceeded`], distinct from the work's own errors
//! - Release the timer on every exit path
//!
//! # Limitation
//! The race drops the losing future. Anything that future already handed
//! off (a spawned task, a request the remote side is still processing)
//! is not aborted and may keep running after the deadline fires. Use
//! [`DeadlineController::run_with_signal`] when the work can observe a
//! cancellation signal.

use std::error::Error as StdError;
use std::future::{Future, IntoFuture};
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::observability::metrics;

/// Classification tag carried by every [`DeadlineExceeded`].
pub const TIMEOUT_KIND: &str = "TIMEOUT";

/// A positive timeout budget in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Budget(NonZeroU64);

/// Rejected budget value (zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline budget must be a positive number of milliseconds, got {0}")]
pub struct InvalidBudget(pub u64);

impl Budget {
    pub fn from_millis(ms: u64) -> Result<Self, InvalidBudget> {
        NonZeroU64::new(ms).map(Self).ok_or(InvalidBudget(ms))
    }

    pub fn as_millis(self) -> u64 {
        self.0.get()
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0.get())
    }
}

impl TryFrom<u64> for Budget {
    type Error = InvalidBudget;

    fn try_from(ms: u64) -> Result<Self, Self::Error> {
        Self::from_millis(ms)
    }
}

/// The bounded operation did not finish within its budget.
#[derive(Debug, Error)]
#[error("{} timed out after {budget_ms}ms", .label.as_deref().unwrap_or("operation"))]
pub struct DeadlineExceeded {
    budget_ms: u64,
    label: Option<String>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl DeadlineExceeded {
    pub fn new(budget: Budget, label: Option<&str>) -> Self {
        Self {
            budget_ms: budget.as_millis(),
            label: label.map(str::to_owned),
            source: None,
        }
    }

    /// Attach the underlying cause for diagnostics.
    pub fn with_source(mut self, source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> &'static str {
        TIMEOUT_KIND
    }

    pub fn budget_ms(&self) -> u64 {
        self.budget_ms
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Runs work under deadlines and tracks how many timers are currently armed.
///
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct DeadlineController {
    armed: Arc<AtomicUsize>,
}

/// Keeps the armed-timer count accurate for as long as a timer lives.
pub(crate) struct ArmedTimer {
    armed: Arc<AtomicUsize>,
}

impl Drop for ArmedTimer {
    fn drop(&mut self) {
        self.armed.fetch_sub(1, Ordering::AcqRel);
        metrics::timer_released();
    }
}

impl DeadlineController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of deadline timers currently alive across all clones.
    pub fn armed_timers(&self) -> usize {
        self.armed.load(Ordering::Acquire)
    }

    pub(crate) fn arm(&self) -> ArmedTimer {
        self.armed.fetch_add(1, Ordering::AcqRel);
        metrics::timer_armed();
        ArmedTimer {
            armed: self.armed.clone(),
        }
    }

    /// Race `work` against `budget`.
    ///
    /// Returns the work's result if it settles first, including its error
    /// unchanged. If the budget elapses first the work is dropped and
    /// `E::from(DeadlineExceeded)` is returned.
    pub async fn race<W, T, E>(&self, work: W, budget: Budget, label: Option<&str>) -> Result<T, E>
    where
        W: IntoFuture<Output = Result<T, E>>,
        E: From<DeadlineExceeded>,
    {
        let work = work.into_future();
        let _armed = self.arm();
        let timer = tokio::time::sleep(budget.as_duration());

        tokio::select! {
            biased;
            result = work => result,
            _ = timer => {
                tracing::warn!(
                    budget_ms = budget.as_millis(),
                    label = label.unwrap_or("operation"),
                    "Deadline exceeded"
                );
                metrics::record_deadline_exceeded(label.unwrap_or("operation"));
                Err(E::from(DeadlineExceeded::new(budget, label)))
            }
        }
    }

    /// Like [`race`](Self::race), but takes a producer that is called exactly once.
    pub async fn race_fn<F, Fut, T, E>(
        &self,
        producer: F,
        budget: Budget,
        label: Option<&str>,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DeadlineExceeded>,
    {
        self.race(producer(), budget, label).await
    }
}

/// Race `work` against `budget` on a throwaway controller.
pub async fn race_with_deadline<W, T, E>(work: W, budget: Budget, label: Option<&str>) -> Result<T, E>
where
    W: IntoFuture<Output = Result<T, E>>,
    E: From<DeadlineExceeded>,
{
    DeadlineController::new().race(work, budget, label).await
}

/// Race the future returned by `producer` against `budget`.
pub async fn race_with_deadline_fn<F, Fut, T, E>(
    producer: F,
    budget: Budget,
    label: Option<&str>,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<DeadlineExceeded>,
{
    DeadlineController::new().race_fn(producer, budget, label).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    enum WorkError {
        #[error("work failed: {0}")]
        Failed(&'static str),
        #[error(transparent)]
        Deadline(#[from] DeadlineExceeded),
    }

    fn budget(ms: u64) -> Budget {
        Budget::from_millis(ms).unwrap()
    }

    #[test]
    fn test_zero_budget_rejected() {
        assert_eq!(Budget::from_millis(0), Err(InvalidBudget(0)));
        assert_eq!(Budget::try_from(250).unwrap().as_millis(), 250);
    }

    #[test]
    fn test_deadline_display() {
        let err = DeadlineExceeded::new(budget(500), Some("monthly index"));
        assert_eq!(err.to_string(), "monthly index timed out after 500ms");
        assert_eq!(err.kind(), TIMEOUT_KIND);

        let err = DeadlineExceeded::new(budget(20), None);
        assert_eq!(err.to_string(), "operation timed out after 20ms");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_deadline_keeps_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "socket stalled");
        let err = DeadlineExceeded::new(budget(10), Some("fetch")).with_source(cause);
        assert_eq!(err.source().map(|s| s.to_string()), Some("socket stalled".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_work_wins_race() {
        let controller = DeadlineController::new();
        let result: Result<u32, WorkError> = controller
            .race(
                async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(7)
                },
                budget(100),
                Some("fast"),
            )
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(controller.armed_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_work_times_out() {
        let controller = DeadlineController::new();
        let result: Result<u32, WorkError> = controller
            .race(
                async {
                    tokio::time::sleep(Duration::from_millis(101)).await;
                    Ok(7)
                },
                budget(100),
                Some("slow"),
            )
            .await;

        match result {
            Err(WorkError::Deadline(e)) => {
                assert_eq!(e.kind(), TIMEOUT_KIND);
                assert_eq!(e.budget_ms(), 100);
                assert_eq!(e.label(), Some("slow"));
            }
            other => panic!("expected deadline failure, got {other:?}"),
        }
        assert_eq!(controller.armed_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_work_error_propagates_unchanged() {
        let controller = DeadlineController::new();
        let result: Result<u32, WorkError> = controller
            .race(
                async {
                    tokio::time::sleep(Duration::from_millis(99)).await;
                    Err(WorkError::Failed("upstream exploded"))
                },
                budget(100),
                None,
            )
            .await;

        assert!(matches!(result, Err(WorkError::Failed("upstream exploded"))));
        assert_eq!(controller.armed_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_runs_inside_race() {
        let result: Result<&str, WorkError> =
            race_with_deadline_fn(|| async { Ok("produced") }, budget(5), Some("producer")).await;
        assert_eq!(result.unwrap(), "produced");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_counted_while_armed() {
        let controller = DeadlineController::new();
        let observer = controller.clone();
        let result: Result<usize, WorkError> = controller
            .race(async move { Ok(observer.armed_timers()) }, budget(50), None)
            .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(controller.armed_timers(), 0);
    }
}
