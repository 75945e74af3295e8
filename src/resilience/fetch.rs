//! Signal-aware deadlines for network retrieval.
//!
//! # Responsibilities
//! - Combine the caller's cancellation signal with an internal timeout signal
//! - Abort the in-flight request when either fires
//! - Report which one fired: timeout → [`FetchError::Deadline`],
//!   caller → [`FetchError::Cancelled`]
//!
//! Unlike [`DeadlineController::race`], the work here receives the combined
//! signal and the request future is dropped on abort, so the connection is
//! torn down instead of left running.

use std::future::Future;

use thiserror::Error;

use crate::resilience::signals::{combine_signals, AbortController, AbortReason, AbortSignal};
use crate::resilience::timeouts::{Budget, DeadlineController, DeadlineExceeded};

/// The caller's signal terminated the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operation cancelled: {reason}")]
pub struct Cancelled {
    pub reason: AbortReason,
}

/// Errors from [`fetch_with_deadline`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// The internal timeout fired first.
    #[error("{0}")]
    Deadline(#[from] DeadlineExceeded),

    /// The caller's signal fired first.
    #[error("{0}")]
    Cancelled(#[from] Cancelled),

    /// Connection or protocol failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Per-call options for [`fetch_with_deadline`].
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Caller-owned signal; firing it aborts the fetch as a cancellation.
    pub signal: Option<AbortSignal>,
    /// Name used in logs and in the deadline error.
    pub label: Option<String>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl DeadlineController {
    /// Run signal-aware work under `budget`.
    ///
    /// `work` receives a signal that fires when either `caller` fires or the
    /// budget elapses. Whichever branch loses is dropped before this returns,
    /// along with the timer.
    pub async fn run_with_signal<F, Fut, T, E>(
        &self,
        work: F,
        caller: Option<&AbortSignal>,
        budget: Budget,
        label: Option<&str>,
    ) -> Result<T, E>
    where
        F: FnOnce(AbortSignal) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DeadlineExceeded> + From<Cancelled>,
    {
        let timeout = AbortController::new();
        let timeout_signal = timeout.signal();
        let combined = combine_signals(caller.into_iter().chain(std::iter::once(&timeout_signal)));

        // Only the caller can have fired this early.
        if let Some(reason) = combined.reason() {
            return Err(E::from(Cancelled { reason }));
        }

        let _armed = self.arm();
        let timer = tokio::time::sleep(budget.as_duration());
        let work = work(combined.clone());

        tokio::select! {
            biased;
            result = work => result,
            _ = timer => {
                timeout.abort(AbortReason::deadline(budget, label));
                tracing::warn!(
                    budget_ms = budget.as_millis(),
                    label = label.unwrap_or("fetch"),
                    "Fetch deadline exceeded"
                );
                crate::observability::metrics::record_deadline_exceeded(label.unwrap_or("fetch"));
                Err(E::from(DeadlineExceeded::new(budget, label)))
            }
            reason = combined.aborted() => {
                tracing::debug!(reason = %reason, label = label.unwrap_or("fetch"), "Fetch cancelled by caller");
                Err(E::from(Cancelled { reason }))
            }
        }
    }

    /// Send `request`, aborting it when the budget elapses or the caller's signal fires.
    pub async fn fetch_with_deadline(
        &self,
        request: reqwest::RequestBuilder,
        options: FetchOptions,
        budget: Budget,
    ) -> Result<reqwest::Response, FetchError> {
        self.run_with_signal(
            |_signal| async move { request.send().await.map_err(FetchError::from) },
            options.signal.as_ref(),
            budget,
            options.label.as_deref(),
        )
        .await
    }
}

/// [`DeadlineController::fetch_with_deadline`] on a throwaway controller.
pub async fn fetch_with_deadline(
    request: reqwest::RequestBuilder,
    options: FetchOptions,
    budget: Budget,
) -> Result<reqwest::Response, FetchError> {
    DeadlineController::new()
        .fetch_with_deadline(request, options, budget)
        .await
}
