//! Cooperative cancellation signals.
//!
//! An [`AbortSignal`] fires at most once and remembers the reason it fired
//! with. Signals built by [`combine_signals`] are registered as dependents of
//! their inputs and fire synchronously from inside the input's `abort`, so
//! the combined reason is always the first input to fire.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

use tokio_util::sync::CancellationToken;

use crate::resilience::timeouts::Budget;

/// Why a signal fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// An internal deadline timer fired.
    Deadline { budget_ms: u64, label: Option<String> },
    /// Someone asked the operation to stop.
    Cancelled(String),
}

impl AbortReason {
    pub fn deadline(budget: Budget, label: Option<&str>) -> Self {
        Self::Deadline {
            budget_ms: budget.as_millis(),
            label: label.map(str::to_owned),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled(message.into())
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Deadline { budget_ms, label } => write!(
                f,
                "{} exceeded its {}ms deadline",
                label.as_deref().unwrap_or("operation"),
                budget_ms
            ),
            AbortReason::Cancelled(message) => write!(f, "{}", message),
        }
    }
}

struct SignalInner {
    token: CancellationToken,
    reason: OnceLock<AbortReason>,
    dependents: Mutex<Vec<Weak<SignalInner>>>,
}

impl SignalInner {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            reason: OnceLock::new(),
            dependents: Mutex::new(Vec::new()),
        }
    }

    fn dependents(&self) -> MutexGuard<'_, Vec<Weak<SignalInner>>> {
        self.dependents.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns false if the signal had already fired.
    fn fire(&self, reason: AbortReason) -> bool {
        if self.reason.set(reason.clone()).is_err() {
            return false;
        }
        self.token.cancel();

        let dependents = std::mem::take(&mut *self.dependents());
        for dependent in dependents.iter().filter_map(Weak::upgrade) {
            dependent.fire(reason.clone());
        }
        true
    }
}

/// Read side of a cancellation signal. Cheap to clone.
#[derive(Clone)]
pub struct AbortSignal {
    inner: Arc<SignalInner>,
}

impl AbortSignal {
    /// A signal nobody holds the controller for; it never fires.
    pub fn never() -> Self {
        Self {
            inner: Arc::new(SignalInner::new()),
        }
    }

    /// A signal that has already fired with `reason`.
    pub fn aborted_with(reason: AbortReason) -> Self {
        let signal = Self::never();
        signal.inner.fire(reason);
        signal
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.reason.get().is_some()
    }

    pub fn reason(&self) -> Option<AbortReason> {
        self.inner.reason.get().cloned()
    }

    /// Resolves once the signal fires, with the reason it fired with.
    pub async fn aborted(&self) -> AbortReason {
        self.inner.token.cancelled().await;
        // The reason is stored before the token is cancelled.
        self.reason()
            .unwrap_or_else(|| AbortReason::cancelled("aborted"))
    }
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortSignal")
            .field("reason", &self.inner.reason.get())
            .finish()
    }
}

/// Write side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        Self {
            signal: AbortSignal::never(),
        }
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Fire the signal. Only the first call has any effect.
    pub fn abort(&self, reason: AbortReason) -> bool {
        self.signal.inner.fire(reason)
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a signal that fires as soon as any of `signals` fires.
///
/// If an input has already fired, the result is returned already fired with
/// that input's reason. With no inputs the result never fires.
pub fn combine_signals<'a, I>(signals: I) -> AbortSignal
where
    I: IntoIterator<Item = &'a AbortSignal>,
{
    let combined = Arc::new(SignalInner::new());

    for signal in signals {
        let mut dependents = signal.inner.dependents();
        if let Some(reason) = signal.inner.reason.get() {
            let reason = reason.clone();
            drop(dependents);
            combined.fire(reason);
            break;
        }
        dependents.retain(|d| d.strong_count() > 0);
        dependents.push(Arc::downgrade(&combined));
    }

    AbortSignal { inner: combined }
}
