//! Request-lifetime control: deadlines and cooperative cancellation.
//!
//! # Data Flow
//! ```text
//! Handler work (any future):
//!     → timeouts.rs (race the future against a budget, drop the loser)
//!
//! Upstream HTTP call:
//!     → signals.rs (combine caller signal + internal timeout signal)
//!     → fetch.rs (send, abort on whichever signal fires first)
//!
//! Failure inspection:
//!     → classify.rs (timeout? cancellation? walk the source chain)
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline; budgets are validated non-zero
//! - Timeout errors are distinct types, never matched by message text
//! - Nothing here retries; retry policy belongs to the caller
//! - Racing a future drops the losing branch. Work that was detached from
//!   the future (spawned tasks, remote side effects) keeps running after
//!   the deadline fires; only signal-aware work stops early

pub mod classify;
pub mod fetch;
pub mod signals;
pub mod timeouts;

pub use classify::{is_cancellation_error, is_timeout_error};
pub use fetch::{fetch_with_deadline, Cancelled, FetchError, FetchOptions};
pub use signals::{combine_signals, AbortController, AbortReason, AbortSignal};
pub use timeouts::{
    race_with_deadline, race_with_deadline_fn, Budget, DeadlineController, DeadlineExceeded,
    InvalidBudget, TIMEOUT_KIND,
};
