//! Failure classification.
//!
//! Both helpers walk the whole `source()` chain so a timeout wrapped inside
//! an upstream or index error is still recognized. They only use
//! `downcast_ref` and `source()`, so any error value is safe to pass.

use std::error::Error as StdError;
use std::io;

use crate::resilience::fetch::Cancelled;
use crate::resilience::timeouts::DeadlineExceeded;

fn chain<'a>(err: &'a (dyn StdError + 'static)) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |&e| e.source())
}

fn is_timeout_link(err: &(dyn StdError + 'static)) -> bool {
    if err.is::<DeadlineExceeded>() || err.is::<tokio::time::error::Elapsed>() {
        return true;
    }
    if let Some(e) = err.downcast_ref::<reqwest::Error>() {
        return e.is_timeout();
    }
    // Raw OS codes (ETIMEDOUT, WSAETIMEDOUT) map to this kind.
    if let Some(e) = err.downcast_ref::<io::Error>() {
        return e.kind() == io::ErrorKind::TimedOut;
    }
    false
}

/// Whether `err`, or anything it wraps, is a deadline/timeout condition.
pub fn is_timeout_error(err: &(dyn StdError + 'static)) -> bool {
    chain(err).any(is_timeout_link)
}

/// Whether `err`, or anything it wraps, is a caller-initiated cancellation.
pub fn is_cancellation_error(err: &(dyn StdError + 'static)) -> bool {
    chain(err).any(|e| e.is::<Cancelled>())
}
