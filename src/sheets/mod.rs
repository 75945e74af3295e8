//! Upstream spreadsheet access.
//!
//! # Responsibilities
//! - Define the capability the dashboard consumes: list monthly tabs, read rows
//! - HTTP client for the sheet-reading service (client.rs)
//! - In-memory source with injectable latency and failures (memory.rs)
//!
//! # Design Decisions
//! - Every call takes the request's [`AbortSignal`] so upstream work stops
//!   on shutdown or when the caller goes away
//! - Non-monthly tabs are dropped at the source boundary

pub mod client;
pub mod memory;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::monthly::MonthlyTabMeta;
use crate::resilience::{AbortSignal, Cancelled, FetchError};

pub use client::SheetServiceClient;
pub use memory::InMemorySource;

/// One spreadsheet row; cells are kept as raw JSON values.
pub type SheetRow = Vec<serde_json::Value>;

/// Errors from the sheet source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("sheet service request failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("sheet service returned {status} for {path}")]
    Status { status: u16, path: String },

    #[error("invalid sheet service response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("invalid sheet service configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Cancelled(#[from] Cancelled),

    #[error("sheet source unavailable: {0}")]
    Unavailable(String),
}

/// Async access to the monthly tabs of the source spreadsheet.
pub trait MonthlySource: Send + Sync {
    /// Every monthly tab, in upstream order.
    fn list_monthly_tabs<'a>(
        &'a self,
        signal: &'a AbortSignal,
    ) -> BoxFuture<'a, Result<Vec<MonthlyTabMeta>, SourceError>>;

    fn get_rows<'a>(
        &'a self,
        tab: &'a MonthlyTabMeta,
        signal: &'a AbortSignal,
    ) -> BoxFuture<'a, Result<Vec<SheetRow>, SourceError>>;
}
