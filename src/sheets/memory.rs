//! In-memory sheet source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::monthly::MonthlyTabMeta;
use crate::resilience::{AbortSignal, Cancelled};
use crate::sheets::{MonthlySource, SheetRow, SourceError};

/// Fixed tab list with optional artificial latency and failure.
///
/// Counts calls so callers can assert how often the source was consulted.
#[derive(Debug, Default)]
pub struct InMemorySource {
    tabs: Vec<MonthlyTabMeta>,
    rows: HashMap<i64, Vec<SheetRow>>,
    latency: Option<Duration>,
    failure: Option<String>,
    list_calls: AtomicUsize,
    row_calls: AtomicUsize,
}

impl InMemorySource {
    pub fn new(tabs: Vec<MonthlyTabMeta>) -> Self {
        Self {
            tabs,
            ..Default::default()
        }
    }

    pub fn with_rows(mut self, sheet_id: i64, rows: Vec<SheetRow>) -> Self {
        self.rows.insert(sheet_id, rows);
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every call with `message` (after any latency).
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn row_calls(&self) -> usize {
        self.row_calls.load(Ordering::SeqCst)
    }

    async fn settle(&self, signal: &AbortSignal) -> Result<(), SourceError> {
        if let Some(latency) = self.latency {
            tokio::select! {
                _ = tokio::time::sleep(latency) => {}
                reason = signal.aborted() => return Err(Cancelled { reason }.into()),
            }
        }
        match &self.failure {
            Some(message) => Err(SourceError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

impl MonthlySource for InMemorySource {
    fn list_monthly_tabs<'a>(
        &'a self,
        signal: &'a AbortSignal,
    ) -> BoxFuture<'a, Result<Vec<MonthlyTabMeta>, SourceError>> {
        Box::pin(async move {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.settle(signal).await?;
            Ok(self.tabs.clone())
        })
    }

    fn get_rows<'a>(
        &'a self,
        tab: &'a MonthlyTabMeta,
        signal: &'a AbortSignal,
    ) -> BoxFuture<'a, Result<Vec<SheetRow>, SourceError>> {
        Box::pin(async move {
            self.row_calls.fetch_add(1, Ordering::SeqCst);
            self.settle(signal).await?;
            Ok(self.rows.get(&tab.sheet_id).cloned().unwrap_or_default())
        })
    }
}
