//! HTTP client for the sheet-reading service.
//!
//! # Wire format
//! ```text
//! GET {base}/tabs                  → {"tabs": [{"sheetId": 1, "title": "2025年10月", "index": 0}]}
//! GET {base}/tabs/{sheetId}/rows   → {"rows": [["Task", "Owner", 3], ...]}
//! ```
//!
//! Each call is an independent [`fetch_with_deadline`](crate::resilience::fetch_with_deadline)
//! bounded by `sheets.request_timeout_ms` and wired to the request's signal.

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::SheetsConfig;
use crate::monthly::{MonthlyTabMeta, YearMonth};
use crate::resilience::{AbortSignal, Budget, DeadlineController, FetchOptions, InvalidBudget};
use crate::sheets::{MonthlySource, SheetRow, SourceError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTab {
    sheet_id: i64,
    title: String,
    #[serde(default)]
    index: u32,
}

#[derive(Debug, Deserialize)]
struct TabListing {
    tabs: Vec<RawTab>,
}

#[derive(Debug, Deserialize)]
struct RowsPayload {
    #[serde(default)]
    rows: Vec<SheetRow>,
}

/// Keep monthly tabs, drop everything else.
fn monthly_tabs(raw: Vec<RawTab>) -> Vec<MonthlyTabMeta> {
    raw.into_iter()
        .filter_map(|tab| match YearMonth::from_tab_title(&tab.title) {
            Some(year_month) => Some(MonthlyTabMeta::new(tab.sheet_id, tab.title, year_month, tab.index)),
            None => {
                tracing::debug!(sheet_id = tab.sheet_id, title = %tab.title, "Skipping non-monthly tab");
                None
            }
        })
        .collect()
}

/// [`MonthlySource`] backed by the sheet-reading service.
#[derive(Debug, Clone)]
pub struct SheetServiceClient {
    http: reqwest::Client,
    base_url: Url,
    request_budget: Budget,
    deadlines: DeadlineController,
}

impl SheetServiceClient {
    pub fn new(base_url: Url, request_budget: Budget) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            request_budget,
            deadlines: DeadlineController::new(),
        }
    }

    pub fn from_config(config: &SheetsConfig) -> Result<Self, SourceError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SourceError::Config(format!("{}: {}", config.base_url, e)))?;
        let budget = Budget::from_millis(config.request_timeout_ms)
            .map_err(|InvalidBudget(ms)| SourceError::Config(format!("request timeout {}ms", ms)))?;
        Ok(Self::new(base_url, budget))
    }

    pub fn deadlines(&self) -> &DeadlineController {
        &self.deadlines
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Config(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        signal: &AbortSignal,
    ) -> Result<T, SourceError> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();

        let options = FetchOptions::new()
            .signal(signal.clone())
            .label(format!("GET {}", path));
        let response = self
            .deadlines
            .fetch_with_deadline(self.http.get(url), options, self.request_budget)
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, path = %path, "Sheet service returned error status");
            return Err(SourceError::Status {
                status: status.as_u16(),
                path,
            });
        }

        response.json::<T>().await.map_err(SourceError::Decode)
    }
}

impl MonthlySource for SheetServiceClient {
    fn list_monthly_tabs<'a>(
        &'a self,
        signal: &'a AbortSignal,
    ) -> BoxFuture<'a, Result<Vec<MonthlyTabMeta>, SourceError>> {
        Box::pin(async move {
            let listing: TabListing = self.get_json(&["tabs"], signal).await?;
            let total = listing.tabs.len();
            let tabs = monthly_tabs(listing.tabs);
            tracing::debug!(total, monthly = tabs.len(), "Fetched tab list");
            Ok(tabs)
        })
    }

    fn get_rows<'a>(
        &'a self,
        tab: &'a MonthlyTabMeta,
        signal: &'a AbortSignal,
    ) -> BoxFuture<'a, Result<Vec<SheetRow>, SourceError>> {
        Box::pin(async move {
            let sheet_id = tab.sheet_id.to_string();
            let payload: RowsPayload = self.get_json(&["tabs", sheet_id.as_str(), "rows"], signal).await?;
            Ok(payload.rows)
        })
    }
}
