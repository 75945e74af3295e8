//! Deadline-bounded monthly queries against a sheet source.

use std::collections::HashMap;
use std::sync::Arc;

use crate::monthly::index::{build_index, IndexError};
use crate::monthly::params::{parse_monthly_index_params, MonthlyIndexParams, ParamError};
use crate::monthly::types::{MonthlyIndex, SheetRows};
use crate::monthly::year_month::YearMonth;
use crate::resilience::{AbortSignal, Budget, DeadlineController};
use crate::sheets::MonthlySource;

const INDEX_LABEL: &str = "monthly index";
const ROWS_LABEL: &str = "month rows";

/// Validates, then runs the fetch-through-project pipeline under a deadline.
#[derive(Clone)]
pub struct MonthlyService {
    source: Arc<dyn MonthlySource>,
    deadlines: DeadlineController,
    index_budget: Budget,
    rows_budget: Budget,
}

impl MonthlyService {
    pub fn new(source: Arc<dyn MonthlySource>, index_budget: Budget, rows_budget: Budget) -> Self {
        Self {
            source,
            deadlines: DeadlineController::new(),
            index_budget,
            rows_budget,
        }
    }

    /// Same source and timer accounting, new budgets.
    pub fn with_budgets(&self, index_budget: Budget, rows_budget: Budget) -> Self {
        Self {
            source: self.source.clone(),
            deadlines: self.deadlines.clone(),
            index_budget,
            rows_budget,
        }
    }

    pub fn deadlines(&self) -> &DeadlineController {
        &self.deadlines
    }

    pub fn index_budget(&self) -> Budget {
        self.index_budget
    }

    /// Parse query parameters and build the index.
    ///
    /// Invalid parameters fail before the source is consulted or a timer is armed.
    pub async fn index(
        &self,
        query: &HashMap<String, String>,
        signal: &AbortSignal,
    ) -> Result<MonthlyIndex, IndexError> {
        let params = parse_monthly_index_params(query)?;
        self.index_with(params, signal).await
    }

    pub async fn index_with(
        &self,
        params: MonthlyIndexParams,
        signal: &AbortSignal,
    ) -> Result<MonthlyIndex, IndexError> {
        tracing::debug!(
            order = params.order.as_str(),
            limit = params.limit,
            from = ?params.from,
            to = ?params.to,
            "Building monthly index"
        );

        let work = async {
            let tabs = self.source.list_monthly_tabs(signal).await?;
            build_index(tabs, &params)
        };
        let index = self.deadlines.race(work, self.index_budget, Some(INDEX_LABEL)).await?;

        tracing::debug!(
            months = index.months.len(),
            latest = ?index.latest_month,
            "Monthly index built"
        );
        Ok(index)
    }

    /// Rows of the tab for `raw_month` (canonical `YYYY-MM`).
    pub async fn rows(&self, raw_month: &str, signal: &AbortSignal) -> Result<SheetRows, IndexError> {
        let year_month: YearMonth = raw_month
            .parse()
            .map_err(|_| ParamError::new("month", raw_month, "must be a month in YYYY-MM format"))?;

        let work = async {
            let tabs = self.source.list_monthly_tabs(signal).await?;
            let mut matching = tabs.into_iter().filter(|tab| tab.year_month == year_month);
            let tab = matching.next().ok_or(IndexError::MonthNotFound(year_month))?;
            if let Some(second) = matching.next() {
                return Err(IndexError::DuplicateMonth {
                    year_month,
                    first_sheet_id: tab.sheet_id,
                    second_sheet_id: second.sheet_id,
                });
            }
            let rows = self.source.get_rows(&tab, signal).await?;
            Ok::<_, IndexError>(SheetRows {
                year_month,
                sheet_id: tab.sheet_id,
                title: tab.title,
                rows,
            })
        };
        self.deadlines.race(work, self.rows_budget, Some(ROWS_LABEL)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monthly::types::MonthlyTabMeta;
    use crate::sheets::memory::InMemorySource;
    use std::time::Duration;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn source() -> InMemorySource {
        InMemorySource::new(vec![
            MonthlyTabMeta::new(1, "2025年8月", ym("2025-08"), 0),
            MonthlyTabMeta::new(2, "2025年9月", ym("2025-09"), 1),
            MonthlyTabMeta::new(3, "2025年10月", ym("2025-10"), 2),
        ])
        .with_rows(2, vec![vec!["task".into(), 3.into()]])
    }

    fn service(source: Arc<InMemorySource>, budget_ms: u64) -> MonthlyService {
        let budget = Budget::from_millis(budget_ms).unwrap();
        MonthlyService::new(source, budget, budget)
    }

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_index_fetches_once() {
        let source = Arc::new(source());
        let svc = service(source.clone(), 1_000);

        let index = svc
            .index(&query(&[("order", "desc"), ("limit", "2")]), &AbortSignal::never())
            .await
            .unwrap();
        assert_eq!(index.months, vec![ym("2025-10"), ym("2025-09")]);
        assert_eq!(source.list_calls(), 1);
        assert_eq!(svc.deadlines().armed_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_params_skip_source() {
        let source = Arc::new(source());
        let svc = service(source.clone(), 1_000);

        let err = svc
            .index(&query(&[("order", "down")]), &AbortSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Invalid(_)));
        assert_eq!(source.list_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_hits_deadline() {
        let source = Arc::new(source().with_latency(Duration::from_millis(250)));
        let svc = service(source.clone(), 100);

        let err = svc.index(&HashMap::new(), &AbortSignal::never()).await.unwrap_err();
        match err {
            IndexError::Deadline(e) => {
                assert_eq!(e.budget_ms(), 100);
                assert_eq!(e.label(), Some(INDEX_LABEL));
            }
            other => panic!("expected deadline, got {other:?}"),
        }
        assert_eq!(svc.deadlines().armed_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rows_lookup() {
        let svc = service(Arc::new(source()), 1_000);
        let rows = svc.rows("2025-09", &AbortSignal::never()).await.unwrap();
        assert_eq!(rows.sheet_id, 2);
        assert_eq!(rows.rows.len(), 1);

        let err = svc.rows("2025-11", &AbortSignal::never()).await.unwrap_err();
        assert!(matches!(err, IndexError::MonthNotFound(m) if m == ym("2025-11")));

        let err = svc.rows("2025-9", &AbortSignal::never()).await.unwrap_err();
        assert!(matches!(err, IndexError::Invalid(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rows_rejects_duplicate_month() {
        let source = InMemorySource::new(vec![
            MonthlyTabMeta::new(4, "2025-03", ym("2025-03"), 0),
            MonthlyTabMeta::new(9, "2025年3月", ym("2025-03"), 1),
        ]);
        let source = Arc::new(source);
        let svc = service(source.clone(), 1_000);

        let err = svc.rows("2025-03", &AbortSignal::never()).await.unwrap_err();
        assert!(matches!(
            err,
            IndexError::DuplicateMonth { first_sheet_id: 4, second_sheet_id: 9, .. }
        ));
        assert_eq!(source.row_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_swap_keeps_timer_accounting() {
        let svc = service(Arc::new(source()), 1_000);
        let swapped = svc.with_budgets(Budget::from_millis(5).unwrap(), Budget::from_millis(5).unwrap());
        assert_eq!(swapped.index_budget().as_millis(), 5);
        assert_eq!(swapped.deadlines().armed_timers(), svc.deadlines().armed_timers());
    }
}
