//! Monthly index computation: filter, sort, truncate, project.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::monthly::params::{MonthlyIndexParams, ParamError};
use crate::monthly::types::{MonthlyIndex, MonthlyTabMeta, SortOrder};
use crate::monthly::year_month::YearMonth;
use crate::resilience::DeadlineExceeded;
use crate::sheets::SourceError;

/// Errors from building a monthly index or looking up a month.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Rejected before any upstream work.
    #[error("{0}")]
    Invalid(#[from] ParamError),

    #[error("{0}")]
    Deadline(#[from] DeadlineExceeded),

    #[error("sheet source failed: {0}")]
    Source(#[from] SourceError),

    /// Two tabs claim the same month.
    #[error("duplicate tabs for {year_month}: sheet {first_sheet_id} and sheet {second_sheet_id}")]
    DuplicateMonth {
        year_month: YearMonth,
        first_sheet_id: i64,
        second_sheet_id: i64,
    },

    #[error("No tab for month {0}")]
    MonthNotFound(YearMonth),
}

/// Build the index from the full, unordered tab list.
pub fn build_index(
    tabs: Vec<MonthlyTabMeta>,
    params: &MonthlyIndexParams,
) -> Result<MonthlyIndex, IndexError> {
    let mut kept: Vec<MonthlyTabMeta> = tabs
        .into_iter()
        .filter(|tab| params.contains(tab.year_month))
        .collect();

    kept.sort_by_key(|tab| tab.year_month);
    if let Some(pair) = kept.windows(2).find(|w| w[0].year_month == w[1].year_month) {
        return Err(IndexError::DuplicateMonth {
            year_month: pair[0].year_month,
            first_sheet_id: pair[0].sheet_id,
            second_sheet_id: pair[1].sheet_id,
        });
    }

    if params.order == SortOrder::Desc {
        kept.reverse();
    }
    kept.truncate(params.limit);

    let months: Vec<YearMonth> = kept.iter().map(|tab| tab.year_month).collect();
    let latest_month = months.iter().copied().max();
    let tabs: BTreeMap<YearMonth, MonthlyTabMeta> =
        kept.into_iter().map(|tab| (tab.year_month, tab)).collect();

    Ok(MonthlyIndex {
        months,
        tabs,
        latest_month,
    })
}
