//! Query parameter validation for the monthly index.
//!
//! Runs before anything touches the sheet source or arms a deadline.

use std::collections::HashMap;

use thiserror::Error;

use crate::monthly::types::SortOrder;
use crate::monthly::year_month::YearMonth;

pub const DEFAULT_LIMIT: usize = 12;
pub const MAX_LIMIT: usize = 100;

/// A caller-supplied parameter is structurally invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {param} parameter {value:?}: {expected}")]
pub struct ParamError {
    pub param: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ParamError {
    pub fn new(param: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            param,
            value: value.to_string(),
            expected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyIndexParams {
    pub order: SortOrder,
    pub limit: usize,
    pub from: Option<YearMonth>,
    pub to: Option<YearMonth>,
}

impl Default for MonthlyIndexParams {
    fn default() -> Self {
        Self {
            order: SortOrder::default(),
            limit: DEFAULT_LIMIT,
            from: None,
            to: None,
        }
    }
}

impl MonthlyIndexParams {
    /// Inclusive bounds check.
    pub fn contains(&self, month: YearMonth) -> bool {
        self.from.map_or(true, |from| month >= from) && self.to.map_or(true, |to| month <= to)
    }
}

/// Empty values count as absent.
fn non_empty<'a>(query: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    query.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn parse_bound(
    query: &HashMap<String, String>,
    param: &'static str,
) -> Result<Option<YearMonth>, ParamError> {
    non_empty(query, param)
        .map(|raw| {
            raw.parse()
                .map_err(|_| ParamError::new(param, raw, "must be a month in YYYY-MM format"))
        })
        .transpose()
}

pub fn parse_monthly_index_params(
    query: &HashMap<String, String>,
) -> Result<MonthlyIndexParams, ParamError> {
    let order = match non_empty(query, "order") {
        Some(raw) => SortOrder::parse(raw)
            .ok_or_else(|| ParamError::new("order", raw, "must be 'asc' or 'desc'"))?,
        None => SortOrder::default(),
    };

    let limit = match non_empty(query, "limit") {
        Some(raw) => Some(raw)
            .filter(|r| r.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|r| r.parse::<usize>().ok())
            .filter(|v| (1..=MAX_LIMIT).contains(v))
            .ok_or_else(|| ParamError::new("limit", raw, "must be an integer between 1 and 100"))?,
        None => DEFAULT_LIMIT,
    };

    Ok(MonthlyIndexParams {
        order,
        limit,
        from: parse_bound(query, "from")?,
        to: parse_bound(query, "to")?,
    })
}
