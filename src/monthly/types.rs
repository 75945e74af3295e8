//! Monthly index data types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::monthly::year_month::YearMonth;
use crate::sheets::SheetRow;

/// Metadata for one monthly tab of the source spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTabMeta {
    /// Upstream numeric tab identifier.
    pub sheet_id: i64,
    /// Title as authored in the spreadsheet.
    pub title: String,
    pub year_month: YearMonth,
    pub year: i32,
    /// 1-12.
    pub month: u32,
    /// Position of the tab upstream. Never used for ordering.
    pub index: u32,
}

impl MonthlyTabMeta {
    pub fn new(sheet_id: i64, title: impl Into<String>, year_month: YearMonth, index: u32) -> Self {
        Self {
            sheet_id,
            title: title.into(),
            year_month,
            year: year_month.year(),
            month: year_month.month(),
            index,
        }
    }
}

/// Sort direction for the monthly index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Response of the monthly index endpoint.
///
/// `months` and the keys of `tabs` always hold the same set of months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyIndex {
    /// Months in the requested order.
    pub months: Vec<YearMonth>,
    pub tabs: BTreeMap<YearMonth, MonthlyTabMeta>,
    /// Calendar-latest month in `months`, regardless of order.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub latest_month: Option<YearMonth>,
}

/// Rows of a single monthly tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRows {
    pub year_month: YearMonth,
    pub sheet_id: i64,
    pub title: String,
    pub rows: Vec<SheetRow>,
}
