//! Canonical `YYYY-MM` month identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A calendar month in canonical `YYYY-MM` form.
///
/// Ordering is chronological, which is also the lexicographic order of the
/// canonical string (fixed width, zero padded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    year: u16,
    month: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseYearMonthError {
    #[error("expected YYYY-MM, got {0:?}")]
    Format(String),
    #[error("month must be between 01 and 12, got {0}")]
    Month(u32),
    #[error("year must be between 0000 and 9999, got {0}")]
    Year(i32),
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ParseYearMonthError> {
        if !(0..=9999).contains(&year) {
            return Err(ParseYearMonthError::Year(year));
        }
        if !(1..=12).contains(&month) {
            return Err(ParseYearMonthError::Month(month));
        }
        Ok(Self {
            year: year as u16,
            month: month as u8,
        })
    }

    pub fn year(&self) -> i32 {
        i32::from(self.year)
    }

    pub fn month(&self) -> u32 {
        u32::from(self.month)
    }

    /// Recognize a monthly tab from its human-authored title.
    ///
    /// Accepts `2025-10`, `2025/10`, `2025.10`, single-digit months and the
    /// `2025年10月` form. Returns `None` for any other title.
    pub fn from_tab_title(title: &str) -> Option<Self> {
        let title = title.trim();

        let (year, month) = if let Some(rest) = title.strip_suffix('月') {
            rest.split_once('年')?
        } else {
            title.split_once(['-', '/', '.'])?
        };

        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if month.is_empty() || month.len() > 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Self::new(year.parse().ok()?, month.parse().ok()?).ok()
    }
}

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    /// Strict canonical parse: exactly four digits, `-`, two digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let shaped = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !shaped {
            return Err(ParseYearMonthError::Format(s.to_string()));
        }

        let year: i32 = s[..4].parse().map_err(|_| ParseYearMonthError::Format(s.to_string()))?;
        let month: u32 = s[5..].parse().map_err(|_| ParseYearMonthError::Format(s.to_string()))?;
        Self::new(year, month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
