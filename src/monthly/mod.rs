//! Monthly snapshot indexing.
//!
//! # Data Flow
//! ```text
//! Query string
//!     → params.rs (validate order/limit/from/to, no I/O)
//!     → service.rs (arm deadline)
//!         → sheet source: list monthly tabs (once)
//!         → index.rs (filter → sort → truncate → project)
//!     → MonthlyIndex
//! ```
//!
//! # Design Decisions
//! - Stateless: every request reads the tab list fresh
//! - Validation errors never consume deadline budget
//! - `latestMonth` is the calendar-latest returned month for either order
//! - Duplicate months are an error, never merged

pub mod index;
pub mod params;
pub mod service;
pub mod types;
pub mod year_month;

pub use index::{build_index, IndexError};
pub use params::{parse_monthly_index_params, MonthlyIndexParams, ParamError, DEFAULT_LIMIT, MAX_LIMIT};
pub use service::MonthlyService;
pub use types::{MonthlyIndex, MonthlyTabMeta, SheetRows, SortOrder};
pub use year_month::{ParseYearMonthError, YearMonth};
