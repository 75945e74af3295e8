//! Monthly sheet dashboard API.
//!
//! Lists the monthly tabs of a spreadsheet and serves their rows, with
//! every upstream call raced against a deadline budget.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod monthly;
pub mod observability;
pub mod resilience;
pub mod sheets;

pub use config::schema::DashboardConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
