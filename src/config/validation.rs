//! Configuration validation.
//!
//! Serde handles syntax; this checks values: budgets are positive, addresses
//! and URLs parse, the log level is known, and the outer request timeout
//! outlasts every deadline budget. All errors are returned, not just the
//! first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{DashboardConfig, TimeoutConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroBudget { field: &'static str },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("sheets.base_url is not a valid http(s) URL: {0}")]
    InvalidBaseUrl(String),

    #[error("observability.log_level is not a known level: {0}")]
    InvalidLogLevel(String),

    #[error("timeouts.request_secs ({request_ms}ms) must exceed the largest deadline budget ({budget_ms}ms)")]
    RequestTimeoutTooShort { request_ms: u64, budget_ms: u64 },
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// The outer request timeout (a bare 408) must outlast both deadline budgets.
pub fn check_request_timeout(timeouts: &TimeoutConfig) -> Result<(), ValidationError> {
    let request_ms = timeouts.request_secs.saturating_mul(1000);
    let budget_ms = timeouts.index_budget_ms.max(timeouts.rows_budget_ms);
    if request_ms > budget_ms {
        Ok(())
    } else {
        Err(ValidationError::RequestTimeoutTooShort { request_ms, budget_ms })
    }
}

pub fn validate_config(config: &DashboardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let budgets = [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.index_budget_ms", config.timeouts.index_budget_ms),
        ("timeouts.rows_budget_ms", config.timeouts.rows_budget_ms),
        ("sheets.request_timeout_ms", config.sheets.request_timeout_ms),
    ];
    for (field, value) in budgets {
        if value == 0 {
            errors.push(ValidationError::ZeroBudget { field });
        }
    }

    if let Err(e) = check_request_timeout(&config.timeouts) {
        errors.push(e);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    match url::Url::parse(&config.sheets.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidBaseUrl(config.sheets.base_url.clone())),
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
