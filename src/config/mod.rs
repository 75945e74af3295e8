//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DashboardConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps in new deadline budgets
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes arrive as whole new values
//! - All fields have defaults to allow minimal configs
//! - Invalid revisions are logged and ignored

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{DashboardConfig, ListenerConfig, ObservabilityConfig, SheetsConfig, TimeoutConfig};
pub use validation::{check_request_timeout, validate_config, ValidationError};
pub use watcher::ConfigWatcher;
