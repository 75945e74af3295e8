//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, elapsed-time stamping)
//!     → handlers.rs (extract query/path, call the monthly service)
//!     → response.rs (map errors to status + {error} body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID, X_RESPONSE_TIME_MS};
pub use response::{ApiError, ErrorBody};
pub use server::{AppState, HttpServer, ServiceState};
