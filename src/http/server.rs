//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (elapsed time, request ID, tracing, outer timeout)
//! - Hold hot-swappable service state (deadline budgets)
//! - Serve until the shutdown notification arrives

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{check_request_timeout, ConfigError, DashboardConfig, TimeoutConfig, ValidationError};
use crate::http::handlers;
use crate::http::request::{stamp_elapsed, MakeRequestUuidV4, X_REQUEST_ID};
use crate::monthly::MonthlyService;
use crate::resilience::{AbortSignal, Budget};
use crate::sheets::{MonthlySource, SheetServiceClient};

/// Snapshot of everything a request needs; replaced wholesale on reload.
pub struct ServiceState {
    pub config: DashboardConfig,
    pub months: MonthlyService,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ArcSwap<ServiceState>>,
    /// Fires when the server shuts down; passed to every upstream call.
    pub shutdown: AbortSignal,
}

fn budgets(timeouts: &TimeoutConfig) -> Result<(Budget, Budget), ConfigError> {
    check_request_timeout(timeouts).map_err(|e| ConfigError::Validation(vec![e]))?;
    let budget = |field: &'static str, ms: u64| {
        Budget::from_millis(ms)
            .map_err(|_| ConfigError::Validation(vec![ValidationError::ZeroBudget { field }]))
    };
    Ok((
        budget("timeouts.index_budget_ms", timeouts.index_budget_ms)?,
        budget("timeouts.rows_budget_ms", timeouts.rows_budget_ms)?,
    ))
}

impl AppState {
    /// Swap in new deadline budgets.
    ///
    /// Listener and sheet source settings only take effect on restart; the
    /// stored config keeps the values actually in use.
    pub fn apply_config(&self, mut config: DashboardConfig) -> Result<(), ConfigError> {
        let current = self.services.load_full();

        if config.sheets != current.config.sheets {
            tracing::warn!("Sheet source settings changed; restart required to apply them");
            config.sheets = current.config.sheets.clone();
        }
        if config.listener != current.config.listener {
            tracing::warn!("Listener settings changed; restart required to apply them");
            config.listener = current.config.listener.clone();
        }

        let (index_budget, rows_budget) = budgets(&config.timeouts)?;
        let months = current.months.with_budgets(index_budget, rows_budget);
        self.services.store(Arc::new(ServiceState { config, months }));

        tracing::info!(
            index_budget_ms = index_budget.as_millis(),
            rows_budget_ms = rows_budget.as_millis(),
            "Configuration applied"
        );
        Ok(())
    }
}

/// HTTP server for the dashboard API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Server backed by the configured sheet service.
    pub fn new(config: DashboardConfig, shutdown: AbortSignal) -> Result<Self, ConfigError> {
        let source = Arc::new(SheetServiceClient::from_config(&config.sheets)?);
        Self::with_source(config, source, shutdown)
    }

    /// Server backed by any [`MonthlySource`].
    pub fn with_source(
        config: DashboardConfig,
        source: Arc<dyn MonthlySource>,
        shutdown: AbortSignal,
    ) -> Result<Self, ConfigError> {
        let (index_budget, rows_budget) = budgets(&config.timeouts)?;
        let months = MonthlyService::new(source, index_budget, rows_budget);

        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let state = AppState {
            services: Arc::new(ArcSwap::from_pointee(ServiceState { config, months })),
            shutdown,
        };

        let router = Self::build_router(state.clone(), request_timeout);
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/months", get(handlers::monthly_index))
            .route("/api/months/{month}/rows", get(handlers::month_rows))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
            .layer(middleware::from_fn(stamp_elapsed))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve on `listener`, applying config revisions until shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<DashboardConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        let updater = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = state.apply_config(config) {
                    tracing::error!(error = %e, "Rejected configuration update");
                }
            }
        });

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        updater.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::InMemorySource;

    fn server(config: DashboardConfig) -> HttpServer {
        HttpServer::with_source(config, Arc::new(InMemorySource::default()), AbortSignal::never()).unwrap()
    }

    #[test]
    fn test_zero_budget_rejected_at_construction() {
        let mut config = DashboardConfig::default();
        config.timeouts.rows_budget_ms = 0;
        let result = HttpServer::with_source(config, Arc::new(InMemorySource::default()), AbortSignal::never());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_apply_config_swaps_budgets_only() {
        let server = server(DashboardConfig::default());
        let original_sheets = server.state().services.load().config.sheets.clone();

        let mut update = DashboardConfig::default();
        update.timeouts.index_budget_ms = 1234;
        update.sheets.base_url = "http://elsewhere:1/".into();
        server.state().apply_config(update).unwrap();

        let services = server.state().services.load();
        assert_eq!(services.months.index_budget().as_millis(), 1234);
        assert_eq!(services.config.sheets, original_sheets);
    }

    #[test]
    fn test_request_timeout_shorter_than_budget_rejected() {
        let mut config = DashboardConfig::default();
        config.timeouts.request_secs = 1;
        config.timeouts.index_budget_ms = 5_000;
        let result = HttpServer::with_source(config, Arc::new(InMemorySource::default()), AbortSignal::never());
        assert!(matches!(
            result,
            Err(ConfigError::Validation(ref errors))
                if matches!(errors[..], [ValidationError::RequestTimeoutTooShort { .. }])
        ));

        let server = server(DashboardConfig::default());
        let mut update = DashboardConfig::default();
        update.timeouts.rows_budget_ms = 60_000;
        assert!(server.state().apply_config(update).is_err());
        assert_eq!(server.state().services.load().config.timeouts.rows_budget_ms, 15_000);
    }

    #[test]
    fn test_invalid_update_keeps_current_state() {
        let server = server(DashboardConfig::default());
        let mut update = DashboardConfig::default();
        update.timeouts.index_budget_ms = 0;

        assert!(server.state().apply_config(update).is_err());
        assert_eq!(server.state().services.load().months.index_budget().as_millis(), 10_000);
    }
}
