//! HTTP API for the trust engine
//!
//! Provides:
//! - Ledger API (edge registration, observations, tasks, governance)
//! - Request logging middleware

pub mod ledger;
pub mod middleware;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use ledger::{create_router, status_for, HostEngine, LedgerApiState};
pub use middleware::{logging_middleware, RequestLogConfig};

/// Full application router with tracing and request logging layers
pub fn build_app(state: LedgerApiState, log_config: RequestLogConfig) -> Router {
    create_router(state)
        .layer(axum::middleware::from_fn_with_state(
            log_config,
            logging_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
