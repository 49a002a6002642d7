//! Request logging middleware for the ledger API
//!
//! Logs method, path, status and latency of every request when enabled.
//! Client errors log at warn, server errors at error.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{error, info, warn};

/// Request logging switch, taken from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogConfig {
    pub log_requests: bool,
}

pub async fn logging_middleware(
    State(config): State<RequestLogConfig>,
    request: Request,
    next: Next,
) -> Response {
    if !config.log_requests {
        return next.run(request).await;
    }

    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request failed"
        );
    } else if status.is_client_error() {
        warn!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Client error"
        );
    } else if is_write(&method) {
        info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

/// Requests that run a state transition
fn is_write(method: &Method) -> bool {
    method == Method::POST
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_post_is_a_write() {
        assert!(is_write(&Method::POST));
        assert!(!is_write(&Method::GET));
        assert!(!is_write(&Method::HEAD));
    }
}
