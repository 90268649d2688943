//! Per-request HTTP metrics
//!
//! `http_requests_total{method, path, status}` and
//! `http_request_duration_seconds{method, path}`. The `path` label is the
//! route template (`/api/v1/stores/{id}`), never the raw URI.

use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};

/// Label used for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

fn path_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string())
}

pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let path = path_label(&request);
    // Scrapes would otherwise count themselves
    if path == "/metrics" {
        return next.run(request).await;
    }
    let method = request.method().to_string();

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(elapsed);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_uris_are_not_used_as_labels() {
        let request = Request::builder()
            .uri("/api/v1/stores/42")
            .body(Body::empty())
            .unwrap();
        assert_eq!(path_label(&request), UNMATCHED_PATH);
    }
}
