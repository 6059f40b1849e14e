use std::convert::Infallible;
use std::sync::Arc;

use warp::http::StatusCode;
use warp::{Filter, Reply};

use super::routes::with_service;
use crate::application::services::OverlayService;
use crate::infrastructure::metrics::PrometheusReporter;

/// Health check response structure
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

impl HealthResponse {
    fn new(status: &'static str) -> Self {
        Self {
            status,
            service: "pipeline-mjpeg",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// `/metrics`, `/health`, `/livez` and `/readyz`.
pub fn routes(
    overlays: Arc<OverlayService>,
) -> impl Filter<Extract = (warp::reply::Response,), Error = warp::Rejection> + Clone {
    let metrics_route = warp::path("metrics").and(warp::path::end()).map(|| {
        let body = PrometheusReporter::gather_metrics();
        warp::reply::with_header(body, "content-type", "text/plain; version=0.0.4; charset=utf-8")
            .into_response()
    });

    let health_route = warp::path("health")
        .and(warp::path::end())
        .map(|| warp::reply::json(&HealthResponse::new("healthy")).into_response());

    // Liveness probe endpoint (minimal check - is the process running?)
    let liveness_route = warp::path("livez")
        .and(warp::path::end())
        .map(|| warp::reply::with_status("OK", StatusCode::OK).into_response());

    // Readiness probe endpoint (can the overlay store take traffic?)
    let readiness_route = warp::path("readyz")
        .and(warp::path::end())
        .and(with_service(overlays))
        .and_then(readiness);

    warp::get().and(
        metrics_route
            .or(health_route)
            .unify()
            .or(liveness_route)
            .unify()
            .or(readiness_route)
            .unify(),
    )
}

async fn readiness(overlays: Arc<OverlayService>) -> Result<warp::reply::Response, Infallible> {
    let reply = if overlays.is_ready().await {
        warp::reply::with_status(
            warp::reply::json(&HealthResponse::new("ready")),
            StatusCode::OK,
        )
    } else {
        warp::reply::with_status(
            warp::reply::json(&HealthResponse::new("unavailable")),
            StatusCode::SERVICE_UNAVAILABLE,
        )
    };
    Ok(reply.into_response())
}
