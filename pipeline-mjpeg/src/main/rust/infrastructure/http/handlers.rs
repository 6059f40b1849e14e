use std::convert::Infallible;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio_stream::StreamExt;
use warp::http::{header, StatusCode};
use warp::hyper::Body;
use warp::reply::Response;
use warp::{Rejection, Reply};

use super::rejection::{reject, ApiError};
use crate::application::services::{OverlayService, StreamingService};
use crate::domain::value_objects::FEED_CONTENT_TYPE;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub url: Option<String>,
}

/// `GET /video_feed?url=...`
pub async fn video_feed(
    query: FeedQuery,
    streaming: Arc<StreamingService>,
) -> Result<Response, Rejection> {
    let feed = streaming
        .open_feed(query.url.as_deref())
        .await
        .map_err(reject)?;

    let body = Body::wrap_stream(feed.map(|chunk| Ok::<_, Infallible>(chunk.into_bytes())));

    warp::http::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, FEED_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .body(body)
        .map_err(|e| reject(ApiError::Internal(e.to_string())))
}

/// `GET /overlays`
pub async fn list_overlays(overlays: Arc<OverlayService>) -> Result<Response, Rejection> {
    let documents = overlays.list().await.map_err(reject)?;
    Ok(warp::reply::json(&documents).into_response())
}

/// `POST /overlays`
pub async fn create_overlay(
    body: Value,
    overlays: Arc<OverlayService>,
) -> Result<Response, Rejection> {
    let id = overlays.create(body).await.map_err(reject)?;
    Ok(warp::reply::with_status(
        warp::reply::json(&json!({ "id": id.to_string() })),
        StatusCode::CREATED,
    )
    .into_response())
}

/// `PUT /overlays/{id}`
pub async fn update_overlay(
    id: String,
    body: Value,
    overlays: Arc<OverlayService>,
) -> Result<Response, Rejection> {
    overlays.update(&id, body).await.map_err(reject)?;
    Ok(warp::reply::json(&json!({ "status": "updated" })).into_response())
}

/// `DELETE /overlays/{id}`
pub async fn delete_overlay(
    id: String,
    overlays: Arc<OverlayService>,
) -> Result<Response, Rejection> {
    overlays.delete(&id).await.map_err(reject)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `OPTIONS` on the overlay endpoints: plain acknowledgment.
pub fn preflight() -> Response {
    warp::reply::json(&json!({ "status": "ok" })).into_response()
}
