use std::convert::Infallible;
use std::sync::Arc;

use warp::http::Method;
use warp::{Filter, Rejection, Reply};

use super::handlers::{self, FeedQuery};
use super::health;
use super::rejection::handle_rejection;
use crate::application::services::{OverlayService, StreamingService};
use crate::domain::value_objects::ServerConfig;

/// Every route the server answers, with CORS and JSON error bodies applied.
pub fn routes(
    streaming: Arc<StreamingService>,
    overlays: Arc<OverlayService>,
    config: &ServerConfig,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(vec![
            "content-type",
            "authorization",
            "accept",
            "origin",
            "x-requested-with",
        ]);

    video_feed(streaming)
        .or(overlay_routes(overlays.clone(), config.max_body_bytes()))
        .unify()
        .or(health::routes(overlays))
        .unify()
        .recover(handle_rejection)
        .with(cors)
}

/// `GET /video_feed`
pub fn video_feed(
    streaming: Arc<StreamingService>,
) -> impl Filter<Extract = (warp::reply::Response,), Error = Rejection> + Clone {
    warp::path("video_feed")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<FeedQuery>())
        .and(with_service(streaming))
        .and_then(handlers::video_feed)
}

/// `/overlays` and `/overlays/{id}`
pub fn overlay_routes(
    overlays: Arc<OverlayService>,
    max_body_bytes: u64,
) -> impl Filter<Extract = (warp::reply::Response,), Error = Rejection> + Clone {
    let collection = warp::path("overlays").and(warp::path::end());
    let item = warp::path!("overlays" / String);

    let list = collection
        .and(warp::get())
        .and(with_service(overlays.clone()))
        .and_then(handlers::list_overlays);

    let create = collection
        .and(warp::post())
        .and(json_body(max_body_bytes))
        .and(with_service(overlays.clone()))
        .and_then(handlers::create_overlay);

    let collection_preflight = collection
        .and(warp::options())
        .map(handlers::preflight);

    let update = item
        .and(warp::put())
        .and(json_body(max_body_bytes))
        .and(with_service(overlays.clone()))
        .and_then(handlers::update_overlay);

    let delete = item
        .and(warp::delete())
        .and(with_service(overlays))
        .and_then(handlers::delete_overlay);

    let item_preflight = item
        .and(warp::options())
        .map(|_id: String| handlers::preflight());

    list.or(create)
        .unify()
        .or(collection_preflight)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(item_preflight)
        .unify()
}

fn json_body(
    limit: u64,
) -> impl Filter<Extract = (serde_json::Value,), Error = Rejection> + Clone {
    warp::body::content_length_limit(limit).and(warp::body::json())
}

pub(crate) fn with_service<T: Send + Sync + ?Sized>(
    service: Arc<T>,
) -> impl Filter<Extract = (Arc<T>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}
