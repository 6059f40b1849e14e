use std::convert::Infallible;

use serde::Serialize;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::domain::errors::DomainError;

/// Rejection carrying an error raised while serving a request.
#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    Internal(String),
}

impl warp::reject::Reject for ApiError {}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

pub fn reject(err: impl Into<ApiError>) -> Rejection {
    warp::reject::custom(err.into())
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

/// Turn every rejection into a JSON error body with a matching status.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "NOT_FOUND", "Not found".to_string())
    } else if let Some(api_error) = err.find::<ApiError>() {
        classify(api_error)
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, "BAD_REQUEST", e.to_string())
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
            "Invalid query string".to_string(),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "PAYLOAD_TOO_LARGE",
            "Request body too large".to_string(),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            "LENGTH_REQUIRED",
            "Content-Length required".to_string(),
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UNSUPPORTED_MEDIA_TYPE",
            "Expected a JSON body".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "METHOD_NOT_ALLOWED",
            "Method not allowed".to_string(),
        )
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred".to_string(),
        )
    };

    let body = ErrorBody {
        error: message,
        code,
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

fn classify(err: &ApiError) -> (StatusCode, &'static str, String) {
    match err {
        ApiError::Domain(domain) => match domain {
            DomainError::MalformedIdentifier(_) | DomainError::InvalidPayload(_) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", domain.to_string())
            }
            DomainError::OverlayNotFound(_) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", domain.to_string())
            }
            DomainError::ShuttingDown => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SHUTTING_DOWN",
                domain.to_string(),
            ),
            DomainError::SourceUnavailable { .. } => (
                StatusCode::BAD_GATEWAY,
                "SOURCE_UNAVAILABLE",
                domain.to_string(),
            ),
            other => {
                tracing::error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        },
        ApiError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
