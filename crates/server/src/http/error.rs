use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub enum ApiError {
    Domain(domain::Error),
    Unauthorized(&'static str),
    Forbidden(&'static str),
}

impl From<domain::Error> for ApiError {
    fn from(err: domain::Error) -> Self {
        ApiError::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            ApiError::Domain(err) => match err {
                domain::Error::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, json!({ "error": err.to_string() }))
                }
                domain::Error::Validation(fields) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "error": "Validation failed", "fields": fields }),
                ),
                // caller bugs and storage failures
                err => {
                    tracing::error!("Request failed: {:?}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({ "error": "Internal server error" }),
                    )
                }
            },
        };
        (status, Json(body)).into_response()
    }
}
