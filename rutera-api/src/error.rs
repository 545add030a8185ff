use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use rutera_catalog::route::CatalogError;
use rutera_catalog::seating::SeatingError;
use rutera_core::CoreError;

#[derive(Debug)]
pub enum ApiError {
    Core(CoreError),
    Anyhow(anyhow::Error),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownStop(_) => Self::Core(CoreError::NotFound(err.to_string())),
            _ => Self::Core(CoreError::Validation(err.to_string())),
        }
    }
}

impl From<SeatingError> for ApiError {
    fn from(err: SeatingError) -> Self {
        match err {
            SeatingError::UnknownSeat(_) => Self::Core(CoreError::NotFound(err.to_string())),
            _ => Self::Core(CoreError::Validation(err.to_string())),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Core(CoreError::Conflict(msg)) => (StatusCode::CONFLICT, msg),
            ApiError::Core(err @ CoreError::HoldLimitExceeded { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ApiError::Core(CoreError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg),
            ApiError::Core(CoreError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Core(CoreError::Upstream(msg)) => {
                tracing::error!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "Upstream unavailable".to_string())
            }
            ApiError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
