use axum::http::HeaderMap;

use crate::error::ApiError;
use rutera_core::CoreError;

/// Anonymous session identity. Threaded explicitly into the core; nothing
/// below this point looks a session up ambiently.
pub const SESSION_HEADER: &str = "x-session-id";

pub fn session_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            ApiError::Core(CoreError::Validation(
                "missing X-Session-Id header".to_string(),
            ))
        })
}
