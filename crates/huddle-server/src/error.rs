use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use huddle_core::{CoreError, ErrorClass};
use huddle_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("Snapshot store error: {0}")]
    Store(#[from] StoreError),

    #[error("Missing or malformed authorization header")]
    MissingToken,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Core(e) => match e.class() {
                ErrorClass::Authorization => (StatusCode::FORBIDDEN, self.to_string()),
                ErrorClass::Validation => (StatusCode::BAD_REQUEST, self.to_string()),
            },
            ApiError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::MissingToken => (StatusCode::FORBIDDEN, self.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_classes_map_to_status_codes() {
        let forbidden = ApiError::Core(CoreError::InvalidToken).into_response();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let bad_request = ApiError::Core(CoreError::AlreadyPinned).into_response();
        assert_eq!(bad_request.status(), StatusCode::BAD_REQUEST);

        let missing = ApiError::MissingToken.into_response();
        assert_eq!(missing.status(), StatusCode::FORBIDDEN);
    }
}
