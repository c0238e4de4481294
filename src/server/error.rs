//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for the crate error so that route handlers can
//! return `Result<T, AppError>` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::Error;

/// Wrapper so we can implement `IntoResponse` for the crate error type.
pub struct AppError(Error);

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.0,
                "Server error in API handler"
            );
            // The real cause is logged, never sent to the client.
            return (status, axum::Json(json!({"error": "Internal Server Error"})))
                .into_response();
        }

        let body = json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LimitKind;

    #[test]
    fn validation_produces_400() {
        let response = AppError::from(Error::Validation("no files uploaded".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upload_limit_produces_400() {
        let response =
            AppError::from(Error::UploadLimit(LimitKind::TooManyFiles)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn encode_produces_422() {
        let response = AppError::from(Error::Encode("bad header".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn internal_produces_500() {
        let response = AppError::from(Error::Internal("oops".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
