//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::error;
use usecase_core::config::ConfigError;
use usecase_core::sharepoint::SharePointError;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    /// 400 with a plain-text body.
    #[error("{0}")]
    Validation(String),

    /// 404 with a plain-text body.
    #[error("{0}")]
    NotFound(String),

    /// Any status with a caller-built JSON body.
    #[error("HTTP {status}: {body}")]
    Json { status: StatusCode, body: Value },

    #[error(transparent)]
    Upstream(#[from] SharePointError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self::Json { status, body }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, m).into_response(),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m).into_response(),
            AppError::Json { status, body } => (status, Json(body)).into_response(),
            AppError::Upstream(e) => {
                error!(
                    status = ?e.status(),
                    data = %e.response_data(),
                    "upstream call failed: {e}"
                );
                internal_error()
            }
            AppError::Config(e) => {
                error!("configuration error: {e}");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn validation_is_plain_text_400() {
        let resp = AppError::Validation("Missing or invalid itemId".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(resp).await, "Missing or invalid itemId");
    }

    #[tokio::test]
    async fn upstream_details_are_not_leaked() {
        let resp = AppError::from(SharePointError::Remote {
            status: 403,
            body: "secret detail".into(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(resp).await, r#"{"error":"Internal server error"}"#);
    }

    #[tokio::test]
    async fn json_variant_keeps_status_and_body() {
        let resp = AppError::json(StatusCode::NOT_FOUND, json!({"error": "gone"})).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(resp).await, r#"{"error":"gone"}"#);
    }
}
