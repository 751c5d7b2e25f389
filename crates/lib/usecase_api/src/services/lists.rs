//! Failure bodies for the plain list endpoints.
//!
//! Unlike the catalog endpoints these echo the upstream status and body,
//! so a misconfigured app registration can be diagnosed from the browser.

use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::error;
use usecase_core::config::ConfigError;
use usecase_core::sharepoint::SharePointError;

use crate::error::AppError;

/// `500 {error, message, status, data}`.
pub fn failure(error: &str, message: String, status: Option<u16>, data: Value) -> AppError {
    error!(status = ?status, data = %data, "{error}: {message}");
    AppError::json(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({
            "error": error,
            "message": message,
            "status": status,
            "data": data,
        }),
    )
}

pub fn from_upstream(error: &str, e: &SharePointError) -> AppError {
    failure(error, e.to_string(), e.status(), e.response_data())
}

pub fn from_config(error: &str, e: &ConfigError) -> AppError {
    failure(error, e.to_string(), None, Value::Null)
}
