//! Thumbnail / cover image of a single use case.

use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use usecase_core::fields::{ImageKind, guess_content_type};

use crate::AppState;
use crate::error::AppResult;
use crate::services::images::{
    X_IMAGE_KIND, content_disposition, image_headers, parse_item_id, resolve_image,
};

/// Query parameters for the image endpoint.
#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    #[serde(rename = "itemId")]
    pub item_id: Option<String>,
    /// `thumbnail` (default) or `cover`.
    pub kind: Option<String>,
}

/// `GET /api/get-usecase-image?itemId=<n>&kind=thumbnail|cover`
pub async fn get_usecase_image(
    State(state): State<AppState>,
    Query(params): Query<ImageQuery>,
) -> AppResult<Response> {
    let item_id = parse_item_id(params.item_id.as_deref())?;
    let kind = ImageKind::parse(params.kind.as_deref());

    let image = resolve_image(&state, item_id, kind, "Image field").await?;

    let mut headers = image_headers(
        guess_content_type(&image.file_name),
        content_disposition("inline", &image.file_name),
        &image,
    );
    headers.insert(X_IMAGE_KIND, HeaderValue::from_static(kind.as_str()));

    Ok((StatusCode::OK, headers, image.bytes).into_response())
}
