//! Cover image export, optionally as a download.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use usecase_core::fields::{ImageKind, content_type_for_extension, file_extension};

use crate::AppState;
use crate::error::AppResult;
use crate::services::images::{content_disposition, image_headers, parse_item_id, resolve_image};

/// Query parameters for the cover export endpoint.
#[derive(Debug, Deserialize)]
pub struct CoverExportQuery {
    #[serde(rename = "itemId")]
    pub item_id: Option<String>,
    /// `1` or `true` serves the file as an attachment.
    pub download: Option<String>,
}

fn disposition_type(download: Option<&str>) -> &'static str {
    match download.map(str::to_ascii_lowercase).as_deref() {
        Some("1") | Some("true") => "attachment",
        _ => "inline",
    }
}

/// `GET /api/export-usecase-cover-image?itemId=<n>&download=1`
///
/// The file is always named `cover.<ext>` regardless of the stored name.
pub async fn export_usecase_cover_image(
    State(state): State<AppState>,
    Query(params): Query<CoverExportQuery>,
) -> AppResult<Response> {
    let item_id = parse_item_id(params.item_id.as_deref())?;
    let disposition = disposition_type(params.download.as_deref());

    let image = resolve_image(&state, item_id, ImageKind::Cover, "CoverImage").await?;

    let ext = file_extension(&image.file_name);
    let headers = image_headers(
        content_type_for_extension(&ext),
        content_disposition(disposition, &format!("cover.{ext}")),
        &image,
    );

    Ok((StatusCode::OK, headers, image.bytes).into_response())
}
