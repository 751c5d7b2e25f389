//! Resolving an item's image column to its reserved attachment.
//!
//! The image column only stores the attachment's file name; the bytes are
//! fetched by exact name match from the item's attachments. There is no
//! fallback to another attachment.

use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};
use usecase_core::fields::{ImageKind, attachment_file_name, find_attachment};
use usecase_core::sharepoint::ListRef;

use crate::AppState;
use crate::error::{AppError, AppResult};

pub const X_ITEM_ID: HeaderName = HeaderName::from_static("x-item-id");
pub const X_IMAGE_KIND: HeaderName = HeaderName::from_static("x-image-kind");
pub const X_SOURCE_FILENAME: HeaderName = HeaderName::from_static("x-source-filename");

const INVALID_ITEM_ID: &str = "Missing or invalid itemId";

/// Attachment bytes plus the name they were stored under.
#[derive(Debug)]
pub struct ResolvedImage {
    pub item_id: i64,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Parses `itemId`. Any non-negative integer is valid, including 0.
pub fn parse_item_id(raw: Option<&str>) -> AppResult<i64> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|id| *id >= 0)
        .ok_or_else(|| AppError::Validation(INVALID_ITEM_ID.into()))
}

/// Loads the attachment referenced by the item's `kind` column.
///
/// `subject` names the column in the 404 raised when the attachment is
/// missing, e.g. `"Image field"` or `"CoverImage"`.
pub async fn resolve_image(
    state: &AppState,
    item_id: i64,
    kind: ImageKind,
    subject: &str,
) -> AppResult<ResolvedImage> {
    let list = ListRef::title(&state.config.sharepoint.list_title);
    let column = kind.column();
    let select = format!("Id,ID,{column},Attachments,Modified");

    let item = state
        .sharepoint
        .get_list_item_by_id(&list, Some(item_id), Some(&select))
        .await?;

    let Some(target) = attachment_file_name(item.get(column)) else {
        debug!(item_id, kind = kind.as_str(), "image column not set");
        return Err(AppError::NotFound(format!(
            "No {} set for this item",
            kind.label()
        )));
    };

    let attachments = state
        .sharepoint
        .get_list_item_attachments(&list, Some(item_id))
        .await?;
    let Some(chosen) = find_attachment(&attachments, &target) else {
        warn!(item_id, file = %target, "referenced attachment missing");
        return Err(AppError::NotFound(format!(
            "{subject} is set but attachment not found: {target}"
        )));
    };

    let bytes = state
        .sharepoint
        .download_attachment_by_server_relative_url(&chosen.server_relative_url)
        .await?;

    Ok(ResolvedImage {
        item_id,
        file_name: chosen.file_name.clone(),
        bytes,
    })
}

/// Header value from arbitrary text; percent-encoded unless it is visible
/// ASCII.
pub fn header_value(text: &str) -> HeaderValue {
    let plain = text.is_ascii().then(|| HeaderValue::from_str(text).ok()).flatten();
    plain.unwrap_or_else(|| {
        HeaderValue::from_str(&urlencoding::encode(text)).unwrap_or(HeaderValue::from_static(""))
    })
}

/// `{disposition}; filename="{name}"` with quotes and backslashes escaped.
/// Names outside visible ASCII are percent-encoded and also sent as
/// `filename*=UTF-8''...`.
pub fn content_disposition(disposition: &str, file_name: &str) -> HeaderValue {
    if file_name.chars().any(|c| !c.is_ascii() || c.is_ascii_control()) {
        let encoded = urlencoding::encode(file_name);
        return header_value(&format!(
            "{disposition}; filename=\"{encoded}\"; filename*=UTF-8''{encoded}"
        ));
    }
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    header_value(&format!("{disposition}; filename=\"{escaped}\""))
}

/// Headers common to both image endpoints.
pub fn image_headers(content_type: &'static str, disposition: HeaderValue, image: &ResolvedImage) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(CONTENT_DISPOSITION, disposition);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(X_ITEM_ID, HeaderValue::from(image.item_id));
    headers.insert(X_SOURCE_FILENAME, header_value(&image.file_name));
    headers
}
