//! Full use-case catalog with derived image URLs.

use axum::Json;
use axum::extract::State;
use tracing::debug;
use usecase_core::fields::enrich_use_case;
use usecase_core::models::ListItem;
use usecase_core::sharepoint::{ListQuery, ListRef};

use crate::AppState;
use crate::error::AppResult;

/// `GET /api/get-usecase-data`: every item, newest first, with
/// `ThumbnailUrl`, `ThumbnailServerRelativeUrl`, `CoverImageUrl` and
/// `CoverImageServerRelativeUrl` added.
pub async fn get_usecase_data(State(state): State<AppState>) -> AppResult<Json<Vec<ListItem>>> {
    let list = ListRef::title(&state.config.sharepoint.list_title);
    let items = state
        .sharepoint
        .get_list_items(&list, &ListQuery::new().orderby("Created desc"))
        .await?;

    debug!(count = items.len(), "serving use cases");
    Ok(Json(items.into_iter().map(enrich_use_case).collect()))
}
