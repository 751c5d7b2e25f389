//! List items through Microsoft Graph with the managed identity.

use axum::Json;
use axum::extract::State;
use usecase_core::models::GraphListEntry;

use crate::AppState;
use crate::error::AppResult;
use crate::services::lists;

const FAILURE: &str = "Failed to read SharePoint list via Graph + Managed Identity";

/// `GET /api/list-items-via-graph`
pub async fn list_items_via_graph(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<GraphListEntry>>> {
    let settings = &state.config.sharepoint;
    let list_id = settings
        .require_list_id()
        .map_err(|e| lists::from_config(FAILURE, &e))?;

    let items = state
        .graph
        .list_items(&settings.site_url, list_id)
        .await
        .map_err(|e| lists::from_upstream(FAILURE, &e))?;

    Ok(Json(items))
}
