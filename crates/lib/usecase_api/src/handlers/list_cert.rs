//! List items through SharePoint REST with the certificate credential.

use axum::Json;
use axum::extract::State;
use usecase_core::models::PublicListEntry;
use usecase_core::sharepoint::{ListQuery, ListRef};

use crate::AppState;
use crate::error::AppResult;
use crate::services::lists;

const FAILURE: &str = "Failed to read SharePoint list";
const SELECT: &str = "Id,Text,Title,Modified,No";

/// `GET /api/list-items-via-cert`
pub async fn list_items_via_cert(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PublicListEntry>>> {
    let list_id = state
        .config
        .sharepoint
        .require_list_id()
        .map_err(|e| lists::from_config(FAILURE, &e))?;

    let items = state
        .sharepoint
        .get_list_items(&ListRef::guid(list_id), &ListQuery::new().select(SELECT))
        .await
        .map_err(|e| lists::from_upstream(FAILURE, &e))?;

    Ok(Json(items.iter().map(PublicListEntry::from).collect()))
}
