//! Content page endpoint.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use usecase_core::models::PageData;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::services::pages::load_page;

/// Query parameters for the page endpoint.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub slug: Option<String>,
    /// Accepted as an alias of `slug`.
    #[serde(rename = "Slug")]
    pub slug_alias: Option<String>,
    /// `1` echoes upstream failure details in the response.
    pub debug: Option<String>,
}

impl PageQuery {
    fn slug(&self) -> Option<&str> {
        [&self.slug, &self.slug_alias]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }

    fn debug(&self) -> bool {
        self.debug.as_deref() == Some("1")
    }
}

/// `GET /api/get-page-data?slug=<slug>`
pub async fn get_page_data(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<PageData>> {
    let Some(slug) = params.slug() else {
        return Err(AppError::json(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Missing 'slug' query parameter" }),
        ));
    };

    match load_page(&state.sharepoint, &state.config.sharepoint.page_lists, slug).await {
        Ok(Some(page)) => Ok(Json(page)),
        Ok(None) => Err(AppError::json(
            StatusCode::NOT_FOUND,
            json!({ "error": format!("Page not found for slug '{slug}'") }),
        )),
        Err(e) if params.debug() => {
            let status = e.status().unwrap_or(500);
            let sp_response = e.response_data();
            error!(slug, status, sp_response = %sp_response, "page lookup failed: {e}");
            Err(AppError::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "SharePoint call failed",
                    "status": status,
                    "message": e.to_string(),
                    "spResponse": sp_response,
                }),
            ))
        }
        Err(e) => Err(AppError::Upstream(e)),
    }
}
