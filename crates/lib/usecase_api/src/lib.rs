//! # usecase_api
//!
//! HTTP API library for the Use Case Library.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use usecase_core::sharepoint::{GraphClient, SharePointClient};

use crate::config::ApiConfig;
use crate::handlers::{
    cover_export, health, list_cert, list_graph, page_data, usecase_data, usecase_image,
};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// SharePoint REST client (certificate credential).
    pub sharepoint: Arc<SharePointClient>,
    /// Graph client (managed identity).
    pub graph: Arc<GraphClient>,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(config: ApiConfig, sharepoint: SharePointClient, graph: GraphClient) -> Self {
        Self {
            sharepoint: Arc::new(sharepoint),
            graph: Arc::new(graph),
            config,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(routes::GET_API_HEALTH, get(health::health))
        .route(
            routes::GET_API_LIST_ITEMS_VIA_GRAPH,
            get(list_graph::list_items_via_graph),
        )
        .route(
            routes::GET_API_LIST_ITEMS_VIA_CERT,
            get(list_cert::list_items_via_cert),
        )
        .route(routes::GET_API_USECASE_DATA, get(usecase_data::get_usecase_data))
        .route(
            routes::GET_API_USECASE_IMAGE,
            get(usecase_image::get_usecase_image),
        )
        .route(
            routes::GET_API_EXPORT_USECASE_COVER_IMAGE,
            get(cover_export::export_usecase_cover_image),
        )
        .route(routes::GET_API_PAGE_DATA, get(page_data::get_page_data))
        .layer(cors)
        .with_state(state)
}
