//! Route paths served by the API.

pub const GET_API_HEALTH: &str = "/api/health";
pub const GET_API_LIST_ITEMS_VIA_GRAPH: &str = "/api/list-items-via-graph";
pub const GET_API_LIST_ITEMS_VIA_CERT: &str = "/api/list-items-via-cert";
pub const GET_API_USECASE_DATA: &str = "/api/get-usecase-data";
pub const GET_API_USECASE_IMAGE: &str = "/api/get-usecase-image";
pub const GET_API_EXPORT_USECASE_COVER_IMAGE: &str = "/api/export-usecase-cover-image";
pub const GET_API_PAGE_DATA: &str = "/api/get-page-data";
