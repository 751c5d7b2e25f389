//! Request handlers.

pub mod cover_export;
pub mod health;
pub mod list_cert;
pub mod list_graph;
pub mod page_data;
pub mod usecase_data;
pub mod usecase_image;
