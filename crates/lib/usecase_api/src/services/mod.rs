//! Request-level logic shared by handlers.

pub mod images;
pub mod lists;
pub mod pages;
