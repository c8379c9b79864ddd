pub mod admin_service;
pub mod auth_service;
pub mod forms;
pub mod pagination;
pub mod post_service;
