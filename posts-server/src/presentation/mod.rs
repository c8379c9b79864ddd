pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod utils;
pub mod views;
