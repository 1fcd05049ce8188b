//! HTTP surface of the desk

pub mod auth;
pub mod handlers;
pub mod routes;

pub use handlers::ApiError;
pub use routes::router;
