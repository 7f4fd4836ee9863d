//! Mailloom API - HTTP surface
//!
//! Health checks, the open/click engagement callbacks, and the workflow
//! run/cancel endpoints.

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
