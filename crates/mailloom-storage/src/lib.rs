//! Mailloom Storage - Database access layer
//!
//! This crate provides the PostgreSQL persistence layer for Mailloom:
//! the connection pool, row models, and per-entity repositories.

pub mod db;
pub mod models;
pub mod repository;

pub use db::DatabasePool;
pub use models::*;
pub use repository::*;
