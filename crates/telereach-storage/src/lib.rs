//! Telereach Storage - Database abstraction
//!
//! This crate provides the PostgreSQL persistence layer for Telereach:
//! connection pooling, row models, and per-entity repositories behind
//! async traits so the engine can run against test doubles.

pub mod db;
pub mod models;
pub mod repository;

pub use db::DatabasePool;
pub use models::*;
pub use repository::*;
