//! Persistence layer for wedplan: configuration, connection pool, embedded
//! migrations, row models and per-table query helpers.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
