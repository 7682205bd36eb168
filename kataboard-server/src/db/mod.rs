//! Database layer - connection pool, schema and repositories
//!
//! # Design Principles
//!
//! - Connection pool passed explicitly, never a global handle
//! - List operations issue one query per relation - no N+1 queries
//! - Rely on DB constraints and map violations - no check-then-insert
//! - Transactions for multi-row writes

pub mod pool;
pub mod repos;
pub mod schema;

pub use pool::{create_memory_pool, create_pool, create_pool_with_options};
pub use repos::*;
