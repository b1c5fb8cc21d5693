//! Database layer - connection pool, schema and repositories
//!
//! # Design Principles
//!
//! - One shared connection pool, injected through `AppState`
//! - Every operation is a single parameterized statement (autocommit)
//! - Referential checks are by value, not foreign key
//! - Handlers only see the `Store` trait; Postgres and in-memory
//!   implementations are interchangeable

pub mod pool;
pub mod migrations;
pub mod repository;
pub mod postgres;
pub mod memory;

pub use pool::{create_pool, create_pool_with_options};
pub use repository::{DbError, ReferenceCheck, Repository, Store, Updated};
pub use postgres::PgStore;
pub use memory::MemoryStore;
