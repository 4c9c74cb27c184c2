//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories are thin translators between Diesel rows and domain types.
//! Row structs and table definitions stay private to this module. Pooling
//! goes through `diesel-async` with `bb8`.
//!
//! ```ignore
//! use syncing_server::outbound::persistence::{DbPool, DieselItemRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/sync")).await?;
//! let items = DieselItemRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_item_repository;
mod diesel_revision_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_item_repository::DieselItemRepository;
pub use diesel_revision_repository::DieselRevisionRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
