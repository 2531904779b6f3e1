//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the group ledger using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: `GroupRepository` owns the SQL
//! and works with plain rows, `PostgresGroupAdapter` implements the domain's
//! `GroupPort` on top of it and converts rows to `Group` aggregates.
//!
//! # Storage Model
//!
//! One row per group. Members, balances and the entry log are JSONB
//! documents in the camelCase layout of the domain's entry records. Updates
//! are guarded by a `version` column.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresGroupAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/groups")).await?;
//! run_migrations(&pool).await?;
//! let port = PostgresGroupAdapter::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use repositories::GroupRepository;
pub use adapters::PostgresGroupAdapter;
