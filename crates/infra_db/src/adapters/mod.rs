//! Domain Adapters
//!
//! Adapter implementations for domain ports, connecting domain interfaces
//! to the PostgreSQL database layer.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresGroupAdapter;
//! use domain_groups::GroupPort;
//!
//! let adapter = PostgresGroupAdapter::new(pool);
//! let group = adapter.get_group(group_id).await?;
//! ```

pub mod groups;

pub use groups::PostgresGroupAdapter;
