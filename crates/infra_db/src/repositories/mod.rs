//! Repository implementations for domain entities
//!
//! Repositories encapsulate SQL queries and map between database rows and
//! plain Rust values. They know nothing about domain rules.
//!
//! # Architecture
//!
//! - Runtime-checked queries (`sqlx::query_as` with `FromRow`)
//! - Transactions for read-check-write sequences
//! - Optimistic concurrency through a `version` column

pub mod groups;

pub use groups::{GroupRepository, GroupRow};
