//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! group ledger test suites.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built groups and amounts
//! - `builders`: Builder for groups with a prepared history
//! - `ports`: Port wrappers that inject storage failures
//! - `assertions`: Ledger invariant assertions
//! - `generators`: Property-based operation sequences

pub mod fixtures;
pub mod builders;
pub mod ports;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use ports::*;
pub use assertions::*;
pub use generators::*;
