//! Core Kernel - Foundational types for the group ledger
//!
//! This crate provides the building blocks shared by every other crate:
//! - `Amount`, a signed decimal money value with a fixed two-place scale
//! - Strongly-typed identifiers for groups and ledger entries
//! - Port plumbing (`PortError`, `DomainPort`, health checks) for adapters

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Amount, MoneyError, MONEY_SCALE};
pub use identifiers::{GroupId, EntryId};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
