//! Group Expense Domain - Replayable Balance Ledger
//!
//! This crate implements expense splitting inside a group of members. A
//! group keeps an append-only log of ledger entries (expenses and
//! settlements) and a per-member balance map that is a cache of replaying
//! that log from all-zero balances.
//!
//! # Sign Convention
//!
//! - Positive balance: the member owes the group
//! - Negative balance: the member is owed
//! - The balances of a group always sum to exactly zero
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_groups::{Group, NewExpense};
//!
//! let mut group = Group::create("Trip", vec!["A".into(), "B".into(), "C".into()])?;
//! group.add_expense(NewExpense::equal("Dinner", amount, "A", vec!["A".into(), "B".into(), "C".into()]))?;
//! group.settle("B", "A", share)?;
//! ```

pub mod group;
pub mod entry;
pub mod expense;
pub mod summary;
pub mod ports;
pub mod service;
pub mod error;

pub use group::{Group, GroupSnapshot};
pub use entry::{LedgerEntry, EntryKind, EntryRecord, MalformedEntry, ApplyError};
pub use expense::{NewExpense, Split};
pub use summary::{
    BalanceStatus, BalanceSummary, GroupOverview, SettlementSuggestion, MemberTotals,
    member_totals, RECENT_ENTRIES_LIMIT,
};
pub use ports::GroupPort;
pub use ports::memory::InMemoryGroupPort;
pub use service::{GroupService, RetryPolicy, Recalculation};
pub use error::GroupError;
