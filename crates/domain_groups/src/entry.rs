//! Ledger entries
//!
//! A group's history is an append-only sequence of entries. Each entry is
//! either an expense paid by one member and split between several, or a
//! settlement moving balance directly from a payer to a receiver.
//!
//! Entries are stored as flat records (`EntryRecord`) with an
//! `isSettlement` flag and optional fields, which is the persisted
//! document layout; the domain works with the tagged `EntryKind`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{Amount, EntryId, MONEY_SCALE};

/// A single immutable entry in a group's log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "EntryRecord", try_from = "EntryRecord")]
pub struct LedgerEntry {
    pub id: EntryId,
    /// Always positive
    pub amount: Amount,
    /// When the expense or transfer happened
    pub date: DateTime<Utc>,
    /// When the entry was appended to the log
    pub created_at: DateTime<Utc>,
    pub kind: EntryKind,
}

/// The two kinds of ledger entry
#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    /// A shared cost paid by `paid_by`
    ///
    /// `shares` is `None` for an equal split and holds the explicit share
    /// of every member in `split_between` for an exact split.
    Expense {
        description: String,
        paid_by: String,
        split_between: Vec<String>,
        shares: Option<BTreeMap<String, Amount>>,
    },
    /// A direct transfer from `payer` to `receiver`
    Settlement {
        payer: String,
        receiver: String,
    },
}

impl LedgerEntry {
    pub fn is_settlement(&self) -> bool {
        matches!(self.kind, EntryKind::Settlement { .. })
    }

    pub fn is_expense(&self) -> bool {
        !self.is_settlement()
    }

    /// Applies this entry to a balance map
    ///
    /// Expense: every split member is charged their share, then the payer
    /// is credited the full amount. Settlement: the payer's balance drops
    /// by the amount and the receiver's rises by it. Both keep the sum of
    /// balances unchanged.
    ///
    /// Either the whole entry is applied or `balances` is left untouched.
    ///
    /// # Errors
    ///
    /// - `ApplyError::UnknownMember` if the entry names someone without a balance
    /// - `ApplyError::Overflow` if a balance would leave the decimal range
    pub(crate) fn apply_to(&self, balances: &mut BTreeMap<String, Amount>) -> Result<(), ApplyError> {
        let mut staged: BTreeMap<String, Amount> = BTreeMap::new();

        for (member, delta) in self.movements() {
            let current = match staged.get(&member) {
                Some(balance) => *balance,
                None => balances
                    .get(&member)
                    .copied()
                    .ok_or_else(|| ApplyError::UnknownMember(member.clone()))?,
            };
            let next = current
                .checked_add(delta)
                .ok_or_else(|| ApplyError::Overflow(member.clone()))?;
            staged.insert(member, next);
        }

        balances.extend(staged);
        Ok(())
    }

    /// Signed balance changes, in the order they are applied
    fn movements(&self) -> Vec<(String, Amount)> {
        match &self.kind {
            EntryKind::Expense { paid_by, split_between, shares, .. } => {
                if split_between.is_empty() {
                    return Vec::new();
                }
                let mut movements = member_shares(self.amount, split_between, shares.as_ref());
                movements.push((paid_by.clone(), -self.amount));
                movements
            }
            EntryKind::Settlement { payer, receiver } => vec![
                (payer.clone(), -self.amount),
                (receiver.clone(), self.amount),
            ],
        }
    }
}

/// Why an entry could not be applied to a balance map
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error("'{0}' is not a member of the group")]
    UnknownMember(String),

    #[error("Balance of '{0}' would overflow")]
    Overflow(String),
}

/// Resolves the share charged to each split member
///
/// Exact splits use the recorded shares. Equal splits give every member
/// the same number of cents, with the leftover cents going one each to
/// the first members in split order.
pub(crate) fn member_shares(
    amount: Amount,
    split_between: &[String],
    shares: Option<&BTreeMap<String, Amount>>,
) -> Vec<(String, Amount)> {
    if let Some(shares) = shares {
        return split_between
            .iter()
            .map(|m| (m.clone(), shares.get(m).copied().unwrap_or_default()))
            .collect();
    }

    let parts = match amount.allocate(split_between.len()) {
        Ok(parts) => parts,
        // Entries restored with sub-cent amounts: the last member absorbs the dust
        Err(_) => {
            let n = split_between.len();
            let share = Amount::new(
                (amount.value() / Decimal::from(n as u64)).round_dp(MONEY_SCALE),
            );
            let mut parts = vec![share; n];
            let rest: Amount = parts[..n - 1].iter().sum();
            parts[n - 1] = amount - rest;
            parts
        }
    };

    split_between.iter().cloned().zip(parts).collect()
}

/// Flat persisted layout of a ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub id: EntryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_by: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub split_between: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<BTreeMap<String, Amount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_settlement: bool,
}

/// A stored record that cannot be turned back into a ledger entry
#[derive(Debug, Error)]
#[error("Malformed ledger entry {id}: {reason}")]
pub struct MalformedEntry {
    pub id: String,
    pub reason: String,
}

impl From<LedgerEntry> for EntryRecord {
    fn from(entry: LedgerEntry) -> Self {
        let mut record = EntryRecord {
            id: entry.id,
            description: None,
            amount: entry.amount,
            paid_by: None,
            split_between: Vec::new(),
            shares: None,
            payer: None,
            receiver: None,
            date: entry.date,
            created_at: entry.created_at,
            is_settlement: false,
        };

        match entry.kind {
            EntryKind::Expense { description, paid_by, split_between, shares } => {
                record.description = Some(description);
                record.paid_by = Some(paid_by);
                record.split_between = split_between;
                record.shares = shares;
            }
            EntryKind::Settlement { payer, receiver } => {
                record.payer = Some(payer);
                record.receiver = Some(receiver);
                record.is_settlement = true;
            }
        }

        record
    }
}

impl TryFrom<EntryRecord> for LedgerEntry {
    type Error = MalformedEntry;

    fn try_from(record: EntryRecord) -> Result<Self, Self::Error> {
        let malformed = |reason: &str| MalformedEntry {
            id: record.id.to_string(),
            reason: reason.to_string(),
        };

        if !record.amount.is_positive() {
            return Err(malformed("amount must be positive"));
        }

        let kind = if record.is_settlement {
            // Older records kept the payer in `paidBy`
            let payer = record
                .payer
                .clone()
                .or_else(|| record.paid_by.clone())
                .ok_or_else(|| malformed("settlement without payer"))?;
            let receiver = record
                .receiver
                .clone()
                .ok_or_else(|| malformed("settlement without receiver"))?;
            if payer == receiver {
                return Err(malformed("settlement payer and receiver are the same"));
            }
            EntryKind::Settlement { payer, receiver }
        } else {
            let paid_by = record
                .paid_by
                .clone()
                .ok_or_else(|| malformed("expense without paidBy"))?;
            if record.split_between.is_empty() {
                return Err(malformed("expense with empty splitBetween"));
            }
            EntryKind::Expense {
                description: record.description.clone().unwrap_or_default(),
                paid_by,
                split_between: record.split_between.clone(),
                shares: record.shares.clone(),
            }
        };

        Ok(LedgerEntry {
            id: record.id,
            amount: record.amount,
            date: record.date,
            created_at: record.created_at,
            kind,
        })
    }
}
