//! Group aggregate and its balance ledger
//!
//! A `Group` owns an ordered member list, an append-only log of ledger
//! entries, and a balance map. The balance map is a cache: it always equals
//! the result of replaying the log from all-zero balances, and
//! [`Group::recalculate_balances`] rebuilds it from scratch.
//!
//! Every mutating operation validates its whole input before it touches the
//! log or the balances, so a rejected call leaves the group unchanged.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use core_kernel::{Amount, EntryId, GroupId};

use crate::entry::{EntryKind, LedgerEntry};
use crate::error::GroupError;
use crate::expense::NewExpense;

/// A group of members sharing expenses
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    id: GroupId,
    name: String,
    members: Vec<String>,
    balances: BTreeMap<String, Amount>,
    expenses: Vec<LedgerEntry>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// The stored form of a group
///
/// Snapshots come back from storage unvalidated; [`Group::restore`] turns
/// them into a group with a balance for every member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSnapshot {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<String>,
    pub balances: BTreeMap<String, Amount>,
    pub expenses: Vec<LedgerEntry>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    /// Creates a group with zero balances and an empty log
    ///
    /// # Arguments
    ///
    /// * `name` - Group name, trimmed
    /// * `members` - Member names in display order, each trimmed
    ///
    /// # Errors
    ///
    /// Returns `GroupError::Validation` if the name is blank, the member
    /// list is empty, or a member name is blank or repeated.
    pub fn create(name: impl Into<String>, members: Vec<String>) -> Result<Self, GroupError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(GroupError::validation("Group name is required"));
        }
        if members.is_empty() {
            return Err(GroupError::validation("A group needs at least one member"));
        }

        let mut normalized: Vec<String> = Vec::with_capacity(members.len());
        for member in members {
            let member = normalize_member(&member)?;
            if normalized.contains(&member) {
                return Err(GroupError::validation(format!(
                    "Member '{}' is listed more than once",
                    member
                )));
            }
            normalized.push(member);
        }

        let balances = normalized
            .iter()
            .map(|m| (m.clone(), Amount::zero()))
            .collect();
        let now = Utc::now();

        Ok(Self {
            id: GroupId::new_v7(),
            name,
            members: normalized,
            balances,
            expenses: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a group from its stored form
    ///
    /// Members missing from the stored balance map get a zero balance and
    /// balances of non-members are dropped. The cached balances are
    /// otherwise kept as stored; call `recalculate_balances` to check them.
    pub fn restore(snapshot: GroupSnapshot) -> Self {
        let mut group = Self {
            id: snapshot.id,
            name: snapshot.name,
            members: snapshot.members,
            balances: snapshot.balances,
            expenses: snapshot.expenses,
            version: snapshot.version,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        };

        let members = &group.members;
        let before = group.balances.len();
        group.balances.retain(|member, _| members.contains(member));
        if group.balances.len() != before {
            warn!(group_id = %group.id, "Dropped balances of non-members while restoring group");
        }
        group.ensure_member_balances();
        group
    }

    /// Returns the stored form of this group
    pub fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            id: self.id,
            name: self.name.clone(),
            members: self.members.clone(),
            balances: self.balances.clone(),
            expenses: self.expenses.clone(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn balances(&self) -> &BTreeMap<String, Amount> {
        &self.balances
    }

    /// Entries in the order they were appended
    pub fn expenses(&self) -> &[LedgerEntry] {
        &self.expenses
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_member(&self, member: &str) -> bool {
        self.members.iter().any(|m| m == member)
    }

    /// Balance of a member, `None` if they are not in the group
    pub fn balance_of(&self, member: &str) -> Option<Amount> {
        if !self.is_member(member) {
            return None;
        }
        Some(self.balances.get(member).copied().unwrap_or_default())
    }

    /// Sum of all balances, zero for a consistent group
    pub fn total_balance(&self) -> Amount {
        self.balances.values().sum()
    }

    /// Adds a member with a zero balance
    ///
    /// # Errors
    ///
    /// Returns `GroupError::Validation` if the name is blank or already a member.
    pub fn add_member(&mut self, member: &str) -> Result<(), GroupError> {
        let member = normalize_member(member)?;
        if self.is_member(&member) {
            return Err(GroupError::validation(format!(
                "'{}' is already a member of the group",
                member
            )));
        }

        self.balances.insert(member.clone(), Amount::zero());
        self.members.push(member);
        self.touch();
        Ok(())
    }

    /// Records an expense and applies it to the balances
    ///
    /// Every split member is charged their share and the payer is credited
    /// the full amount. A payer inside their own split ends up charged for
    /// their share like everyone else.
    ///
    /// # Returns
    ///
    /// The id of the appended entry
    ///
    /// # Errors
    ///
    /// Returns `GroupError::Validation` for any invalid input, see
    /// [`NewExpense`] for the rules.
    pub fn add_expense(&mut self, expense: NewExpense) -> Result<EntryId, GroupError> {
        let kind = expense.validate(&self.members)?;
        let now = Utc::now();

        let entry = LedgerEntry {
            id: EntryId::new_v7(),
            amount: expense.amount,
            date: expense.date.unwrap_or(now),
            created_at: now,
            kind,
        };

        debug!(group_id = %self.id, entry_id = %entry.id, amount = %entry.amount, "Recording expense");
        self.append(entry)
    }

    /// Records a direct transfer from `payer` to `receiver`
    ///
    /// The payer's balance drops by `amount` and the receiver's rises by
    /// it. Paying more than is owed is allowed and flips the sign of the
    /// balances involved.
    ///
    /// # Errors
    ///
    /// Returns `GroupError::Validation` if the amount is not a positive
    /// two-place decimal, payer and receiver are the same, or either is
    /// not a member.
    pub fn settle(
        &mut self,
        payer: &str,
        receiver: &str,
        amount: Amount,
    ) -> Result<EntryId, GroupError> {
        amount.ensure_positive()?;

        if payer == receiver {
            return Err(GroupError::validation("Payer and receiver must be different members"));
        }
        for member in [payer, receiver] {
            if !self.is_member(member) {
                return Err(GroupError::validation(format!(
                    "'{}' is not a member of the group",
                    member
                )));
            }
        }

        let now = Utc::now();
        let entry = LedgerEntry {
            id: EntryId::new_v7(),
            amount,
            date: now,
            created_at: now,
            kind: EntryKind::Settlement {
                payer: payer.to_string(),
                receiver: receiver.to_string(),
            },
        };

        debug!(group_id = %self.id, entry_id = %entry.id, payer, receiver, "Recording settlement");
        self.append(entry)
    }

    /// Rebuilds balances by replaying the log from zero
    ///
    /// Returns true if the cached balances differed from the replayed ones.
    pub fn recalculate_balances(&mut self) -> bool {
        let replayed = self.replayed_balances();
        let drift = replayed != self.balances;

        if drift {
            warn!(group_id = %self.id, "Cached balances drifted from the entry log, rebuilding");
            self.balances = replayed;
            self.touch();
        }

        drift
    }

    /// Balances obtained by replaying the log from zero, without changing the group
    pub fn replayed_balances(&self) -> BTreeMap<String, Amount> {
        let mut balances: BTreeMap<String, Amount> = self
            .members
            .iter()
            .map(|m| (m.clone(), Amount::zero()))
            .collect();

        for entry in &self.expenses {
            if let Err(err) = entry.apply_to(&mut balances) {
                warn!(
                    group_id = %self.id,
                    entry_id = %entry.id,
                    error = %err,
                    "Skipping entry that cannot be replayed"
                );
            }
        }

        balances
    }

    /// Returns the group as stored after a successful save
    pub fn committed(mut self) -> Self {
        self.version += 1;
        self
    }

    fn append(&mut self, entry: LedgerEntry) -> Result<EntryId, GroupError> {
        self.ensure_member_balances();
        entry
            .apply_to(&mut self.balances)
            .map_err(|err| GroupError::validation(err.to_string()))?;

        let id = entry.id;
        self.expenses.push(entry);
        self.touch();
        Ok(id)
    }

    fn ensure_member_balances(&mut self) {
        for member in &self.members {
            self.balances.entry(member.clone()).or_default();
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn normalize_member(member: &str) -> Result<String, GroupError> {
    let member = member.trim();
    if member.is_empty() {
        return Err(GroupError::validation("Member name cannot be empty"));
    }
    Ok(member.to_string())
}
