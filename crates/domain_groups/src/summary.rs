//! Read-side views over a group's balances and log

use serde::{Deserialize, Serialize};

use core_kernel::{Amount, GroupId};

use crate::entry::LedgerEntry;
use crate::group::Group;

/// Number of entries shown in a group overview
pub const RECENT_ENTRIES_LIMIT: usize = 3;

/// Where a member stands in a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceStatus {
    #[serde(rename = "settled")]
    Settled,
    #[serde(rename = "owes")]
    Owes,
    #[serde(rename = "is owed")]
    IsOwed,
}

impl BalanceStatus {
    pub fn of(balance: Amount) -> Self {
        if balance.is_positive() {
            BalanceStatus::Owes
        } else if balance.is_negative() {
            BalanceStatus::IsOwed
        } else {
            BalanceStatus::Settled
        }
    }
}

/// A member's signed balance and what it means
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub member: String,
    pub balance: Amount,
    pub status: BalanceStatus,
}

impl BalanceSummary {
    /// Summary for one member, `None` if they are not in the group
    pub fn for_member(group: &Group, member: &str) -> Option<Self> {
        let balance = group.balance_of(member)?;
        Some(Self {
            member: member.to_string(),
            balance,
            status: BalanceStatus::of(balance),
        })
    }
}

/// Headline figures for a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOverview {
    pub group_id: GroupId,
    pub name: String,
    pub members_count: usize,
    pub expenses_count: usize,
    pub settlements_count: usize,
    /// Sum of expense amounts; settlements are transfers, not spending
    pub total_spent: Amount,
    /// In member order
    pub balances: Vec<BalanceSummary>,
    /// Most recent first, by entry date
    pub recent_entries: Vec<LedgerEntry>,
}

impl GroupOverview {
    pub fn of(group: &Group) -> Self {
        let (settlements, expenses): (Vec<&LedgerEntry>, Vec<&LedgerEntry>) =
            group.expenses().iter().partition(|e| e.is_settlement());

        let balances = group
            .members()
            .iter()
            .filter_map(|m| BalanceSummary::for_member(group, m))
            .collect();

        let mut recent: Vec<LedgerEntry> = group.expenses().to_vec();
        // Stable sort keeps append order between entries with the same date
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(RECENT_ENTRIES_LIMIT);

        Self {
            group_id: group.id(),
            name: group.name().to_string(),
            members_count: group.members().len(),
            expenses_count: expenses.len(),
            settlements_count: settlements.len(),
            total_spent: expenses.iter().map(|e| e.amount).sum(),
            balances,
            recent_entries: recent,
        }
    }
}

/// A proposed settlement that clears a member's debt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementSuggestion {
    pub payer: String,
    pub receiver: String,
    pub amount: Amount,
}

impl SettlementSuggestion {
    /// Suggests how `member` can clear what they owe
    ///
    /// Only a member with a positive balance gets a suggestion: pay the
    /// full balance to the other member with the lowest balance. Ties go
    /// to the earlier member.
    pub fn for_member(group: &Group, member: &str) -> Option<Self> {
        let owed = group.balance_of(member)?;
        if !owed.is_positive() {
            return None;
        }

        let receiver = group
            .members()
            .iter()
            .filter(|m| m.as_str() != member)
            .map(|m| (m, group.balance_of(m).unwrap_or_default()))
            .fold(None::<(&String, Amount)>, |lowest, (m, balance)| match lowest {
                Some((_, low)) if low <= balance => lowest,
                _ => Some((m, balance)),
            })?;

        Some(Self {
            payer: member.to_string(),
            receiver: receiver.0.clone(),
            amount: owed,
        })
    }
}

/// What a member owes and is owed across several groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTotals {
    pub member: String,
    pub total_owes: Amount,
    pub total_owed: Amount,
}

/// Adds up a member's positive and negative balances over `groups`
///
/// Groups the member does not belong to contribute nothing.
pub fn member_totals(groups: &[Group], member: &str) -> MemberTotals {
    let mut totals = MemberTotals {
        member: member.to_string(),
        total_owes: Amount::zero(),
        total_owed: Amount::zero(),
    };

    for balance in groups.iter().filter_map(|g| g.balance_of(member)) {
        if balance.is_positive() {
            totals.total_owes += balance;
        } else if balance.is_negative() {
            totals.total_owed += balance.abs();
        }
    }

    totals
}
