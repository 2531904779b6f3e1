//! Group DTOs
//!
//! All bodies use camelCase field names. Amounts are accepted as JSON
//! numbers or strings and always returned as strings with two decimals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{Amount, EntryId, GroupId};
use domain_groups::{Group, LedgerEntry, NewExpense};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "must list at least one member"))]
    pub members: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub member: String,
}

/// An expense; exact when `shares` is present, equal otherwise
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddExpenseRequest {
    #[validate(length(min = 1, max = 500, message = "must be 1 to 500 characters"))]
    pub description: String,
    pub amount: Amount,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub paid_by: String,
    /// Members of an equal split; ignored when `shares` is present
    #[serde(default)]
    pub split_between: Vec<String>,
    pub shares: Option<BTreeMap<String, Amount>>,
    pub date: Option<DateTime<Utc>>,
}

impl AddExpenseRequest {
    pub fn into_expense(self) -> NewExpense {
        let expense = match self.shares {
            Some(shares) => NewExpense::exact(
                self.description,
                self.amount,
                self.paid_by,
                shares.into_iter().collect(),
            ),
            None => NewExpense::equal(
                self.description,
                self.amount,
                self.paid_by,
                self.split_between,
            ),
        };

        match self.date {
            Some(date) => expense.on(date),
            None => expense,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub payer: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub receiver: String,
    pub amount: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<String>,
    pub balances: BTreeMap<String, Amount>,
    /// Chronological, oldest first
    pub expenses: Vec<LedgerEntry>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Group> for GroupResponse {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id(),
            name: group.name().to_string(),
            members: group.members().to_vec(),
            balances: group.balances().clone(),
            expenses: group.expenses().to_vec(),
            version: group.version(),
            created_at: group.created_at(),
            updated_at: group.updated_at(),
        }
    }
}

/// A new ledger entry and the group after it was applied
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCreatedResponse {
    pub entry_id: EntryId,
    pub group: GroupResponse,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateResponse {
    /// Whether the stored balances differed from the replayed log
    pub drift: bool,
    pub group: GroupResponse,
}
