//! Expense input and split validation

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

use core_kernel::Amount;

use crate::entry::EntryKind;
use crate::error::GroupError;

/// How an expense is divided between members
#[derive(Debug, Clone, PartialEq)]
pub enum Split {
    /// Same share for everyone, remainder cents to the first members
    Equal(Vec<String>),
    /// Explicit share per member, in the given order
    Exact(Vec<(String, Amount)>),
}

impl Split {
    /// Members the expense is split between, in split order
    pub fn members(&self) -> Vec<String> {
        match self {
            Split::Equal(members) => members.clone(),
            Split::Exact(shares) => shares.iter().map(|(m, _)| m.clone()).collect(),
        }
    }
}

/// A new expense waiting to be appended to a group
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub description: String,
    pub amount: Amount,
    pub paid_by: String,
    pub split: Split,
    /// Defaults to the time the expense is recorded
    pub date: Option<DateTime<Utc>>,
}

impl NewExpense {
    /// An expense split equally between `split_between`
    pub fn equal(
        description: impl Into<String>,
        amount: Amount,
        paid_by: impl Into<String>,
        split_between: Vec<String>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            paid_by: paid_by.into(),
            split: Split::Equal(split_between),
            date: None,
        }
    }

    /// An expense with an explicit share for each member
    pub fn exact(
        description: impl Into<String>,
        amount: Amount,
        paid_by: impl Into<String>,
        shares: Vec<(String, Amount)>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            paid_by: paid_by.into(),
            split: Split::Exact(shares),
            date: None,
        }
    }

    /// Sets the date the expense happened
    pub fn on(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Checks the expense against a member list and builds the entry kind
    ///
    /// # Errors
    ///
    /// Returns `GroupError::Validation` if the description is blank, the
    /// amount is not a positive two-place decimal, the payer or any split
    /// member is unknown, the split is empty or lists a member twice, or
    /// exact shares are negative or do not add up to the amount.
    pub(crate) fn validate(&self, members: &[String]) -> Result<EntryKind, GroupError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(GroupError::validation("Expense description is required"));
        }

        self.amount.ensure_positive()?;

        let is_member = |m: &str| members.iter().any(|known| known == m);

        if !is_member(&self.paid_by) {
            return Err(GroupError::validation(format!(
                "Payer '{}' is not a member of the group",
                self.paid_by
            )));
        }

        let split_between = self.split.members();
        if split_between.is_empty() {
            return Err(GroupError::validation("Expense must be split between at least one member"));
        }

        let mut seen = HashSet::new();
        for member in &split_between {
            if !is_member(member) {
                return Err(GroupError::validation(format!(
                    "Split member '{}' is not a member of the group",
                    member
                )));
            }
            if !seen.insert(member.as_str()) {
                return Err(GroupError::validation(format!(
                    "Member '{}' appears more than once in the split",
                    member
                )));
            }
        }

        let shares = match &self.split {
            Split::Equal(_) => None,
            Split::Exact(shares) => Some(validate_shares(self.amount, shares)?),
        };

        Ok(EntryKind::Expense {
            description: description.to_string(),
            paid_by: self.paid_by.clone(),
            split_between,
            shares,
        })
    }
}

fn validate_shares(
    amount: Amount,
    shares: &[(String, Amount)],
) -> Result<BTreeMap<String, Amount>, GroupError> {
    for (member, share) in shares {
        if share.is_negative() {
            return Err(GroupError::validation(format!(
                "Share for '{}' cannot be negative",
                member
            )));
        }
        share.ensure_in_range().map_err(|err| {
            GroupError::validation(format!("Share for '{}' is invalid: {}", member, err))
        })?;
    }

    let total = shares
        .iter()
        .try_fold(Amount::zero(), |acc, (_, share)| acc.checked_add(*share))
        .ok_or_else(|| GroupError::validation("Shares add up to more than an amount can hold"))?;
    if total != amount {
        return Err(GroupError::validation(format!(
            "Shares add up to {} but the expense amount is {}",
            total, amount
        )));
    }

    Ok(shares.iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn members() -> Vec<String> {
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    }

    fn split(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_equal_expense_validates() {
        let expense = NewExpense::equal("  Dinner ", Amount::new(dec!(30)), "A", split(&["A", "B"]));
        let kind = expense.validate(&members()).unwrap();

        match kind {
            EntryKind::Expense { description, split_between, shares, .. } => {
                assert_eq!(description, "Dinner");
                assert_eq!(split_between, split(&["A", "B"]));
                assert!(shares.is_none());
            }
            _ => panic!("expected expense"),
        }
    }

    #[test]
    fn test_unknown_payer_rejected() {
        let expense = NewExpense::equal("Dinner", Amount::new(dec!(30)), "Z", split(&["A"]));
        let err = expense.validate(&members()).unwrap_err();
        assert!(err.to_string().contains("Payer 'Z'"));
    }

    #[test]
    fn test_duplicate_split_member_rejected() {
        let expense = NewExpense::equal("Dinner", Amount::new(dec!(30)), "A", split(&["B", "B"]));
        assert!(expense.validate(&members()).unwrap_err().is_validation());
    }

    #[test]
    fn test_blank_description_rejected() {
        let expense = NewExpense::equal("   ", Amount::new(dec!(30)), "A", split(&["B"]));
        assert!(expense.validate(&members()).is_err());
    }

    #[test]
    fn test_exact_shares_must_sum_to_amount() {
        let expense = NewExpense::exact(
            "Hotel",
            Amount::new(dec!(100)),
            "A",
            vec![
                ("A".to_string(), Amount::new(dec!(50))),
                ("B".to_string(), Amount::new(dec!(40))),
            ],
        );
        let err = expense.validate(&members()).unwrap_err();
        assert!(err.to_string().contains("add up to 90.00"));
    }

    #[test]
    fn test_exact_shares_allow_zero_share() {
        let expense = NewExpense::exact(
            "Hotel",
            Amount::new(dec!(100)),
            "A",
            vec![
                ("B".to_string(), Amount::new(dec!(100))),
                ("C".to_string(), Amount::zero()),
            ],
        );
        assert!(expense.validate(&members()).is_ok());
    }

    #[test]
    fn test_negative_share_rejected() {
        let expense = NewExpense::exact(
            "Hotel",
            Amount::new(dec!(10)),
            "A",
            vec![
                ("B".to_string(), Amount::new(dec!(20))),
                ("C".to_string(), Amount::new(dec!(-10))),
            ],
        );
        assert!(expense.validate(&members()).is_err());
    }
}
