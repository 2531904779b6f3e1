//! Test Data Builders
//!
//! Builds a group together with a history of expenses and settlements,
//! failing loudly if any step of the history is rejected.

use chrono::{DateTime, Utc};
use core_kernel::Amount;
use domain_groups::{Group, NewExpense};

use crate::fixtures::{names, MemberFixtures};

enum Step {
    Expense(NewExpense),
    Settlement { payer: String, receiver: String, amount: Amount },
    Member(String),
}

/// Builder for groups with a prepared history
pub struct TestGroupBuilder {
    name: String,
    members: Vec<String>,
    steps: Vec<Step>,
}

impl Default for TestGroupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestGroupBuilder {
    /// Creates a builder for a group named "Trip" with members A, B and C
    pub fn new() -> Self {
        Self {
            name: "Trip".to_string(),
            members: MemberFixtures::abc(),
            steps: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_members(mut self, members: &[&str]) -> Self {
        self.members = names(members);
        self
    }

    /// Adds an equally split expense
    pub fn expense(mut self, amount: &str, paid_by: &str, split: &[&str]) -> Self {
        self.steps.push(Step::Expense(NewExpense::equal(
            "Expense",
            parse(amount),
            paid_by,
            names(split),
        )));
        self
    }

    /// Adds an equally split expense on a given date
    pub fn expense_on(
        mut self,
        date: DateTime<Utc>,
        amount: &str,
        paid_by: &str,
        split: &[&str],
    ) -> Self {
        self.steps.push(Step::Expense(
            NewExpense::equal("Expense", parse(amount), paid_by, names(split)).on(date),
        ));
        self
    }

    /// Adds an expense with explicit shares
    pub fn exact_expense(mut self, amount: &str, paid_by: &str, shares: &[(&str, &str)]) -> Self {
        let shares = shares
            .iter()
            .map(|(member, share)| (member.to_string(), parse(share)))
            .collect();
        self.steps
            .push(Step::Expense(NewExpense::exact("Expense", parse(amount), paid_by, shares)));
        self
    }

    pub fn settlement(mut self, payer: &str, receiver: &str, amount: &str) -> Self {
        self.steps.push(Step::Settlement {
            payer: payer.to_string(),
            receiver: receiver.to_string(),
            amount: parse(amount),
        });
        self
    }

    pub fn member(mut self, member: &str) -> Self {
        self.steps.push(Step::Member(member.to_string()));
        self
    }

    /// Builds the group, panicking on the first rejected step
    pub fn build(self) -> Group {
        let mut group = Group::create(self.name, self.members).unwrap();

        for step in self.steps {
            match step {
                Step::Expense(expense) => {
                    group.add_expense(expense).unwrap();
                }
                Step::Settlement { payer, receiver, amount } => {
                    group.settle(&payer, &receiver, amount).unwrap();
                }
                Step::Member(member) => group.add_member(&member).unwrap(),
            }
        }

        group
    }
}

fn parse(value: &str) -> Amount {
    value.parse().unwrap()
}
