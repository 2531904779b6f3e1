//! Property-Based Test Generators
//!
//! Strategies for random sequences of ledger operations. Operations pick
//! members by index so a sequence can be replayed against any group with
//! enough members; out-of-range indexes wrap around.

use core_kernel::Amount;
use domain_groups::{Group, GroupError, NewExpense};
use proptest::prelude::*;

/// One step in a random ledger history
#[derive(Debug, Clone)]
pub enum LedgerOp {
    /// Equal split; `split` is a bitmask over the members
    EqualExpense { payer: usize, split: u32, minor: i64 },
    /// Exact split of `minor` cents, shares drawn from `weights`
    ExactExpense { payer: usize, weights: Vec<u32>, minor: i64 },
    Settlement { payer: usize, receiver: usize, minor: i64 },
    AddMember,
}

/// Strategy for valid amounts in cents
pub fn amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..10_000_000i64
}

/// Strategy for a positive two-place amount
pub fn amount_strategy() -> impl Strategy<Value = Amount> {
    amount_minor_strategy().prop_map(Amount::from_minor)
}

/// Strategy for a member list of 2 to 6 distinct names
pub fn members_strategy() -> impl Strategy<Value = Vec<String>> {
    (2usize..=6).prop_map(|n| (0..n).map(|i| format!("M{}", i)).collect())
}

/// Strategy for a single ledger operation
pub fn ledger_op_strategy() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        4 => (0usize..16, 1u32..u32::MAX, amount_minor_strategy())
            .prop_map(|(payer, split, minor)| LedgerOp::EqualExpense { payer, split, minor }),
        2 => (0usize..16, prop::collection::vec(0u32..10, 1..6), amount_minor_strategy())
            .prop_map(|(payer, weights, minor)| LedgerOp::ExactExpense { payer, weights, minor }),
        3 => (0usize..16, 0usize..16, amount_minor_strategy())
            .prop_map(|(payer, receiver, minor)| LedgerOp::Settlement { payer, receiver, minor }),
        1 => Just(LedgerOp::AddMember),
    ]
}

/// Strategy for a history of up to `max_len` operations
pub fn ledger_ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<LedgerOp>> {
    prop::collection::vec(ledger_op_strategy(), 0..max_len)
}

impl LedgerOp {
    /// Applies the operation to a group
    ///
    /// Only settlements with `payer == receiver` after wrapping can be
    /// rejected; every other generated operation is valid.
    pub fn apply(&self, group: &mut Group) -> Result<(), GroupError> {
        let members = group.members().to_vec();
        let pick = |i: usize| members[i % members.len()].clone();

        match self {
            LedgerOp::EqualExpense { payer, split, minor } => {
                let mut split_between: Vec<String> = members
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| split & (1 << (i % 32)) != 0)
                    .map(|(_, m)| m.clone())
                    .collect();
                if split_between.is_empty() {
                    split_between.push(pick(*payer));
                }
                group
                    .add_expense(NewExpense::equal(
                        "Generated",
                        Amount::from_minor(*minor),
                        pick(*payer),
                        split_between,
                    ))
                    .map(|_| ())
            }
            LedgerOp::ExactExpense { payer, weights, minor } => {
                let shares = exact_shares(&members, weights, *minor);
                group
                    .add_expense(NewExpense::exact(
                        "Generated",
                        Amount::from_minor(*minor),
                        pick(*payer),
                        shares,
                    ))
                    .map(|_| ())
            }
            LedgerOp::Settlement { payer, receiver, minor } => group
                .settle(&pick(*payer), &pick(*receiver), Amount::from_minor(*minor))
                .map(|_| ()),
            LedgerOp::AddMember => {
                let name = format!("M{}", members.len());
                group.add_member(&name)
            }
        }
    }
}

/// Distributes `minor` cents by weight over the first members, summing exactly
fn exact_shares(members: &[String], weights: &[u32], minor: i64) -> Vec<(String, Amount)> {
    let count = weights.len().min(members.len());
    let weights = &weights[..count];
    let total_weight: i64 = weights.iter().map(|w| i64::from(*w)).sum();

    let mut cents: Vec<i64> = if total_weight == 0 {
        vec![0; count]
    } else {
        weights
            .iter()
            .map(|w| minor * i64::from(*w) / total_weight)
            .collect()
    };
    let assigned: i64 = cents.iter().sum();
    cents[0] += minor - assigned;

    members
        .iter()
        .zip(cents)
        .map(|(m, c)| (m.clone(), Amount::from_minor(c)))
        .collect()
}

/// Builds a group and applies a whole history, skipping rejected steps
pub fn apply_all(members: Vec<String>, ops: &[LedgerOp]) -> Group {
    let mut group = Group::create("Generated", members).unwrap();
    for op in ops {
        let _ = op.apply(&mut group);
    }
    group
}
