//! Custom Test Assertions
//!
//! Ledger invariant checks with messages that show the balances involved.

use core_kernel::Amount;
use domain_groups::Group;

/// Asserts that a group's balances sum to exactly zero
pub fn assert_balances_conserved(group: &Group) {
    let total = group.total_balance();
    assert!(
        total.is_zero(),
        "Balances of group {} sum to {} instead of zero: {:?}",
        group.id(),
        total,
        group.balances()
    );
}

/// Asserts that the cached balances equal a replay of the entry log
pub fn assert_replay_matches(group: &Group) {
    let replayed = group.replayed_balances();
    assert_eq!(
        group.balances(),
        &replayed,
        "Cached balances of group {} differ from the replayed log",
        group.id()
    );
}

/// Asserts that every member has a balance and nobody else does
pub fn assert_balance_keys_match_members(group: &Group) {
    let mut members: Vec<&String> = group.members().iter().collect();
    members.sort();
    let keys: Vec<&String> = group.balances().keys().collect();
    assert_eq!(keys, members, "Balance keys do not match the member list");
}

/// Asserts the three ledger invariants at once
pub fn assert_ledger_consistent(group: &Group) {
    assert_balance_keys_match_members(group);
    assert_balances_conserved(group);
    assert_replay_matches(group);
}

/// Asserts a list of expected balances, e.g. `[("A", "-200"), ("B", "100")]`
pub fn assert_balances(group: &Group, expected: &[(&str, &str)]) {
    for (member, value) in expected {
        let expected: Amount = value.parse().unwrap();
        let actual = group
            .balance_of(member)
            .unwrap_or_else(|| panic!("'{}' is not a member of group {}", member, group.id()));
        assert_eq!(
            actual, expected,
            "Balance of '{}': expected {}, got {}",
            member, expected, actual
        );
    }
}
