//! Pre-built Test Fixtures
//!
//! Ready-to-use groups and amounts. Member names are single letters so
//! expected balances in tests stay readable.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::Amount;
use domain_groups::{Group, NewExpense};
use rust_decimal_macros::dec;

/// Fixture for amounts
pub struct AmountFixtures;

impl AmountFixtures {
    /// 300.00, splits evenly three ways
    pub fn dinner() -> Amount {
        Amount::new(dec!(300.00))
    }

    /// 100.00, leaves one remainder cent in a three-way split
    pub fn hundred() -> Amount {
        Amount::new(dec!(100.00))
    }

    /// 0.01, the smallest accepted amount
    pub fn one_cent() -> Amount {
        Amount::from_minor(1)
    }

    /// Has a sub-cent digit and must be rejected
    pub fn sub_cent() -> Amount {
        Amount::new(dec!(10.005))
    }
}

/// Fixture for member lists
pub struct MemberFixtures;

impl MemberFixtures {
    /// `["A", "B", "C"]`
    pub fn abc() -> Vec<String> {
        names(&["A", "B", "C"])
    }

    /// `["A", "B"]`
    pub fn ab() -> Vec<String> {
        names(&["A", "B"])
    }
}

/// Fixture for dates
pub struct DateFixtures;

impl DateFixtures {
    pub fn march_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 19, 30, 0).unwrap()
    }

    pub fn march_second() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap()
    }
}

/// Fixture for groups
pub struct GroupFixtures;

impl GroupFixtures {
    /// Empty group of A, B and C
    pub fn trip() -> Group {
        Group::create("Trip", MemberFixtures::abc()).unwrap()
    }

    /// A paid 300 for A, B and C: `{A: -200, B: 100, C: 100}`
    pub fn trip_after_dinner() -> Group {
        let mut group = Self::trip();
        group
            .add_expense(NewExpense::equal(
                "Dinner",
                AmountFixtures::dinner(),
                "A",
                MemberFixtures::abc(),
            ))
            .unwrap();
        group
    }
}

/// Turns string literals into owned member names
pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Parses an amount literal
pub fn amount(value: &str) -> Amount {
    value.parse().unwrap()
}
