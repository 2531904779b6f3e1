//! Unit tests for the Amount type
//!
//! Tests cover creation, predicates, arithmetic, validation of external
//! amounts, and cent-exact allocation.

use core_kernel::{Amount, MoneyError};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_keeps_value() {
        let a = Amount::new(dec!(100.50));
        assert_eq!(a.value(), dec!(100.50));
    }

    #[test]
    fn test_from_minor_converts_cents() {
        assert_eq!(Amount::from_minor(10050).value(), dec!(100.50));
        assert_eq!(Amount::from_minor(-1).value(), dec!(-0.01));
    }

    #[test]
    fn test_zero_and_default_agree() {
        assert_eq!(Amount::zero(), Amount::default());
        assert!(Amount::zero().is_zero());
    }

    #[test]
    fn test_parse_from_str() {
        let a: Amount = " 42.10 ".parse().unwrap();
        assert_eq!(a, Amount::new(dec!(42.1)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let result = "forty".parse::<Amount>();
        assert!(matches!(result, Err(MoneyError::InvalidAmount(_))));
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_sign_predicates() {
        assert!(Amount::new(dec!(0.01)).is_positive());
        assert!(Amount::new(dec!(-0.01)).is_negative());
        assert!(!Amount::zero().is_positive());
        assert!(!Amount::zero().is_negative());
    }

    #[test]
    fn test_has_money_scale_ignores_trailing_zeros() {
        assert!(Amount::new(dec!(10.500)).has_money_scale());
        assert!(!Amount::new(dec!(10.505)).has_money_scale());
    }

    #[test]
    fn test_abs() {
        assert_eq!(Amount::new(dec!(-7.25)).abs(), Amount::new(dec!(7.25)));
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_add_sub_neg() {
        let a = Amount::new(dec!(100));
        let b = Amount::new(dec!(33.33));
        assert_eq!(a + b, Amount::new(dec!(133.33)));
        assert_eq!(a - b, Amount::new(dec!(66.67)));
        assert_eq!(-a, Amount::new(dec!(-100)));
    }

    #[test]
    fn test_assign_operators() {
        let mut a = Amount::zero();
        a += Amount::new(dec!(5));
        a -= Amount::new(dec!(7.5));
        assert_eq!(a, Amount::new(dec!(-2.5)));
    }

    #[test]
    fn test_sum_of_owned_and_borrowed() {
        let parts = vec![Amount::new(dec!(1)), Amount::new(dec!(2)), Amount::new(dec!(-3))];
        let borrowed: Amount = parts.iter().sum();
        let owned: Amount = parts.into_iter().sum();
        assert!(borrowed.is_zero());
        assert_eq!(borrowed, owned);
    }
}

mod validation {
    use super::*;

    #[test]
    fn test_ensure_positive_accepts_cents() {
        let a = Amount::new(dec!(19.99)).ensure_positive().unwrap();
        assert_eq!(a.value(), dec!(19.99));
    }

    #[test]
    fn test_ensure_positive_rejects_negative() {
        let result = Amount::new(dec!(-1)).ensure_positive();
        assert!(matches!(result, Err(MoneyError::NotPositive(_))));
    }

    #[test]
    fn test_to_minor() {
        assert_eq!(Amount::new(dec!(12.34)).to_minor().unwrap(), 1234);
        assert!(matches!(
            Amount::new(dec!(0.001)).to_minor(),
            Err(MoneyError::ExcessPrecision(_))
        ));
    }
}

mod allocation {
    use super::*;

    #[test]
    fn test_allocate_even_split() {
        let parts = Amount::new(dec!(300)).allocate(3).unwrap();
        assert!(parts.iter().all(|p| *p == Amount::new(dec!(100))));
    }

    #[test]
    fn test_allocate_remainder_goes_first() {
        let parts = Amount::new(dec!(0.05)).allocate(3).unwrap();
        assert_eq!(
            parts,
            vec![Amount::from_minor(2), Amount::from_minor(2), Amount::from_minor(1)]
        );
    }

    #[test]
    fn test_allocate_more_parts_than_cents() {
        let parts = Amount::new(dec!(0.02)).allocate(4).unwrap();
        let total: Amount = parts.iter().sum();
        assert_eq!(total, Amount::new(dec!(0.02)));
        assert_eq!(parts[3], Amount::zero());
    }

    #[test]
    fn test_allocate_negative_fails() {
        let result = Amount::new(dec!(-10)).allocate(2);
        assert!(matches!(result, Err(MoneyError::InvalidAmount(_))));
    }
}

mod serialization {
    use super::*;

    #[test]
    fn test_deserializes_from_number_and_string() {
        let from_number: Amount = serde_json::from_str("12.5").unwrap();
        let from_string: Amount = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn test_serializes_with_two_places() {
        assert_eq!(serde_json::to_string(&Amount::zero()).unwrap(), "\"0.00\"");
        assert_eq!(serde_json::to_string(&Amount::new(dec!(-200))).unwrap(), "\"-200.00\"");
    }

    #[test]
    fn test_sub_cent_values_are_not_rounded() {
        assert_eq!(serde_json::to_string(&Amount::new(dec!(0.125))).unwrap(), "\"0.125\"");
    }
}
