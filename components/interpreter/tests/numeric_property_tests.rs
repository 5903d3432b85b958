//! Property tests checking that the small-integer fast paths agree
//! with the double-precision general paths, plus targeted edge cases.

use interpreter::ops::{self, RelationalOp};
use proptest::prelude::*;
use value_model::Value;

/// Compare results bit-for-bit so `-0.0` and `0.0` stay distinct.
fn bits(value: &Value) -> Option<u64> {
    value.as_number().map(f64::to_bits)
}

proptest! {
    #[test]
    fn prop_add_fast_path_matches_doubles(a in any::<i32>(), b in any::<i32>()) {
        let fast = ops::add(&Value::Integer(a), &Value::Integer(b)).unwrap();
        let slow = ops::add(&Value::Number(a as f64), &Value::Number(b as f64)).unwrap();
        prop_assert_eq!(bits(&fast), bits(&slow));
    }

    #[test]
    fn prop_subtract_fast_path_matches_doubles(a in any::<i32>(), b in any::<i32>()) {
        let fast = ops::subtract(&Value::Integer(a), &Value::Integer(b)).unwrap();
        let slow = ops::subtract(&Value::Number(a as f64), &Value::Number(b as f64)).unwrap();
        prop_assert_eq!(bits(&fast), bits(&slow));
    }

    #[test]
    fn prop_multiply_fast_path_matches_doubles(
        a in -46_340i32..46_340,
        b in -46_340i32..46_340,
    ) {
        // Bounded so the double product stays exact.
        let fast = ops::multiply(&Value::Integer(a), &Value::Integer(b)).unwrap();
        let slow = ops::multiply(&Value::Number(a as f64), &Value::Number(b as f64)).unwrap();
        prop_assert_eq!(bits(&fast), bits(&slow));
    }

    #[test]
    fn prop_remainder_fast_path_matches_doubles(a in any::<i32>(), b in any::<i32>()) {
        let fast = ops::remainder(&Value::Integer(a), &Value::Integer(b)).unwrap();
        let slow = ops::remainder(&Value::Number(a as f64), &Value::Number(b as f64)).unwrap();
        prop_assert_eq!(bits(&fast), bits(&slow));
    }

    #[test]
    fn prop_divide_matches_doubles(a in any::<i32>(), b in any::<i32>()) {
        let fast = ops::divide(&Value::Integer(a), &Value::Integer(b)).unwrap();
        let slow = ops::divide(&Value::Number(a as f64), &Value::Number(b as f64)).unwrap();
        prop_assert_eq!(bits(&fast), bits(&slow));
    }

    #[test]
    fn prop_bitwise_matches_coerced_doubles(a in any::<i32>(), b in any::<i32>()) {
        for op in [ops::shift_left, ops::shift_right, ops::shift_right_unsigned] {
            let fast = op(&Value::Integer(a), &Value::Integer(b)).unwrap();
            let slow = op(&Value::Number(a as f64), &Value::Number(b as f64)).unwrap();
            prop_assert_eq!(bits(&fast), bits(&slow));
        }
    }

    #[test]
    fn prop_relational_matches_doubles(a in any::<i32>(), b in any::<i32>()) {
        for op in [
            RelationalOp::Less,
            RelationalOp::Greater,
            RelationalOp::LessEqual,
            RelationalOp::GreaterEqual,
        ] {
            let fast = ops::relational(&Value::Integer(a), &Value::Integer(b), op).unwrap();
            let slow = ops::relational(
                &Value::Number(a as f64),
                &Value::Number(b as f64),
                op,
            )
            .unwrap();
            prop_assert_eq!(fast, slow);
        }
    }

    #[test]
    fn prop_strict_equality_is_reflexive_for_integers(a in any::<i32>()) {
        prop_assert!(ops::strict(&Value::Integer(a), &Value::Integer(a)));
        prop_assert!(ops::strict(&Value::Integer(a), &Value::Number(a as f64)));
    }
}

#[test]
fn test_add_overflow_promotes_to_double() {
    let result = ops::add(&Value::Integer(i32::MAX), &Value::Integer(1)).unwrap();
    assert_eq!(result, Value::Number(i32::MAX as f64 + 1.0));
}

#[test]
fn test_negate_of_min_integer_promotes() {
    let result = ops::negate(&Value::Integer(i32::MIN)).unwrap();
    assert_eq!(result, Value::Number(-(i32::MIN as f64)));
}

#[test]
fn test_negate_of_zero_is_negative_zero() {
    let result = ops::negate(&Value::Integer(0)).unwrap();
    assert_eq!(bits(&result), Some((-0.0f64).to_bits()));
}

#[test]
fn test_multiply_preserves_negative_zero() {
    let result = ops::multiply(&Value::Integer(0), &Value::Integer(-5)).unwrap();
    assert_eq!(bits(&result), Some((-0.0f64).to_bits()));
}

#[test]
fn test_division_by_zero_is_infinite() {
    let result = ops::divide(&Value::Integer(1), &Value::Integer(0)).unwrap();
    assert_eq!(result, Value::Number(f64::INFINITY));
    let result = ops::divide(&Value::Integer(-1), &Value::Integer(0)).unwrap();
    assert_eq!(result, Value::Number(f64::NEG_INFINITY));
}

#[test]
fn test_shift_count_uses_low_five_bits() {
    let result = ops::shift_left(&Value::Integer(1), &Value::Integer(33)).unwrap();
    assert_eq!(result, Value::Integer(2));
}

#[test]
fn test_relational_with_nan_is_false() {
    for op in [
        RelationalOp::Less,
        RelationalOp::Greater,
        RelationalOp::LessEqual,
        RelationalOp::GreaterEqual,
    ] {
        let result =
            ops::relational(&Value::Number(f64::NAN), &Value::Integer(0), op).unwrap();
        assert!(!result);
    }
}
