//! Operator semantics.
//!
//! Each operator tries an integer/integer or float/float fast path
//! first; the generic path implements the full ECMAScript numeric
//! semantics (ToPrimitive/ToNumeric, NaN propagation, negative zero,
//! 32-bit wraparound, 5-bit shift counts, BigInt pairs, string
//! concatenation for `+`). The fast paths are a pure optimization; the
//! equivalence is covered by a property test in the integration suite.

use std::rc::Rc;

use num_bigint::BigInt;
use value_model::{
    bigint_is_zero, less_than, loose_equals, strict_equals, to_int32, to_number, to_numeric,
    to_object, to_primitive, to_property_key, to_string_value, to_uint32, Numeric, PrimitiveHint,
    Thrown, Value,
};

/// `+`: string concatenation when either primitive is a string,
/// otherwise numeric addition.
pub fn add(left: &Value, right: &Value) -> Result<Value, Thrown> {
    if let (Value::Integer(l), Value::Integer(r)) = (left, right) {
        return Ok(match l.checked_add(*r) {
            Some(sum) => Value::Integer(sum),
            None => Value::from_f64(f64::from(*l) + f64::from(*r)),
        });
    }
    if let (Value::Number(l), Value::Number(r)) = (left, right) {
        return Ok(Value::from_f64(l + r));
    }
    let pl = to_primitive(left, PrimitiveHint::Number)?;
    let pr = to_primitive(right, PrimitiveHint::Number)?;
    if matches!(pl, Value::String(_)) || matches!(pr, Value::String(_)) {
        let mut s = to_string_value(&pl)?.to_string();
        s.push_str(&to_string_value(&pr)?);
        return Ok(Value::string(&s));
    }
    match (to_numeric(&pl)?, to_numeric(&pr)?) {
        (Numeric::Num(l), Numeric::Num(r)) => Ok(Value::from_f64(l + r)),
        (Numeric::Big(l), Numeric::Big(r)) => Ok(Value::BigInt(Rc::new(&*l + &*r))),
        _ => Err(Thrown::type_error("cannot mix BigInt and other types")),
    }
}

/// `-`.
pub fn subtract(left: &Value, right: &Value) -> Result<Value, Thrown> {
    if let (Value::Integer(l), Value::Integer(r)) = (left, right) {
        return Ok(match l.checked_sub(*r) {
            Some(diff) => Value::Integer(diff),
            None => Value::from_f64(f64::from(*l) - f64::from(*r)),
        });
    }
    numeric_binary(left, right, |l, r| l - r, |l, r| l - r)
}

/// `*`. The integer fast path bails out when the result could be a
/// negative zero.
pub fn multiply(left: &Value, right: &Value) -> Result<Value, Thrown> {
    if let (Value::Integer(l), Value::Integer(r)) = (left, right) {
        let zero_result = *l == 0 || *r == 0;
        let negative_operand = *l < 0 || *r < 0;
        if !(zero_result && negative_operand) {
            if let Some(product) = l.checked_mul(*r) {
                return Ok(Value::Integer(product));
            }
        }
    }
    numeric_binary(left, right, |l, r| l * r, |l, r| l * r)
}

/// `/`: always computed as doubles on the Number track.
pub fn divide(left: &Value, right: &Value) -> Result<Value, Thrown> {
    match (to_numeric(left)?, to_numeric(right)?) {
        (Numeric::Num(l), Numeric::Num(r)) => Ok(Value::from_f64(l / r)),
        (Numeric::Big(l), Numeric::Big(r)) => {
            if bigint_is_zero(&r) {
                return Err(Thrown::range_error("division by zero"));
            }
            Ok(Value::BigInt(Rc::new(&*l / &*r)))
        }
        _ => Err(Thrown::type_error("cannot mix BigInt and other types")),
    }
}

/// `%`: sign follows the dividend. The integer fast path requires a
/// positive dividend so it can never produce a negative zero.
pub fn remainder(left: &Value, right: &Value) -> Result<Value, Thrown> {
    if let (Value::Integer(l), Value::Integer(r)) = (left, right) {
        if *l > 0 && *r != 0 {
            return Ok(Value::Integer(l.wrapping_rem(*r)));
        }
    }
    match (to_numeric(left)?, to_numeric(right)?) {
        (Numeric::Num(l), Numeric::Num(r)) => Ok(Value::from_f64(l % r)),
        (Numeric::Big(l), Numeric::Big(r)) => {
            if bigint_is_zero(&r) {
                return Err(Thrown::range_error("division by zero"));
            }
            Ok(Value::BigInt(Rc::new(&*l % &*r)))
        }
        _ => Err(Thrown::type_error("cannot mix BigInt and other types")),
    }
}

/// Unary `-`.
pub fn negate(operand: &Value) -> Result<Value, Thrown> {
    if let Value::Integer(n) = operand {
        if *n != 0 && *n != i32::MIN {
            return Ok(Value::Integer(-n));
        }
    }
    match to_numeric(operand)? {
        Numeric::Num(n) => Ok(Value::from_f64(-n)),
        Numeric::Big(n) => Ok(Value::BigInt(Rc::new(-&*n))),
    }
}

/// Unary `+`: ToNumber, so BigInt operands are a TypeError.
pub fn unary_plus(operand: &Value) -> Result<Value, Thrown> {
    Ok(Value::from_f64(to_number(operand)?))
}

/// `~`.
pub fn bit_not(operand: &Value) -> Result<Value, Thrown> {
    match to_numeric(operand)? {
        Numeric::Num(n) => Ok(Value::Integer(!to_int32(n))),
        Numeric::Big(n) => Ok(Value::BigInt(Rc::new(!&*n))),
    }
}

/// Binary bitwise operators (`&`, `|`, `^`).
pub fn bitwise(
    left: &Value,
    right: &Value,
    int_op: fn(i32, i32) -> i32,
    big_op: fn(&BigInt, &BigInt) -> BigInt,
) -> Result<Value, Thrown> {
    if let (Value::Integer(l), Value::Integer(r)) = (left, right) {
        return Ok(Value::Integer(int_op(*l, *r)));
    }
    match (to_numeric(left)?, to_numeric(right)?) {
        (Numeric::Num(l), Numeric::Num(r)) => Ok(Value::Integer(int_op(to_int32(l), to_int32(r)))),
        (Numeric::Big(l), Numeric::Big(r)) => Ok(Value::BigInt(Rc::new(big_op(&l, &r)))),
        _ => Err(Thrown::type_error("cannot mix BigInt and other types")),
    }
}

/// `<<`: shift count truncated to 5 bits.
pub fn shift_left(left: &Value, right: &Value) -> Result<Value, Thrown> {
    let (l, r) = shift_operands(left, right)?;
    Ok(Value::Integer(l.wrapping_shl(r)))
}

/// `>>`.
pub fn shift_right(left: &Value, right: &Value) -> Result<Value, Thrown> {
    let (l, r) = shift_operands(left, right)?;
    Ok(Value::Integer(l.wrapping_shr(r)))
}

/// `>>>`: unsigned, result re-enters the Number track.
pub fn shift_right_unsigned(left: &Value, right: &Value) -> Result<Value, Thrown> {
    let (l, r) = shift_operands(left, right)?;
    Ok(Value::from_f64(f64::from((l as u32) >> (r & 31))))
}

fn shift_operands(left: &Value, right: &Value) -> Result<(i32, u32), Thrown> {
    if let (Value::Integer(l), Value::Integer(r)) = (left, right) {
        return Ok((*l, (*r as u32) & 31));
    }
    match (to_numeric(left)?, to_numeric(right)?) {
        (Numeric::Num(l), Numeric::Num(r)) => Ok((to_int32(l), to_uint32(r) & 31)),
        _ => Err(Thrown::type_error("BigInt shifts are not supported")),
    }
}

/// `==` / `!=`.
pub fn equals(left: &Value, right: &Value) -> Result<bool, Thrown> {
    if let (Value::Integer(l), Value::Integer(r)) = (left, right) {
        return Ok(l == r);
    }
    loose_equals(left, right)
}

/// `===` / `!==`.
pub fn strict(left: &Value, right: &Value) -> bool {
    strict_equals(left, right)
}

/// The four relational operators, expressed through the abstract
/// comparison with the undefined-on-NaN rule applied.
pub fn relational(left: &Value, right: &Value, op: RelationalOp) -> Result<bool, Thrown> {
    if let (Value::Integer(l), Value::Integer(r)) = (left, right) {
        return Ok(match op {
            RelationalOp::Less => l < r,
            RelationalOp::Greater => l > r,
            RelationalOp::LessEqual => l <= r,
            RelationalOp::GreaterEqual => l >= r,
        });
    }
    Ok(match op {
        RelationalOp::Less => less_than(left, right)?.unwrap_or(false),
        RelationalOp::Greater => less_than(right, left)?.unwrap_or(false),
        RelationalOp::LessEqual => !less_than(right, left)?.unwrap_or(true),
        RelationalOp::GreaterEqual => !less_than(left, right)?.unwrap_or(true),
    })
}

/// Which relational operator is being evaluated.
#[derive(Debug, Clone, Copy)]
pub enum RelationalOp {
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
}

/// `instanceof`: walks the left operand's prototype chain against the
/// right operand's `prototype` property.
pub fn instance_of(left: &Value, right: &Value) -> Result<bool, Thrown> {
    let constructor = match right.as_object() {
        Some(object) if object.is_callable() => object,
        _ => {
            return Err(Thrown::type_error(
                "right-hand side of 'instanceof' is not callable",
            ))
        }
    };
    let prototype = match constructor.get(&value_model::PropertyKey::from_str("prototype")) {
        Some(Value::Object(prototype)) => prototype,
        _ => {
            return Err(Thrown::type_error(
                "constructor prototype is not an object",
            ))
        }
    };
    let mut current = match left.as_object() {
        Some(object) => object.prototype(),
        None => return Ok(false),
    };
    while let Some(link) = current {
        if link.ptr_eq(&prototype) {
            return Ok(true);
        }
        current = link.prototype();
    }
    Ok(false)
}

/// `in`: the right operand must be an object.
pub fn has_property(key: &Value, subject: &Value) -> Result<bool, Thrown> {
    let object = match subject.as_object() {
        Some(object) => object,
        None => {
            return Err(Thrown::type_error(
                "cannot use 'in' operator on a non-object",
            ))
        }
    };
    Ok(object.has(&to_property_key(key)?))
}

/// Property read with primitive receivers coerced through ToObject.
pub fn get_property(base: &Value, key: &Value) -> Result<Value, Thrown> {
    let property_key = to_property_key(key)?;
    let object = to_object(base)?;
    Ok(object.get(&property_key).unwrap_or(Value::Undefined))
}

fn numeric_binary(
    left: &Value,
    right: &Value,
    num_op: fn(f64, f64) -> f64,
    big_op: fn(&BigInt, &BigInt) -> BigInt,
) -> Result<Value, Thrown> {
    match (to_numeric(left)?, to_numeric(right)?) {
        (Numeric::Num(l), Numeric::Num(r)) => Ok(Value::from_f64(num_op(l, r))),
        (Numeric::Big(l), Numeric::Big(r)) => Ok(Value::BigInt(Rc::new(big_op(&l, &r)))),
        _ => Err(Thrown::type_error("cannot mix BigInt and other types")),
    }
}
