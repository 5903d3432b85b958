//! Abstract operations: coercions and comparisons.
//!
//! These implement the ECMAScript conversion semantics the interpreter's
//! generic (non-fast-path) operators are built on: NaN propagation,
//! negative-zero preservation, modular 32-bit conversion for bitwise
//! operators, and BigInt separation from Number arithmetic.

use num_bigint::BigInt;
use num_traits::cast::ToPrimitive;
use num_traits::Zero;
use std::rc::Rc;

use crate::error::Thrown;
use crate::object::{ObjectHandle, PropertyKey};
use crate::value::{format_number, Value};

/// A numeric value after ToNumeric: a double or a BigInt.
#[derive(Debug, Clone)]
pub enum Numeric {
    /// Number track.
    Num(f64),
    /// BigInt track.
    Big(Rc<BigInt>),
}

/// Preferred type for ToPrimitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveHint {
    /// Number-preferring contexts (arithmetic, relational).
    Number,
    /// String-preferring contexts (property keys, ToString).
    String,
}

/// OrdinaryToPrimitive. Only host-implemented `valueOf`/`toString`
/// methods are invoked at this boundary; bytecode-implemented conversion
/// methods are outside the coercion contract and fall back to the
/// default string form.
pub fn to_primitive(value: &Value, hint: PrimitiveHint) -> Result<Value, Thrown> {
    let object = match value {
        Value::Object(object) => object,
        _ => return Ok(value.clone()),
    };
    let method_order = match hint {
        PrimitiveHint::Number => ["valueOf", "toString"],
        PrimitiveHint::String => ["toString", "valueOf"],
    };
    for name in method_order {
        if let Some(Value::Object(method)) = object.get(&PropertyKey::from_str(name)) {
            if let Some(native) = method.as_native() {
                let result = native(value, &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
    }
    Ok(Value::string(&object.display_placeholder()))
}

/// ToNumber. BigInt values refuse implicit conversion (TypeError).
pub fn to_number(value: &Value) -> Result<f64, Thrown> {
    match value {
        Value::Undefined => Ok(f64::NAN),
        Value::Null => Ok(0.0),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Integer(n) => Ok(f64::from(*n)),
        Value::Number(n) => Ok(*n),
        Value::BigInt(_) => Err(Thrown::type_error("cannot convert a BigInt to a number")),
        Value::String(s) => Ok(string_to_number(s)),
        Value::Object(_) => {
            let prim = to_primitive(value, PrimitiveHint::Number)?;
            to_number(&prim)
        }
        Value::RegisterReference(_) => Ok(f64::NAN),
    }
}

/// ToNumeric: the entry point of generic arithmetic.
pub fn to_numeric(value: &Value) -> Result<Numeric, Thrown> {
    let prim = to_primitive(value, PrimitiveHint::Number)?;
    match prim {
        Value::BigInt(n) => Ok(Numeric::Big(n)),
        other => Ok(Numeric::Num(to_number(&other)?)),
    }
}

/// StringToNumber: trimmed, empty string is zero, hex/octal/binary
/// prefixes, `Infinity` spellings.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return match u64::from_str_radix(hex, 16) {
            Ok(v) => v as f64,
            Err(_) => f64::NAN,
        };
    }
    if let Some(oct) = trimmed.strip_prefix("0o").or_else(|| trimmed.strip_prefix("0O")) {
        return match u64::from_str_radix(oct, 8) {
            Ok(v) => v as f64,
            Err(_) => f64::NAN,
        };
    }
    if let Some(bin) = trimmed.strip_prefix("0b").or_else(|| trimmed.strip_prefix("0B")) {
        return match u64::from_str_radix(bin, 2) {
            Ok(v) => v as f64,
            Err(_) => f64::NAN,
        };
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// ToInt32: modular conversion with truncation toward zero.
pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let modulus = 4294967296.0; // 2^32
    let mut m = n.trunc() % modulus;
    if m < 0.0 {
        m += modulus;
    }
    if m >= 2147483648.0 {
        (m - modulus) as i32
    } else {
        m as i32
    }
}

/// ToUint32.
pub fn to_uint32(n: f64) -> u32 {
    to_int32(n) as u32
}

/// ToString.
pub fn to_string_value(value: &Value) -> Result<Rc<str>, Thrown> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Object(_) => {
            let prim = to_primitive(value, PrimitiveHint::String)?;
            match prim {
                Value::Object(object) => Ok(object.display_placeholder().into()),
                other => to_string_value(&other),
            }
        }
        other => Ok(other.to_string().into()),
    }
}

/// ToObject. `undefined` and `null` have no object coercion.
pub fn to_object(value: &Value) -> Result<ObjectHandle, Thrown> {
    match value {
        Value::Undefined | Value::Null => {
            Err(Thrown::type_error("cannot convert undefined or null to object"))
        }
        Value::Object(object) => Ok(object.clone()),
        Value::String(s) => {
            // String exotic wrapper: index properties plus length, so
            // for-in over a string enumerates its indexes.
            let wrapper = ObjectHandle::ordinary(None);
            for (i, ch) in s.chars().enumerate() {
                wrapper.set(
                    &PropertyKey::Index(i as u32),
                    Value::string(&ch.to_string()),
                );
            }
            wrapper.define(
                "length",
                crate::object::Property {
                    value: Value::from_f64(s.chars().count() as f64),
                    enumerable: false,
                    writable: false,
                    configurable: false,
                },
            );
            Ok(wrapper)
        }
        _ => Ok(ObjectHandle::ordinary(None)),
    }
}

/// ToPropertyKey.
pub fn to_property_key(value: &Value) -> Result<PropertyKey, Thrown> {
    match value {
        Value::String(s) => Ok(PropertyKey::from_str(s)),
        Value::Integer(n) if *n >= 0 => Ok(PropertyKey::Index(*n as u32)),
        Value::Number(n) => Ok(PropertyKey::from_str(&format_number(*n))),
        other => {
            let s = to_string_value(other)?;
            Ok(PropertyKey::from_str(&s))
        }
    }
}

/// Strict equality (`===`).
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::BigInt(x), Value::BigInt(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => x.ptr_eq(y),
        _ => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Loose equality (`==`), including the cross-type coercion ladder.
pub fn loose_equals(a: &Value, b: &Value) -> Result<bool, Thrown> {
    if same_type(a, b) {
        return Ok(strict_equals(a, b));
    }
    match (a, b) {
        (Value::Null, Value::Undefined) | (Value::Undefined, Value::Null) => Ok(true),
        (Value::BigInt(x), Value::String(s)) | (Value::String(s), Value::BigInt(x)) => {
            Ok(s.trim().parse::<BigInt>().map(|v| v == **x).unwrap_or(false))
        }
        (Value::BigInt(x), other) | (other, Value::BigInt(x)) if other.as_number().is_some() => {
            let n = other.as_number().unwrap();
            if !n.is_finite() || n.fract() != 0.0 {
                return Ok(false);
            }
            Ok(x.to_f64().map(|v| v == n).unwrap_or(false))
        }
        (Value::Boolean(_), other) => loose_equals(&Value::Number(to_number(a)?), other),
        (other, Value::Boolean(_)) => loose_equals(other, &Value::Number(to_number(b)?)),
        (Value::String(_), other) | (Value::Number(_), other) | (Value::Integer(_), other)
            if other.is_object() =>
        {
            let prim = to_primitive(b, PrimitiveHint::Number)?;
            loose_equals(a, &prim)
        }
        (other, Value::String(_)) | (other, Value::Number(_)) | (other, Value::Integer(_))
            if other.is_object() =>
        {
            let prim = to_primitive(a, PrimitiveHint::Number)?;
            loose_equals(&prim, b)
        }
        (Value::String(s), other) if other.as_number().is_some() => {
            Ok(string_to_number(s) == other.as_number().unwrap())
        }
        (other, Value::String(s)) if other.as_number().is_some() => {
            Ok(other.as_number().unwrap() == string_to_number(s))
        }
        _ => Ok(false),
    }
}

fn same_type(a: &Value, b: &Value) -> bool {
    use std::mem::discriminant;
    if discriminant(a) == discriminant(b) {
        return true;
    }
    // Integer and Number are the same JS type.
    a.as_number().is_some() && b.as_number().is_some()
}

/// Abstract relational comparison (`a < b`). `None` means an
/// incomparable pair (NaN involved).
pub fn less_than(a: &Value, b: &Value) -> Result<Option<bool>, Thrown> {
    let pa = to_primitive(a, PrimitiveHint::Number)?;
    let pb = to_primitive(b, PrimitiveHint::Number)?;
    if let (Value::String(x), Value::String(y)) = (&pa, &pb) {
        return Ok(Some(x.as_ref() < y.as_ref()));
    }
    match (&pa, &pb) {
        (Value::BigInt(x), Value::BigInt(y)) => Ok(Some(x < y)),
        (Value::BigInt(x), other) if other.as_number().is_some() => {
            let n = other.as_number().unwrap();
            if n.is_nan() {
                return Ok(None);
            }
            Ok(Some(x.to_f64().map(|v| v < n).unwrap_or(false)))
        }
        (other, Value::BigInt(y)) if other.as_number().is_some() => {
            let n = other.as_number().unwrap();
            if n.is_nan() {
                return Ok(None);
            }
            Ok(Some(y.to_f64().map(|v| n < v).unwrap_or(false)))
        }
        _ => {
            let x = to_number(&pa)?;
            let y = to_number(&pb)?;
            if x.is_nan() || y.is_nan() {
                Ok(None)
            } else {
                Ok(Some(x < y))
            }
        }
    }
}

/// BigInt zero check helper for division guards.
pub fn bigint_is_zero(n: &BigInt) -> bool {
    n.is_zero()
}
