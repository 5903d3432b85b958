//! JavaScript value representation.
//!
//! This module provides the core `Value` enum consumed by the VM. Handles
//! are reference counted: `clone` and `drop` are the explicit ref-count
//! increment/decrement of the engine's ownership contract, so every path
//! that must "free on all exits" does so by Rust scope exit.

use num_bigint::BigInt;
use num_traits::Zero;
use std::fmt;
use std::rc::Rc;

use crate::object::ObjectHandle;

/// Represents any JavaScript value.
///
/// Primitive values are stored inline; objects are shared ref-counted
/// handles. The `Integer` variant is the tagged small-integer fast path;
/// `Number` carries every other IEEE 754 double.
///
/// # Examples
///
/// ```
/// use value_model::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Integer(42);
///
/// assert!(!undefined.to_boolean());
/// assert!(number.to_boolean());
/// assert_eq!(number.type_of(), "number");
/// ```
#[derive(Clone)]
pub enum Value {
    /// JavaScript undefined value
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean
    Boolean(bool),
    /// Small integer (fast-path tag)
    Integer(i32),
    /// IEEE 754 double-precision floating point
    Number(f64),
    /// JavaScript BigInt (arbitrary precision)
    BigInt(Rc<BigInt>),
    /// JavaScript string
    String(Rc<str>),
    /// Heap object handle (ordinary objects, arrays, functions, ...)
    Object(ObjectHandle),
    /// VM-internal register-reference marker used by the PUT_REFERENCE
    /// result sink; never observable by scripts.
    RegisterReference(u32),
}

impl Value {
    /// String value helper.
    pub fn string(s: &str) -> Value {
        Value::String(s.into())
    }

    /// ToBoolean per ECMAScript: `undefined`, `null`, `false`, ±0, NaN,
    /// the empty string and `0n` are falsy; everything else is truthy.
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Number(n) => !n.is_nan() && *n != 0.0,
            Value::BigInt(n) => !n.is_zero(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
            Value::RegisterReference(_) => true,
        }
    }

    /// The `typeof` operator result.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object", // historical quirk
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Object(obj) => {
                if obj.is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
            Value::RegisterReference(_) => "object",
        }
    }

    /// True for `undefined` and `null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// True when the value carries an object handle.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// The object handle, if any.
    pub fn as_object(&self) -> Option<&ObjectHandle> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The numeric value when integer- or double-tagged.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(f64::from(*n)),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Narrow an f64 into the integer fast-path tag when it is exactly
    /// representable (integral, in range, not negative zero).
    pub fn from_f64(n: f64) -> Value {
        if n.fract() == 0.0
            && n >= f64::from(i32::MIN)
            && n <= f64::from(i32::MAX)
            && !(n == 0.0 && n.is_sign_negative())
        {
            Value::Integer(n as i32)
        } else {
            Value::Number(n)
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Integer(n) => f.debug_tuple("Integer").field(n).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::BigInt(n) => f.debug_tuple("BigInt").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Object(_) => write!(f, "Object(...)"),
            Value::RegisterReference(r) => {
                f.debug_tuple("RegisterReference").field(r).finish()
            }
        }
    }
}

/// Same-value-ish equality for tests and property maps; numeric variants
/// compare by mathematical value, objects by handle identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Integer(a), Value::Number(b)) | (Value::Number(b), Value::Integer(a)) => {
                f64::from(*a) == *b
            }
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::RegisterReference(a), Value::RegisterReference(b)) => a == b,
            _ => false,
        }
    }
}

/// Implementation of Display following JavaScript's `String()` rules for
/// primitives; objects display a class-dependent placeholder.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::BigInt(n) => write!(f, "{}n", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Object(obj) => write!(f, "{}", obj.display_placeholder()),
            Value::RegisterReference(_) => write!(f, "[register reference]"),
        }
    }
}

/// JavaScript number-to-string conversion for doubles.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        // Integer-valued doubles display without decimal point
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_boolean_basic() {
        assert!(!Value::Undefined.to_boolean());
        assert!(!Value::Null.to_boolean());
        assert!(!Value::Boolean(false).to_boolean());
        assert!(!Value::Integer(0).to_boolean());
        assert!(!Value::Number(f64::NAN).to_boolean());
        assert!(!Value::string("").to_boolean());
        assert!(Value::Boolean(true).to_boolean());
        assert!(Value::Integer(42).to_boolean());
        assert!(Value::Number(-0.5).to_boolean());
    }

    #[test]
    fn test_negative_zero_is_falsy() {
        assert!(!Value::Number(-0.0).to_boolean());
    }

    #[test]
    fn test_type_of_basic() {
        assert_eq!(Value::Undefined.type_of(), "undefined");
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::Integer(1).type_of(), "number");
        assert_eq!(Value::Number(1.5).type_of(), "number");
        assert_eq!(Value::string("x").type_of(), "string");
    }

    #[test]
    fn test_from_f64_narrowing() {
        assert_eq!(Value::from_f64(42.0), Value::Integer(42));
        assert_eq!(Value::from_f64(2.5), Value::Number(2.5));
        assert_eq!(Value::from_f64(1e80), Value::Number(1e80));
        // Negative zero must stay a double; Integer(0) would lose the sign.
        match Value::from_f64(-0.0) {
            Value::Number(n) => assert!(n.is_sign_negative()),
            other => panic!("expected Number(-0.0), got {:?}", other),
        }
    }

    #[test]
    fn test_display_numbers() {
        assert_eq!(Value::Integer(7).to_string(), "7");
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
    }

    #[test]
    fn test_mixed_numeric_equality() {
        assert_eq!(Value::Integer(3), Value::Number(3.0));
        assert_ne!(Value::Integer(3), Value::Number(3.5));
    }
}
