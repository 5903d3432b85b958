//! JavaScript value representation and runtime object model.
//!
//! This crate provides the data layer the interpreter executes over:
//! tagged values, reference-counted objects, lexical environments,
//! abstract conversion operations, and the iteration protocol.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`ObjectHandle`] - Shared, mutable runtime objects
//! - [`Environment`] - Lexical scope chains
//! - [`Thrown`] - Catchable JavaScript exceptions
//! - [`EngineFault`] - Unrecoverable engine-level faults
//!
//! # Examples
//!
//! ```
//! use value_model::{ObjectHandle, PropertyKey, Value};
//!
//! let object = ObjectHandle::ordinary(None);
//! object.set(&PropertyKey::from_str("answer"), Value::Integer(42));
//! assert_eq!(
//!     object.get(&PropertyKey::from_str("answer")),
//!     Some(Value::Integer(42))
//! );
//! assert_eq!(Value::Object(object).type_of(), "object");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod convert;
mod environment;
mod error;
mod iterator;
mod object;
mod value;

pub use convert::{
    bigint_is_zero, less_than, loose_equals, strict_equals, string_to_number, to_int32,
    to_number, to_numeric, to_object, to_primitive, to_property_key, to_string_value, to_uint32,
    Numeric, PrimitiveHint,
};
pub use environment::{Environment, SetOutcome};
pub use error::{EngineFault, NativeErrorKind, Thrown};
pub use iterator::{
    close_iterator, get_iterator, iteration_result, iterator_step, ITERATOR_KEY,
};
pub use object::{
    FunctionData, NativeFn, ObjectHandle, ObjectKind, Property, PropertyKey,
};
pub use value::{format_number, Value};
