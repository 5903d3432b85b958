//! Iteration protocol boundary.
//!
//! For-of traffic crosses into user objects through a `next` method that
//! must be host-implemented: the dispatch loop cannot re-enter itself
//! from inside an instruction, so bytecode-implemented iterators are a
//! TypeError at this boundary. Arrays and strings get built-in
//! iterators so the common cases need no user protocol object.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Thrown;
use crate::object::{ObjectHandle, Property, PropertyKey};
use crate::value::Value;

/// Property key under which an object may publish its iterator factory.
pub const ITERATOR_KEY: &str = "@@iterator";

/// GetIterator. Resolves the `@@iterator` method when present, otherwise
/// falls back to the built-in array and string iterators.
pub fn get_iterator(value: &Value) -> Result<ObjectHandle, Thrown> {
    if let Value::Object(object) = value {
        if let Some(method) = object.get(&PropertyKey::from_str(ITERATOR_KEY)) {
            let method_object = match method {
                Value::Object(m) => m,
                _ => return Err(Thrown::type_error("@@iterator is not callable")),
            };
            let native = match method_object.as_native() {
                Some(native) => native,
                None => {
                    return Err(Thrown::type_error(
                        "@@iterator must be a host-implemented function",
                    ))
                }
            };
            return match native(value, &[])? {
                Value::Object(iterator) => Ok(iterator),
                _ => Err(Thrown::type_error("iterator result is not an object")),
            };
        }
        if object.is_array() {
            return Ok(array_iterator(object.clone()));
        }
    }
    if let Value::String(s) = value {
        return Ok(string_iterator(s.clone()));
    }
    Err(Thrown::type_error("value is not iterable"))
}

/// IteratorStep followed by IteratorValue. `None` means the iterator is
/// exhausted.
pub fn iterator_step(iterator: &ObjectHandle) -> Result<Option<Value>, Thrown> {
    let next = match iterator.get(&PropertyKey::from_str("next")) {
        Some(Value::Object(next)) => next,
        _ => return Err(Thrown::type_error("iterator has no next method")),
    };
    let native = match next.as_native() {
        Some(native) => native,
        None => {
            return Err(Thrown::type_error(
                "iterator next must be a host-implemented function",
            ))
        }
    };
    let result = match native(&Value::Object(iterator.clone()), &[])? {
        Value::Object(result) => result,
        _ => return Err(Thrown::type_error("iterator result is not an object")),
    };
    let done = result
        .get(&PropertyKey::from_str("done"))
        .map(|v| v.to_boolean())
        .unwrap_or(false);
    if done {
        return Ok(None);
    }
    Ok(Some(
        result
            .get(&PropertyKey::from_str("value"))
            .unwrap_or(Value::Undefined),
    ))
}

/// IteratorClose. Invoked when iteration is abandoned early. A missing
/// or non-host `return` method is ignored; a throwing one propagates.
pub fn close_iterator(iterator: &ObjectHandle) -> Result<(), Thrown> {
    if let Some(Value::Object(method)) = iterator.get(&PropertyKey::from_str("return")) {
        if let Some(native) = method.as_native() {
            native(&Value::Object(iterator.clone()), &[])?;
        }
    }
    Ok(())
}

/// Builds an IteratorResult object.
pub fn iteration_result(value: Value, done: bool) -> Value {
    let result = ObjectHandle::ordinary(None);
    result.set(&PropertyKey::from_str("value"), value);
    result.set(&PropertyKey::from_str("done"), Value::Boolean(done));
    Value::Object(result)
}

fn array_iterator(array: ObjectHandle) -> ObjectHandle {
    let position = Rc::new(RefCell::new(0usize));
    let next = ObjectHandle::native(
        "next",
        false,
        Rc::new(move |_this, _args| {
            let index = *position.borrow();
            let element = array.get_own(&PropertyKey::Index(index as u32));
            match element {
                Some(value) => {
                    *position.borrow_mut() = index + 1;
                    Ok(iteration_result(value, false))
                }
                None => Ok(iteration_result(Value::Undefined, true)),
            }
        }),
    );
    let iterator = ObjectHandle::ordinary(None);
    iterator.define(
        "next",
        Property {
            value: Value::Object(next),
            enumerable: false,
            writable: true,
            configurable: true,
        },
    );
    iterator
}

fn string_iterator(source: Rc<str>) -> ObjectHandle {
    let chars: Vec<Value> = source
        .chars()
        .map(|c| Value::string(&c.to_string()))
        .collect();
    let position = Rc::new(RefCell::new(0usize));
    let next = ObjectHandle::native(
        "next",
        false,
        Rc::new(move |_this, _args| {
            let index = *position.borrow();
            if index < chars.len() {
                *position.borrow_mut() = index + 1;
                Ok(iteration_result(chars[index].clone(), false))
            } else {
                Ok(iteration_result(Value::Undefined, true))
            }
        }),
    );
    let iterator = ObjectHandle::ordinary(None);
    iterator.define(
        "next",
        Property {
            value: Value::Object(next),
            enumerable: false,
            writable: true,
            configurable: true,
        },
    );
    iterator
}
