//! Object model: property maps, prototype chains, callables.
//!
//! Objects are shared, ref-counted handles over interior-mutable data.
//! Property maps are insertion ordered, which is what for-in enumeration
//! order is built on.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

use code_object::CodeObject;

use crate::environment::Environment;
use crate::error::{NativeErrorKind, Thrown};
use crate::value::Value;

/// A property key: either an array index or a string name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKey {
    /// Canonical array index (0 <= i < 2^32 - 1).
    Index(u32),
    /// String-keyed property name.
    Name(Rc<str>),
}

impl PropertyKey {
    /// Build a key from a string, canonicalizing numeric names.
    pub fn from_str(s: &str) -> PropertyKey {
        if let Ok(index) = s.parse::<u32>() {
            // Reject non-canonical spellings like "01".
            if index.to_string() == s && index != u32::MAX {
                return PropertyKey::Index(index);
            }
        }
        PropertyKey::Name(s.into())
    }

    /// The canonical string form of the key.
    pub fn as_name(&self) -> Rc<str> {
        match self {
            PropertyKey::Index(i) => i.to_string().into(),
            PropertyKey::Name(n) => n.clone(),
        }
    }
}

/// One named property with its attributes.
#[derive(Debug, Clone)]
pub struct Property {
    /// The stored value.
    pub value: Value,
    /// Visited by for-in enumeration.
    pub enumerable: bool,
    /// Assignable.
    pub writable: bool,
    /// Deletable / redefinable.
    pub configurable: bool,
}

impl Property {
    /// A plain data property with all attributes set.
    pub fn data(value: Value) -> Property {
        Property {
            value,
            enumerable: true,
            writable: true,
            configurable: true,
        }
    }

    /// A non-enumerable data property (built-ins, `prototype` slots).
    pub fn hidden(value: Value) -> Property {
        Property {
            value,
            enumerable: false,
            writable: true,
            configurable: true,
        }
    }
}

/// Host function signature. `Rc<dyn Fn>` so embedders and tests can
/// capture state.
pub type NativeFn = Rc<dyn Fn(&Value, &[Value]) -> Result<Value, Thrown>>;

/// Payload of a bytecode-implemented function object.
#[derive(Clone)]
pub struct FunctionData {
    /// Compiled body.
    pub code: Rc<CodeObject>,
    /// Environment captured at materialization.
    pub env: Environment,
    /// `this` captured at materialization for arrow functions.
    pub lexical_this: Option<Value>,
    /// Parent-class constructor for derived constructors.
    pub super_constructor: Option<Value>,
}

/// Internal classification of an object.
pub enum ObjectKind {
    /// Plain object.
    Ordinary,
    /// Array with dense element storage and a live `length`.
    Array(Vec<Value>),
    /// Bytecode function (closure over its environment).
    Function(FunctionData),
    /// Host function.
    Native {
        /// Diagnostic name.
        name: Rc<str>,
        /// The callable itself.
        func: NativeFn,
        /// Whether `new` may target it.
        constructable: bool,
    },
    /// Regular expression (compiled from a deferred literal template).
    Regex {
        /// Pattern source text.
        source: Rc<str>,
        /// Flags string.
        flags: Rc<str>,
        /// Compiled matcher.
        compiled: regex::Regex,
    },
    /// Error object carrying its native kind.
    Error {
        /// Which built-in error constructor this corresponds to.
        kind: NativeErrorKind,
        /// The message property, duplicated here for cheap display.
        message: Rc<str>,
    },
}

struct ObjectData {
    kind: ObjectKind,
    properties: IndexMap<Rc<str>, Property>,
    prototype: Option<ObjectHandle>,
}

/// Shared, ref-counted object handle. `clone`/`drop` are the explicit
/// ref-count operations of the engine's ownership contract.
#[derive(Clone)]
pub struct ObjectHandle(Rc<RefCell<ObjectData>>);

impl ObjectHandle {
    fn from_kind(kind: ObjectKind, prototype: Option<ObjectHandle>) -> ObjectHandle {
        ObjectHandle(Rc::new(RefCell::new(ObjectData {
            kind,
            properties: IndexMap::new(),
            prototype,
        })))
    }

    /// Create a plain object.
    pub fn ordinary(prototype: Option<ObjectHandle>) -> ObjectHandle {
        Self::from_kind(ObjectKind::Ordinary, prototype)
    }

    /// Create an array from elements.
    pub fn array(elements: Vec<Value>) -> ObjectHandle {
        Self::from_kind(ObjectKind::Array(elements), None)
    }

    /// Create a bytecode function object. A fresh `prototype` property
    /// (an ordinary object) is attached unless the code is an arrow
    /// function.
    pub fn function(data: FunctionData) -> ObjectHandle {
        let is_arrow = data.code.has_flag(code_object::flags::ARROW);
        let handle = Self::from_kind(ObjectKind::Function(data), None);
        if !is_arrow {
            let proto = ObjectHandle::ordinary(None);
            proto.define("constructor", Property::hidden(Value::Object(handle.clone())));
            handle.define("prototype", Property::hidden(Value::Object(proto)));
        }
        handle
    }

    /// Create a host function object.
    pub fn native(name: &str, constructable: bool, func: NativeFn) -> ObjectHandle {
        Self::from_kind(
            ObjectKind::Native {
                name: name.into(),
                func,
                constructable,
            },
            None,
        )
    }

    /// Create a regex object from a template.
    pub fn regex(source: Rc<str>, flags: Rc<str>) -> Result<ObjectHandle, Thrown> {
        let mut builder = regex::RegexBuilder::new(&source);
        if flags.contains('i') {
            builder.case_insensitive(true);
        }
        if flags.contains('m') {
            builder.multi_line(true);
        }
        if flags.contains('s') {
            builder.dot_matches_new_line(true);
        }
        let compiled = builder.build().map_err(|e| {
            Thrown::syntax_error(&format!("invalid regular expression: {}", e))
        })?;
        let handle = Self::from_kind(
            ObjectKind::Regex {
                source: source.clone(),
                flags: flags.clone(),
                compiled,
            },
            None,
        );
        handle.define("source", Property::hidden(Value::String(source)));
        handle.define("flags", Property::hidden(Value::String(flags)));
        Ok(handle)
    }

    /// Create an error object.
    pub fn error(kind: NativeErrorKind, message: &str) -> ObjectHandle {
        let handle = Self::from_kind(
            ObjectKind::Error {
                kind,
                message: message.into(),
            },
            None,
        );
        handle.define("name", Property::hidden(Value::string(kind.name())));
        handle.define("message", Property::hidden(Value::string(message)));
        handle
    }

    /// Handle identity.
    pub fn ptr_eq(&self, other: &ObjectHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Current reference count; used by resource-accounting tests.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// The prototype handle, if any.
    pub fn prototype(&self) -> Option<ObjectHandle> {
        self.0.borrow().prototype.clone()
    }

    /// Replace the prototype.
    pub fn set_prototype(&self, prototype: Option<ObjectHandle>) {
        self.0.borrow_mut().prototype = prototype;
    }

    /// `[[Get]]`: own lookup, then the prototype chain.
    pub fn get(&self, key: &PropertyKey) -> Option<Value> {
        if let Some(value) = self.get_own(key) {
            return Some(value);
        }
        let mut cursor = self.prototype();
        while let Some(object) = cursor {
            if let Some(value) = object.get_own(key) {
                return Some(value);
            }
            cursor = object.prototype();
        }
        None
    }

    /// Own-property lookup, handling array elements and `length`.
    pub fn get_own(&self, key: &PropertyKey) -> Option<Value> {
        let data = self.0.borrow();
        if let ObjectKind::Array(elements) = &data.kind {
            match key {
                PropertyKey::Index(i) => {
                    if let Some(value) = elements.get(*i as usize) {
                        return Some(value.clone());
                    }
                }
                PropertyKey::Name(name) if name.as_ref() == "length" => {
                    return Some(Value::from_f64(elements.len() as f64));
                }
                _ => {}
            }
        }
        data.properties.get(key.as_name().as_ref()).map(|p| p.value.clone())
    }

    /// `[[Put]]`: write an own property (creating it when absent).
    /// Returns false when the property exists and is non-writable.
    pub fn set(&self, key: &PropertyKey, value: Value) -> bool {
        let mut data = self.0.borrow_mut();
        if let ObjectKind::Array(elements) = &mut data.kind {
            match key {
                PropertyKey::Index(i) => {
                    let index = *i as usize;
                    if index < elements.len() {
                        elements[index] = value;
                    } else {
                        elements.resize(index, Value::Undefined);
                        elements.push(value);
                    }
                    return true;
                }
                PropertyKey::Name(name) if name.as_ref() == "length" => {
                    if let Value::Integer(n) = value {
                        if n >= 0 {
                            elements.resize(n as usize, Value::Undefined);
                            return true;
                        }
                    }
                    return false;
                }
                _ => {}
            }
        }
        let name = key.as_name();
        match data.properties.get_mut(name.as_ref()) {
            Some(property) => {
                if !property.writable {
                    return false;
                }
                property.value = value;
            }
            None => {
                data.properties.insert(name, Property::data(value));
            }
        }
        true
    }

    /// Define an own property with explicit attributes.
    pub fn define(&self, name: &str, property: Property) {
        self.0.borrow_mut().properties.insert(name.into(), property);
    }

    /// `[[Delete]]`. Returns false for non-configurable properties.
    pub fn delete(&self, key: &PropertyKey) -> bool {
        let mut data = self.0.borrow_mut();
        if let ObjectKind::Array(elements) = &mut data.kind {
            if let PropertyKey::Index(i) = key {
                let index = *i as usize;
                if index < elements.len() {
                    elements[index] = Value::Undefined;
                    return true;
                }
            }
        }
        let name = key.as_name();
        match data.properties.get(name.as_ref()) {
            Some(property) if !property.configurable => false,
            Some(_) => {
                data.properties.shift_remove(name.as_ref());
                true
            }
            None => true,
        }
    }

    /// `[[HasProperty]]`: own or inherited.
    pub fn has(&self, key: &PropertyKey) -> bool {
        if self.has_own(key) {
            return true;
        }
        let mut cursor = self.prototype();
        while let Some(object) = cursor {
            if object.has_own(key) {
                return true;
            }
            cursor = object.prototype();
        }
        false
    }

    /// Own-property existence check.
    pub fn has_own(&self, key: &PropertyKey) -> bool {
        let data = self.0.borrow();
        if let ObjectKind::Array(elements) = &data.kind {
            match key {
                PropertyKey::Index(i) => {
                    if (*i as usize) < elements.len() {
                        return true;
                    }
                }
                PropertyKey::Name(name) if name.as_ref() == "length" => return true,
                _ => {}
            }
        }
        data.properties.contains_key(key.as_name().as_ref())
    }

    /// Whether the named own property is enumerable. Array elements are.
    pub fn own_enumerable(&self, name: &str) -> Option<bool> {
        let data = self.0.borrow();
        if let ObjectKind::Array(elements) = &data.kind {
            if let Ok(index) = name.parse::<u32>() {
                if (index as usize) < elements.len() {
                    return Some(true);
                }
            }
            if name == "length" {
                return Some(false);
            }
        }
        data.properties.get(name).map(|p| p.enumerable)
    }

    /// Own string-keyed property names in enumeration order: array
    /// element indexes first, then named properties in insertion order.
    /// The `enumerable` flag is reported alongside each name.
    pub fn own_string_keys(&self) -> Vec<(Rc<str>, bool)> {
        let data = self.0.borrow();
        let mut keys: Vec<(Rc<str>, bool)> = Vec::new();
        if let ObjectKind::Array(elements) = &data.kind {
            for i in 0..elements.len() {
                keys.push((i.to_string().into(), true));
            }
        }
        for (name, property) in &data.properties {
            keys.push((name.clone(), property.enumerable));
        }
        keys
    }

    /// True when the object can be called.
    pub fn is_callable(&self) -> bool {
        matches!(
            self.0.borrow().kind,
            ObjectKind::Function(_) | ObjectKind::Native { .. }
        )
    }

    /// True when the object can be a `new` target.
    pub fn is_constructable(&self) -> bool {
        match &self.0.borrow().kind {
            ObjectKind::Function(data) => !data.code.has_flag(code_object::flags::ARROW),
            ObjectKind::Native { constructable, .. } => *constructable,
            _ => false,
        }
    }

    /// Bytecode-function payload, if this is one.
    pub fn as_function(&self) -> Option<FunctionData> {
        match &self.0.borrow().kind {
            ObjectKind::Function(data) => Some(data.clone()),
            _ => None,
        }
    }

    /// Host-function payload, if this is one.
    pub fn as_native(&self) -> Option<NativeFn> {
        match &self.0.borrow().kind {
            ObjectKind::Native { func, .. } => Some(func.clone()),
            _ => None,
        }
    }

    /// Array elements snapshot, if this is an array.
    pub fn as_array(&self) -> Option<Vec<Value>> {
        match &self.0.borrow().kind {
            ObjectKind::Array(elements) => Some(elements.clone()),
            _ => None,
        }
    }

    /// Error payload, if this is an error object.
    pub fn as_error(&self) -> Option<(NativeErrorKind, Rc<str>)> {
        match &self.0.borrow().kind {
            ObjectKind::Error { kind, message } => Some((*kind, message.clone())),
            _ => None,
        }
    }

    /// Compiled regex, if this is a regex object.
    pub fn as_regex(&self) -> Option<regex::Regex> {
        match &self.0.borrow().kind {
            ObjectKind::Regex { compiled, .. } => Some(compiled.clone()),
            _ => None,
        }
    }

    /// Whether this object is an array.
    pub fn is_array(&self) -> bool {
        matches!(self.0.borrow().kind, ObjectKind::Array(_))
    }

    /// String form used by `Display` on `Value`.
    pub fn display_placeholder(&self) -> String {
        match &self.0.borrow().kind {
            ObjectKind::Ordinary => "[object Object]".to_string(),
            ObjectKind::Array(elements) => elements
                .iter()
                .map(|v| match v {
                    Value::Undefined | Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            ObjectKind::Function(_) => "function () { [bytecode] }".to_string(),
            ObjectKind::Native { name, .. } => {
                format!("function {}() {{ [native code] }}", name)
            }
            ObjectKind::Regex { source, flags, .. } => format!("/{}/{}", source, flags),
            ObjectKind::Error { kind, message } => {
                if message.is_empty() {
                    kind.name().to_string()
                } else {
                    format!("{}: {}", kind.name(), message)
                }
            }
        }
    }
}
