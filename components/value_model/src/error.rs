//! Error taxonomy.
//!
//! Two worlds, kept apart by design:
//!
//! - [`Thrown`] carries a JavaScript exception value. Engine-raised
//!   TypeError/ReferenceError/RangeError equivalents are real error
//!   objects; all of them are catchable by user `try`/`catch`.
//! - [`EngineFault`] names internal invariant violations (malformed
//!   bytecode, decode-table misses). These are engine bugs: the VM
//!   panics with the fault message and never best-effort continues.

use std::fmt;
use thiserror::Error;

use crate::object::ObjectHandle;
use crate::value::Value;

/// The kind of native JavaScript error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeErrorKind {
    /// Type error (e.g. calling a non-function)
    Type,
    /// Reference to an unresolvable identifier
    Reference,
    /// Value out of allowed range (includes the call-depth guard)
    Range,
    /// Malformed program text (invalid regex template)
    Syntax,
}

impl NativeErrorKind {
    /// The constructor name (`"TypeError"` ...).
    pub fn name(self) -> &'static str {
        match self {
            NativeErrorKind::Type => "TypeError",
            NativeErrorKind::Reference => "ReferenceError",
            NativeErrorKind::Range => "RangeError",
            NativeErrorKind::Syntax => "SyntaxError",
        }
    }
}

/// A thrown JavaScript value in flight between the throw site and the
/// nearest intercepting context (or the outermost `run` call).
#[derive(Debug, Clone)]
pub struct Thrown(pub Value);

impl Thrown {
    /// Raise an engine TypeError.
    pub fn type_error(message: &str) -> Thrown {
        Thrown(Value::Object(ObjectHandle::error(
            NativeErrorKind::Type,
            message,
        )))
    }

    /// Raise an engine ReferenceError.
    pub fn reference_error(message: &str) -> Thrown {
        Thrown(Value::Object(ObjectHandle::error(
            NativeErrorKind::Reference,
            message,
        )))
    }

    /// Raise an engine RangeError.
    pub fn range_error(message: &str) -> Thrown {
        Thrown(Value::Object(ObjectHandle::error(
            NativeErrorKind::Range,
            message,
        )))
    }

    /// Raise an engine SyntaxError.
    pub fn syntax_error(message: &str) -> Thrown {
        Thrown(Value::Object(ObjectHandle::error(
            NativeErrorKind::Syntax,
            message,
        )))
    }

    /// The native kind, when the thrown value is an engine error object.
    pub fn native_kind(&self) -> Option<NativeErrorKind> {
        self.0.as_object().and_then(|o| o.as_error()).map(|(k, _)| k)
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Internal invariant violations; always engine bugs, never JS errors.
#[derive(Debug, Error)]
pub enum EngineFault {
    /// An unassigned opcode byte reached dispatch.
    #[error("illegal opcode 0x{opcode:02X} at offset {offset}")]
    IllegalOpcode {
        /// The offending byte.
        opcode: u8,
        /// Instruction offset.
        offset: usize,
    },
    /// The instruction stream ended inside an instruction.
    #[error("truncated instruction stream at offset {0}")]
    TruncatedStream(usize),
    /// An operand pop found an empty stack.
    #[error("operand stack underflow at offset {0}")]
    StackUnderflow(usize),
    /// A context operation found the wrong record on top.
    #[error("context stack mismatch at offset {0}")]
    ContextMismatch(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thrown_constructors() {
        let t = Thrown::type_error("not callable");
        assert_eq!(t.native_kind(), Some(NativeErrorKind::Type));
        let t = Thrown::range_error("depth");
        assert_eq!(t.native_kind(), Some(NativeErrorKind::Range));
    }

    #[test]
    fn test_plain_value_has_no_native_kind() {
        let t = Thrown(Value::Integer(1));
        assert_eq!(t.native_kind(), None);
    }

    #[test]
    fn test_fault_display() {
        let fault = EngineFault::IllegalOpcode {
            opcode: 0xFD,
            offset: 3,
        };
        assert_eq!(fault.to_string(), "illegal opcode 0xFD at offset 3");
    }
}
