//! Compiled-code representation for the bytecode VM
//!
//! This crate provides the immutable compiled-function artifact consumed by
//! the interpreter:
//!
//! - Byte-stream instruction encoding (main opcode page plus an extended
//!   page behind a prefix byte)
//! - Literal pool with deferred-construction templates
//! - Static decode table mapping opcodes to operand-fetch modes, dispatch
//!   groups and result sinks
//! - `CodeBuilder` for assembling instruction streams
//!
//! # Example
//!
//! ```
//! use code_object::{CodeBuilder, Literal, opcode};
//!
//! let mut builder = CodeBuilder::new(0, 0);
//! let idx = builder.add_literal(Literal::Number(42.0));
//! builder.emit_literal(opcode::PUSH_LITERAL, idx);
//! builder.emit(opcode::RETURN);
//! let code = builder.finish();
//!
//! assert_eq!(code.register_count, 0);
//! assert!(code.bytes.len() > 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod code;
pub mod decode;
pub mod literal;
pub mod opcode;

// Re-export main types at crate root
pub use builder::{CodeBuilder, ForwardBranch};
pub use code::{flags, CodeObject};
pub use decode::{decode_entry, DecodeEntry, OpGroup, OperandMode, ResultSink};
pub use literal::Literal;
