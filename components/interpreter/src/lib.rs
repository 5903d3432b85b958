//! Bytecode interpreter: dispatch loop, context stack, call driver.
//!
//! The engine core. Executes [`code_object::CodeObject`] streams over
//! the [`value_model`] runtime: a table-driven fetch-decode-execute
//! loop, reified context records for structured control flow
//! (try/catch/finally, `with`, block scopes, for-in, for-of), and a
//! trampoline call driver so host-stack depth tracks JS call depth only.
//!
//! # Overview
//!
//! - [`Vm`] - Global state and the sole execution entry point
//! - [`Frame`] - One function activation
//! - [`ExecutionHook`] - Watchdog/breakpoint callback
//! - [`VmError`] - How a top-level run fails
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//! use code_object::{opcode, CodeBuilder, Literal};
//! use interpreter::Vm;
//! use value_model::Value;
//!
//! let mut builder = CodeBuilder::new(0, 0);
//! let greeting = builder.add_literal(Literal::String("hi".into()));
//! builder.emit_literal(opcode::PUSH_LITERAL, greeting);
//! builder.emit(opcode::RETURN);
//!
//! let mut vm = Vm::new();
//! assert_eq!(
//!     vm.run_global(Rc::new(builder.finish())).unwrap(),
//!     Value::string("hi")
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod context_stack;
mod dispatch;
mod driver;
mod frame;
pub mod ops;

pub use driver::{ExecutionHook, HookDecision, Vm, VmError};
pub use frame::{CallOperation, Frame};
