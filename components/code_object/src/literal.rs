//! Literal pool entries
//!
//! The pool stores plain values plus deferred-construction templates that
//! the interpreter materializes lazily, once per activation.

use std::rc::Rc;

use crate::code::CodeObject;

/// One entry of a code object's literal pool.
#[derive(Debug, Clone)]
pub enum Literal {
    /// Numeric literal.
    Number(f64),
    /// String literal.
    String(Rc<str>),
    /// Identifier name; resolved against the lexical environment chain
    /// (or the register window, for indexes below `register_count`).
    Name(Rc<str>),
    /// Deferred nested-function template. Constructed into a function
    /// object the first time the literal is reached in an activation.
    Function(Rc<CodeObject>),
    /// Deferred regular-expression template (pattern, flags). Compiled
    /// the first time the literal is reached in an activation.
    Regex {
        /// Regular expression pattern source.
        pattern: Rc<str>,
        /// Flags string (`i`, `m`, ...).
        flags: Rc<str>,
    },
}

impl Literal {
    /// Returns the identifier name if this literal is a `Name`.
    pub fn as_name(&self) -> Option<&Rc<str>> {
        match self {
            Literal::Name(name) => Some(name),
            _ => None,
        }
    }

    /// True for deferred-construction templates (functions, regexes).
    pub fn is_template(&self) -> bool {
        matches!(self, Literal::Function(_) | Literal::Regex { .. })
    }
}
