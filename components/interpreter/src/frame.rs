//! Activation frames.
//!
//! One `Vec<Value>` holds the register window in its low slots with the
//! operand stack growing above it. Context records live in a dedicated
//! side stack (see [`crate::context_stack`]); each records the operand
//! stack height at entry so aborting it can discard temporaries pushed
//! inside its region.

use std::collections::HashMap;
use std::rc::Rc;

use code_object::{flags, CodeObject, Literal};
use value_model::{
    EngineFault, Environment, FunctionData, ObjectHandle, SetOutcome, Thrown, Value,
};

use crate::context_stack::ContextRecord;

/// Why the dispatch loop handed control back to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOperation {
    /// No pending operation; the frame is finished.
    None,
    /// Plain call; callee staged below the arguments, `this` is undefined.
    Call {
        /// Number of staged argument values.
        argc: u8,
    },
    /// Method call; receiver staged below the callee.
    CallMethod {
        /// Number of staged argument values.
        argc: u8,
    },
    /// `new` expression.
    Construct {
        /// Number of staged argument values.
        argc: u8,
    },
    /// `super(...)` in a derived constructor.
    SuperCall {
        /// Number of staged argument values.
        argc: u8,
    },
}

/// One function activation.
pub struct Frame {
    /// The code being executed, shared with its function object.
    pub(crate) code: Rc<CodeObject>,
    /// Registers in `[0, registers_end)`, operand stack above.
    pub(crate) stack: Vec<Value>,
    /// Size of the register window.
    pub(crate) registers_end: usize,
    /// Context record side stack, strict LIFO.
    pub(crate) contexts: Vec<ContextRecord>,
    /// Instruction pointer into `code.bytes`.
    pub(crate) ip: usize,
    /// The `this` binding.
    pub(crate) this_binding: Value,
    /// False in a derived constructor until `super()` has run.
    pub(crate) this_initialized: bool,
    /// Head of the lexical environment chain.
    pub(crate) lex_env: Environment,
    /// Completion value of the last finished statement (eval frames).
    pub(crate) block_result: Value,
    /// Pending call staged for the driver.
    pub(crate) call_operation: CallOperation,
    /// Parent-class constructor available to `super()`.
    pub(crate) super_constructor: Option<Value>,
    /// Deferred literals materialized in this activation, by encoded index.
    materialized: HashMap<u32, Value>,
}

impl Frame {
    /// Create a frame for top-level or eval code.
    pub fn new(code: Rc<CodeObject>, this_binding: Value, lex_env: Environment) -> Frame {
        let registers_end = code.register_count as usize;
        Frame {
            code,
            stack: vec![Value::Undefined; registers_end],
            registers_end,
            contexts: Vec::new(),
            ip: 0,
            this_binding,
            this_initialized: true,
            lex_env,
            block_result: Value::Undefined,
            call_operation: CallOperation::None,
            super_constructor: None,
            materialized: HashMap::new(),
        }
    }

    /// Create a frame for a bytecode function invocation, binding the
    /// arguments into the low registers.
    ///
    /// Registers beyond the supplied arguments start as `undefined`; a
    /// declared rest parameter collects the remainder into a fresh array.
    pub fn for_function(data: &FunctionData, this_arg: Value, args: &[Value]) -> Frame {
        let code = data.code.clone();
        let this_binding = match &data.lexical_this {
            Some(lexical) => lexical.clone(),
            None => this_arg,
        };
        let lex_env = Environment::declarative(Some(data.env.clone()));
        let mut frame = Frame::new(code, this_binding, lex_env);
        frame.super_constructor = data.super_constructor.clone();
        frame.this_initialized = data.super_constructor.is_none();
        frame.bind_arguments(args);
        frame
    }

    pub(crate) fn bind_arguments(&mut self, args: &[Value]) {
        let declared = self.code.argument_count as usize;
        let window = self.registers_end;
        if self.code.has_flag(flags::REST_PARAMETER) && declared > 0 {
            let fixed = declared - 1;
            for (slot, value) in args.iter().take(fixed.min(window)).enumerate() {
                self.stack[slot] = value.clone();
            }
            if fixed < window {
                let rest: Vec<Value> = args.iter().skip(fixed).cloned().collect();
                self.stack[fixed] = Value::Object(ObjectHandle::array(rest));
            }
        } else {
            let bound = args.len().min(declared).min(window);
            for (slot, value) in args.iter().take(bound).enumerate() {
                self.stack[slot] = value.clone();
            }
        }
    }

    /// Number of context records currently on the side stack.
    pub fn context_depth(&self) -> usize {
        self.contexts.len()
    }

    /// Number of operand-stack slots above the register window.
    pub fn operand_depth(&self) -> usize {
        self.stack.len() - self.registers_end
    }

    /// Whether every context record's saved stack mark is at or below
    /// the current stack top, innermost highest. Exposed for invariant
    /// checks in tests.
    pub fn stack_marks_consistent(&self) -> bool {
        let mut previous = self.registers_end;
        for record in &self.contexts {
            let mark = record.stack_mark();
            if mark < previous || mark > self.stack.len() {
                return false;
            }
            previous = mark;
        }
        true
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub(crate) fn pop(&mut self) -> Value {
        if self.stack.len() <= self.registers_end {
            panic!("{}", EngineFault::StackUnderflow(self.ip));
        }
        match self.stack.pop() {
            Some(value) => value,
            None => panic!("{}", EngineFault::StackUnderflow(self.ip)),
        }
    }

    /// Drop operand-stack slots above `mark`.
    pub(crate) fn truncate_stack(&mut self, mark: usize) {
        debug_assert!(mark >= self.registers_end);
        self.stack.truncate(mark);
    }

    pub(crate) fn take_block_result(&mut self) -> Value {
        std::mem::replace(&mut self.block_result, Value::Undefined)
    }

    /// Pop the current lexical environment, restoring its parent.
    pub(crate) fn pop_lex_env(&mut self) {
        if let Some(parent) = self.lex_env.parent() {
            self.lex_env = parent;
        }
    }

    /// Load the value behind an encoded literal index.
    ///
    /// Indexes inside the register window read registers. Pool `Name`
    /// entries resolve through the environment chain when `resolve_names`
    /// is set (identifier position) and load as plain strings otherwise
    /// (property-key position). Deferred function and regex templates are
    /// materialized once per activation and cached.
    pub(crate) fn load_literal(&mut self, index: u32, resolve_names: bool) -> Result<Value, Thrown> {
        if (index as usize) < self.registers_end {
            return Ok(self.stack[index as usize].clone());
        }
        if let Some(cached) = self.materialized.get(&index) {
            return Ok(cached.clone());
        }
        let value = match self.code.literal(index) {
            Literal::Number(n) => return Ok(Value::from_f64(*n)),
            Literal::String(s) => return Ok(Value::String(s.clone())),
            Literal::Name(name) => {
                if !resolve_names {
                    return Ok(Value::String(name.clone()));
                }
                return match self.lex_env.lookup(name) {
                    Some(value) => Ok(value),
                    None => Err(Thrown::reference_error(&format!("{} is not defined", name))),
                };
            }
            Literal::Function(code) => {
                let lexical_this = if code.has_flag(flags::ARROW) {
                    Some(self.this_binding.clone())
                } else {
                    None
                };
                let super_constructor = if code.has_flag(flags::ARROW) {
                    self.super_constructor.clone()
                } else {
                    None
                };
                Value::Object(ObjectHandle::function(FunctionData {
                    code: code.clone(),
                    env: self.lex_env.clone(),
                    lexical_this,
                    super_constructor,
                }))
            }
            Literal::Regex { pattern, flags } => {
                Value::Object(ObjectHandle::regex(pattern.clone(), flags.clone())?)
            }
        };
        self.materialized.insert(index, value.clone());
        Ok(value)
    }

    /// Write through a PutIdentifier target: a register slot, or a bound
    /// identifier on the environment chain.
    pub(crate) fn put_identifier(&mut self, target: u32, value: Value) -> Result<(), Thrown> {
        if (target as usize) < self.registers_end {
            self.stack[target as usize] = value;
            return Ok(());
        }
        let name = match self.code.literal(target).as_name() {
            Some(name) => name.clone(),
            None => panic!("{}", EngineFault::ContextMismatch(self.ip)),
        };
        match self.lex_env.set(&name, value.clone()) {
            SetOutcome::Done => Ok(()),
            SetOutcome::Immutable => {
                if self.code.has_flag(flags::STRICT) {
                    Err(Thrown::type_error(&format!(
                        "assignment to constant variable {}",
                        name
                    )))
                } else {
                    Ok(())
                }
            }
            SetOutcome::NotFound => {
                if self.code.has_flag(flags::STRICT) {
                    Err(Thrown::reference_error(&format!("{} is not defined", name)))
                } else {
                    // Sloppy mode creates the binding on the global record.
                    let mut root = self.lex_env.clone();
                    while let Some(parent) = root.parent() {
                        root = parent;
                    }
                    root.create_binding(&name, value, true);
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use code_object::CodeBuilder;

    fn frame_for(register_count: u32, argument_count: u32, flag_bits: u16) -> FunctionData {
        let mut builder = CodeBuilder::new(register_count, argument_count);
        builder.set_flags(flag_bits);
        builder.emit(code_object::opcode::RETURN_UNDEFINED);
        FunctionData {
            code: Rc::new(builder.finish()),
            env: Environment::declarative(None),
            lexical_this: None,
            super_constructor: None,
        }
    }

    #[test]
    fn test_argument_binding_undefined_fill() {
        let data = frame_for(4, 2, 0);
        let frame = Frame::for_function(&data, Value::Undefined, &[Value::Integer(7)]);
        assert_eq!(frame.stack[0], Value::Integer(7));
        assert_eq!(frame.stack[1], Value::Undefined);
        assert_eq!(frame.stack[3], Value::Undefined);
        assert_eq!(frame.operand_depth(), 0);
    }

    #[test]
    fn test_extra_arguments_dropped() {
        let data = frame_for(2, 1, 0);
        let frame = Frame::for_function(
            &data,
            Value::Undefined,
            &[Value::Integer(1), Value::Integer(2), Value::Integer(3)],
        );
        assert_eq!(frame.stack[0], Value::Integer(1));
        assert_eq!(frame.stack[1], Value::Undefined);
    }

    #[test]
    fn test_rest_parameter_collects_remainder() {
        let data = frame_for(3, 2, flags::REST_PARAMETER);
        let frame = Frame::for_function(
            &data,
            Value::Undefined,
            &[Value::Integer(1), Value::Integer(2), Value::Integer(3)],
        );
        assert_eq!(frame.stack[0], Value::Integer(1));
        let rest = frame.stack[1].as_object().unwrap().as_array().unwrap();
        assert_eq!(rest, vec![Value::Integer(2), Value::Integer(3)]);
    }

    #[test]
    fn test_lexical_this_overrides_receiver() {
        let mut data = frame_for(0, 0, flags::ARROW);
        data.lexical_this = Some(Value::Integer(9));
        let frame = Frame::for_function(&data, Value::Integer(1), &[]);
        assert_eq!(frame.this_binding, Value::Integer(9));
    }

    #[test]
    fn test_register_literal_index_reads_register() {
        let mut builder = CodeBuilder::new(2, 0);
        builder.emit(code_object::opcode::RETURN_UNDEFINED);
        let mut frame = Frame::new(
            Rc::new(builder.finish()),
            Value::Undefined,
            Environment::declarative(None),
        );
        frame.stack[1] = Value::Integer(5);
        assert_eq!(frame.load_literal(1, true).unwrap(), Value::Integer(5));
    }

    #[test]
    fn test_function_template_materialized_once() {
        let mut inner = CodeBuilder::new(0, 0);
        inner.emit(code_object::opcode::RETURN_UNDEFINED);
        let mut builder = CodeBuilder::new(0, 0);
        let idx = builder.add_literal(Literal::Function(Rc::new(inner.finish())));
        builder.emit(code_object::opcode::RETURN_UNDEFINED);
        let mut frame = Frame::new(
            Rc::new(builder.finish()),
            Value::Undefined,
            Environment::declarative(None),
        );
        let first = frame.load_literal(idx, true).unwrap();
        let second = frame.load_literal(idx, true).unwrap();
        assert!(first.as_object().unwrap().ptr_eq(second.as_object().unwrap()));
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn test_pop_into_register_window_panics() {
        let mut builder = CodeBuilder::new(1, 0);
        builder.emit(code_object::opcode::RETURN_UNDEFINED);
        let mut frame = Frame::new(
            Rc::new(builder.finish()),
            Value::Undefined,
            Environment::declarative(None),
        );
        frame.pop();
    }
}
