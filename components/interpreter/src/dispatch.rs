//! The fetch-decode-execute loop.
//!
//! Runs one frame until the stream ends, a call must reenter the driver,
//! or an abrupt completion leaves the frame. Every instruction is routed
//! through the static decode table; operands are fetched into a small
//! fixed-capacity buffer; each dispatch arm returns an explicit
//! continuation decision. Thrown values surface as `Err` from the step
//! function and immediately enter the unwind walker.

use std::rc::Rc;

use arrayvec::ArrayVec;
use code_object::decode::{OpGroup, OperandMode, ResultSink};
use code_object::{decode_entry, flags, opcode};
use value_model::{
    get_iterator, iterator_step, to_object, to_property_key, EngineFault, Environment,
    ObjectHandle, PropertyKey, Thrown, Value,
};

use crate::context_stack::{abort_record, find_finally, ContextRecord, UnwindTarget, Unwound};
use crate::driver::{ExecutionHook, HookDecision};
use crate::frame::{CallOperation, Frame};
use crate::ops;

/// How a frame finished.
pub(crate) enum Completion {
    /// Normal completion or an explicit return.
    Normal(Value),
    /// An uncaught exception leaving the frame.
    Thrown(Value),
    /// The execution hook requested a stop; propagates uncatchably.
    Stopped(Value),
}

/// Why the loop handed control back to the driver.
pub(crate) enum LoopExit {
    /// A call/construct/super-call is staged in the frame.
    CallPending,
    /// The frame is done.
    Finished(Completion),
}

enum Control {
    Next,
    Unwind(UnwindTarget),
    CallPending,
    Stopped(Value),
}

/// Execute instructions from `frame.ip` until an exit condition.
pub(crate) fn run(frame: &mut Frame, hook: &mut Option<Box<dyn ExecutionHook>>) -> LoopExit {
    loop {
        if frame.ip >= frame.code.bytes.len() {
            return LoopExit::Finished(Completion::Normal(frame.take_block_result()));
        }
        let control = match step(frame, hook) {
            Ok(control) => control,
            Err(thrown) => Control::Unwind(UnwindTarget::Throw(thrown.0)),
        };
        match control {
            Control::Next => {}
            Control::CallPending => return LoopExit::CallPending,
            Control::Stopped(value) => return LoopExit::Finished(Completion::Stopped(value)),
            Control::Unwind(target) => match find_finally(frame, target) {
                Unwound::Resumed => {}
                Unwound::Completed(Ok(value)) => {
                    return LoopExit::Finished(Completion::Normal(value))
                }
                Unwound::Completed(Err(value)) => {
                    return LoopExit::Finished(Completion::Thrown(value))
                }
            },
        }
    }
}

/// Deliver a thrown value produced outside the loop (a callee's uncaught
/// exception) into this frame's context stack. `None` means a handler or
/// finally resumed; otherwise the frame is finished.
pub(crate) fn deliver_exception(frame: &mut Frame, value: Value) -> Option<Completion> {
    match find_finally(frame, UnwindTarget::Throw(value)) {
        Unwound::Resumed => None,
        Unwound::Completed(Ok(value)) => Some(Completion::Normal(value)),
        Unwound::Completed(Err(value)) => Some(Completion::Thrown(value)),
    }
}

fn step(frame: &mut Frame, hook: &mut Option<Box<dyn ExecutionHook>>) -> Result<Control, Thrown> {
    let instr_start = frame.ip;
    let first = read_byte(frame);
    let (extended, op) = if first == opcode::EXT_OPCODE {
        (true, read_byte(frame))
    } else {
        (false, first)
    };
    let entry = decode_entry(extended, op);
    if entry.group == OpGroup::Illegal {
        panic!(
            "{}",
            EngineFault::IllegalOpcode {
                opcode: op,
                offset: instr_start
            }
        );
    }

    // PutIdentifier instructions encode the assignment target right
    // after the opcode, before the mode operands.
    let put_target = if entry.sink == ResultSink::PutIdentifier {
        Some(read_literal_index(frame))
    } else {
        None
    };

    // Property keys load names as strings; everywhere else a name
    // literal is an identifier resolved through the environment chain.
    let resolve_names = entry.group != OpGroup::Property;

    let mut operands: ArrayVec<Value, 2> = ArrayVec::new();
    let mut branch_offset = 0usize;
    match entry.mode {
        OperandMode::None => {}
        OperandMode::OneLiteral => {
            let index = read_literal_index(frame);
            operands.push(frame.load_literal(index, resolve_names)?);
        }
        OperandMode::TwoLiterals => {
            let left = read_literal_index(frame);
            let right = read_literal_index(frame);
            operands.push(frame.load_literal(left, resolve_names)?);
            operands.push(frame.load_literal(right, resolve_names)?);
        }
        OperandMode::OneStack => operands.push(frame.pop()),
        OperandMode::TwoStack => {
            let right = frame.pop();
            let left = frame.pop();
            operands.push(left);
            operands.push(right);
        }
        OperandMode::StackAndLiteral => {
            let left = frame.pop();
            let index = read_literal_index(frame);
            operands.push(left);
            operands.push(frame.load_literal(index, resolve_names)?);
        }
        OperandMode::ThisAndLiteral => {
            operands.push(frame.this_binding.clone());
            let index = read_literal_index(frame);
            operands.push(frame.load_literal(index, resolve_names)?);
        }
        OperandMode::Branch => branch_offset = read_branch_offset(frame) as usize,
    }

    let result: Option<Value> = match entry.group {
        OpGroup::Stack => match op {
            opcode::NOP => None,
            opcode::POP => None,
            opcode::DUP => {
                let value = take_one(frame, &mut operands);
                frame.push(value.clone());
                Some(value)
            }
            _ => unreachable!("stack group"),
        },

        OpGroup::Literal => match op {
            opcode::PUSH_LITERAL => Some(take_one(frame, &mut operands)),
            opcode::PUSH_TWO_LITERALS => {
                let (left, right) = take_two(frame, &mut operands);
                frame.push(left);
                Some(right)
            }
            opcode::PUSH_UNDEFINED => Some(Value::Undefined),
            opcode::PUSH_NULL => Some(Value::Null),
            opcode::PUSH_TRUE => Some(Value::Boolean(true)),
            opcode::PUSH_FALSE => Some(Value::Boolean(false)),
            opcode::PUSH_THIS => {
                if !frame.this_initialized {
                    return Err(Thrown::reference_error(
                        "must call super constructor before accessing 'this'",
                    ));
                }
                Some(frame.this_binding.clone())
            }
            _ => unreachable!("literal group"),
        },

        OpGroup::Identifier => match (extended, op) {
            (false, opcode::STORE_IDENT) | (false, opcode::COPY_LITERAL) => {
                Some(take_one(frame, &mut operands))
            }
            (false, opcode::TYPEOF_IDENT) => {
                let index = read_literal_index(frame);
                let name = if (index as usize) < frame.registers_end {
                    frame.stack[index as usize].type_of()
                } else {
                    match frame.code.literal(index).as_name() {
                        Some(ident) => match frame.lex_env.lookup(ident) {
                            Some(value) => value.type_of(),
                            // typeof of an unresolvable identifier is the
                            // one non-throwing unresolved reference.
                            None => "undefined",
                        },
                        None => panic!("{}", EngineFault::ContextMismatch(instr_start)),
                    }
                };
                Some(Value::string(name))
            }
            (true, opcode::EXT_CREATE_BINDING) => {
                let index = read_literal_index(frame);
                match frame.code.literal(index).as_name() {
                    Some(name) => {
                        let name = name.clone();
                        frame.lex_env.create_binding(&name, Value::Undefined, true);
                    }
                    None => panic!("{}", EngineFault::ContextMismatch(instr_start)),
                }
                None
            }
            _ => unreachable!("identifier group"),
        },

        OpGroup::Arithmetic => {
            let (left, right) = take_two(frame, &mut operands);
            Some(match op {
                opcode::ADD | opcode::ADD_TWO_LITERALS | opcode::ADD_RIGHT_LITERAL => {
                    ops::add(&left, &right)?
                }
                opcode::SUB => ops::subtract(&left, &right)?,
                opcode::MUL => ops::multiply(&left, &right)?,
                opcode::DIV => ops::divide(&left, &right)?,
                opcode::MOD => ops::remainder(&left, &right)?,
                _ => unreachable!("arithmetic group"),
            })
        }

        OpGroup::Unary => {
            let value = take_one(frame, &mut operands);
            Some(match op {
                opcode::NEGATE => ops::negate(&value)?,
                opcode::UNARY_PLUS => ops::unary_plus(&value)?,
                opcode::LOGICAL_NOT => Value::Boolean(!value.to_boolean()),
                opcode::BIT_NOT => ops::bit_not(&value)?,
                opcode::TYPEOF => Value::string(value.type_of()),
                opcode::VOID => Value::Undefined,
                _ => unreachable!("unary group"),
            })
        }

        OpGroup::Relational => {
            let (left, right) = take_two(frame, &mut operands);
            Some(Value::Boolean(match op {
                opcode::EQUAL => ops::equals(&left, &right)?,
                opcode::NOT_EQUAL => !ops::equals(&left, &right)?,
                opcode::STRICT_EQUAL => ops::strict(&left, &right),
                opcode::STRICT_NOT_EQUAL => !ops::strict(&left, &right),
                opcode::LESS => ops::relational(&left, &right, ops::RelationalOp::Less)?,
                opcode::GREATER => ops::relational(&left, &right, ops::RelationalOp::Greater)?,
                opcode::LESS_EQUAL => {
                    ops::relational(&left, &right, ops::RelationalOp::LessEqual)?
                }
                opcode::GREATER_EQUAL => {
                    ops::relational(&left, &right, ops::RelationalOp::GreaterEqual)?
                }
                opcode::INSTANCEOF => ops::instance_of(&left, &right)?,
                opcode::IN => ops::has_property(&left, &right)?,
                _ => unreachable!("relational group"),
            }))
        }

        OpGroup::Bitwise => {
            let (left, right) = take_two(frame, &mut operands);
            Some(match op {
                opcode::BIT_AND => ops::bitwise(&left, &right, |a, b| a & b, |a, b| a & b)?,
                opcode::BIT_OR => ops::bitwise(&left, &right, |a, b| a | b, |a, b| a | b)?,
                opcode::BIT_XOR => ops::bitwise(&left, &right, |a, b| a ^ b, |a, b| a ^ b)?,
                opcode::SHIFT_LEFT => ops::shift_left(&left, &right)?,
                opcode::SHIFT_RIGHT => ops::shift_right(&left, &right)?,
                opcode::SHIFT_RIGHT_UNSIGNED => ops::shift_right_unsigned(&left, &right)?,
                _ => unreachable!("bitwise group"),
            })
        }

        OpGroup::Branch => {
            match op {
                opcode::JUMP_FORWARD => frame.ip = instr_start + branch_offset,
                opcode::JUMP_BACKWARD => {
                    if let Some(value) = consult_hook(hook, false) {
                        return Ok(Control::Stopped(value));
                    }
                    frame.ip = instr_start - branch_offset;
                }
                opcode::BRANCH_IF_TRUE_FORWARD | opcode::BRANCH_IF_FALSE_FORWARD => {
                    let condition = frame.pop().to_boolean();
                    let wanted = op == opcode::BRANCH_IF_TRUE_FORWARD;
                    if condition == wanted {
                        frame.ip = instr_start + branch_offset;
                    }
                }
                opcode::BRANCH_IF_TRUE_BACKWARD | opcode::BRANCH_IF_FALSE_BACKWARD => {
                    let condition = frame.pop().to_boolean();
                    let wanted = op == opcode::BRANCH_IF_TRUE_BACKWARD;
                    if condition == wanted {
                        if let Some(value) = consult_hook(hook, false) {
                            return Ok(Control::Stopped(value));
                        }
                        frame.ip = instr_start - branch_offset;
                    }
                }
                _ => unreachable!("branch group"),
            }
            None
        }

        OpGroup::Call => match (extended, op) {
            (false, opcode::CALL) => {
                let argc = read_byte(frame);
                frame.call_operation = CallOperation::Call { argc };
                return Ok(Control::CallPending);
            }
            (false, opcode::CALL_METHOD) => {
                let argc = read_byte(frame);
                frame.call_operation = CallOperation::CallMethod { argc };
                return Ok(Control::CallPending);
            }
            (false, opcode::CONSTRUCT) => {
                let argc = read_byte(frame);
                frame.call_operation = CallOperation::Construct { argc };
                return Ok(Control::CallPending);
            }
            (true, opcode::EXT_SUPER_CALL) => {
                let argc = read_byte(frame);
                frame.call_operation = CallOperation::SuperCall { argc };
                return Ok(Control::CallPending);
            }
            (false, opcode::RETURN) => {
                let value = take_one(frame, &mut operands);
                return Ok(Control::Unwind(UnwindTarget::Return(value)));
            }
            (false, opcode::RETURN_UNDEFINED) => {
                return Ok(Control::Unwind(UnwindTarget::Return(Value::Undefined)));
            }
            _ => unreachable!("call group"),
        },

        OpGroup::Context => return context_op(frame, op, instr_start, branch_offset, operands),

        OpGroup::Iterator => return iterator_op(frame, hook, op, instr_start, branch_offset),

        OpGroup::Property => match (extended, op) {
            (false, opcode::CREATE_OBJECT) => Some(Value::Object(ObjectHandle::ordinary(None))),
            (false, opcode::CREATE_ARRAY) => Some(Value::Object(ObjectHandle::array(Vec::new()))),
            (false, opcode::APPEND_ARRAY) => {
                let count = read_byte(frame) as usize;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(frame.pop());
                }
                values.reverse();
                append_to_array(frame, values, instr_start);
                None
            }
            (false, opcode::GET_PROPERTY) | (false, opcode::GET_PROPERTY_LITERAL)
            | (true, opcode::EXT_GET_THIS_PROPERTY) => {
                let (base, key) = take_two(frame, &mut operands);
                Some(ops::get_property(&base, &key)?)
            }
            (false, opcode::SET_PROPERTY) => Some(take_one(frame, &mut operands)),
            (false, opcode::APPEND_PROPERTY) => {
                let (key, value) = take_two(frame, &mut operands);
                let object = match frame.stack.last() {
                    Some(Value::Object(object)) => object.clone(),
                    _ => panic!("{}", EngineFault::ContextMismatch(instr_start)),
                };
                object.set(&to_property_key(&key)?, value);
                None
            }
            (false, opcode::DELETE_PROPERTY) => {
                let (base, key) = take_two(frame, &mut operands);
                Some(Value::Boolean(match base.as_object() {
                    Some(object) => {
                        let removed = object.delete(&to_property_key(&key)?);
                        if !removed && frame.code.has_flag(flags::STRICT) {
                            return Err(Thrown::type_error(
                                "cannot delete non-configurable property",
                            ));
                        }
                        removed
                    }
                    None => true,
                }))
            }
            (false, opcode::PUSH_REGISTER_REFERENCE) => {
                let index = read_literal_index(frame);
                frame.push(Value::RegisterReference(index));
                frame.push(Value::Undefined);
                None
            }
            _ => unreachable!("property group"),
        },

        OpGroup::Misc => match op {
            opcode::EXT_BREAKPOINT => {
                if let Some(value) = consult_hook(hook, true) {
                    return Ok(Control::Stopped(value));
                }
                None
            }
            opcode::EXT_BLOCK_RESULT => Some(take_one(frame, &mut operands)),
            _ => unreachable!("misc group"),
        },

        OpGroup::Illegal => unreachable!("checked above"),
    };

    if let Some(value) = result {
        match entry.sink {
            ResultSink::Discard => {}
            ResultSink::PushStack => frame.push(value),
            ResultSink::StoreBlockResult => frame.block_result = value,
            ResultSink::PutIdentifier => {
                let target = match put_target {
                    Some(target) => target,
                    None => panic!("{}", EngineFault::ContextMismatch(instr_start)),
                };
                frame.put_identifier(target, value)?;
            }
            ResultSink::PutReference => {
                let key = frame.pop();
                let base = frame.pop();
                put_reference(frame, base, key, value)?;
            }
        }
    }
    Ok(Control::Next)
}

fn context_op(
    frame: &mut Frame,
    op: u8,
    instr_start: usize,
    branch_offset: usize,
    mut operands: ArrayVec<Value, 2>,
) -> Result<Control, Thrown> {
    match op {
        opcode::THROW => {
            let value = take_one(frame, &mut operands);
            Ok(Control::Unwind(UnwindTarget::Throw(value)))
        }
        opcode::TRY_CREATE => {
            frame.contexts.push(ContextRecord::Try {
                end_offset: instr_start + branch_offset,
                stack_mark: frame.stack.len(),
            });
            Ok(Control::Next)
        }
        opcode::CATCH => {
            // Fall-through: the try block completed without throwing.
            match frame.contexts.pop() {
                Some(ContextRecord::Try { stack_mark, .. }) => {
                    frame.truncate_stack(stack_mark);
                }
                _ => panic!("{}", EngineFault::ContextMismatch(instr_start)),
            }
            frame.ip = instr_start + branch_offset;
            Ok(Control::Next)
        }
        opcode::FINALLY => {
            // Fall-through entry; the finally completes with no pending
            // target.
            let stack_mark = match frame.contexts.pop() {
                Some(ContextRecord::Try { stack_mark, .. })
                | Some(ContextRecord::Catch { stack_mark, .. }) => stack_mark,
                _ => panic!("{}", EngineFault::ContextMismatch(instr_start)),
            };
            frame.truncate_stack(stack_mark);
            frame.contexts.push(ContextRecord::FinallyJump {
                end_offset: instr_start + branch_offset,
                stack_mark,
                target: None,
            });
            Ok(Control::Next)
        }
        opcode::CONTEXT_END => {
            let record = match frame.contexts.pop() {
                Some(record) => record,
                None => panic!("{}", EngineFault::ContextMismatch(instr_start)),
            };
            match record {
                ContextRecord::FinallyJump {
                    target, stack_mark, ..
                } => {
                    frame.truncate_stack(stack_mark);
                    match target {
                        Some(offset) => Ok(Control::Unwind(UnwindTarget::Jump(offset))),
                        None => Ok(Control::Next),
                    }
                }
                ContextRecord::FinallyThrow {
                    value, stack_mark, ..
                } => {
                    frame.truncate_stack(stack_mark);
                    Ok(Control::Unwind(UnwindTarget::Throw(value)))
                }
                ContextRecord::FinallyReturn {
                    value, stack_mark, ..
                } => {
                    frame.truncate_stack(stack_mark);
                    Ok(Control::Unwind(UnwindTarget::Return(value)))
                }
                other => {
                    abort_record(frame, other);
                    Ok(Control::Next)
                }
            }
        }
        opcode::JUMP_AND_EXIT_CONTEXT => Ok(Control::Unwind(UnwindTarget::Jump(
            instr_start + branch_offset,
        ))),
        opcode::BLOCK_CREATE => {
            frame.contexts.push(ContextRecord::Block {
                end_offset: instr_start + branch_offset,
                stack_mark: frame.stack.len(),
            });
            frame.lex_env = Environment::declarative(Some(frame.lex_env.clone()));
            Ok(Control::Next)
        }
        opcode::WITH_CREATE => {
            let subject = frame.pop();
            let object = to_object(&subject)?;
            frame.contexts.push(ContextRecord::With {
                end_offset: instr_start + branch_offset,
                stack_mark: frame.stack.len(),
            });
            frame.lex_env = Environment::object_bound(Some(frame.lex_env.clone()), object);
            Ok(Control::Next)
        }
        _ => unreachable!("context group"),
    }
}

fn iterator_op(
    frame: &mut Frame,
    hook: &mut Option<Box<dyn ExecutionHook>>,
    op: u8,
    instr_start: usize,
    branch_offset: usize,
) -> Result<Control, Thrown> {
    match op {
        opcode::FOR_IN_CREATE => {
            let subject = frame.pop();
            let end_offset = instr_start + branch_offset;
            // A null or undefined subject skips the loop entirely.
            if subject.is_nullish() {
                frame.ip = end_offset;
                return Ok(Control::Next);
            }
            let object = to_object(&subject)?;
            let names = collect_for_in_names(&object);
            if names.is_empty() {
                frame.ip = end_offset;
                return Ok(Control::Next);
            }
            frame.contexts.push(ContextRecord::ForIn {
                end_offset,
                stack_mark: frame.stack.len(),
                object,
                names,
                index: 0,
            });
            Ok(Control::Next)
        }
        opcode::FOR_IN_GET_NEXT => {
            let name = match frame.contexts.last() {
                Some(ContextRecord::ForIn { names, index, .. }) => names[*index].clone(),
                _ => panic!("{}", EngineFault::ContextMismatch(instr_start)),
            };
            frame.push(Value::String(name));
            Ok(Control::Next)
        }
        opcode::FOR_IN_HAS_NEXT => {
            let more = match frame.contexts.last_mut() {
                Some(ContextRecord::ForIn {
                    object,
                    names,
                    index,
                    ..
                }) => {
                    // Skip names deleted since enumeration started.
                    *index += 1;
                    while *index < names.len()
                        && !object.has(&PropertyKey::from_str(&names[*index]))
                    {
                        *index += 1;
                    }
                    *index < names.len()
                }
                _ => panic!("{}", EngineFault::ContextMismatch(instr_start)),
            };
            if more {
                if let Some(value) = consult_hook(hook, false) {
                    return Ok(Control::Stopped(value));
                }
                frame.ip = instr_start - branch_offset;
            } else {
                match frame.contexts.pop() {
                    Some(record) => frame.truncate_stack(record.stack_mark()),
                    None => panic!("{}", EngineFault::ContextMismatch(instr_start)),
                }
            }
            Ok(Control::Next)
        }
        opcode::FOR_OF_CREATE => {
            let subject = frame.pop();
            let end_offset = instr_start + branch_offset;
            let iterator = get_iterator(&subject)?;
            match iterator_step(&iterator)? {
                Some(value) => {
                    frame.contexts.push(ContextRecord::ForOf {
                        end_offset,
                        stack_mark: frame.stack.len(),
                        iterator,
                        next_value: Some(value),
                    });
                    Ok(Control::Next)
                }
                None => {
                    // Exhausted before the first iteration.
                    frame.ip = end_offset;
                    Ok(Control::Next)
                }
            }
        }
        opcode::FOR_OF_GET_NEXT => {
            let value = match frame.contexts.last_mut() {
                Some(ContextRecord::ForOf { next_value, .. }) => {
                    next_value.take().unwrap_or(Value::Undefined)
                }
                _ => panic!("{}", EngineFault::ContextMismatch(instr_start)),
            };
            frame.push(value);
            Ok(Control::Next)
        }
        opcode::FOR_OF_HAS_NEXT => {
            let iterator = match frame.contexts.last() {
                Some(ContextRecord::ForOf { iterator, .. }) => iterator.clone(),
                _ => panic!("{}", EngineFault::ContextMismatch(instr_start)),
            };
            match iterator_step(&iterator)? {
                Some(value) => {
                    if let Some(stop) = consult_hook(hook, false) {
                        return Ok(Control::Stopped(stop));
                    }
                    match frame.contexts.last_mut() {
                        Some(ContextRecord::ForOf { next_value, .. }) => {
                            *next_value = Some(value);
                        }
                        _ => panic!("{}", EngineFault::ContextMismatch(instr_start)),
                    }
                    frame.ip = instr_start - branch_offset;
                }
                None => match frame.contexts.pop() {
                    // Normal exhaustion does not notify the iterator.
                    Some(record) => frame.truncate_stack(record.stack_mark()),
                    None => panic!("{}", EngineFault::ContextMismatch(instr_start)),
                },
            }
            Ok(Control::Next)
        }
        _ => unreachable!("iterator group"),
    }
}

/// The single enumeration pass: own and inherited enumerable string
/// keys, first occurrence wins, and a name seen anywhere higher in the
/// chain (enumerable or not) shadows later occurrences.
fn collect_for_in_names(object: &ObjectHandle) -> Vec<Rc<str>> {
    let mut seen: Vec<Rc<str>> = Vec::new();
    let mut names: Vec<Rc<str>> = Vec::new();
    let mut current = Some(object.clone());
    while let Some(link) = current {
        for (name, enumerable) in link.own_string_keys() {
            if seen.iter().any(|s| **s == *name) {
                continue;
            }
            seen.push(name.clone());
            if enumerable {
                names.push(name);
            }
        }
        current = link.prototype();
    }
    names
}

fn append_to_array(frame: &mut Frame, values: Vec<Value>, instr_start: usize) {
    let array = match frame.stack.last() {
        Some(Value::Object(object)) if object.is_array() => object.clone(),
        _ => panic!("{}", EngineFault::ContextMismatch(instr_start)),
    };
    let start = array
        .get_own(&PropertyKey::from_str("length"))
        .and_then(|v| v.as_number())
        .map(|n| n as u32)
        .unwrap_or(0);
    for (i, value) in values.into_iter().enumerate() {
        array.set(&PropertyKey::Index(start + i as u32), value);
    }
}

fn put_reference(frame: &mut Frame, base: Value, key: Value, value: Value) -> Result<(), Thrown> {
    match base {
        Value::RegisterReference(register) => {
            frame.stack[register as usize] = value;
            Ok(())
        }
        Value::Object(object) => {
            let written = object.set(&to_property_key(&key)?, value);
            if !written && frame.code.has_flag(flags::STRICT) {
                Err(Thrown::type_error("cannot assign to read-only property"))
            } else {
                Ok(())
            }
        }
        _ => {
            if frame.code.has_flag(flags::STRICT) {
                Err(Thrown::type_error("cannot create property on a primitive"))
            } else {
                Ok(())
            }
        }
    }
}

fn consult_hook(hook: &mut Option<Box<dyn ExecutionHook>>, breakpoint: bool) -> Option<Value> {
    let hook = hook.as_mut()?;
    let decision = if breakpoint {
        hook.on_breakpoint()
    } else {
        hook.on_backward_branch()
    };
    match decision {
        HookDecision::Continue => None,
        HookDecision::Stop(value) => Some(value),
    }
}

fn read_byte(frame: &mut Frame) -> u8 {
    if frame.ip >= frame.code.bytes.len() {
        panic!("{}", EngineFault::TruncatedStream(frame.ip));
    }
    let byte = frame.code.bytes[frame.ip];
    frame.ip += 1;
    byte
}

fn read_literal_index(frame: &mut Frame) -> u32 {
    let first = read_byte(frame);
    if first & 0x80 == 0 {
        u32::from(first)
    } else {
        let second = read_byte(frame);
        (u32::from(first & 0x7F) << 8) | u32::from(second)
    }
}

fn read_branch_offset(frame: &mut Frame) -> u32 {
    let mut value: u32 = 0;
    loop {
        let byte = read_byte(frame);
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return value;
        }
    }
}

fn take_one(frame: &Frame, operands: &mut ArrayVec<Value, 2>) -> Value {
    match operands.pop() {
        Some(value) => value,
        None => panic!("{}", EngineFault::StackUnderflow(frame.ip)),
    }
}

fn take_two(frame: &Frame, operands: &mut ArrayVec<Value, 2>) -> (Value, Value) {
    let right = take_one(frame, operands);
    let left = take_one(frame, operands);
    (left, right)
}
