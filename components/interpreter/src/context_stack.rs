//! Context records and the Find-Finally unwind walker.
//!
//! Structured control constructs (try/catch/finally, `with`, block
//! scopes, for-in, for-of) are reified as tagged records on a dedicated
//! side stack, strict LIFO. Unwinding never uses the host stack: the
//! walker processes records innermost-first, converting try records into
//! catch or finally continuations in place, aborting everything else,
//! and propagating out of the frame when the stack empties.

use std::rc::Rc;

use code_object::opcode;
use value_model::{close_iterator, ObjectHandle, Value};

use crate::frame::Frame;

/// One reified control-flow region.
///
/// Every record stores the operand-stack height at entry (`stack_mark`)
/// and the byte offset bounding its region (`end_offset`): for `Try` the
/// position of the catch/finally prologue, for everything else the first
/// instruction past the region.
pub(crate) enum ContextRecord {
    /// An armed try region; `end_offset` points at its prologue.
    Try { end_offset: usize, stack_mark: usize },
    /// A running catch handler.
    Catch { end_offset: usize, stack_mark: usize },
    /// A running finally entered by normal completion or a jump.
    FinallyJump {
        end_offset: usize,
        stack_mark: usize,
        /// Resume target once the finally completes, when the finally
        /// intercepted a jump; `None` for plain fall-through entry.
        target: Option<usize>,
    },
    /// A running finally holding a thrown value to re-raise.
    FinallyThrow {
        end_offset: usize,
        stack_mark: usize,
        value: Value,
    },
    /// A running finally holding a return value to deliver.
    FinallyReturn {
        end_offset: usize,
        stack_mark: usize,
        value: Value,
    },
    /// A `with` region; owns one object-bound lexical environment.
    With { end_offset: usize, stack_mark: usize },
    /// A lexical block region; owns one declarative environment.
    Block { end_offset: usize, stack_mark: usize },
    /// A for-in region owning the collected name list.
    ForIn {
        end_offset: usize,
        stack_mark: usize,
        object: ObjectHandle,
        names: Vec<Rc<str>>,
        index: usize,
    },
    /// A for-of region owning the iterator and the pending step value.
    ForOf {
        end_offset: usize,
        stack_mark: usize,
        iterator: ObjectHandle,
        next_value: Option<Value>,
    },
}

impl ContextRecord {
    pub(crate) fn stack_mark(&self) -> usize {
        match self {
            ContextRecord::Try { stack_mark, .. }
            | ContextRecord::Catch { stack_mark, .. }
            | ContextRecord::FinallyJump { stack_mark, .. }
            | ContextRecord::FinallyThrow { stack_mark, .. }
            | ContextRecord::FinallyReturn { stack_mark, .. }
            | ContextRecord::With { stack_mark, .. }
            | ContextRecord::Block { stack_mark, .. }
            | ContextRecord::ForIn { stack_mark, .. }
            | ContextRecord::ForOf { stack_mark, .. } => *stack_mark,
        }
    }

    pub(crate) fn end_offset(&self) -> usize {
        match self {
            ContextRecord::Try { end_offset, .. }
            | ContextRecord::Catch { end_offset, .. }
            | ContextRecord::FinallyJump { end_offset, .. }
            | ContextRecord::FinallyThrow { end_offset, .. }
            | ContextRecord::FinallyReturn { end_offset, .. }
            | ContextRecord::With { end_offset, .. }
            | ContextRecord::Block { end_offset, .. }
            | ContextRecord::ForIn { end_offset, .. }
            | ContextRecord::ForOf { end_offset, .. } => *end_offset,
        }
    }

    fn owns_lex_env(&self) -> bool {
        matches!(self, ContextRecord::With { .. } | ContextRecord::Block { .. })
    }
}

/// What the unwind walker is looking for.
pub(crate) enum UnwindTarget {
    /// `break`/`continue` crossing context regions.
    Jump(usize),
    /// An exception in flight.
    Throw(Value),
    /// A return statement delivering its value.
    Return(Value),
}

/// Outcome of a Find-Finally walk.
pub(crate) enum Unwound {
    /// A handler or finally took over; `frame.ip` is positioned.
    Resumed,
    /// The frame completed: `Ok` carries a return value, `Err` a thrown
    /// value propagating to the caller.
    Completed(Result<Value, Value>),
}

/// Type-specific cleanup when a record is discarded without reaching its
/// normal exit. Drops owned payloads, restores the lexical environment,
/// and discards operand-stack temporaries pushed inside the region.
pub(crate) fn abort_record(frame: &mut Frame, record: ContextRecord) {
    if record.owns_lex_env() {
        frame.pop_lex_env();
    }
    if let ContextRecord::ForOf { ref iterator, .. } = record {
        // Abandoning iteration early still notifies the iterator; a
        // throwing close handler loses to the unwind already in flight.
        let _ = close_iterator(iterator);
    }
    frame.truncate_stack(record.stack_mark());
}

/// The central unwind primitive. Walks the context stack innermost-first
/// until the target is delivered, a catch handler intercepts a throw, or
/// a finally intercepts any target kind.
pub(crate) fn find_finally(frame: &mut Frame, target: UnwindTarget) -> Unwound {
    let mut target = target;
    loop {
        let Some(record) = frame.contexts.pop() else {
            return match target {
                UnwindTarget::Jump(offset) => {
                    frame.ip = offset;
                    Unwound::Resumed
                }
                UnwindTarget::Throw(value) => Unwound::Completed(Err(value)),
                UnwindTarget::Return(value) => Unwound::Completed(Ok(value)),
            };
        };

        // A jump landing inside the innermost region needs no context
        // work at all.
        if let UnwindTarget::Jump(offset) = target {
            if offset < record.end_offset() {
                frame.contexts.push(record);
                frame.ip = offset;
                return Unwound::Resumed;
            }
        }

        match record {
            ContextRecord::Try {
                end_offset,
                stack_mark,
            } => {
                let (extended, prologue) = frame.code.opcode_at(end_offset);
                if !extended && prologue == opcode::CATCH {
                    match target {
                        UnwindTarget::Throw(value) => {
                            // Handler found: become a catch region bounded
                            // by the prologue's branch target, deliver the
                            // value.
                            let catch_end =
                                end_offset + frame.code.branch_operand(end_offset) as usize;
                            frame.contexts.push(ContextRecord::Catch {
                                end_offset: catch_end,
                                stack_mark,
                            });
                            frame.truncate_stack(stack_mark);
                            frame.push(value);
                            frame.ip =
                                end_offset + frame.code.branch_instruction_len(end_offset);
                            return Unwound::Resumed;
                        }
                        other => {
                            // Jump/return passes straight through a
                            // catch-only try.
                            target = other;
                            frame.truncate_stack(stack_mark);
                            continue;
                        }
                    }
                }
                if !extended && prologue == opcode::FINALLY {
                    // Finally found: it supersedes the original target
                    // until it completes normally.
                    let finally_end =
                        end_offset + frame.code.branch_operand(end_offset) as usize;
                    let converted = match target {
                        UnwindTarget::Jump(offset) => ContextRecord::FinallyJump {
                            end_offset: finally_end,
                            stack_mark,
                            target: Some(offset),
                        },
                        UnwindTarget::Throw(value) => ContextRecord::FinallyThrow {
                            end_offset: finally_end,
                            stack_mark,
                            value,
                        },
                        UnwindTarget::Return(value) => ContextRecord::FinallyReturn {
                            end_offset: finally_end,
                            stack_mark,
                            value,
                        },
                    };
                    frame.contexts.push(converted);
                    frame.truncate_stack(stack_mark);
                    frame.ip = end_offset + frame.code.branch_instruction_len(end_offset);
                    return Unwound::Resumed;
                }
                // A try whose prologue the target kind ignores.
                frame.truncate_stack(stack_mark);
            }
            ContextRecord::Catch { stack_mark, .. } => {
                // A catch handler being abandoned never re-arms: its
                // construct's finally, if any, lives in an enclosing
                // record. Discard and keep walking.
                frame.truncate_stack(stack_mark);
            }
            other => abort_record(frame, other),
        }
    }
}
