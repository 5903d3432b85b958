//! Integration tests for branches, loops, scoped contexts, and the
//! execution hook.

use std::cell::RefCell;
use std::rc::Rc;

use code_object::{opcode, CodeBuilder, Literal};
use interpreter::{ExecutionHook, HookDecision, Vm, VmError};
use value_model::{NativeErrorKind, ObjectHandle, PropertyKey, Value};

fn run(builder: CodeBuilder) -> Result<Value, VmError> {
    Vm::new().run_global(Rc::new(builder.finish()))
}

#[test]
fn test_conditional_branch_selects_else_arm() {
    // if (false) { return 1; } else { return 2; }
    let mut b = CodeBuilder::new(0, 0);
    let one = b.add_literal(Literal::Number(1.0));
    let two = b.add_literal(Literal::Number(2.0));

    b.emit(opcode::PUSH_FALSE);
    let else_branch = b.emit_forward_branch(opcode::BRANCH_IF_FALSE_FORWARD);
    b.emit_literal(opcode::PUSH_LITERAL, one);
    b.emit(opcode::RETURN);
    b.patch_forward_branch(else_branch);
    b.emit_literal(opcode::PUSH_LITERAL, two);
    b.emit(opcode::RETURN);

    assert_eq!(run(b).unwrap(), Value::Integer(2));
}

#[test]
fn test_unconditional_jump_skips_region() {
    let mut b = CodeBuilder::new(0, 0);
    let one = b.add_literal(Literal::Number(1.0));
    let two = b.add_literal(Literal::Number(2.0));

    let skip = b.emit_forward_branch(opcode::JUMP_FORWARD);
    b.emit_literal(opcode::PUSH_LITERAL, one);
    b.emit(opcode::RETURN);
    b.patch_forward_branch(skip);
    b.emit_literal(opcode::PUSH_LITERAL, two);
    b.emit(opcode::RETURN);

    assert_eq!(run(b).unwrap(), Value::Integer(2));
}

#[test]
fn test_counting_loop_runs_to_completion() {
    // r0 = 0; do { r0 = r0 + 1; } while (r0 < 100000); return r0;
    //
    // The iteration count is deliberately large; the loop must not
    // consume host stack per iteration.
    let mut b = CodeBuilder::new(1, 0);
    let zero = b.add_literal(Literal::Number(0.0));
    let one = b.add_literal(Literal::Number(1.0));
    let limit = b.add_literal(Literal::Number(100_000.0));

    b.emit_literal(opcode::PUSH_LITERAL, zero);
    b.emit_store_ident(0);
    let head = b.position();
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit_literal(opcode::PUSH_LITERAL, one);
    b.emit(opcode::ADD);
    b.emit_store_ident(0);
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit_literal(opcode::PUSH_LITERAL, limit);
    b.emit(opcode::LESS);
    b.emit_backward_branch(opcode::BRANCH_IF_TRUE_BACKWARD, head);
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit(opcode::RETURN);

    assert_eq!(run(b).unwrap(), Value::Integer(100_000));
}

#[test]
fn test_block_scope_shadows_and_restores() {
    // x = 1; { let x = 2; r0 = x; } r1 = x; return r0 * 10 + r1;
    let mut b = CodeBuilder::new(2, 0);
    let one = b.add_literal(Literal::Number(1.0));
    let two = b.add_literal(Literal::Number(2.0));
    let ten = b.add_literal(Literal::Number(10.0));
    let name_x = b.add_name("x");

    b.emit_literal(opcode::PUSH_LITERAL, one);
    b.emit_store_ident(name_x); // creates the global binding
    let block = b.emit_forward_branch(opcode::BLOCK_CREATE);
    b.emit_ext_with_literal(opcode::EXT_CREATE_BINDING, name_x);
    b.emit_literal(opcode::PUSH_LITERAL, two);
    b.emit_store_ident(name_x);
    b.emit_literal(opcode::PUSH_LITERAL, name_x);
    b.emit_store_ident(0);
    b.emit(opcode::CONTEXT_END);
    b.patch_forward_branch(block);
    b.emit_literal(opcode::PUSH_LITERAL, name_x);
    b.emit_store_ident(1);
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit_literal(opcode::PUSH_LITERAL, ten);
    b.emit(opcode::MUL);
    b.emit_literal(opcode::PUSH_LITERAL, 1);
    b.emit(opcode::ADD);
    b.emit(opcode::RETURN);

    assert_eq!(run(b).unwrap(), Value::Integer(21));
}

#[test]
fn test_with_statement_resolves_subject_property() {
    // with (subject) { return v; }
    let mut b = CodeBuilder::new(1, 0);
    let subject = b.add_name("subject");
    let name_v = b.add_name("v");

    b.emit_literal(opcode::PUSH_LITERAL, subject);
    let with_branch = b.emit_forward_branch(opcode::WITH_CREATE);
    b.emit_literal(opcode::PUSH_LITERAL, name_v);
    b.emit_store_ident(0);
    b.emit(opcode::CONTEXT_END);
    b.patch_forward_branch(with_branch);
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit(opcode::RETURN);

    let mut vm = Vm::new();
    let object = ObjectHandle::ordinary(None);
    object.set(&PropertyKey::from_str("v"), Value::Integer(42));
    vm.define_global("subject", Value::Object(object));
    assert_eq!(vm.run_global(Rc::new(b.finish())).unwrap(), Value::Integer(42));
}

#[test]
fn test_with_statement_assignment_writes_subject() {
    // with (subject) { v = 9; }
    let mut b = CodeBuilder::new(0, 0);
    let subject = b.add_name("subject");
    let name_v = b.add_name("v");
    let nine = b.add_literal(Literal::Number(9.0));

    b.emit_literal(opcode::PUSH_LITERAL, subject);
    let with_branch = b.emit_forward_branch(opcode::WITH_CREATE);
    b.emit_literal(opcode::PUSH_LITERAL, nine);
    b.emit_store_ident(name_v);
    b.emit(opcode::CONTEXT_END);
    b.patch_forward_branch(with_branch);
    b.emit(opcode::RETURN_UNDEFINED);

    let mut vm = Vm::new();
    let object = ObjectHandle::ordinary(None);
    object.set(&PropertyKey::from_str("v"), Value::Integer(1));
    vm.define_global("subject", Value::Object(object.clone()));
    vm.run_global(Rc::new(b.finish())).unwrap();
    assert_eq!(object.get(&PropertyKey::from_str("v")), Some(Value::Integer(9)));
}

#[test]
fn test_block_result_returned_at_stream_end() {
    // Direct-eval style completion value, no explicit return.
    let mut b = CodeBuilder::new(0, 0);
    let five = b.add_literal(Literal::Number(5.0));
    b.emit_literal(opcode::PUSH_LITERAL, five);
    b.emit_ext(opcode::EXT_BLOCK_RESULT);

    assert_eq!(run(b).unwrap(), Value::Integer(5));
}

#[test]
fn test_stream_end_without_block_result_is_undefined() {
    let mut b = CodeBuilder::new(0, 0);
    b.emit(opcode::NOP);
    assert_eq!(run(b).unwrap(), Value::Undefined);
}

#[test]
fn test_unresolvable_identifier_throws_reference_error() {
    let mut b = CodeBuilder::new(0, 0);
    let missing = b.add_name("missing");
    b.emit_literal(opcode::PUSH_LITERAL, missing);
    b.emit(opcode::RETURN);

    match run(b) {
        Err(VmError::Exception(value)) => {
            let object = value.as_object().expect("error object");
            let (kind, _) = object.as_error().expect("native error");
            assert_eq!(kind, NativeErrorKind::Reference);
        }
        other => panic!("expected reference error, got {:?}", other),
    }
}

#[test]
fn test_typeof_unresolvable_identifier_is_undefined() {
    let mut b = CodeBuilder::new(0, 0);
    let missing = b.add_name("missing");
    b.emit_literal(opcode::TYPEOF_IDENT, missing);
    b.emit(opcode::RETURN);

    assert_eq!(run(b).unwrap(), Value::string("undefined"));
}

struct BranchCounter {
    count: Rc<RefCell<usize>>,
}

impl ExecutionHook for BranchCounter {
    fn on_backward_branch(&mut self) -> HookDecision {
        *self.count.borrow_mut() += 1;
        HookDecision::Continue
    }
}

#[test]
fn test_hook_sees_every_backward_branch_taken() {
    // Five loop iterations take the backward branch four times.
    let mut b = CodeBuilder::new(1, 0);
    let zero = b.add_literal(Literal::Number(0.0));
    let one = b.add_literal(Literal::Number(1.0));
    let five = b.add_literal(Literal::Number(5.0));

    b.emit_literal(opcode::PUSH_LITERAL, zero);
    b.emit_store_ident(0);
    let head = b.position();
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit_literal(opcode::PUSH_LITERAL, one);
    b.emit(opcode::ADD);
    b.emit_store_ident(0);
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit_literal(opcode::PUSH_LITERAL, five);
    b.emit(opcode::LESS);
    b.emit_backward_branch(opcode::BRANCH_IF_TRUE_BACKWARD, head);
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit(opcode::RETURN);

    let count = Rc::new(RefCell::new(0));
    let mut vm = Vm::new();
    vm.set_hook(Box::new(BranchCounter { count: count.clone() }));
    assert_eq!(vm.run_global(Rc::new(b.finish())).unwrap(), Value::Integer(5));
    assert_eq!(*count.borrow(), 4);
}

struct StopOnBranch;

impl ExecutionHook for StopOnBranch {
    fn on_backward_branch(&mut self) -> HookDecision {
        HookDecision::Stop(Value::string("halt"))
    }
}

#[test]
fn test_hook_stop_bypasses_try_catch() {
    // try { while (true) {} } catch (e) { return "caught"; }
    let mut b = CodeBuilder::new(0, 0);
    let caught = b.add_literal(Literal::String("caught".into()));

    let try_branch = b.emit_forward_branch(opcode::TRY_CREATE);
    let head = b.position();
    b.emit(opcode::PUSH_TRUE);
    b.emit_backward_branch(opcode::BRANCH_IF_TRUE_BACKWARD, head);
    b.patch_forward_branch(try_branch);
    let catch_branch = b.emit_forward_branch(opcode::CATCH);
    b.emit(opcode::POP);
    b.emit(opcode::CONTEXT_END);
    b.patch_forward_branch(catch_branch);
    b.emit_literal(opcode::PUSH_LITERAL, caught);
    b.emit(opcode::RETURN);

    let mut vm = Vm::new();
    vm.set_hook(Box::new(StopOnBranch));
    match vm.run_global(Rc::new(b.finish())) {
        Err(VmError::Stopped(value)) => assert_eq!(value, Value::string("halt")),
        other => panic!("expected stop, got {:?}", other),
    }
}

struct StopOnBreakpoint;

impl ExecutionHook for StopOnBreakpoint {
    fn on_breakpoint(&mut self) -> HookDecision {
        HookDecision::Stop(Value::string("paused"))
    }
}

#[test]
fn test_breakpoint_consults_hook() {
    let mut b = CodeBuilder::new(0, 0);
    let one = b.add_literal(Literal::Number(1.0));
    b.emit_ext(opcode::EXT_BREAKPOINT);
    b.emit_literal(opcode::PUSH_LITERAL, one);
    b.emit(opcode::RETURN);

    let mut vm = Vm::new();
    vm.set_hook(Box::new(StopOnBreakpoint));
    match vm.run_global(Rc::new(b.finish())) {
        Err(VmError::Stopped(value)) => assert_eq!(value, Value::string("paused")),
        other => panic!("expected stop, got {:?}", other),
    }
}

#[test]
fn test_breakpoint_without_hook_is_inert() {
    let mut b = CodeBuilder::new(0, 0);
    let one = b.add_literal(Literal::Number(1.0));
    b.emit_ext(opcode::EXT_BREAKPOINT);
    b.emit_literal(opcode::PUSH_LITERAL, one);
    b.emit(opcode::RETURN);

    assert_eq!(run(b).unwrap(), Value::Integer(1));
}
