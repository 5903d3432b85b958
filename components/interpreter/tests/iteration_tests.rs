//! Integration tests for for-in enumeration and for-of iteration.

use std::cell::RefCell;
use std::rc::Rc;

use code_object::{opcode, CodeBuilder, Literal};
use interpreter::{Vm, VmError};
use value_model::{
    iteration_result, NativeErrorKind, ObjectHandle, Property, PropertyKey, Value,
    ITERATOR_KEY,
};

/// Build a program that walks `subject` with for-in, concatenating the
/// visited names into r0.
fn for_in_concat_program() -> CodeBuilder {
    let mut b = CodeBuilder::new(1, 0);
    let empty = b.add_literal(Literal::String("".into()));
    let subject = b.add_name("subject");

    b.emit_literal(opcode::PUSH_LITERAL, empty);
    b.emit_store_ident(0);
    b.emit_literal(opcode::PUSH_LITERAL, subject);
    let create = b.emit_forward_branch(opcode::FOR_IN_CREATE);
    let head = b.position();
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit(opcode::FOR_IN_GET_NEXT);
    b.emit(opcode::ADD);
    b.emit_store_ident(0);
    b.emit_backward_branch(opcode::FOR_IN_HAS_NEXT, head);
    b.patch_forward_branch(create);
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit(opcode::RETURN);
    b
}

#[test]
fn test_for_in_walks_own_then_prototype_names() {
    // Own names first in insertion order, then unseen prototype names.
    let proto = ObjectHandle::ordinary(None);
    proto.set(&PropertyKey::from_str("b"), Value::Integer(3));
    proto.set(&PropertyKey::from_str("a"), Value::Integer(9)); // shadowed
    let subject = ObjectHandle::ordinary(Some(proto));
    subject.set(&PropertyKey::from_str("a"), Value::Integer(1));
    subject.set(&PropertyKey::from_str("c"), Value::Integer(2));

    let mut vm = Vm::new();
    vm.define_global("subject", Value::Object(subject));
    let result = vm
        .run_global(Rc::new(for_in_concat_program().finish()))
        .unwrap();
    assert_eq!(result, Value::string("acb"));
}

#[test]
fn test_for_in_non_enumerable_shadow_hides_prototype_name() {
    // An own non-enumerable "x" suppresses the enumerable prototype "x".
    let proto = ObjectHandle::ordinary(None);
    proto.set(&PropertyKey::from_str("x"), Value::Integer(1));
    let subject = ObjectHandle::ordinary(Some(proto));
    subject.define("x", Property::hidden(Value::Integer(2)));
    subject.set(&PropertyKey::from_str("y"), Value::Integer(3));

    let mut vm = Vm::new();
    vm.define_global("subject", Value::Object(subject));
    let result = vm
        .run_global(Rc::new(for_in_concat_program().finish()))
        .unwrap();
    assert_eq!(result, Value::string("y"));
}

#[test]
fn test_for_in_skips_names_deleted_during_iteration() {
    // The body deletes "c" before the walk reaches it.
    let proto = ObjectHandle::ordinary(None);
    proto.set(&PropertyKey::from_str("b"), Value::Integer(3));
    let subject = ObjectHandle::ordinary(Some(proto));
    subject.set(&PropertyKey::from_str("a"), Value::Integer(1));
    subject.set(&PropertyKey::from_str("c"), Value::Integer(2));

    let mut b = CodeBuilder::new(1, 0);
    let empty = b.add_literal(Literal::String("".into()));
    let key_c = b.add_literal(Literal::String("c".into()));
    let name_subject = b.add_name("subject");

    b.emit_literal(opcode::PUSH_LITERAL, empty);
    b.emit_store_ident(0);
    b.emit_literal(opcode::PUSH_LITERAL, name_subject);
    let create = b.emit_forward_branch(opcode::FOR_IN_CREATE);
    let head = b.position();
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit(opcode::FOR_IN_GET_NEXT);
    b.emit(opcode::ADD);
    b.emit_store_ident(0);
    b.emit_literal(opcode::PUSH_LITERAL, name_subject);
    b.emit_literal(opcode::PUSH_LITERAL, key_c);
    b.emit(opcode::DELETE_PROPERTY);
    b.emit(opcode::POP);
    b.emit_backward_branch(opcode::FOR_IN_HAS_NEXT, head);
    b.patch_forward_branch(create);
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit(opcode::RETURN);

    let mut vm = Vm::new();
    vm.define_global("subject", Value::Object(subject));
    assert_eq!(
        vm.run_global(Rc::new(b.finish())).unwrap(),
        Value::string("ab")
    );
}

#[test]
fn test_for_in_nullish_subject_skips_loop() {
    let mut b = CodeBuilder::new(1, 0);
    let marker = b.add_literal(Literal::String("ran".into()));

    b.emit(opcode::PUSH_NULL);
    let create = b.emit_forward_branch(opcode::FOR_IN_CREATE);
    let head = b.position();
    b.emit_literal(opcode::PUSH_LITERAL, marker);
    b.emit_store_ident(0);
    b.emit_backward_branch(opcode::FOR_IN_HAS_NEXT, head);
    b.patch_forward_branch(create);
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit(opcode::RETURN);

    assert_eq!(
        Vm::new().run_global(Rc::new(b.finish())).unwrap(),
        Value::Undefined
    );
}

/// Build a program that sums the values of `subject` with for-of into r0.
fn for_of_sum_program() -> CodeBuilder {
    let mut b = CodeBuilder::new(1, 0);
    let zero = b.add_literal(Literal::Number(0.0));
    let subject = b.add_name("subject");

    b.emit_literal(opcode::PUSH_LITERAL, zero);
    b.emit_store_ident(0);
    b.emit_literal(opcode::PUSH_LITERAL, subject);
    let create = b.emit_forward_branch(opcode::FOR_OF_CREATE);
    let head = b.position();
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit(opcode::FOR_OF_GET_NEXT);
    b.emit(opcode::ADD);
    b.emit_store_ident(0);
    b.emit_backward_branch(opcode::FOR_OF_HAS_NEXT, head);
    b.patch_forward_branch(create);
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit(opcode::RETURN);
    b
}

#[test]
fn test_for_of_sums_array_elements() {
    let array = ObjectHandle::array(vec![
        Value::Integer(1),
        Value::Integer(2),
        Value::Integer(3),
    ]);
    let mut vm = Vm::new();
    vm.define_global("subject", Value::Object(array));
    assert_eq!(
        vm.run_global(Rc::new(for_of_sum_program().finish())).unwrap(),
        Value::Integer(6)
    );
}

#[test]
fn test_for_of_iterates_string_code_points() {
    let mut vm = Vm::new();
    vm.define_global("subject", Value::string("ab"));

    // Same loop shape, but concatenating from "".
    let mut b = CodeBuilder::new(1, 0);
    let empty = b.add_literal(Literal::String("".into()));
    let subject = b.add_name("subject");
    b.emit_literal(opcode::PUSH_LITERAL, empty);
    b.emit_store_ident(0);
    b.emit_literal(opcode::PUSH_LITERAL, subject);
    let create = b.emit_forward_branch(opcode::FOR_OF_CREATE);
    let head = b.position();
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit(opcode::FOR_OF_GET_NEXT);
    b.emit(opcode::ADD);
    b.emit_store_ident(0);
    b.emit_backward_branch(opcode::FOR_OF_HAS_NEXT, head);
    b.patch_forward_branch(create);
    b.emit_literal(opcode::PUSH_LITERAL, 0);
    b.emit(opcode::RETURN);

    assert_eq!(vm.run_global(Rc::new(b.finish())).unwrap(), Value::string("ab"));
}

#[test]
fn test_for_of_nullish_subject_throws_type_error() {
    let mut b = CodeBuilder::new(0, 0);
    b.emit(opcode::PUSH_NULL);
    let create = b.emit_forward_branch(opcode::FOR_OF_CREATE);
    b.patch_forward_branch(create);
    b.emit(opcode::RETURN_UNDEFINED);

    match Vm::new().run_global(Rc::new(b.finish())) {
        Err(VmError::Exception(value)) => {
            let (kind, _) = value.as_object().unwrap().as_error().unwrap();
            assert_eq!(kind, NativeErrorKind::Type);
        }
        other => panic!("expected type error, got {:?}", other),
    }
}

/// A custom iterable whose `next` counts its invocations.
fn counting_iterable(values: Vec<i32>) -> (ObjectHandle, ObjectHandle, Rc<RefCell<usize>>) {
    let calls = Rc::new(RefCell::new(0));
    let remaining = Rc::new(RefCell::new(values.into_iter()));

    let iterator = ObjectHandle::ordinary(None);
    let call_count = calls.clone();
    iterator.set(
        &PropertyKey::from_str("next"),
        Value::Object(ObjectHandle::native(
            "next",
            false,
            Rc::new(move |_this, _args| {
                *call_count.borrow_mut() += 1;
                Ok(match remaining.borrow_mut().next() {
                    Some(n) => iteration_result(Value::Integer(n), false),
                    None => iteration_result(Value::Undefined, true),
                })
            }),
        )),
    );

    let subject = ObjectHandle::ordinary(None);
    let handle = iterator.clone();
    subject.set(
        &PropertyKey::from_str(ITERATOR_KEY),
        Value::Object(ObjectHandle::native(
            ITERATOR_KEY,
            false,
            Rc::new(move |_this, _args| Ok(Value::Object(handle.clone()))),
        )),
    );
    (subject, iterator, calls)
}

#[test]
fn test_for_of_custom_iterator_protocol() {
    let (subject, _iterator, calls) = counting_iterable(vec![4, 5]);
    let mut vm = Vm::new();
    vm.define_global("subject", Value::Object(subject));
    assert_eq!(
        vm.run_global(Rc::new(for_of_sum_program().finish())).unwrap(),
        Value::Integer(9)
    );
    // Two values plus the exhausting call.
    assert_eq!(*calls.borrow(), 3);
}

#[test]
fn test_for_of_break_stops_stepping_and_releases_iterator() {
    // for (v of subject) { if (v === 2) break; }
    let mut b = CodeBuilder::new(0, 0);
    let two = b.add_literal(Literal::Number(2.0));
    let subject = b.add_name("subject");

    b.emit_literal(opcode::PUSH_LITERAL, subject);
    let create = b.emit_forward_branch(opcode::FOR_OF_CREATE);
    let head = b.position();
    b.emit(opcode::FOR_OF_GET_NEXT);
    b.emit_literal(opcode::PUSH_LITERAL, two);
    b.emit(opcode::STRICT_EQUAL);
    let brk = b.emit_forward_branch(opcode::BRANCH_IF_TRUE_FORWARD);
    b.emit_backward_branch(opcode::FOR_OF_HAS_NEXT, head);
    b.patch_forward_branch(brk);
    let exit = b.emit_forward_branch(opcode::JUMP_AND_EXIT_CONTEXT);
    b.patch_forward_branch(create);
    b.patch_forward_branch(exit);
    b.emit(opcode::RETURN_UNDEFINED);

    let (subject, iterator, calls) = counting_iterable(vec![1, 2, 3]);
    let baseline = iterator.ref_count();
    let mut vm = Vm::new();
    vm.define_global("subject", Value::Object(subject));
    vm.run_global(Rc::new(b.finish())).unwrap();
    // Values 1 and 2 were fetched; nothing after the break.
    assert_eq!(*calls.borrow(), 2);
    // Aborting the loop context dropped the iterator reference.
    assert_eq!(iterator.ref_count(), baseline);
}
