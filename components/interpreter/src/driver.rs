//! The call driver and public VM entry point.
//!
//! The dispatch loop never performs a call itself; it stages the callee
//! and arguments and returns control here. JS-implemented callees get a
//! fresh frame and one level of host-stack recursion; host functions are
//! invoked directly. This trampoline keeps host-stack depth proportional
//! to JS call depth, never to control-flow complexity inside a function.

use std::rc::Rc;

use code_object::CodeObject;
use thiserror::Error;
use value_model::{Environment, ObjectHandle, PropertyKey, Thrown, Value};

use crate::dispatch::{self, Completion, LoopExit};
use crate::frame::{CallOperation, Frame};

/// Default JS call-depth limit.
const DEFAULT_MAX_DEPTH: usize = 512;

/// What the execution hook wants the VM to do.
#[derive(Debug, Clone)]
pub enum HookDecision {
    /// Keep running.
    Continue,
    /// Stop the whole execution, reporting the given value.
    Stop(Value),
}

/// Watchdog/debugger callback, consulted once per backward branch taken
/// and at breakpoint instructions.
pub trait ExecutionHook {
    /// Called when a backward branch is taken.
    fn on_backward_branch(&mut self) -> HookDecision {
        HookDecision::Continue
    }

    /// Called at a breakpoint instruction.
    fn on_breakpoint(&mut self) -> HookDecision {
        HookDecision::Continue
    }
}

/// How a top-level `run` failed.
#[derive(Debug, Error)]
pub enum VmError {
    /// An exception left the outermost frame uncaught.
    #[error("uncaught exception: {0}")]
    Exception(Value),
    /// The execution hook requested a stop; bypasses `try`/`catch`.
    #[error("execution stopped: {0}")]
    Stopped(Value),
}

/// The virtual machine: global state plus the call driver.
pub struct Vm {
    global_object: ObjectHandle,
    global_env: Environment,
    hook: Option<Box<dyn ExecutionHook>>,
    depth: usize,
    max_depth: usize,
}

impl Vm {
    /// Create a VM with an empty global object.
    pub fn new() -> Vm {
        let global_object = ObjectHandle::ordinary(None);
        let global_env = Environment::object_bound(None, global_object.clone());
        Vm {
            global_object,
            global_env,
            hook: None,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// The global object.
    pub fn global_object(&self) -> ObjectHandle {
        self.global_object.clone()
    }

    /// The global (object-bound) environment.
    pub fn global_env(&self) -> Environment {
        self.global_env.clone()
    }

    /// Define a property on the global object (host functions, globals).
    pub fn define_global(&self, name: &str, value: Value) {
        self.global_object.set(&PropertyKey::from_str(name), value);
    }

    /// Install the execution hook.
    pub fn set_hook(&mut self, hook: Box<dyn ExecutionHook>) {
        self.hook = Some(hook);
    }

    /// Remove the execution hook.
    pub fn clear_hook(&mut self) {
        self.hook = None;
    }

    /// Override the JS call-depth limit.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Execute a code object. The sole execution entry point: global
    /// code, eval code and direct function invocation all route here.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::rc::Rc;
    /// use code_object::{opcode, CodeBuilder, Literal};
    /// use interpreter::Vm;
    /// use value_model::Value;
    ///
    /// let mut builder = CodeBuilder::new(0, 0);
    /// let two = builder.add_literal(Literal::Number(2.0));
    /// let three = builder.add_literal(Literal::Number(3.0));
    /// builder.emit_two_literals(opcode::ADD_TWO_LITERALS, two, three);
    /// builder.emit(opcode::RETURN);
    ///
    /// let mut vm = Vm::new();
    /// let result = vm.run_global(Rc::new(builder.finish())).unwrap();
    /// assert_eq!(result, Value::Integer(5));
    /// ```
    pub fn run(
        &mut self,
        code: Rc<CodeObject>,
        this_binding: Value,
        lex_env: Environment,
        args: &[Value],
    ) -> Result<Value, VmError> {
        let mut frame = Frame::new(code, this_binding, lex_env);
        frame.bind_arguments(args);
        self.drive(&mut frame)
    }

    /// Execute top-level code against the global object and environment.
    pub fn run_global(&mut self, code: Rc<CodeObject>) -> Result<Value, VmError> {
        let this = Value::Object(self.global_object.clone());
        let env = self.global_env.clone();
        self.run(code, this, env, &[])
    }

    /// Call a callable value from the host.
    pub fn call(&mut self, callee: &Value, this_arg: Value, args: &[Value]) -> Result<Value, VmError> {
        self.call_value(callee, this_arg, args)
    }

    fn drive(&mut self, frame: &mut Frame) -> Result<Value, VmError> {
        loop {
            match dispatch::run(frame, &mut self.hook) {
                LoopExit::Finished(Completion::Normal(value)) => return Ok(value),
                LoopExit::Finished(Completion::Thrown(value)) => {
                    return Err(VmError::Exception(value))
                }
                LoopExit::Finished(Completion::Stopped(value)) => {
                    return Err(VmError::Stopped(value))
                }
                LoopExit::CallPending => match self.perform_pending_call(frame) {
                    Ok(()) => {}
                    Err(VmError::Exception(value)) => {
                        // The callee threw; unwind in this frame.
                        match dispatch::deliver_exception(frame, value) {
                            None => {}
                            Some(Completion::Normal(value)) => return Ok(value),
                            Some(Completion::Thrown(value)) => {
                                return Err(VmError::Exception(value))
                            }
                            Some(Completion::Stopped(value)) => {
                                return Err(VmError::Stopped(value))
                            }
                        }
                    }
                    Err(stop @ VmError::Stopped(_)) => return Err(stop),
                },
            }
        }
    }

    fn perform_pending_call(&mut self, frame: &mut Frame) -> Result<(), VmError> {
        let operation = std::mem::replace(&mut frame.call_operation, CallOperation::None);
        match operation {
            CallOperation::None => Ok(()),
            CallOperation::Call { argc } => {
                let args = pop_arguments(frame, argc);
                let callee = frame.pop();
                let result = self.call_value(&callee, Value::Undefined, &args)?;
                frame.push(result);
                Ok(())
            }
            CallOperation::CallMethod { argc } => {
                let args = pop_arguments(frame, argc);
                let callee = frame.pop();
                let receiver = frame.pop();
                let result = self.call_value(&callee, receiver, &args)?;
                frame.push(result);
                Ok(())
            }
            CallOperation::Construct { argc } => {
                let args = pop_arguments(frame, argc);
                let callee = frame.pop();
                let result = self.construct_value(&callee, &args)?;
                frame.push(result);
                Ok(())
            }
            CallOperation::SuperCall { argc } => {
                let args = pop_arguments(frame, argc);
                if frame.this_initialized {
                    return Err(exception(Thrown::reference_error(
                        "super constructor may only be called once",
                    )));
                }
                let callee = match frame.super_constructor.clone() {
                    Some(callee) => callee,
                    None => {
                        return Err(exception(Thrown::syntax_error(
                            "'super' keyword is only valid in a derived constructor",
                        )))
                    }
                };
                let this = self.construct_value(&callee, &args)?;
                frame.this_binding = this.clone();
                frame.this_initialized = true;
                frame.push(this);
                Ok(())
            }
        }
    }

    fn call_value(
        &mut self,
        callee: &Value,
        this_arg: Value,
        args: &[Value],
    ) -> Result<Value, VmError> {
        let object = match callee.as_object() {
            Some(object) if object.is_callable() => object.clone(),
            _ => return Err(exception(Thrown::type_error("value is not callable"))),
        };
        if let Some(native) = object.as_native() {
            return native(&this_arg, args).map_err(exception);
        }
        let data = match object.as_function() {
            Some(data) => data,
            None => return Err(exception(Thrown::type_error("value is not callable"))),
        };
        self.enter_depth()?;
        let mut child = Frame::for_function(&data, this_arg, args);
        let result = self.drive(&mut child);
        self.depth -= 1;
        result
    }

    fn construct_value(&mut self, callee: &Value, args: &[Value]) -> Result<Value, VmError> {
        let object = match callee.as_object() {
            Some(object) if object.is_constructable() => object.clone(),
            _ => return Err(exception(Thrown::type_error("value is not a constructor"))),
        };
        if let Some(native) = object.as_native() {
            return native(&Value::Undefined, args).map_err(exception);
        }
        let data = match object.as_function() {
            Some(data) => data,
            None => return Err(exception(Thrown::type_error("value is not a constructor"))),
        };
        let prototype = match object.get(&PropertyKey::from_str("prototype")) {
            Some(Value::Object(prototype)) => Some(prototype),
            _ => None,
        };
        let this = Value::Object(ObjectHandle::ordinary(prototype));
        self.enter_depth()?;
        let mut child = Frame::for_function(&data, this.clone(), args);
        let result = self.drive(&mut child);
        self.depth -= 1;
        match result {
            // An explicit object result replaces the created instance.
            Ok(Value::Object(explicit)) => Ok(Value::Object(explicit)),
            Ok(_) => Ok(this),
            Err(error) => Err(error),
        }
    }

    fn enter_depth(&mut self) -> Result<(), VmError> {
        if self.depth >= self.max_depth {
            // Catchable by design: runaway recursion is a JS-level error.
            return Err(exception(Thrown::range_error(
                "maximum call stack size exceeded",
            )));
        }
        self.depth += 1;
        Ok(())
    }
}

impl Default for Vm {
    fn default() -> Vm {
        Vm::new()
    }
}

fn pop_arguments(frame: &mut Frame, argc: u8) -> Vec<Value> {
    let mut args = Vec::with_capacity(argc as usize);
    for _ in 0..argc {
        args.push(frame.pop());
    }
    args.reverse();
    args
}

fn exception(thrown: Thrown) -> VmError {
    VmError::Exception(thrown.0)
}
