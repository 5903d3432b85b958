//! Bytecode opcodes for the virtual machine
//!
//! The instruction stream is a flat byte sequence. The first byte of every
//! instruction is a main-page opcode; the reserved `EXT_OPCODE` byte selects
//! a second page read from the following byte. Operands follow the opcode
//! according to the decode table (see [`crate::decode`]).
//!
//! Encoding conventions shared by both pages:
//!
//! - Literal indexes occupy one byte when below `0x80`, otherwise two bytes
//!   (`0x80 | high`, `low`). Indexes below the code object's
//!   `register_count` address register slots; the rest address the literal
//!   pool at `index - register_count`.
//! - Branch offsets are unsigned magnitudes in 1-3 bytes, seven bits per
//!   byte with a continuation bit, relative to the first byte of the
//!   branching instruction. Direction is part of the opcode.
//! - When the result sink is `PutIdentifier`, the target literal index is
//!   encoded directly after the opcode, before the mode operands.
//! - Call opcodes and `APPEND_ARRAY` carry one raw count byte after the
//!   opcode.

/// Prefix byte selecting the extended opcode page.
pub const EXT_OPCODE: u8 = 0xFE;

// --- Stack manipulation ---

/// No operation.
pub const NOP: u8 = 0x00;
/// Pop and discard the top operand-stack value.
pub const POP: u8 = 0x01;
/// Duplicate the top operand-stack value.
pub const DUP: u8 = 0x02;

// --- Literal / register loads ---

/// Push one literal (register or pool entry).
pub const PUSH_LITERAL: u8 = 0x03;
/// Push two literals left to right.
pub const PUSH_TWO_LITERALS: u8 = 0x04;
/// Push `undefined`.
pub const PUSH_UNDEFINED: u8 = 0x05;
/// Push `null`.
pub const PUSH_NULL: u8 = 0x06;
/// Push `true`.
pub const PUSH_TRUE: u8 = 0x07;
/// Push `false`.
pub const PUSH_FALSE: u8 = 0x08;
/// Push the frame's `this` binding.
pub const PUSH_THIS: u8 = 0x09;

// --- Identifier access ---

/// Pop a value and write it to the target identifier.
pub const STORE_IDENT: u8 = 0x0A;
/// Read one literal and write it to the target identifier.
pub const COPY_LITERAL: u8 = 0x0B;
/// `typeof` on an identifier; unresolvable names yield "undefined"
/// instead of a ReferenceError. Reads one raw literal index.
pub const TYPEOF_IDENT: u8 = 0x0C;

// --- Arithmetic ---

/// Addition (`+`, including string concatenation).
pub const ADD: u8 = 0x0D;
/// Subtraction.
pub const SUB: u8 = 0x0E;
/// Multiplication.
pub const MUL: u8 = 0x0F;
/// Division.
pub const DIV: u8 = 0x10;
/// Remainder.
pub const MOD: u8 = 0x11;
/// Addition of two literal operands.
pub const ADD_TWO_LITERALS: u8 = 0x12;
/// Addition with the right operand taken from the literal pool.
pub const ADD_RIGHT_LITERAL: u8 = 0x13;

// --- Unary ---

/// Numeric negation.
pub const NEGATE: u8 = 0x14;
/// Unary plus (ToNumber).
pub const UNARY_PLUS: u8 = 0x15;
/// Logical NOT.
pub const LOGICAL_NOT: u8 = 0x16;
/// Bitwise NOT.
pub const BIT_NOT: u8 = 0x17;
/// `typeof` on a computed value.
pub const TYPEOF: u8 = 0x18;
/// `void` - evaluate and push `undefined`.
pub const VOID: u8 = 0x19;

// --- Relational / equality ---

/// Loose equality (`==`).
pub const EQUAL: u8 = 0x1A;
/// Loose inequality (`!=`).
pub const NOT_EQUAL: u8 = 0x1B;
/// Strict equality (`===`).
pub const STRICT_EQUAL: u8 = 0x1C;
/// Strict inequality (`!==`).
pub const STRICT_NOT_EQUAL: u8 = 0x1D;
/// Less than.
pub const LESS: u8 = 0x1E;
/// Greater than.
pub const GREATER: u8 = 0x1F;
/// Less than or equal.
pub const LESS_EQUAL: u8 = 0x20;
/// Greater than or equal.
pub const GREATER_EQUAL: u8 = 0x21;
/// `instanceof`.
pub const INSTANCEOF: u8 = 0x22;
/// `in`.
pub const IN: u8 = 0x23;

// --- Bitwise ---

/// Bitwise AND.
pub const BIT_AND: u8 = 0x24;
/// Bitwise OR.
pub const BIT_OR: u8 = 0x25;
/// Bitwise XOR.
pub const BIT_XOR: u8 = 0x26;
/// Left shift.
pub const SHIFT_LEFT: u8 = 0x27;
/// Sign-propagating right shift.
pub const SHIFT_RIGHT: u8 = 0x28;
/// Zero-fill right shift.
pub const SHIFT_RIGHT_UNSIGNED: u8 = 0x29;

// --- Branches ---

/// Unconditional forward jump.
pub const JUMP_FORWARD: u8 = 0x2A;
/// Unconditional backward jump (watchdog point).
pub const JUMP_BACKWARD: u8 = 0x2B;
/// Pop condition; jump forward when truthy.
pub const BRANCH_IF_TRUE_FORWARD: u8 = 0x2C;
/// Pop condition; jump forward when falsy.
pub const BRANCH_IF_FALSE_FORWARD: u8 = 0x2D;
/// Pop condition; jump backward when truthy (watchdog point).
pub const BRANCH_IF_TRUE_BACKWARD: u8 = 0x2E;
/// Pop condition; jump backward when falsy (watchdog point).
pub const BRANCH_IF_FALSE_BACKWARD: u8 = 0x2F;

// --- Calls ---

/// Call; stack holds `[callee, args...]`, raw argc byte follows.
pub const CALL: u8 = 0x30;
/// Method call; stack holds `[this, callee, args...]`, raw argc byte.
pub const CALL_METHOD: u8 = 0x31;
/// Construct (`new`); stack holds `[callee, args...]`, raw argc byte.
pub const CONSTRUCT: u8 = 0x32;
/// Pop a value and return it from the frame.
pub const RETURN: u8 = 0x33;
/// Return `undefined` from the frame.
pub const RETURN_UNDEFINED: u8 = 0x34;

// --- Exceptions and contexts ---

/// Pop a value and throw it.
pub const THROW: u8 = 0x35;
/// Push a TRY context; branch operand points at the catch/finally
/// prologue.
pub const TRY_CREATE: u8 = 0x36;
/// Catch prologue marker; executed by fall-through it pops the TRY
/// context and jumps past the catch block (branch operand).
pub const CATCH: u8 = 0x37;
/// Finally prologue marker; branch operand points past the finally body.
pub const FINALLY: u8 = 0x38;
/// Normal exit of the innermost context record.
pub const CONTEXT_END: u8 = 0x39;
/// Forward jump that runs Find-Finally, aborting crossed contexts and
/// honouring intercepting finally blocks.
pub const JUMP_AND_EXIT_CONTEXT: u8 = 0x3A;
/// Enter a block scope; pushes a BLOCK context with a fresh declarative
/// environment. Branch operand points past the block.
pub const BLOCK_CREATE: u8 = 0x3B;
/// Pop the subject and enter a `with` scope (object-bound environment).
pub const WITH_CREATE: u8 = 0x3C;

// --- for-in / for-of ---

/// Pop the subject and enter a for-in enumeration; branches past the loop
/// when the subject is null/undefined or has no enumerable keys.
pub const FOR_IN_CREATE: u8 = 0x3D;
/// Push the current for-in property name.
pub const FOR_IN_GET_NEXT: u8 = 0x3E;
/// Advance the for-in cursor; backward branch to the loop head while
/// names remain, otherwise pop the context (watchdog point).
pub const FOR_IN_HAS_NEXT: u8 = 0x3F;
/// Pop the subject, get its iterator and take the first step; branches
/// past the loop when already done.
pub const FOR_OF_CREATE: u8 = 0x40;
/// Push the value of the last for-of step result.
pub const FOR_OF_GET_NEXT: u8 = 0x41;
/// Take the next for-of step; backward branch to the loop head while not
/// done, otherwise release the iterator and pop the context (watchdog
/// point).
pub const FOR_OF_HAS_NEXT: u8 = 0x42;

// --- Objects and properties ---

/// Push a new empty object.
pub const CREATE_OBJECT: u8 = 0x43;
/// Push a new empty array.
pub const CREATE_ARRAY: u8 = 0x44;
/// Append N stack values to the array below them; raw count byte.
pub const APPEND_ARRAY: u8 = 0x45;
/// Pop key and base; push `base[key]`.
pub const GET_PROPERTY: u8 = 0x46;
/// Pop base; push `base[literal]`.
pub const GET_PROPERTY_LITERAL: u8 = 0x47;
/// Pop value, then key and base (PUT_REFERENCE sink); performs the
/// property store or a register-reference write.
pub const SET_PROPERTY: u8 = 0x48;
/// Pop key and value; define the property on the object below them,
/// leaving the object on the stack (object literal construction).
pub const APPEND_PROPERTY: u8 = 0x49;
/// Pop key and base; push the result of `delete base[key]`.
pub const DELETE_PROPERTY: u8 = 0x4A;
/// Push a register-reference marker pair for a later SET_PROPERTY;
/// reads one raw literal index designating the register.
pub const PUSH_REGISTER_REFERENCE: u8 = 0x4B;

// --- Extended page (after EXT_OPCODE) ---

/// Create a mutable binding in the current lexical environment,
/// initialized to `undefined`. Reads one raw literal index (a name).
pub const EXT_CREATE_BINDING: u8 = 0x01;
/// Push a property of the `this` binding named by a string literal.
pub const EXT_GET_THIS_PROPERTY: u8 = 0x02;
/// Super call; stack holds `[args...]`, raw argc byte. The callee is the
/// frame's super-constructor slot.
pub const EXT_SUPER_CALL: u8 = 0x03;
/// Designated breakpoint; consults the execution hook.
pub const EXT_BREAKPOINT: u8 = 0x04;
/// Pop a value into the frame's block-result slot (eval-style code).
pub const EXT_BLOCK_RESULT: u8 = 0x05;
