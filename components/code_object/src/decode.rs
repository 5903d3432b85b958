//! Static decode table
//!
//! Maps each opcode byte (main page, plus the extended page behind
//! `EXT_OPCODE`) to its operand-fetch mode, dispatch group and result
//! sink. Built once at compile time; read-only, no failure mode. Bytes
//! without an assigned opcode decode to the [`OpGroup::Illegal`] group;
//! executing one is an engine bug, not a JavaScript error.

use crate::opcode as op;

/// How the interpreter fetches operands for an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandMode {
    /// No operands.
    None,
    /// One literal index (register or pool).
    OneLiteral,
    /// Two literal indexes.
    TwoLiterals,
    /// One value popped from the operand stack.
    OneStack,
    /// Two values popped from the operand stack (right first).
    TwoStack,
    /// Left operand popped, right operand from a literal index.
    StackAndLiteral,
    /// A variable-length branch offset (1-3 bytes).
    Branch,
    /// Left operand is the `this` binding, right from a literal index.
    ThisAndLiteral,
}

/// Where an instruction's result goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSink {
    /// Result dropped.
    Discard,
    /// Result pushed on the operand stack.
    PushStack,
    /// Result replaces the frame's block-result slot.
    StoreBlockResult,
    /// Result written to a register or an environment binding; the
    /// target literal index is encoded directly after the opcode.
    PutIdentifier,
    /// Result applied to the `(base, key)` pair below it on the stack.
    PutReference,
}

/// Dispatch routing tag; each group is one match arm of the interpreter
/// loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpGroup {
    /// Stack manipulation (nop/pop/dup).
    Stack,
    /// Literal and constant loads.
    Literal,
    /// Identifier reads/writes.
    Identifier,
    /// Binary arithmetic.
    Arithmetic,
    /// Unary operators.
    Unary,
    /// Equality and relational operators.
    Relational,
    /// Bitwise and shift operators.
    Bitwise,
    /// Plain branches.
    Branch,
    /// Call/construct/super-call staging and returns.
    Call,
    /// Context stack operations (try/catch/finally/with/block, throw).
    Context,
    /// for-in / for-of operations.
    Iterator,
    /// Object and property operations.
    Property,
    /// Breakpoints and block-result stores.
    Misc,
    /// Unassigned opcode byte.
    Illegal,
}

/// One decode-table entry.
#[derive(Debug, Clone, Copy)]
pub struct DecodeEntry {
    /// Operand-fetch mode.
    pub mode: OperandMode,
    /// Dispatch group.
    pub group: OpGroup,
    /// Result sink.
    pub sink: ResultSink,
}

const ILLEGAL: DecodeEntry = DecodeEntry {
    mode: OperandMode::None,
    group: OpGroup::Illegal,
    sink: ResultSink::Discard,
};

const fn entry(mode: OperandMode, group: OpGroup, sink: ResultSink) -> DecodeEntry {
    DecodeEntry { mode, group, sink }
}

const fn build_main_table() -> [DecodeEntry; 256] {
    use OpGroup as G;
    use OperandMode as M;
    use ResultSink as S;

    let mut t = [ILLEGAL; 256];

    t[op::NOP as usize] = entry(M::None, G::Stack, S::Discard);
    t[op::POP as usize] = entry(M::OneStack, G::Stack, S::Discard);
    t[op::DUP as usize] = entry(M::OneStack, G::Stack, S::PushStack);

    t[op::PUSH_LITERAL as usize] = entry(M::OneLiteral, G::Literal, S::PushStack);
    t[op::PUSH_TWO_LITERALS as usize] = entry(M::TwoLiterals, G::Literal, S::PushStack);
    t[op::PUSH_UNDEFINED as usize] = entry(M::None, G::Literal, S::PushStack);
    t[op::PUSH_NULL as usize] = entry(M::None, G::Literal, S::PushStack);
    t[op::PUSH_TRUE as usize] = entry(M::None, G::Literal, S::PushStack);
    t[op::PUSH_FALSE as usize] = entry(M::None, G::Literal, S::PushStack);
    t[op::PUSH_THIS as usize] = entry(M::None, G::Literal, S::PushStack);

    t[op::STORE_IDENT as usize] = entry(M::OneStack, G::Identifier, S::PutIdentifier);
    t[op::COPY_LITERAL as usize] = entry(M::OneLiteral, G::Identifier, S::PutIdentifier);
    t[op::TYPEOF_IDENT as usize] = entry(M::None, G::Identifier, S::PushStack);

    t[op::ADD as usize] = entry(M::TwoStack, G::Arithmetic, S::PushStack);
    t[op::SUB as usize] = entry(M::TwoStack, G::Arithmetic, S::PushStack);
    t[op::MUL as usize] = entry(M::TwoStack, G::Arithmetic, S::PushStack);
    t[op::DIV as usize] = entry(M::TwoStack, G::Arithmetic, S::PushStack);
    t[op::MOD as usize] = entry(M::TwoStack, G::Arithmetic, S::PushStack);
    t[op::ADD_TWO_LITERALS as usize] = entry(M::TwoLiterals, G::Arithmetic, S::PushStack);
    t[op::ADD_RIGHT_LITERAL as usize] = entry(M::StackAndLiteral, G::Arithmetic, S::PushStack);

    t[op::NEGATE as usize] = entry(M::OneStack, G::Unary, S::PushStack);
    t[op::UNARY_PLUS as usize] = entry(M::OneStack, G::Unary, S::PushStack);
    t[op::LOGICAL_NOT as usize] = entry(M::OneStack, G::Unary, S::PushStack);
    t[op::BIT_NOT as usize] = entry(M::OneStack, G::Unary, S::PushStack);
    t[op::TYPEOF as usize] = entry(M::OneStack, G::Unary, S::PushStack);
    t[op::VOID as usize] = entry(M::OneStack, G::Unary, S::PushStack);

    t[op::EQUAL as usize] = entry(M::TwoStack, G::Relational, S::PushStack);
    t[op::NOT_EQUAL as usize] = entry(M::TwoStack, G::Relational, S::PushStack);
    t[op::STRICT_EQUAL as usize] = entry(M::TwoStack, G::Relational, S::PushStack);
    t[op::STRICT_NOT_EQUAL as usize] = entry(M::TwoStack, G::Relational, S::PushStack);
    t[op::LESS as usize] = entry(M::TwoStack, G::Relational, S::PushStack);
    t[op::GREATER as usize] = entry(M::TwoStack, G::Relational, S::PushStack);
    t[op::LESS_EQUAL as usize] = entry(M::TwoStack, G::Relational, S::PushStack);
    t[op::GREATER_EQUAL as usize] = entry(M::TwoStack, G::Relational, S::PushStack);
    t[op::INSTANCEOF as usize] = entry(M::TwoStack, G::Relational, S::PushStack);
    t[op::IN as usize] = entry(M::TwoStack, G::Relational, S::PushStack);

    t[op::BIT_AND as usize] = entry(M::TwoStack, G::Bitwise, S::PushStack);
    t[op::BIT_OR as usize] = entry(M::TwoStack, G::Bitwise, S::PushStack);
    t[op::BIT_XOR as usize] = entry(M::TwoStack, G::Bitwise, S::PushStack);
    t[op::SHIFT_LEFT as usize] = entry(M::TwoStack, G::Bitwise, S::PushStack);
    t[op::SHIFT_RIGHT as usize] = entry(M::TwoStack, G::Bitwise, S::PushStack);
    t[op::SHIFT_RIGHT_UNSIGNED as usize] = entry(M::TwoStack, G::Bitwise, S::PushStack);

    t[op::JUMP_FORWARD as usize] = entry(M::Branch, G::Branch, S::Discard);
    t[op::JUMP_BACKWARD as usize] = entry(M::Branch, G::Branch, S::Discard);
    t[op::BRANCH_IF_TRUE_FORWARD as usize] = entry(M::Branch, G::Branch, S::Discard);
    t[op::BRANCH_IF_FALSE_FORWARD as usize] = entry(M::Branch, G::Branch, S::Discard);
    t[op::BRANCH_IF_TRUE_BACKWARD as usize] = entry(M::Branch, G::Branch, S::Discard);
    t[op::BRANCH_IF_FALSE_BACKWARD as usize] = entry(M::Branch, G::Branch, S::Discard);

    t[op::CALL as usize] = entry(M::None, G::Call, S::PushStack);
    t[op::CALL_METHOD as usize] = entry(M::None, G::Call, S::PushStack);
    t[op::CONSTRUCT as usize] = entry(M::None, G::Call, S::PushStack);
    t[op::RETURN as usize] = entry(M::OneStack, G::Call, S::Discard);
    t[op::RETURN_UNDEFINED as usize] = entry(M::None, G::Call, S::Discard);

    t[op::THROW as usize] = entry(M::OneStack, G::Context, S::Discard);
    t[op::TRY_CREATE as usize] = entry(M::Branch, G::Context, S::Discard);
    t[op::CATCH as usize] = entry(M::Branch, G::Context, S::Discard);
    t[op::FINALLY as usize] = entry(M::Branch, G::Context, S::Discard);
    t[op::CONTEXT_END as usize] = entry(M::None, G::Context, S::Discard);
    t[op::JUMP_AND_EXIT_CONTEXT as usize] = entry(M::Branch, G::Context, S::Discard);
    t[op::BLOCK_CREATE as usize] = entry(M::Branch, G::Context, S::Discard);
    t[op::WITH_CREATE as usize] = entry(M::Branch, G::Context, S::Discard);

    t[op::FOR_IN_CREATE as usize] = entry(M::Branch, G::Iterator, S::Discard);
    t[op::FOR_IN_GET_NEXT as usize] = entry(M::None, G::Iterator, S::PushStack);
    t[op::FOR_IN_HAS_NEXT as usize] = entry(M::Branch, G::Iterator, S::Discard);
    t[op::FOR_OF_CREATE as usize] = entry(M::Branch, G::Iterator, S::Discard);
    t[op::FOR_OF_GET_NEXT as usize] = entry(M::None, G::Iterator, S::PushStack);
    t[op::FOR_OF_HAS_NEXT as usize] = entry(M::Branch, G::Iterator, S::Discard);

    t[op::CREATE_OBJECT as usize] = entry(M::None, G::Property, S::PushStack);
    t[op::CREATE_ARRAY as usize] = entry(M::None, G::Property, S::PushStack);
    t[op::APPEND_ARRAY as usize] = entry(M::None, G::Property, S::Discard);
    t[op::GET_PROPERTY as usize] = entry(M::TwoStack, G::Property, S::PushStack);
    t[op::GET_PROPERTY_LITERAL as usize] = entry(M::StackAndLiteral, G::Property, S::PushStack);
    t[op::SET_PROPERTY as usize] = entry(M::OneStack, G::Property, S::PutReference);
    t[op::APPEND_PROPERTY as usize] = entry(M::TwoStack, G::Property, S::Discard);
    t[op::DELETE_PROPERTY as usize] = entry(M::TwoStack, G::Property, S::PushStack);
    t[op::PUSH_REGISTER_REFERENCE as usize] = entry(M::None, G::Property, S::Discard);

    t
}

const fn build_ext_table() -> [DecodeEntry; 256] {
    use OpGroup as G;
    use OperandMode as M;
    use ResultSink as S;

    let mut t = [ILLEGAL; 256];

    t[op::EXT_CREATE_BINDING as usize] = entry(M::None, G::Identifier, S::Discard);
    t[op::EXT_GET_THIS_PROPERTY as usize] = entry(M::ThisAndLiteral, G::Property, S::PushStack);
    t[op::EXT_SUPER_CALL as usize] = entry(M::None, G::Call, S::PushStack);
    t[op::EXT_BREAKPOINT as usize] = entry(M::None, G::Misc, S::Discard);
    t[op::EXT_BLOCK_RESULT as usize] = entry(M::OneStack, G::Misc, S::StoreBlockResult);

    t
}

static MAIN_TABLE: [DecodeEntry; 256] = build_main_table();
static EXT_TABLE: [DecodeEntry; 256] = build_ext_table();

/// Look up the decode entry for an opcode byte.
pub fn decode_entry(extended: bool, opcode: u8) -> &'static DecodeEntry {
    if extended {
        &EXT_TABLE[opcode as usize]
    } else {
        &MAIN_TABLE[opcode as usize]
    }
}
