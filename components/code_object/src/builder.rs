//! Code builder - assembles instruction streams
//!
//! Used by the compiler front end and by tests to construct
//! [`CodeObject`]s: emit opcodes, intern literals, reserve and patch
//! forward branches.

use crate::code::CodeObject;
use crate::literal::Literal;
use crate::opcode;

/// Handle for a reserved forward branch awaiting its target.
#[derive(Debug, Clone, Copy)]
pub struct ForwardBranch {
    instr_start: usize,
    operand_pos: usize,
}

/// Incremental builder for a [`CodeObject`].
#[derive(Debug)]
pub struct CodeBuilder {
    bytes: Vec<u8>,
    literals: Vec<Literal>,
    register_count: u32,
    argument_count: u32,
    flags: u16,
}

impl CodeBuilder {
    /// Create a builder for a function with the given register window
    /// size and declared argument count.
    pub fn new(register_count: u32, argument_count: u32) -> Self {
        Self {
            bytes: Vec::new(),
            literals: Vec::new(),
            register_count,
            argument_count,
            flags: 0,
        }
    }

    /// Set the code object flag bits (see [`crate::code::flags`]).
    pub fn set_flags(&mut self, flags: u16) {
        self.flags = flags;
    }

    /// Current byte position; the target of the next emitted instruction.
    pub fn position(&self) -> usize {
        self.bytes.len()
    }

    /// Add a pool literal and return its encoded index (pool position
    /// offset by the register window).
    pub fn add_literal(&mut self, literal: Literal) -> u32 {
        let idx = self.literals.len() as u32;
        self.literals.push(literal);
        idx + self.register_count
    }

    /// Intern an identifier name, reusing an existing pool entry.
    pub fn add_name(&mut self, name: &str) -> u32 {
        for (i, lit) in self.literals.iter().enumerate() {
            if let Literal::Name(existing) = lit {
                if existing.as_ref() == name {
                    return i as u32 + self.register_count;
                }
            }
        }
        self.add_literal(Literal::Name(name.into()))
    }

    /// Encoded index of a register slot.
    ///
    /// # Panics
    ///
    /// Panics when `register` is outside the declared window.
    pub fn register(&self, register: u32) -> u32 {
        assert!(
            register < self.register_count,
            "register {} outside window of {}",
            register,
            self.register_count
        );
        register
    }

    /// Emit a main-page instruction with no encoded operands.
    pub fn emit(&mut self, op: u8) {
        self.bytes.push(op);
    }

    /// Emit an extended-page instruction with no encoded operands.
    pub fn emit_ext(&mut self, op: u8) {
        self.bytes.push(opcode::EXT_OPCODE);
        self.bytes.push(op);
    }

    /// Emit a main-page instruction followed by one literal index.
    pub fn emit_literal(&mut self, op: u8, index: u32) {
        self.bytes.push(op);
        self.write_literal_index(index);
    }

    /// Emit a main-page instruction followed by two literal indexes.
    pub fn emit_two_literals(&mut self, op: u8, left: u32, right: u32) {
        self.bytes.push(op);
        self.write_literal_index(left);
        self.write_literal_index(right);
    }

    /// Emit a PutIdentifier-sink instruction: opcode, target index, then
    /// any mode operands appended by the caller via the other emitters'
    /// index form. For `STORE_IDENT` (stack operand) this is complete.
    pub fn emit_store_ident(&mut self, target: u32) {
        self.bytes.push(opcode::STORE_IDENT);
        self.write_literal_index(target);
    }

    /// Emit `COPY_LITERAL target <- source`.
    pub fn emit_copy_literal(&mut self, target: u32, source: u32) {
        self.bytes.push(opcode::COPY_LITERAL);
        self.write_literal_index(target);
        self.write_literal_index(source);
    }

    /// Emit an instruction followed by one raw byte (call argc,
    /// array append count).
    pub fn emit_with_byte(&mut self, op: u8, byte: u8) {
        self.bytes.push(op);
        self.bytes.push(byte);
    }

    /// Emit an extended-page instruction followed by one raw byte.
    pub fn emit_ext_with_byte(&mut self, op: u8, byte: u8) {
        self.bytes.push(opcode::EXT_OPCODE);
        self.bytes.push(op);
        self.bytes.push(byte);
    }

    /// Emit an instruction followed by one raw literal index (ops that
    /// fetch a name without resolving it, and register references).
    pub fn emit_with_raw_index(&mut self, op: u8, index: u32) {
        self.bytes.push(op);
        self.write_literal_index(index);
    }

    /// Emit an extended-page instruction followed by one raw literal
    /// index.
    pub fn emit_ext_with_raw_index(&mut self, op: u8, index: u32) {
        self.bytes.push(opcode::EXT_OPCODE);
        self.bytes.push(op);
        self.write_literal_index(index);
    }

    /// Emit an extended-page instruction followed by one literal index
    /// operand (ThisAndLiteral mode).
    pub fn emit_ext_with_literal(&mut self, op: u8, index: u32) {
        self.emit_ext_with_raw_index(op, index);
    }

    /// Reserve a forward branch; the 3-byte offset is patched later.
    pub fn emit_forward_branch(&mut self, op: u8) -> ForwardBranch {
        let instr_start = self.bytes.len();
        self.bytes.push(op);
        let operand_pos = self.bytes.len();
        self.bytes.extend_from_slice(&[0x80, 0x80, 0x00]);
        ForwardBranch {
            instr_start,
            operand_pos,
        }
    }

    /// Patch a reserved forward branch to jump to the current position.
    pub fn patch_forward_branch(&mut self, branch: ForwardBranch) {
        let target = self.bytes.len();
        self.patch_forward_branch_to(branch, target);
    }

    /// Patch a reserved forward branch to an explicit target.
    ///
    /// # Panics
    ///
    /// Panics when the target precedes the branch or the offset exceeds
    /// the 21-bit encoding range.
    pub fn patch_forward_branch_to(&mut self, branch: ForwardBranch, target: usize) {
        assert!(target >= branch.instr_start, "forward branch going backward");
        let offset = (target - branch.instr_start) as u32;
        assert!(offset < 1 << 21, "branch offset out of range");
        self.bytes[branch.operand_pos] = 0x80 | ((offset >> 14) & 0x7F) as u8;
        self.bytes[branch.operand_pos + 1] = 0x80 | ((offset >> 7) & 0x7F) as u8;
        self.bytes[branch.operand_pos + 2] = (offset & 0x7F) as u8;
    }

    /// Emit a backward branch to an already-emitted target position,
    /// using the smallest offset encoding.
    pub fn emit_backward_branch(&mut self, op: u8, target: usize) {
        let instr_start = self.bytes.len();
        assert!(target <= instr_start, "backward branch going forward");
        let offset = (instr_start - target) as u32;
        assert!(offset < 1 << 21, "branch offset out of range");
        self.bytes.push(op);
        if offset >= 1 << 14 {
            self.bytes.push(0x80 | ((offset >> 14) & 0x7F) as u8);
        }
        if offset >= 1 << 7 {
            self.bytes.push(0x80 | ((offset >> 7) & 0x7F) as u8);
        }
        self.bytes.push((offset & 0x7F) as u8);
    }

    /// Finish the build and produce the immutable code object.
    pub fn finish(self) -> CodeObject {
        CodeObject {
            bytes: self.bytes.into_boxed_slice(),
            literals: self.literals.into_boxed_slice(),
            register_count: self.register_count,
            argument_count: self.argument_count,
            flags: self.flags,
        }
    }

    fn write_literal_index(&mut self, index: u32) {
        assert!(index < 1 << 15, "literal index out of range");
        if index < 0x80 {
            self.bytes.push(index as u8);
        } else {
            self.bytes.push(0x80 | (index >> 8) as u8);
            self.bytes.push((index & 0xFF) as u8);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_name_interns() {
        let mut builder = CodeBuilder::new(2, 0);
        let a = builder.add_name("x");
        let b = builder.add_name("y");
        let c = builder.add_name("x");
        assert_eq!(a, c);
        assert_ne!(a, b);
        // Encoded indexes start above the register window.
        assert_eq!(a, 2);
    }

    #[test]
    fn test_literal_index_two_byte_encoding() {
        let mut builder = CodeBuilder::new(0, 0);
        for i in 0..0x90 {
            builder.add_literal(Literal::Number(i as f64));
        }
        builder.emit_literal(opcode::PUSH_LITERAL, 0x85);
        let code = builder.finish();
        assert_eq!(code.bytes[0], opcode::PUSH_LITERAL);
        assert_eq!(code.bytes[1], 0x80);
        assert_eq!(code.bytes[2], 0x85);
    }

    #[test]
    fn test_backward_branch_minimal_width() {
        let mut builder = CodeBuilder::new(0, 0);
        let head = builder.position();
        builder.emit(opcode::NOP);
        builder.emit_backward_branch(opcode::JUMP_BACKWARD, head);
        let code = builder.finish();
        // One opcode byte plus a single offset byte.
        assert_eq!(code.bytes.len(), 3);
        assert_eq!(code.branch_operand(1), 1);
    }

    #[test]
    #[should_panic(expected = "outside window")]
    fn test_register_out_of_window_panics() {
        let builder = CodeBuilder::new(2, 0);
        builder.register(5);
    }
}
