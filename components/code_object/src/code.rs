//! Code object - immutable compiled-function artifact
//!
//! Produced by the compiler (or [`crate::CodeBuilder`] in embedders and
//! tests), shared by reference between every frame that runs it.

use crate::literal::Literal;

/// Code object flags.
pub mod flags {
    /// Strict-mode code.
    pub const STRICT: u16 = 0x01;
    /// Arrow function (lexical `this`).
    pub const ARROW: u16 = 0x02;
    /// Constructable function (class constructor or ordinary function).
    pub const CONSTRUCTOR: u16 = 0x04;
    /// Direct-eval code; the completion value of the last statement is
    /// reported through the block-result slot.
    pub const DIRECT_EVAL: u16 = 0x08;
    /// The last declared parameter is a rest parameter.
    pub const REST_PARAMETER: u16 = 0x10;
}

/// An immutable compiled function or program body.
///
/// Invariant: never mutated after construction. Multiple frames may hold
/// references concurrently only through nested/recursive calls on the
/// single VM thread.
#[derive(Debug)]
pub struct CodeObject {
    /// Instruction byte stream.
    pub bytes: Box<[u8]>,
    /// Literal pool. Encoded literal indexes at or above
    /// [`CodeObject::register_count`] address this pool at
    /// `index - register_count`.
    pub literals: Box<[Literal]>,
    /// Size of the register window (arguments, locals, temporaries).
    pub register_count: u32,
    /// Number of declared arguments.
    pub argument_count: u32,
    /// Flag bits, see [`flags`].
    pub flags: u16,
}

impl CodeObject {
    /// Check a single flag bit.
    pub fn has_flag(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    /// Read the literal pool entry for an encoded literal index.
    ///
    /// # Panics
    ///
    /// Panics when the index falls inside the register window or past the
    /// pool; both indicate malformed bytecode, an engine bug.
    pub fn literal(&self, encoded_index: u32) -> &Literal {
        let pool_index = encoded_index
            .checked_sub(self.register_count)
            .unwrap_or_else(|| {
                panic!(
                    "literal index {} addresses the register window",
                    encoded_index
                )
            }) as usize;
        &self.literals[pool_index]
    }

    /// Decode the variable-length branch offset of the instruction
    /// starting at `instr_start`, skipping the opcode byte(s). Returns
    /// the offset magnitude. Used by Find-Finally to inspect prologue
    /// instructions without executing them.
    pub fn branch_operand(&self, instr_start: usize) -> u32 {
        let mut pos = instr_start + 1;
        if self.bytes[instr_start] == crate::opcode::EXT_OPCODE {
            pos += 1;
        }
        let mut value: u32 = 0;
        loop {
            let byte = self.bytes[pos];
            pos += 1;
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return value;
            }
        }
    }

    /// Length in bytes of the instruction starting at `instr_start`,
    /// assuming a branch-mode instruction (opcode bytes plus offset).
    pub fn branch_instruction_len(&self, instr_start: usize) -> usize {
        let mut pos = instr_start + 1;
        if self.bytes[instr_start] == crate::opcode::EXT_OPCODE {
            pos += 1;
        }
        while self.bytes[pos] & 0x80 != 0 {
            pos += 1;
        }
        pos + 1 - instr_start
    }

    /// The opcode byte at an offset, looking through the extension
    /// prefix. Returns `(is_extended, opcode)`.
    pub fn opcode_at(&self, offset: usize) -> (bool, u8) {
        let byte = self.bytes[offset];
        if byte == crate::opcode::EXT_OPCODE {
            (true, self.bytes[offset + 1])
        } else {
            (false, byte)
        }
    }
}
