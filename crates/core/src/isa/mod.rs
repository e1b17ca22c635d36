//! Instruction set model.
//!
//! Decoding, encoding, and disassembly of the supported MIPS-I integer
//! subset. Decoding is a pure function over a 32-bit word; the encoder is
//! its exact inverse for every supported instruction.

/// Register naming conventions and well-known indices.
pub mod abi;
/// Word-to-instruction decoder.
pub mod decode;
/// Instruction-to-text disassembler.
pub mod disasm;
/// Instruction-to-word encoder and field builders.
pub mod encode;
/// Secondary operation field constants (SPECIAL, REGIMM, COP0).
pub mod funct;
/// Decoded instruction record and field extraction.
pub mod instruction;
/// Primary opcode constants.
pub mod opcodes;

pub use decode::decode;
pub use disasm::disassemble;
pub use encode::encode;
pub use instruction::{Instruction, InstructionBits, Operation, Relocation};
