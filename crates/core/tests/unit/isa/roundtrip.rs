//! Decode/encode round-trip.
//!
//! `decode(encode(i)) == i` must hold for every supported instruction. The
//! exhaustive walk covers one canonical word per operation; the property
//! test covers the full canonical field space per format.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use mipsim_core::isa::encode::{cop0, i_type, j_type, r_type, regimm};
use mipsim_core::isa::instruction::InstructionBits;
use mipsim_core::isa::{decode, encode, funct, opcodes};

// ══════════════════════════════════════════════════════════
// 1. Exhaustive canonical walk
// ══════════════════════════════════════════════════════════

/// Every R-format operation re-encodes to its original word.
#[test]
fn special_words_roundtrip() {
    let functs = [
        funct::FN_SLL,
        funct::FN_SRL,
        funct::FN_SRA,
        funct::FN_SLLV,
        funct::FN_SRLV,
        funct::FN_SRAV,
        funct::FN_JR,
        funct::FN_JALR,
        funct::FN_MFHI,
        funct::FN_MTHI,
        funct::FN_MFLO,
        funct::FN_MTLO,
        funct::FN_MULT,
        funct::FN_MULTU,
        funct::FN_DIV,
        funct::FN_DIVU,
        funct::FN_ADD,
        funct::FN_ADDU,
        funct::FN_SUB,
        funct::FN_SUBU,
        funct::FN_AND,
        funct::FN_OR,
        funct::FN_XOR,
        funct::FN_NOR,
        funct::FN_SLT,
        funct::FN_SLTU,
    ];
    for fn_code in functs {
        let word = r_type(fn_code, 8, 9, 10, 0);
        let inst = decode(word).unwrap_or_else(|_| panic!("funct {fn_code:#o} must decode"));
        assert_eq!(encode(&inst), word, "funct {fn_code:#o}");
    }
}

/// Every I-format opcode re-encodes to its original word.
#[test]
fn imm_words_roundtrip() {
    let ops = [
        opcodes::OP_BEQ,
        opcodes::OP_BNE,
        opcodes::OP_BLEZ,
        opcodes::OP_BGTZ,
        opcodes::OP_ADDI,
        opcodes::OP_ADDIU,
        opcodes::OP_SLTI,
        opcodes::OP_SLTIU,
        opcodes::OP_ANDI,
        opcodes::OP_ORI,
        opcodes::OP_XORI,
        opcodes::OP_LUI,
        opcodes::OP_LB,
        opcodes::OP_LH,
        opcodes::OP_LW,
        opcodes::OP_LBU,
        opcodes::OP_LHU,
        opcodes::OP_SB,
        opcodes::OP_SH,
        opcodes::OP_SW,
    ];
    for opcode in ops {
        let word = i_type(opcode, 4, 5, 0xBEEF);
        let inst = decode(word).unwrap_or_else(|_| panic!("opcode {opcode:#o} must decode"));
        assert_eq!(encode(&inst), word, "opcode {opcode:#o}");
    }
}

/// Jumps, REGIMM branches, COP0 moves, and code-field words round-trip.
#[test]
fn remaining_formats_roundtrip() {
    let words = [
        j_type(opcodes::OP_J, 0x12_3456),
        j_type(opcodes::OP_JAL, 0x03FF_FFFF),
        regimm(funct::RI_BLTZ, 3, 0x8000),
        regimm(funct::RI_BGEZ, 3, 0x7FFF),
        regimm(funct::RI_BLTZAL, 9, 4),
        regimm(funct::RI_BGEZAL, 9, 4),
        cop0(funct::C0_MFC0, 2, 14),
        cop0(funct::C0_MTC0, 2, 12),
        (0x1234 << 6) | funct::FN_SYSCALL,
        (0xF_FFFF << 6) | funct::FN_BREAK,
    ];
    for word in words {
        let inst = decode(word).unwrap_or_else(|_| panic!("{word:#010x} must decode"));
        assert_eq!(encode(&inst), word, "{word:#010x}");
    }
}

/// Unknown primary opcodes are rejected, not silently misdecoded.
#[test]
fn unsupported_opcodes_rejected() {
    for opcode in [0o21u32, 0o30, 0o42, 0o52, 0o61, 0o77] {
        let word = opcode << 26;
        assert!(decode(word).is_err(), "opcode {opcode:#o} must be rejected");
    }
}

/// Unknown SPECIAL function codes are rejected.
#[test]
fn unsupported_functs_rejected() {
    for fn_code in [0o01u32, 0o05, 0o16, 0o27, 0o54, 0o77] {
        assert!(decode(fn_code).is_err(), "funct {fn_code:#o} must be rejected");
    }
}

/// The all-zero word is the canonical NOP.
#[test]
fn zero_word_is_nop() {
    let inst = decode(0).unwrap_or_else(|_| panic!("NOP must decode"));
    assert!(inst.is_nop());
    assert_eq!(encode(&inst), 0);
}

// ══════════════════════════════════════════════════════════
// 2. Property: canonical field space
// ══════════════════════════════════════════════════════════

/// Strategy generating canonical words across all formats.
fn canonical_word() -> impl Strategy<Value = u32> {
    use proptest::sample::select;

    let r3 = (
        select(vec![
            funct::FN_ADD,
            funct::FN_ADDU,
            funct::FN_SUB,
            funct::FN_SUBU,
            funct::FN_AND,
            funct::FN_OR,
            funct::FN_XOR,
            funct::FN_NOR,
            funct::FN_SLT,
            funct::FN_SLTU,
            funct::FN_SLLV,
            funct::FN_SRLV,
            funct::FN_SRAV,
        ]),
        0usize..32,
        0usize..32,
        0usize..32,
    )
        .prop_map(|(fn_code, rs, rt, rd)| r_type(fn_code, rs, rt, rd, 0));

    let shift = (
        select(vec![funct::FN_SLL, funct::FN_SRL, funct::FN_SRA]),
        0usize..32,
        0usize..32,
        0u32..32,
    )
        .prop_map(|(fn_code, rt, rd, shamt)| r_type(fn_code, 0, rt, rd, shamt));

    let imm = (
        select(vec![
            opcodes::OP_ADDI,
            opcodes::OP_ADDIU,
            opcodes::OP_SLTI,
            opcodes::OP_SLTIU,
            opcodes::OP_ANDI,
            opcodes::OP_ORI,
            opcodes::OP_XORI,
            opcodes::OP_LUI,
            opcodes::OP_LB,
            opcodes::OP_LBU,
            opcodes::OP_LH,
            opcodes::OP_LHU,
            opcodes::OP_LW,
            opcodes::OP_SB,
            opcodes::OP_SH,
            opcodes::OP_SW,
            opcodes::OP_BEQ,
            opcodes::OP_BNE,
        ]),
        0usize..32,
        0usize..32,
        any::<u16>(),
    )
        .prop_map(|(opcode, rs, rt, imm16)| i_type(opcode, rs, rt, imm16));

    let jump = (
        select(vec![opcodes::OP_J, opcodes::OP_JAL]),
        0u32..0x0400_0000,
    )
        .prop_map(|(opcode, target)| j_type(opcode, target));

    prop_oneof![r3, shift, imm, jump]
}

proptest! {
    /// Decoding a canonical word and re-encoding it is the identity.
    #[test]
    fn decode_encode_identity(word in canonical_word()) {
        let Ok(inst) = decode(word) else {
            return Err(TestCaseError::fail(format!("{word:#010x} failed to decode")));
        };
        prop_assert_eq!(encode(&inst), word);
        // Field extraction agrees with the decoded record.
        prop_assert_eq!(inst.rs, word.rs());
        prop_assert_eq!(inst.rt, word.rt());
    }
}
