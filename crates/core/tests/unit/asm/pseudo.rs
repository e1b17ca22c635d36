//! Pseudo-instruction expansion tests.
//!
//! Verifies the documented expansions by inspecting the emitted words and
//! by executing the expanded forms.

use mipsim_core::common::{Address, MemWidth};
use mipsim_core::sim::machine::Machine;

use crate::common::{EXIT, assemble_into, run_to_halt, single_config};

/// Reads the text-section word at the given index.
fn text_word(machine: &mut Machine, index: u32) -> u32 {
    machine
        .read_debug(Address::new(0x0040_0000 + index * 4), MemWidth::Word)
        .unwrap_or_else(|e| panic!("{e}"))
}

/// `nop` is the all-zero word.
#[test]
fn nop_is_zero() {
    let mut machine = assemble_into(single_config(), "    nop\n");
    assert_eq!(text_word(&mut machine, 0), 0);
}

/// `la` always expands to the lui/ori pair.
#[test]
fn la_pair() {
    let mut machine = assemble_into(
        single_config(),
        "
    .set target, 0x12345678
    la  $t0, target
",
    );
    // lui $t0, 0x1234 ; ori $t0, $t0, 0x5678
    assert_eq!(text_word(&mut machine, 0), 0x3C08_1234);
    assert_eq!(text_word(&mut machine, 1), 0x3508_5678);
}

/// `li` selects the shortest encoding per value.
#[test]
fn li_shortest_forms() {
    let mut machine = assemble_into(
        single_config(),
        "
    li  $t0, 100            # addiu
    li  $t1, -5             # addiu (sign-extends)
    li  $t2, 0xFFFF         # ori (zero-extends)
    li  $t3, 0x70001        # lui + ori (two words)
    li  $t4, 0x50000        # low half zero: lui only
",
    );
    assert_eq!(text_word(&mut machine, 0), 0x2408_0064, "addiu $t0,$0,100");
    assert_eq!(text_word(&mut machine, 1), 0x2409_FFFB, "addiu $t1,$0,-5");
    assert_eq!(text_word(&mut machine, 2), 0x340A_FFFF, "ori $t2,$0,0xFFFF");
    assert_eq!(text_word(&mut machine, 3), 0x3C0B_0007, "lui $t3,7");
    assert_eq!(text_word(&mut machine, 4), 0x356B_0001, "ori $t3,$t3,1");
    assert_eq!(text_word(&mut machine, 5), 0x3C0C_0005, "lui $t4,5");
}

/// The expanded `li` forms load the intended values.
#[test]
fn li_values_correct() {
    let machine = run_to_halt(
        single_config(),
        &format!(
            "
    li  $t0, 100
    li  $t1, -5
    li  $t2, 0xFFFF
    li  $t3, 0x12345678
{EXIT}"
        ),
    );
    let regs = machine.regs();
    assert_eq!(regs.read_gp(8), 100);
    assert_eq!(regs.read_gp(9), 0xFFFF_FFFB);
    assert_eq!(regs.read_gp(10), 0xFFFF);
    assert_eq!(regs.read_gp(11), 0x1234_5678);
}

/// `b` is an unconditional `beq $0, $0`.
#[test]
fn b_is_beq_zero() {
    let mut machine = assemble_into(
        single_config(),
        "
    b   skip
    nop
skip:
",
    );
    // beq $0, $0, +1
    assert_eq!(text_word(&mut machine, 0), 0x1000_0001);
}

/// `move`, `neg`, and `not` expand to their R-format equivalents.
#[test]
fn register_pseudos() {
    let mut machine = assemble_into(
        single_config(),
        "
    move $t0, $t1
    neg  $t2, $t3
    not  $t4, $t5
",
    );
    // addu $t0, $0, $t1
    assert_eq!(text_word(&mut machine, 0), 0x0009_4021);
    // sub $t2, $0, $t3
    assert_eq!(text_word(&mut machine, 1), 0x000B_5022);
    // nor $t4, $t5, $0
    assert_eq!(text_word(&mut machine, 2), 0x01A0_6027);
}

/// `beqz`/`bnez` compare against the zero register.
#[test]
fn zero_branches() {
    let machine = run_to_halt(
        single_config(),
        &format!(
            "
    addiu $t0, $zero, 1
    beqz  $t0, wrong
    nop
    bnez  $t0, right
    nop
    b     end
    nop
wrong:
    addiu $t1, $zero, 1
    b     end
    nop
right:
    addiu $t2, $zero, 2
end:
{EXIT}"
        ),
    );
    assert_eq!(machine.regs().read_gp(9), 0, "beqz on non-zero must fall through");
    assert_eq!(machine.regs().read_gp(10), 2, "bnez on non-zero must branch");
}
