//! Single-cycle core programs.
//!
//! End-to-end programs through the assembler and the single-cycle core:
//! arithmetic, memory, control flow, HI/LO, and the zero-register invariant.

use crate::common::{EXIT, run_to_halt, single_config};

/// Straight-line arithmetic lands in the right registers.
#[test]
fn arithmetic_chain() {
    let machine = run_to_halt(
        single_config(),
        &format!(
            "
    addiu $t0, $zero, 5
    addiu $t1, $zero, 7
    addu  $t2, $t0, $t1
    subu  $t3, $t1, $t0
    and   $t4, $t0, $t1
    or    $t5, $t0, $t1
{EXIT}"
        ),
    );
    let regs = machine.regs();
    assert_eq!(regs.read_gp(10), 12);
    assert_eq!(regs.read_gp(11), 2);
    assert_eq!(regs.read_gp(12), 5);
    assert_eq!(regs.read_gp(13), 7);
}

/// Loads and stores round-trip through memory with extension rules.
#[test]
fn memory_round_trip() {
    let machine = run_to_halt(
        single_config(),
        &format!(
            "
    .data
value: .word 0
    .text
    la    $t0, value
    addiu $t1, $zero, -2
    sw    $t1, 0($t0)
    lw    $t2, 0($t0)
    lb    $t3, 3($t0)
    lbu   $t4, 3($t0)
    lh    $t5, 2($t0)
    lhu   $t6, 2($t0)
{EXIT}"
        ),
    );
    let regs = machine.regs();
    assert_eq!(regs.read_gp(10), 0xFFFF_FFFE);
    assert_eq!(regs.read_gp(11), 0xFFFF_FFFE, "lb sign-extends");
    assert_eq!(regs.read_gp(12), 0x0000_00FE, "lbu zero-extends");
    assert_eq!(regs.read_gp(13), 0xFFFF_FFFE, "lh sign-extends");
    assert_eq!(regs.read_gp(14), 0x0000_FFFE, "lhu zero-extends");
}

/// A counted loop with a backward branch.
#[test]
fn counted_loop() {
    let machine = run_to_halt(
        single_config(),
        &format!(
            "
    addiu $t0, $zero, 0      # sum
    addiu $t1, $zero, 1      # i
loop:
    addu  $t0, $t0, $t1
    addiu $t1, $t1, 1
    slti  $t2, $t1, 6
    bne   $t2, $zero, loop
    nop                      # delay slot
{EXIT}"
        ),
    );
    assert_eq!(machine.regs().read_gp(8), 15, "sum 1..5");
}

/// JAL links and JR returns.
#[test]
fn call_and_return() {
    let machine = run_to_halt(
        single_config(),
        &format!(
            "
    jal   routine
    nop
    addiu $t1, $zero, 2
{EXIT}
routine:
    addiu $t0, $zero, 1
    jr    $ra
    nop
"
        ),
    );
    assert_eq!(machine.regs().read_gp(8), 1);
    assert_eq!(machine.regs().read_gp(9), 2);
}

/// HI/LO through multiply, divide, and the move instructions.
#[test]
fn hi_lo_plumbing() {
    let machine = run_to_halt(
        single_config(),
        &format!(
            "
    addiu $t0, $zero, 100
    addiu $t1, $zero, 7
    div   $t0, $t1
    mflo  $t2               # 14
    mfhi  $t3               # 2
    mthi  $t0
    mtlo  $t1
{EXIT}"
        ),
    );
    let regs = machine.regs();
    assert_eq!(regs.read_gp(10), 14);
    assert_eq!(regs.read_gp(11), 2);
    assert_eq!(regs.read_hi(), 100);
    assert_eq!(regs.read_lo(), 7);
}

/// Register 0 stays zero through direct writes.
#[test]
fn zero_register_immutable() {
    let machine = run_to_halt(
        single_config(),
        &format!(
            "
    addiu $zero, $zero, 123
    addiu $t0, $zero, 1
{EXIT}"
        ),
    );
    assert_eq!(machine.regs().read_gp(0), 0);
    assert_eq!(machine.regs().read_gp(8), 1);
}

/// MTC0/MFC0 round-trip through coprocessor 0.
#[test]
fn cp0_moves() {
    let machine = run_to_halt(
        single_config(),
        &format!(
            "
    addiu $t0, $zero, 0x55
    mtc0  $t0, $12          # Status
    mfc0  $t1, $12
{EXIT}"
        ),
    );
    assert_eq!(machine.regs().read_gp(9), 0x55);
    assert_eq!(machine.regs().read_cp0(12), 0x55);
}
