//! Fix-up resolution tests.
//!
//! Forward references resolve at `finish()`; unresolved and out-of-range
//! references become diagnostics carrying their source location.

use mipsim_core::asm::ErrorKind;
use mipsim_core::common::{Address, MemWidth};
use mipsim_core::sim::machine::Machine;

use crate::common::{EXIT, NoIncludes, assemble_into, run_to_halt, single_config};

/// A forward conditional branch is patched to the later label.
#[test]
fn forward_branch_resolves() {
    let mut machine = assemble_into(
        single_config(),
        "
    beq $zero, $zero, later
    nop
    nop
later:
",
    );
    // Offset from the delay slot (0x400004) to 0x40000C: 2 words.
    let word = machine
        .read_debug(Address::new(0x0040_0000), MemWidth::Word)
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(word & 0xFFFF, 2);
}

/// A forward `jal` patches the 26-bit target field.
#[test]
fn forward_jump_resolves() {
    let mut machine = assemble_into(
        single_config(),
        "
    jal routine
    nop
routine:
",
    );
    let word = machine
        .read_debug(Address::new(0x0040_0000), MemWidth::Word)
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(word >> 26, 3, "jal opcode");
    assert_eq!((word & 0x03FF_FFFF) << 2, 0x0040_0008);
}

/// `la` with a forward data symbol resolves both halves.
#[test]
fn forward_la_resolves() {
    let machine = run_to_halt(
        single_config(),
        &format!(
            "
    la  $t0, buffer
    lw  $t1, 0($t0)
{EXIT}
    .data
    .org 0x12344
buffer: .word 77
"
        ),
    );
    assert_eq!(machine.regs().read_gp(8), 0x0001_2344);
    assert_eq!(machine.regs().read_gp(9), 77);
}

/// `.word` forward references patch the whole word.
#[test]
fn forward_word_resolves() {
    let mut machine = assemble_into(
        single_config(),
        "
    .data
    .org 0x2000
table: .word end, 5
end:
",
    );
    let word = machine
        .read_debug(Address::new(0x2000), MemWidth::Word)
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(word, 0x2008, "address of `end` after two words");
}

/// An undefined forward reference surfaces at finish with its location.
#[test]
fn undefined_symbol_diagnosed() {
    let mut machine = Machine::new(single_config());
    let result = machine.assemble_source(
        "
    beq $zero, $zero, nowhere
    nop
",
        "prog.S",
        &NoIncludes,
    );
    assert!(!result.ok);
    let diagnostic = &result.diagnostics[0];
    assert!(matches!(
        &diagnostic.kind,
        ErrorKind::UndefinedSymbol(name) if name == "nowhere"
    ));
    assert_eq!(diagnostic.loc.line, 2);
    assert_eq!(diagnostic.loc.file, "prog.S");
}

/// A branch target beyond the 16-bit offset range is diagnosed.
#[test]
fn branch_out_of_range() {
    let mut machine = Machine::new(single_config());
    let result = machine.assemble_source(
        "
    beq $zero, $zero, far
    nop
    .org 0x480000
far:
",
        "prog.S",
        &NoIncludes,
    );
    assert!(!result.ok);
    assert!(matches!(
        result.diagnostics[0].kind,
        ErrorKind::OutOfRange(_, "16-bit branch offset")
    ));
}

/// A jump outside the 256 MiB region is diagnosed as unreachable.
#[test]
fn jump_out_of_region() {
    let mut machine = Machine::new(single_config());
    let result = machine.assemble_source(
        "
    j far
    nop
    .org 0x10000000
far:
",
        "prog.S",
        &NoIncludes,
    );
    assert!(!result.ok);
    assert!(matches!(
        result.diagnostics[0].kind,
        ErrorKind::Unreachable(0x1000_0000, _)
    ));
}

/// Backward references need no fix-up and still assemble correctly.
#[test]
fn backward_reference_direct() {
    let machine = run_to_halt(
        single_config(),
        &format!(
            "
    b     start
    nop
start:
    addiu $t0, $zero, 1
    bne   $t0, $zero, done
    nop
    addiu $t1, $zero, 9    # skipped
done:
{EXIT}"
        ),
    );
    assert_eq!(machine.regs().read_gp(8), 1);
    assert_eq!(machine.regs().read_gp(9), 0);
}
