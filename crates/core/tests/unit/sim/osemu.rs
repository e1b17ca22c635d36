//! OS-call emulation tests.
//!
//! The SPIM-style call set routed through the serial port, and the exit
//! call as a halt condition on both cores.

use std::cell::RefCell;
use std::rc::Rc;

use mipsim_core::config::{HazardUnit, MachineConfig};
use mipsim_core::core::events::{EventKind, MachineEvent};
use mipsim_core::sim::machine::{Machine, RunStatus};

use crate::common::{EXIT, TEST_BUDGET, assemble_into, pipelined_config, run_to_halt};

/// A single-cycle configuration with OS-call emulation enabled.
fn osemu_config() -> MachineConfig {
    MachineConfig {
        osemu_enable: true,
        ..MachineConfig::default()
    }
}

/// Collects serial output produced during a run.
fn collect_output(machine: &mut Machine) -> Rc<RefCell<Vec<u8>>> {
    let bytes: Rc<RefCell<Vec<u8>>> = Rc::default();
    let sink = Rc::clone(&bytes);
    machine.observe(EventKind::Serial, move |event| {
        if let MachineEvent::SerialOutput { byte } = event {
            sink.borrow_mut().push(*byte);
        }
    });
    bytes
}

/// print_int renders the signed value of `$a0`.
#[test]
fn print_int() {
    let mut machine = assemble_into(
        osemu_config(),
        &format!(
            "
    addiu $a0, $zero, -42
    addiu $v0, $zero, 1
    syscall
{EXIT}"
        ),
    );
    let bytes = collect_output(&mut machine);
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);
    assert_eq!(bytes.borrow().as_slice(), b"-42");
}

/// print_string walks memory to the NUL terminator.
#[test]
fn print_string() {
    let mut machine = assemble_into(
        osemu_config(),
        &format!(
            "
    la    $a0, text
    addiu $v0, $zero, 4
    syscall
{EXIT}
    .data
text: .asciz \"ok\\n\"
"
        ),
    );
    let bytes = collect_output(&mut machine);
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);
    assert_eq!(bytes.borrow().as_slice(), b"ok\n");
}

/// print_char emits the low byte of `$a0`.
#[test]
fn print_char() {
    let mut machine = assemble_into(
        osemu_config(),
        &format!(
            "
    addiu $a0, $zero, 88    # 'X'
    addiu $v0, $zero, 11
    syscall
{EXIT}"
        ),
    );
    let bytes = collect_output(&mut machine);
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);
    assert_eq!(bytes.borrow().as_slice(), b"X");
}

/// read_int parses a queued decimal line into `$v0`.
#[test]
fn read_int() {
    let mut machine = assemble_into(
        osemu_config(),
        &format!(
            "
    addiu $v0, $zero, 5
    syscall
    move  $t0, $v0
{EXIT}"
        ),
    );
    machine.queue_serial_input(b"123\n");
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);
    assert_eq!(machine.regs().read_gp(8), 123);
}

/// read_char pops one byte into `$v0`.
#[test]
fn read_char() {
    let mut machine = assemble_into(
        osemu_config(),
        &format!(
            "
    addiu $v0, $zero, 12
    syscall
    move  $t0, $v0
{EXIT}"
        ),
    );
    machine.queue_serial_input(b"Q");
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);
    assert_eq!(machine.regs().read_gp(8), u32::from(b'Q'));
}

/// With emulation disabled, non-exit calls are no-ops and exit still halts.
#[test]
fn disabled_osemu_is_inert() {
    let machine = run_to_halt(
        MachineConfig::default(),
        &format!(
            "
    addiu $a0, $zero, 7
    addiu $v0, $zero, 1
    syscall                 # ignored: emulation disabled
    addiu $t0, $zero, 3
{EXIT}"
        ),
    );
    assert_eq!(machine.regs().read_gp(8), 3, "execution continues");
}

/// The exit call halts the pipelined core too.
#[test]
fn exit_halts_pipeline() {
    let mut machine = assemble_into(
        pipelined_config(HazardUnit::Forward),
        &format!("{EXIT}"),
    );
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);
    assert!(machine.is_halted());
}
