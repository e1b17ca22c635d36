//! Machine lifecycle tests.
//!
//! Observer notifications (exactly one per register write), the
//! zero-register invariant, breakpoints, cancellation, cycle budgets,
//! reset, and peripheral plumbing.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::Ordering;

use mipsim_core::common::Address;
use mipsim_core::core::events::{EventKind, MachineEvent, RegKind};
use mipsim_core::sim::machine::{Machine, RunStatus};

use crate::common::{EXIT, TEST_BUDGET, assemble_into, pipelined_config, run_to_halt, single_config};

// ══════════════════════════════════════════════════════════
// 1. Observer notifications
// ══════════════════════════════════════════════════════════

/// Every GP write emits exactly one change notification.
#[test]
fn one_notification_per_write() {
    let counts: Rc<RefCell<Vec<(usize, u32, u32)>>> = Rc::default();
    let sink = Rc::clone(&counts);

    let mut machine = assemble_into(
        single_config(),
        &format!(
            "
    addiu $t0, $zero, 5
    addiu $t0, $t0, 1
    addiu $t1, $zero, 7
{EXIT}"
        ),
    );
    machine.observe(EventKind::Register, move |event| {
        if let MachineEvent::RegisterChange {
            kind: RegKind::Gp,
            index,
            old,
            new,
        } = event
        {
            sink.borrow_mut().push((*index, *old, *new));
        }
    });
    let status = machine.run(Some(TEST_BUDGET));
    assert_eq!(status, RunStatus::Halted);

    // Three writes to $t0/$t0/$t1 plus one to $v0 from the exit sequence.
    let events = counts.borrow();
    assert_eq!(
        events.as_slice(),
        &[(8, 0, 5), (8, 5, 6), (9, 0, 7), (2, 0, 10)]
    );
}

/// Writes to the zero register emit nothing; `$zero` stays zero every cycle.
#[test]
fn zero_register_invariant_observed() {
    let zero_writes: Rc<RefCell<u32>> = Rc::default();
    let sink = Rc::clone(&zero_writes);

    let mut machine = assemble_into(
        single_config(),
        &format!(
            "
    addiu $zero, $zero, 42
    addu  $zero, $zero, $zero
    addiu $t0, $zero, 1
{EXIT}"
        ),
    );
    machine.observe(EventKind::Register, move |event| {
        if let MachineEvent::RegisterChange {
            kind: RegKind::Gp,
            index: 0,
            ..
        } = event
        {
            *sink.borrow_mut() += 1;
        }
    });

    while !machine.is_halted() {
        machine.step();
        assert_eq!(machine.regs().read_gp(0), 0, "gp[0] after a cycle");
    }
    assert_eq!(*zero_writes.borrow(), 0, "no notification for $zero writes");
}

/// Memory writes surface as typed events with address and value.
#[test]
fn memory_write_events() {
    let stores: Rc<RefCell<Vec<(u32, u32)>>> = Rc::default();
    let sink = Rc::clone(&stores);

    let mut machine = assemble_into(
        single_config(),
        &format!(
            "
    addiu $t0, $zero, 33
    sw    $t0, 0x180($zero)
{EXIT}"
        ),
    );
    machine.observe(EventKind::Memory, move |event| {
        if let MachineEvent::MemoryWrite { addr, value, .. } = event {
            sink.borrow_mut().push((addr.val(), *value));
        }
    });
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);
    assert_eq!(stores.borrow().as_slice(), &[(0x180, 33)]);
}

/// Notifications for a cycle fire in stage order IF→ID→EX→MEM→WB: when a
/// store sits in MEM during the same cycle an older instruction writes
/// back, the memory event precedes the write-back notification.
#[test]
fn notifications_fire_in_stage_order() {
    use mipsim_core::config::HazardUnit;

    let log: Rc<RefCell<Vec<String>>> = Rc::default();

    // addiu writes back in the exact cycle the sw performs its access.
    let mut machine = assemble_into(
        pipelined_config(HazardUnit::Forward),
        &format!(
            "
    addiu $t0, $zero, 5
    sw    $t0, 0x180($zero)
{EXIT}"
        ),
    );

    let sink = Rc::clone(&log);
    machine.observe(EventKind::Memory, move |event| {
        if let MachineEvent::MemoryWrite { addr, .. } = event {
            sink.borrow_mut().push(format!("mem:{:#x}", addr.val()));
        }
    });
    let sink = Rc::clone(&log);
    machine.observe(EventKind::Register, move |event| {
        if let MachineEvent::RegisterChange {
            kind: RegKind::Gp,
            index,
            ..
        } = event
        {
            sink.borrow_mut().push(format!("gp:{index}"));
        }
    });
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);

    let log = log.borrow();
    let store = log.iter().position(|e| e == "mem:0x180");
    let write_back = log.iter().position(|e| e == "gp:8");
    assert!(store.is_some() && write_back.is_some(), "{log:?}");
    assert!(store < write_back, "MEM must precede WB: {log:?}");
}

// ══════════════════════════════════════════════════════════
// 2. Run control
// ══════════════════════════════════════════════════════════

/// A breakpoint pauses the run with the machine inspectable; resuming
/// continues to the halt.
#[test]
fn breakpoint_pauses_and_resumes() {
    let mut machine = assemble_into(
        single_config(),
        &format!(
            "
    addiu $t0, $zero, 1
    addiu $t1, $zero, 2
    addiu $t2, $zero, 3
{EXIT}"
        ),
    );
    machine.add_breakpoint(Address::new(0x0040_0008));

    let status = machine.run(Some(TEST_BUDGET));
    assert_eq!(status, RunStatus::Breakpoint(Address::new(0x0040_0008)));
    assert_eq!(machine.regs().read_gp(8), 1);
    assert_eq!(machine.regs().read_gp(10), 0, "not yet executed");

    machine.remove_breakpoint(Address::new(0x0040_0008));
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);
    assert_eq!(machine.regs().read_gp(10), 3);
}

/// The cancellation flag stops the run between cycles.
#[test]
fn cancellation_stops_cleanly() {
    let mut machine = assemble_into(
        single_config(),
        "
loop:
    j loop
    nop
",
    );
    let flag = machine.cancel_flag();
    flag.store(true, Ordering::Relaxed);

    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Cancelled);
    assert!(!machine.is_halted(), "cancelled, not halted");
}

/// An infinite loop exhausts the cycle budget.
#[test]
fn budget_exhaustion() {
    let mut machine = assemble_into(
        single_config(),
        "
loop:
    j loop
    nop
",
    );
    assert_eq!(machine.run(Some(50)), RunStatus::BudgetExhausted);
    assert_eq!(machine.stats().cycles, 50);
}

/// The `_halt` symbol stops execution when the PC reaches it.
#[test]
fn halt_symbol_stops_fetch() {
    let machine = run_to_halt(
        single_config(),
        "
    addiu $t0, $zero, 4
_halt:
    addiu $t1, $zero, 9    # never executed
",
    );
    assert_eq!(machine.regs().read_gp(8), 4);
    assert_eq!(machine.regs().read_gp(9), 0);
}

/// Reset clears registers and statistics but keeps memory and symbols.
#[test]
fn reset_preserves_memory() {
    let mut machine = assemble_into(
        single_config(),
        &format!(
            "
    addiu $t0, $zero, 8
    sw    $t0, 0x140($zero)
{EXIT}"
        ),
    );
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);
    assert!(machine.stats().cycles > 0);

    machine.reset();
    assert!(!machine.is_halted());
    assert_eq!(machine.stats().cycles, 0);
    assert_eq!(machine.regs().read_gp(8), 0);
    assert_eq!(machine.regs().read_pc(), Address::new(0x0040_0000));
    // Memory survives the reset.
    let word = machine
        .read_debug(Address::new(0x140), mipsim_core::common::MemWidth::Word)
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(word, 8);
}

// ══════════════════════════════════════════════════════════
// 3. Peripherals
// ══════════════════════════════════════════════════════════

/// A store to the serial transmit register surfaces as output events.
#[test]
fn serial_output_event() {
    let bytes: Rc<RefCell<Vec<u8>>> = Rc::default();
    let sink = Rc::clone(&bytes);

    let mut machine = assemble_into(
        single_config(),
        &format!(
            "
    li    $t0, 0xFFFFC00C   # serial TX data
    addiu $t1, $zero, 72    # 'H'
    sw    $t1, 0($t0)
    addiu $t1, $zero, 105   # 'i'
    sw    $t1, 0($t0)
{EXIT}"
        ),
    );
    machine.observe(EventKind::Serial, move |event| {
        if let MachineEvent::SerialOutput { byte } = event {
            sink.borrow_mut().push(*byte);
        }
    });
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);
    assert_eq!(bytes.borrow().as_slice(), b"Hi");
}

/// Serial input queued between cycles is readable by the program.
#[test]
fn serial_input_readable() {
    let mut machine = assemble_into(
        single_config(),
        &format!(
            "
    li    $t0, 0xFFFFC000   # serial base
    lw    $t1, 0($t0)       # RX status
    lw    $t2, 4($t0)       # RX data
    lw    $t3, 0($t0)       # status afterwards
{EXIT}"
        ),
    );
    machine.queue_serial_input(b"A");
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);
    assert_eq!(machine.regs().read_gp(9), 1, "data was ready");
    assert_eq!(machine.regs().read_gp(10), u32::from(b'A'));
    assert_eq!(machine.regs().read_gp(11), 0, "queue drained");
}

/// Dial values set by the host are visible; LED stores are captured.
#[test]
fn knobs_and_leds() {
    let mut machine = assemble_into(
        single_config(),
        &format!(
            "
    li    $t0, 0xFFFFC100   # knobs base
    lw    $t1, 4($t0)       # dial 1
    addiu $t2, $zero, 0xA5
    sw    $t2, 0x10($t0)    # LED bank
{EXIT}"
        ),
    );
    machine.set_dial(1, 77);
    assert_eq!(machine.run(Some(TEST_BUDGET)), RunStatus::Halted);
    assert_eq!(machine.regs().read_gp(9), 77);
}

/// Debugger probes of the serial data register do not consume input.
#[test]
fn debugger_probe_preserves_input() {
    let mut machine = Machine::new(single_config());
    machine.queue_serial_input(b"Z");

    let data = Address::new(0xFFFF_C004);
    let first = machine
        .read_debug(data, mipsim_core::common::MemWidth::Word)
        .unwrap_or_else(|e| panic!("{e}"));
    let second = machine
        .read_debug(data, mipsim_core::common::MemWidth::Word)
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(first, u32::from(b'Z'));
    assert_eq!(second, u32::from(b'Z'), "probe must not pop the queue");
}
