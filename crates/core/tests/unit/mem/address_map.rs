//! Address space tests.
//!
//! Registration disjointness, bus errors, strict alignment, the big-endian
//! architectural view, and bulk range transfer.

use mipsim_core::common::{AccessSource, Address, MemWidth, Trap};
use mipsim_core::mem::{AddressSpace, Ram};

/// A space with 64 KiB of RAM at 0x1000.
fn space() -> AddressSpace {
    let mut space = AddressSpace::new();
    space
        .register(Address::new(0x1000), Box::new(Ram::new(0x10000)))
        .unwrap_or_else(|e| panic!("{e}"));
    space
}

// ══════════════════════════════════════════════════════════
// 1. Registration
// ══════════════════════════════════════════════════════════

/// Overlapping registrations are rejected in either direction.
#[test]
fn overlap_rejected() {
    let mut space = space();
    // Starts inside the existing range.
    assert!(
        space
            .register(Address::new(0x8000), Box::new(Ram::new(0x400)))
            .is_err()
    );
    // Starts below but reaches into it.
    assert!(
        space
            .register(Address::new(0x0800), Box::new(Ram::new(0x1000)))
            .is_err()
    );
    // Disjoint above is fine.
    assert!(
        space
            .register(Address::new(0x2_0000), Box::new(Ram::new(0x400)))
            .is_ok()
    );
}

/// A range may not wrap past the top of the address space.
#[test]
fn wrapping_range_rejected() {
    let mut space = AddressSpace::new();
    assert!(
        space
            .register(Address::new(0xFFFF_FF00), Box::new(Ram::new(0x1000)))
            .is_err()
    );
}

// ══════════════════════════════════════════════════════════
// 2. Access routing
// ══════════════════════════════════════════════════════════

/// Unmapped accesses raise a bus error carrying the address.
#[test]
fn unmapped_is_bus_error() {
    let mut space = space();
    assert_eq!(
        space.read_word(Address::new(0x0100)),
        Err(Trap::BusError(Address::new(0x0100)))
    );
    assert_eq!(
        space.write_word(Address::new(0xFF00_0000), 1),
        Err(Trap::BusError(Address::new(0xFF00_0000)))
    );
}

/// Misaligned half and word accesses fault; bytes never do.
#[test]
fn strict_alignment() {
    let mut space = space();
    assert_eq!(
        space.read(Address::new(0x1002), MemWidth::Word, AccessSource::Cpu),
        Err(Trap::UnalignedAccess(Address::new(0x1002)))
    );
    assert_eq!(
        space.read(Address::new(0x1001), MemWidth::Half, AccessSource::Cpu),
        Err(Trap::UnalignedAccess(Address::new(0x1001)))
    );
    assert!(
        space
            .read(Address::new(0x1003), MemWidth::Byte, AccessSource::Cpu)
            .is_ok()
    );
}

/// The architectural view is big-endian and round-trips through bytes.
#[test]
fn big_endian_round_trip() {
    let mut space = space();
    space
        .write_word(Address::new(0x1000), 0x1122_3344)
        .unwrap_or_else(|e| panic!("{e}"));

    let byte = |space: &mut AddressSpace, addr: u32| {
        space
            .read(Address::new(addr), MemWidth::Byte, AccessSource::Cpu)
            .unwrap_or_else(|e| panic!("{e}"))
    };
    assert_eq!(byte(&mut space, 0x1000), 0x11);
    assert_eq!(byte(&mut space, 0x1001), 0x22);
    assert_eq!(byte(&mut space, 0x1002), 0x33);
    assert_eq!(byte(&mut space, 0x1003), 0x44);

    // Halves compose from the same bytes.
    assert_eq!(
        space
            .read(Address::new(0x1000), MemWidth::Half, AccessSource::Cpu)
            .unwrap_or_else(|e| panic!("{e}")),
        0x1122
    );
    assert_eq!(
        space
            .read(Address::new(0x1002), MemWidth::Half, AccessSource::Cpu)
            .unwrap_or_else(|e| panic!("{e}")),
        0x3344
    );
}

/// Sub-word writes merge into the containing word.
#[test]
fn subword_write_merge() {
    let mut space = space();
    space
        .write_word(Address::new(0x1000), 0xAABB_CCDD)
        .unwrap_or_else(|e| panic!("{e}"));
    space
        .write(Address::new(0x1001), MemWidth::Byte, 0xEE, AccessSource::Cpu)
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(space.read_word(Address::new(0x1000)), Ok(0xAAEE_CCDD));

    space
        .write(Address::new(0x1002), MemWidth::Half, 0x1234, AccessSource::Cpu)
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(space.read_word(Address::new(0x1000)), Ok(0xAAEE_1234));
}

// ══════════════════════════════════════════════════════════
// 3. Bulk transfer
// ══════════════════════════════════════════════════════════

/// write_range / read_range round-trip across word boundaries.
#[test]
fn range_round_trip() {
    let mut space = space();
    let data: Vec<u8> = (0..=255).collect();
    space
        .write_range(Address::new(0x1002), &data, AccessSource::Debugger)
        .unwrap_or_else(|e| panic!("{e}"));

    let mut back = vec![0u8; 256];
    space
        .read_range(Address::new(0x1002), &mut back, AccessSource::Debugger)
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(back, data);
}

/// A range write that leaves mapped memory reports the bus error.
#[test]
fn range_write_unmapped_fails() {
    let mut space = space();
    let result = space.write_range(Address::new(0x1_0FFE), &[1, 2, 3, 4], AccessSource::Debugger);
    assert!(matches!(result, Err(Trap::BusError(_))));
}
