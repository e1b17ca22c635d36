//! Operating-system call emulation.
//!
//! A small SPIM-compatible call set, enabled by configuration. Calls run
//! between cycles (after the SYSCALL retires) and perform their I/O through
//! the memory-mapped serial port, exactly as a program doing its own I/O
//! would. Exit (`$v0` = 10) is a machine halt condition and never reaches
//! this module; unknown codes are ignored when emulation is enabled and the
//! retiring SYSCALL behaves as a no-op.

use tracing::debug;

use crate::common::{AccessSource, Address, MemWidth};
use crate::core::arch::Registers;
use crate::isa::abi;
use crate::mem::peripherals::serial;
use crate::mem::{AddressSpace, Cache, SERIAL_BASE};

/// Print the signed integer in `$a0`.
pub const PRINT_INT: u32 = 1;
/// Print the NUL-terminated string at `$a0`.
pub const PRINT_STRING: u32 = 4;
/// Read a line from the serial input and parse a signed integer into `$v0`.
pub const READ_INT: u32 = 5;
/// Exit (handled by the cores as a halt condition).
pub const EXIT: u32 = 10;
/// Print the character in `$a0`.
pub const PRINT_CHAR: u32 = 11;
/// Read one character from the serial input into `$v0`.
pub const READ_CHAR: u32 = 12;

/// Handles one emulated call.
///
/// # Arguments
///
/// * `code` - The call number (`$v0` at the time the SYSCALL executed).
/// * `regs` - Architectural registers (results go into `$v0`).
/// * `space` - Physical address space (serial port, string memory).
/// * `dcache` - Data cache, for a coherent view of string memory.
pub fn handle(code: u32, regs: &mut Registers, space: &mut AddressSpace, dcache: &mut Cache) {
    match code {
        PRINT_INT => {
            let value = regs.read_gp(abi::REG_A0) as i32;
            emit_str(space, &value.to_string());
        }
        PRINT_STRING => {
            let mut addr = Address::new(regs.read_gp(abi::REG_A0));
            // Read through the cache so dirty lines are visible.
            for _ in 0..0x10000 {
                let Ok(byte) =
                    dcache.read(space, addr, MemWidth::Byte, AccessSource::Debugger)
                else {
                    break;
                };
                if byte == 0 {
                    break;
                }
                emit_byte(space, byte as u8);
                addr = addr.wrapping_add(1);
            }
        }
        READ_INT => {
            let mut text = String::new();
            loop {
                match read_byte(space) {
                    Some(b'\n') | None => break,
                    Some(byte) => text.push(byte as char),
                }
            }
            let value = text.trim().parse::<i64>().unwrap_or(0);
            regs.write_gp(abi::REG_V0, value as u32);
        }
        PRINT_CHAR => {
            emit_byte(space, regs.read_gp(abi::REG_A0) as u8);
        }
        READ_CHAR => {
            let byte = read_byte(space).unwrap_or(0);
            regs.write_gp(abi::REG_V0, u32::from(byte));
        }
        other => {
            debug!(target: "mipsim::osemu", code = other, "unhandled call");
        }
    }
}

/// Writes one byte to the serial transmit register.
fn emit_byte(space: &mut AddressSpace, byte: u8) {
    let addr = Address::new(SERIAL_BASE + serial::TX_DATA);
    let _ = space.write(addr, MemWidth::Word, u32::from(byte), AccessSource::Cpu);
}

/// Writes a whole string to the serial transmit register.
fn emit_str(space: &mut AddressSpace, text: &str) {
    for byte in text.bytes() {
        emit_byte(space, byte);
    }
}

/// Reads one byte from the serial receive register, if input is ready.
fn read_byte(space: &mut AddressSpace) -> Option<u8> {
    let status = Address::new(SERIAL_BASE + serial::RX_STATUS);
    let data = Address::new(SERIAL_BASE + serial::RX_DATA);
    let ready = space
        .read(status, MemWidth::Word, AccessSource::Cpu)
        .unwrap_or(0);
    if ready & 1 == 0 {
        return None;
    }
    space
        .read(data, MemWidth::Word, AccessSource::Cpu)
        .ok()
        .map(|v| v as u8)
}
