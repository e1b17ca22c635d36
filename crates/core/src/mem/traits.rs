//! Backend trait for the physical address space.
//!
//! This module defines the trait implemented by everything mapped into the
//! simulated address space. It provides:
//! 1. **Identification:** `name` and `size` for map registration and reports.
//! 2. **Access:** Byte-granular read/write at range-relative offsets, with
//!    default big-endian composition for half and word widths.
//! 3. **Downcasting:** Optional casts to concrete peripherals so the machine
//!    facade can feed input and drain output without back-pointers.
//!
//! Offsets are always relative to the backend's mapped base; alignment and
//! range checks happen in the address space before a backend is reached, so
//! backend accessors are infallible.

use crate::common::{AccessSource, MemWidth};
use crate::mem::peripherals::{Knobs, Lcd, SerialPort};

/// Trait for components mapped into the physical address space.
///
/// Backends are byte-addressed; the default `read`/`write` compose the
/// architectural big-endian view from byte accesses. Implementations must be
/// safe under repeated [`AccessSource::Debugger`] probes: a probe never
/// triggers observable side effects.
pub trait Backend {
    /// Returns a short name for this backend (e.g. `"ram"`, `"serial"`).
    fn name(&self) -> &'static str;

    /// Returns the size of this backend's range in bytes.
    fn size(&self) -> u32;

    /// Reads one byte at the given range-relative offset.
    fn read_byte(&mut self, offset: u32, source: AccessSource) -> u8;

    /// Writes one byte at the given range-relative offset.
    fn write_byte(&mut self, offset: u32, value: u8, source: AccessSource);

    /// Reads at the given offset with the given width (big-endian).
    fn read(&mut self, offset: u32, width: MemWidth, source: AccessSource) -> u32 {
        let mut value = 0u32;
        for i in 0..width.bytes() {
            value = (value << 8) | u32::from(self.read_byte(offset + i, source));
        }
        value
    }

    /// Writes at the given offset with the given width (big-endian).
    fn write(&mut self, offset: u32, width: MemWidth, value: u32, source: AccessSource) {
        let bytes = width.bytes();
        for i in 0..bytes {
            let shift = 8 * (bytes - 1 - i);
            self.write_byte(offset + i, (value >> shift) as u8, source);
        }
    }

    /// Returns a mutable reference as [`SerialPort`] if this is the serial
    /// device; otherwise `None`.
    fn as_serial_mut(&mut self) -> Option<&mut SerialPort> {
        None
    }

    /// Returns a mutable reference as [`Lcd`] if this is the display;
    /// otherwise `None`.
    fn as_lcd_mut(&mut self) -> Option<&mut Lcd> {
        None
    }

    /// Returns a mutable reference as [`Knobs`] if this is the dial/LED
    /// block; otherwise `None`.
    fn as_knobs_mut(&mut self) -> Option<&mut Knobs> {
        None
    }
}
