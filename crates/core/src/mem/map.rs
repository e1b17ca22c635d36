//! Physical address space.
//!
//! This module implements the dispatcher that routes reads and writes to the
//! mapped backends. It provides:
//! 1. **Registration:** Backends are added by base address; ranges must be
//!    disjoint and are kept sorted for lookup.
//! 2. **Access routing:** Alignment-checked read/write by absolute address;
//!    unmapped accesses raise a bus error.
//! 3. **Bulk transfer:** Range reads and writes powering the loaders and the
//!    assembler.

use crate::common::{AccessSource, Address, MemWidth, Trap};
use crate::mem::traits::Backend;

/// One mapped half-open range `[start, start + size)`.
struct MappedRange {
    start: u32,
    size: u32,
    backend: Box<dyn Backend>,
}

impl MappedRange {
    /// Returns whether the given address falls inside this range.
    const fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr - self.start < self.size
    }
}

impl std::fmt::Debug for MappedRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRange")
            .field("start", &self.start)
            .field("size", &self.size)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// The machine's physical address space.
///
/// An ordered set of disjoint half-open ranges, each bound to a memory or
/// peripheral backend. Lookup is a binary search; construction is rare and
/// registration enforces disjointness.
#[derive(Debug, Default)]
pub struct AddressSpace {
    ranges: Vec<MappedRange>,
}

impl AddressSpace {
    /// Creates an empty address space.
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Registers a backend at the given base address.
    ///
    /// # Arguments
    ///
    /// * `start` - First address of the range; the size comes from the backend.
    ///
    /// # Errors
    ///
    /// Returns a description when the new range would overlap an existing one
    /// or wrap past the end of the address space.
    pub fn register(&mut self, start: Address, backend: Box<dyn Backend>) -> Result<(), String> {
        let size = backend.size();
        if size == 0 {
            return Err(format!("backend '{}' has zero size", backend.name()));
        }
        if start.val().checked_add(size - 1).is_none() {
            return Err(format!(
                "range {start}+{size:#x} wraps past the end of the address space"
            ));
        }

        let index = self
            .ranges
            .partition_point(|range| range.start < start.val());

        let overlaps_prev = index > 0 && self.ranges[index - 1].contains(start.val());
        let overlaps_next = self
            .ranges
            .get(index)
            .is_some_and(|next| next.start - start.val() < size);
        if overlaps_prev || overlaps_next {
            return Err(format!(
                "range {start}+{size:#x} overlaps an existing mapping"
            ));
        }

        self.ranges.insert(
            index,
            MappedRange {
                start: start.val(),
                size,
                backend,
            },
        );
        Ok(())
    }

    /// Finds the range containing the address, returning it with the offset.
    fn find(&mut self, addr: u32) -> Option<(&mut MappedRange, u32)> {
        let index = self.ranges.partition_point(|range| range.start <= addr);
        if index == 0 {
            return None;
        }
        let range = &mut self.ranges[index - 1];
        if addr - range.start < range.size {
            let offset = addr - range.start;
            Some((range, offset))
        } else {
            None
        }
    }

    /// Checks the alignment contract for the given width.
    fn check_alignment(addr: Address, width: MemWidth) -> Result<(), Trap> {
        if addr.val() & width.align_mask() != 0 {
            return Err(Trap::UnalignedAccess(addr));
        }
        Ok(())
    }

    /// Reads at an absolute address.
    ///
    /// # Arguments
    ///
    /// * `addr` - Absolute physical address.
    /// * `width` - Access width; half and word accesses must be aligned.
    /// * `source` - Access originator; debugger probes are side-effect free.
    ///
    /// # Errors
    ///
    /// [`Trap::UnalignedAccess`] on misalignment, [`Trap::BusError`] when no
    /// backend claims the address.
    pub fn read(
        &mut self,
        addr: Address,
        width: MemWidth,
        source: AccessSource,
    ) -> Result<u32, Trap> {
        Self::check_alignment(addr, width)?;
        let (range, offset) = self.find(addr.val()).ok_or(Trap::BusError(addr))?;
        if offset + width.bytes() > range.size {
            return Err(Trap::BusError(addr));
        }
        Ok(range.backend.read(offset, width, source))
    }

    /// Writes at an absolute address.
    ///
    /// # Errors
    ///
    /// Same error contract as [`Self::read`].
    pub fn write(
        &mut self,
        addr: Address,
        width: MemWidth,
        value: u32,
        source: AccessSource,
    ) -> Result<(), Trap> {
        Self::check_alignment(addr, width)?;
        let (range, offset) = self.find(addr.val()).ok_or(Trap::BusError(addr))?;
        if offset + width.bytes() > range.size {
            return Err(Trap::BusError(addr));
        }
        range.backend.write(offset, width, value, source);
        Ok(())
    }

    /// Reads an aligned word as the CPU would.
    ///
    /// # Errors
    ///
    /// Same error contract as [`Self::read`].
    pub fn read_word(&mut self, addr: Address) -> Result<u32, Trap> {
        self.read(addr, MemWidth::Word, AccessSource::Cpu)
    }

    /// Writes an aligned word as the CPU would.
    ///
    /// # Errors
    ///
    /// Same error contract as [`Self::write`].
    pub fn write_word(&mut self, addr: Address, value: u32) -> Result<(), Trap> {
        self.write(addr, MemWidth::Word, value, AccessSource::Cpu)
    }

    /// Reads a byte range into `out`, byte by byte.
    ///
    /// # Errors
    ///
    /// [`Trap::BusError`] at the first unmapped byte.
    pub fn read_range(
        &mut self,
        start: Address,
        out: &mut [u8],
        source: AccessSource,
    ) -> Result<(), Trap> {
        for (i, slot) in out.iter_mut().enumerate() {
            let addr = start.wrapping_add(i as u32);
            *slot = self.read(addr, MemWidth::Byte, source)? as u8;
        }
        Ok(())
    }

    /// Writes a byte range, byte by byte.
    ///
    /// # Errors
    ///
    /// [`Trap::BusError`] at the first unmapped byte.
    pub fn write_range(
        &mut self,
        start: Address,
        data: &[u8],
        source: AccessSource,
    ) -> Result<(), Trap> {
        for (i, byte) in data.iter().enumerate() {
            let addr = start.wrapping_add(i as u32);
            self.write(addr, MemWidth::Byte, u32::from(*byte), source)?;
        }
        Ok(())
    }

    /// Returns whether any backend claims the given address.
    pub fn is_mapped(&mut self, addr: Address) -> bool {
        self.find(addr.val()).is_some()
    }

    /// Runs `f` on the serial port if one is mapped.
    pub fn with_serial<R>(
        &mut self,
        f: impl FnOnce(&mut crate::mem::peripherals::SerialPort) -> R,
    ) -> Option<R> {
        self.ranges
            .iter_mut()
            .find_map(|range| range.backend.as_serial_mut())
            .map(f)
    }

    /// Runs `f` on the dial/LED block if one is mapped.
    pub fn with_knobs<R>(
        &mut self,
        f: impl FnOnce(&mut crate::mem::peripherals::Knobs) -> R,
    ) -> Option<R> {
        self.ranges
            .iter_mut()
            .find_map(|range| range.backend.as_knobs_mut())
            .map(f)
    }

    /// Runs `f` on the display if one is mapped.
    pub fn with_lcd<R>(
        &mut self,
        f: impl FnOnce(&mut crate::mem::peripherals::Lcd) -> R,
    ) -> Option<R> {
        self.ranges
            .iter_mut()
            .find_map(|range| range.backend.as_lcd_mut())
            .map(f)
    }
}
