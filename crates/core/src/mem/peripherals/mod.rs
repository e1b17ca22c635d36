//! Memory-mapped peripherals.
//!
//! Each peripheral occupies a contiguous range in the address space and is
//! safe under repeated debugger probes: a probe never consumes input, queues
//! output, or otherwise perturbs device state. External input (serial bytes,
//! dial positions) is delivered by the host between cycles only.

/// Dial inputs and LED outputs.
pub mod knobs;
/// Word-addressable frame buffer.
pub mod lcd;
/// Two-channel serial port.
pub mod serial;

pub use knobs::Knobs;
pub use lcd::Lcd;
pub use serial::SerialPort;
