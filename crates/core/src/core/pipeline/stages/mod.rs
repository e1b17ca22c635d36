//! Pipeline stage implementations.
//!
//! One module per stage. Each stage reads only from its input latch (plus
//! the forwarding sources for execute) and produces its output latch; the
//! driver in the parent module snapshots the latches first, so evaluation
//! order within a cycle cannot leak same-cycle values between stages.

/// Instruction decode.
pub mod decode;
/// Execute and control resolution.
pub mod execute;
/// Instruction fetch.
pub mod fetch;
/// Data memory access.
pub mod memory;
/// Register writeback and retirement.
pub mod writeback;

pub use decode::decode_stage;
pub use execute::{ExecOutput, execute_stage};
pub use fetch::fetch_stage;
pub use memory::memory_stage;
pub use writeback::{WbOutput, writeback_stage};
