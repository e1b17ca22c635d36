//! Core tests.

/// Single-cycle core programs.
pub mod single_cycle;
