//! Prelude module for common re-exports.
//!
//! ```rust
//! use hwi_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, HwiConfig, LogLevel, SharedConfig};

// ─── Instructions ───────────────────────────────────────────────────
pub use crate::instr::{Capabilities, HwError, Instruction, InstructionSource, SourceFactory};

// ─── Retry ──────────────────────────────────────────────────────────
pub use crate::policy::RetryPolicy;

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{DEFAULT_MAX_ATTEMPTS, NATIVE_SOURCE, SIMULATION_SOURCE};
