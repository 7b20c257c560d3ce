//! HWI Common Library
//!
//! This crate provides the shared vocabulary for all HWI workspace crates:
//! the instruction catalogue, capability flags, the `InstructionSource`
//! trait implemented by instruction backends, retry policies and the
//! configuration loading utilities.
//!
//! # Module Structure
//!
//! - [`instr`] - Instructions, capabilities, source trait and error types
//! - [`policy`] - Retry policy for fallible instruction steps
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Workspace-wide constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use hwi_common::prelude::*;
//!
//! let policy = RetryPolicy::default_for(Instruction::Rdseed64);
//! assert!(policy.is_bounded());
//! ```

pub mod config;
pub mod consts;
pub mod instr;
pub mod policy;
pub mod prelude;
