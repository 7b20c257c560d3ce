//! # HWI Core Library
//!
//! Hardware instruction access surface: RDTSC, RDRAND and RDSEED exposed
//! both as a safe Rust API and as unmangled C ABI functions for consumers
//! linking the `cdylib`.
//!
//! # Module Structure
//!
//! - [`arch`] - Intrinsic wrappers and CPU capability detection
//! - [`retry`] - Unbounded spin and policy-driven retry loops
//! - [`sources`] - `InstructionSource` implementations (native, simulation)
//! - [`source_registry`] - Source factory registration
//! - [`surface`] - `Surface`, the safe per-instruction API
//! - [`export`] - C ABI entry points
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      hwi_core (single crate)                  │
//! │  ┌──────────────┐    ┌──────────────┐    ┌─────────────────┐  │
//! │  │ C ABI export │    │   Surface    │◄──►│ Source Registry │  │
//! │  │  (cdylib)    │    │ (+ policy)   │    │                 │  │
//! │  └──────┬───────┘    └──────┬───────┘    └─────────────────┘  │
//! │         │                   ▼                                 │
//! │         │          ┌──────────────────┐                       │
//! │         │          │ InstructionSource│ native | simulation   │
//! │         │          └────────┬─────────┘                       │
//! │         ▼                   ▼                                 │
//! │  ┌──────────────────────────────────┐   ┌─────────────────┐   │
//! │  │        arch (core::arch)         │   │      retry      │   │
//! │  └──────────────────────────────────┘   └─────────────────┘   │
//! └───────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod arch;
pub mod export;
pub mod retry;
pub mod source_registry;
pub mod sources;
pub mod surface;

// Re-export key types for convenience
pub use crate::export::HwiStatus;
pub use crate::source_registry::SourceRegistry;
pub use crate::sources::{FailurePlan, NativeSource, SimulatedSource};
pub use crate::surface::Surface;
