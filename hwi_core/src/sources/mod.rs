//! Instruction source implementations.
//!
//! - [`native`] - Executes the instructions on the running CPU
//! - [`simulation`] - Scripted source for exercising failure paths
//!
//! # Adding New Sources
//!
//! 1. Create a new submodule under `sources/`
//! 2. Implement the `InstructionSource` trait from `hwi_common::instr`
//! 3. Register the factory in [`register_builtin_sources`]

pub mod native;
pub mod simulation;

pub use native::NativeSource;
pub use simulation::{FailurePlan, SimulatedSource};

use crate::source_registry::SourceRegistry;
use hwi_common::consts::{NATIVE_SOURCE, SIMULATION_SOURCE};

/// Register all built-in sources into `registry`.
pub fn register_builtin_sources(registry: &mut SourceRegistry) {
    registry.register(NATIVE_SOURCE, native::create_source);
    registry.register(SIMULATION_SOURCE, simulation::create_source);
}
