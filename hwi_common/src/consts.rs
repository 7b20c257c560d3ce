//! Workspace-wide constants.

/// Default bounded attempt count for RDRAND steps.
///
/// Vendor guidance treats ten consecutive RDRAND failures as a hardware
/// fault rather than transient underflow.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default wall-clock budget for RDSEED steps, in microseconds.
///
/// RDSEED fails in long streaks when several cores draw at once.
pub const DEFAULT_RDSEED_DEADLINE_US: u64 = 100_000;

/// Default wall-clock budget for deadline-based retry, in microseconds.
pub const DEFAULT_DEADLINE_US: u64 = 1_000;

/// Default number of samples the probe draws per instruction.
pub const DEFAULT_PROBE_SAMPLES: u32 = 4;

/// Name of the source backed by the executing CPU.
pub const NATIVE_SOURCE: &str = "native";

/// Name of the scripted, deterministic source used in tests.
pub const SIMULATION_SOURCE: &str = "simulation";

/// Default probe service name.
pub const PROBE_SERVICE_NAME: &str = "hwi-probe";
