//! Instruction catalogue, source trait and error types.
//!
//! This module defines:
//! - `Instruction` enum - The hardware instructions exposed by the surface
//! - `Capabilities` bitflags - What a CPU (or simulated CPU) supports
//! - `InstructionSource` trait - Interface for pluggable instruction backends
//! - `HwError` enum - Error types for surface operations
//! - `SourceFactory` type alias - Factory function type

use crate::config::ConfigError;
use bitflags::bitflags;
use std::fmt;
use thiserror::Error;

/// Hardware instruction exposed through the access surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Read time-stamp counter.
    Rdtsc,
    /// 32-bit hardware random number.
    Rdrand32,
    /// 64-bit hardware random number.
    Rdrand64,
    /// 32-bit hardware seed.
    Rdseed32,
    /// 64-bit hardware seed.
    Rdseed64,
}

impl Instruction {
    /// Every instruction, in probe order.
    pub const ALL: [Instruction; 5] = [
        Instruction::Rdtsc,
        Instruction::Rdrand32,
        Instruction::Rdrand64,
        Instruction::Rdseed32,
        Instruction::Rdseed64,
    ];

    /// Assembler mnemonic with operand width suffix.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Instruction::Rdtsc => "RDTSC",
            Instruction::Rdrand32 => "RDRAND32",
            Instruction::Rdrand64 => "RDRAND64",
            Instruction::Rdseed32 => "RDSEED32",
            Instruction::Rdseed64 => "RDSEED64",
        }
    }

    /// Width of the produced value in bits.
    pub fn width_bits(self) -> u32 {
        match self {
            Instruction::Rdrand32 | Instruction::Rdseed32 => 32,
            Instruction::Rdtsc | Instruction::Rdrand64 | Instruction::Rdseed64 => 64,
        }
    }

    /// Capability the CPU must report before the instruction may execute.
    pub fn required_capability(self) -> Capabilities {
        match self {
            Instruction::Rdtsc => Capabilities::TSC,
            Instruction::Rdrand32 | Instruction::Rdrand64 => Capabilities::RDRAND,
            Instruction::Rdseed32 | Instruction::Rdseed64 => Capabilities::RDSEED,
        }
    }

    /// Whether a single step of this instruction may report failure.
    pub fn is_fallible(self) -> bool {
        !matches!(self, Instruction::Rdtsc)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

bitflags! {
    /// CPU capabilities relevant to the access surface.
    ///
    /// Bit values are part of the C ABI (`hwi_capabilities`) and must not
    /// be renumbered.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        /// Time-stamp counter present (CPUID.01H:EDX.TSC).
        const TSC = 1 << 0;
        /// Counter runs at a constant rate in all ACPI states
        /// (CPUID.80000007H:EDX[8]).
        const INVARIANT_TSC = 1 << 1;
        /// RDRAND present (CPUID.01H:ECX[30]).
        const RDRAND = 1 << 2;
        /// RDSEED present (CPUID.(EAX=07H,ECX=0H):EBX[18]).
        const RDSEED = 1 << 3;
    }
}

impl Capabilities {
    /// Whether `instruction` may be executed under these capabilities.
    pub fn supports(self, instruction: Instruction) -> bool {
        self.contains(instruction.required_capability())
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        f.write_str(&names.join(" | "))
    }
}

/// Error types for surface operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HwError {
    /// Bounded retry gave up before the instruction reported success.
    #[error("{instruction} exhausted after {attempts} attempts")]
    Exhausted {
        /// Instruction that kept failing.
        instruction: Instruction,
        /// Number of steps taken.
        attempts: u32,
    },

    /// The source does not support the instruction.
    #[error("{0} is not supported by this CPU")]
    Unsupported(Instruction),

    /// Source not found in the registry.
    #[error("Instruction source not found: {0}")]
    SourceNotFound(String),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Factory function type for creating source instances.
pub type SourceFactory = fn() -> Box<dyn InstructionSource>;

/// Trait defining the interface for instruction backends.
///
/// The access surface drives a source through this trait, enabling the
/// native CPU backend and the scripted simulation backend to be swapped.
///
/// # Step Contract
///
/// | Method | Failure | Meaning of `None` |
/// |--------|---------|-------------------|
/// | `read_timestamp()` | never | - |
/// | `*_step()` | transient | hardware declined this attempt |
///
/// Step methods must only be called for instructions the source reports in
/// `capabilities()`. Sources return `None` for unsupported instructions
/// rather than executing them, so a caller that skips the capability check
/// spins instead of faulting.
pub trait InstructionSource: Send + Sync {
    /// Returns the source's unique identifier (e.g., "native", "simulation").
    fn name(&self) -> &'static str;

    /// Capabilities of the underlying (real or simulated) CPU.
    fn capabilities(&self) -> Capabilities;

    /// Current time-stamp counter value.
    fn read_timestamp(&self) -> u64;

    /// One RDRAND attempt producing 32 bits.
    fn random32_step(&self) -> Option<u32>;

    /// One RDRAND attempt producing 64 bits.
    fn random64_step(&self) -> Option<u64>;

    /// One RDSEED attempt producing 32 bits.
    fn seed32_step(&self) -> Option<u32>;

    /// One RDSEED attempt producing 64 bits.
    fn seed64_step(&self) -> Option<u64>;
}

impl<S: InstructionSource + ?Sized> InstructionSource for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn read_timestamp(&self) -> u64 {
        (**self).read_timestamp()
    }

    fn random32_step(&self) -> Option<u32> {
        (**self).random32_step()
    }

    fn random64_step(&self) -> Option<u64> {
        (**self).random64_step()
    }

    fn seed32_step(&self) -> Option<u32> {
        (**self).seed32_step()
    }

    fn seed64_step(&self) -> Option<u64> {
        (**self).seed64_step()
    }
}
