//! Source backed by the executing CPU.

use crate::arch;
use hwi_common::instr::{Capabilities, InstructionSource};

/// Executes RDTSC/RDRAND/RDSEED on the running CPU.
///
/// Capabilities are captured at construction; steps for instructions the
/// CPU lacks return `None` without executing anything.
#[derive(Debug, Clone, Copy)]
pub struct NativeSource {
    caps: Capabilities,
}

impl NativeSource {
    /// Create a source using the process-wide detected capabilities.
    pub fn new() -> Self {
        Self {
            caps: arch::capabilities(),
        }
    }
}

impl Default for NativeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionSource for NativeSource {
    fn name(&self) -> &'static str {
        hwi_common::consts::NATIVE_SOURCE
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    #[inline]
    fn read_timestamp(&self) -> u64 {
        arch::rdtsc()
    }

    #[inline]
    fn random32_step(&self) -> Option<u32> {
        if !self.caps.contains(Capabilities::RDRAND) {
            return None;
        }
        // SAFETY: RDRAND support checked above.
        unsafe { arch::rdrand32_step() }
    }

    #[inline]
    fn random64_step(&self) -> Option<u64> {
        if !self.caps.contains(Capabilities::RDRAND) {
            return None;
        }
        // SAFETY: RDRAND support checked above.
        unsafe { arch::rdrand64_step() }
    }

    #[inline]
    fn seed32_step(&self) -> Option<u32> {
        if !self.caps.contains(Capabilities::RDSEED) {
            return None;
        }
        // SAFETY: RDSEED support checked above.
        unsafe { arch::rdseed32_step() }
    }

    #[inline]
    fn seed64_step(&self) -> Option<u64> {
        if !self.caps.contains(Capabilities::RDSEED) {
            return None;
        }
        // SAFETY: RDSEED support checked above.
        unsafe { arch::rdseed64_step() }
    }
}

/// Factory function to create a native source instance.
pub fn create_source() -> Box<dyn InstructionSource> {
    Box::new(NativeSource::new())
}
