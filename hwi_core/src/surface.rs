//! Safe Rust access surface.
//!
//! A `Surface` pairs an [`InstructionSource`] with retry policies and
//! exposes one method per hardware operation. Each call is independent:
//! the surface holds no state besides its source and policy.
//!
//! Without an explicit policy every instruction retries under
//! [`RetryPolicy::default_for`].

use crate::retry::retry;
use crate::sources::NativeSource;
use hwi_common::instr::{HwError, Instruction, InstructionSource};
use hwi_common::policy::RetryPolicy;

/// Instruction access surface over a source `S`.
#[derive(Debug, Clone)]
pub struct Surface<S = NativeSource> {
    source: S,
    /// Overrides the per-instruction defaults when set.
    policy: Option<RetryPolicy>,
}

impl Surface<NativeSource> {
    /// Surface over the running CPU with per-instruction default policies.
    pub fn native() -> Self {
        Self::with_default_policies(NativeSource::new())
    }
}

impl<S: InstructionSource> Surface<S> {
    /// Create a surface over `source` retrying every instruction under `policy`.
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy: Some(policy),
        }
    }

    /// Create a surface over `source` using [`RetryPolicy::default_for`].
    pub fn with_default_policies(source: S) -> Self {
        Self {
            source,
            policy: None,
        }
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Policy applied to `instruction`.
    pub fn policy_for(&self, instruction: Instruction) -> RetryPolicy {
        self.policy
            .unwrap_or_else(|| RetryPolicy::default_for(instruction))
    }

    /// Apply `policy` to every instruction, or restore the defaults with `None`.
    pub fn set_policy(&mut self, policy: Option<RetryPolicy>) {
        self.policy = policy;
    }

    /// Current time-stamp counter value.
    #[inline]
    pub fn read_timestamp_counter(&self) -> u64 {
        self.source.read_timestamp()
    }

    /// 32-bit hardware random number.
    ///
    /// # Errors
    /// `Unsupported` if the source lacks RDRAND, `Exhausted` if the policy
    /// gives up.
    pub fn generate_random32(&self) -> Result<u32, HwError> {
        self.run(Instruction::Rdrand32, || self.source.random32_step())
    }

    /// 64-bit hardware random number.
    ///
    /// # Errors
    /// See [`Surface::generate_random32`].
    pub fn generate_random64(&self) -> Result<u64, HwError> {
        self.run(Instruction::Rdrand64, || self.source.random64_step())
    }

    /// 32-bit hardware seed.
    ///
    /// # Errors
    /// `Unsupported` if the source lacks RDSEED, `Exhausted` if the policy
    /// gives up.
    pub fn generate_seed32(&self) -> Result<u32, HwError> {
        self.run(Instruction::Rdseed32, || self.source.seed32_step())
    }

    /// 64-bit hardware seed.
    ///
    /// # Errors
    /// See [`Surface::generate_seed32`].
    pub fn generate_seed64(&self) -> Result<u64, HwError> {
        self.run(Instruction::Rdseed64, || self.source.seed64_step())
    }

    /// Run `instruction` once and widen the result to `u64`.
    ///
    /// # Errors
    /// Same as the per-instruction methods.
    pub fn sample(&self, instruction: Instruction) -> Result<u64, HwError> {
        match instruction {
            Instruction::Rdtsc => Ok(self.read_timestamp_counter()),
            Instruction::Rdrand32 => self.generate_random32().map(u64::from),
            Instruction::Rdrand64 => self.generate_random64(),
            Instruction::Rdseed32 => self.generate_seed32().map(u64::from),
            Instruction::Rdseed64 => self.generate_seed64(),
        }
    }

    fn run<T>(
        &self,
        instruction: Instruction,
        step: impl FnMut() -> Option<T>,
    ) -> Result<T, HwError> {
        if !self.source.capabilities().supports(instruction) {
            return Err(HwError::Unsupported(instruction));
        }
        retry(self.policy_for(instruction), instruction, step)
    }
}
