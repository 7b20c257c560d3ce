//! Retry policy for fallible instruction steps.
//!
//! RDRAND and RDSEED may decline to produce a value on any single attempt.
//! A `RetryPolicy` decides how long a caller keeps asking.
//!
//! The two generators fail very differently: RDRAND almost never declines
//! twice in a row, RDSEED routinely declines dozens of times under load.
//! [`RetryPolicy::default_for`] picks a bound per instruction.

use crate::consts::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RDSEED_DEADLINE_US};
use crate::instr::Instruction;
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

/// How many times a failing instruction step is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Spin until the hardware succeeds. May never return.
    Unbounded,
    /// Give up after this many attempts.
    Attempts(NonZeroU32),
    /// Give up once this much wall-clock time has elapsed.
    /// At least one attempt is always made.
    Deadline(Duration),
}

impl RetryPolicy {
    /// Bounded policy with `n` attempts; `None` when `n` is zero.
    pub fn attempts(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(RetryPolicy::Attempts)
    }

    /// Default bound for `instruction`.
    ///
    /// | Instruction | Policy |
    /// |-------------|--------|
    /// | RDTSC, RDRAND | `DEFAULT_MAX_ATTEMPTS` attempts |
    /// | RDSEED | `DEFAULT_RDSEED_DEADLINE_US` deadline |
    pub fn default_for(instruction: Instruction) -> Self {
        match instruction {
            Instruction::Rdseed32 | Instruction::Rdseed64 => {
                RetryPolicy::Deadline(Duration::from_micros(DEFAULT_RDSEED_DEADLINE_US))
            }
            Instruction::Rdtsc | Instruction::Rdrand32 | Instruction::Rdrand64 => {
                RetryPolicy::Attempts(
                    NonZeroU32::new(DEFAULT_MAX_ATTEMPTS).unwrap_or(NonZeroU32::MIN),
                )
            }
        }
    }

    /// Whether the policy can give up.
    pub fn is_bounded(&self) -> bool {
        !matches!(self, RetryPolicy::Unbounded)
    }
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryPolicy::Unbounded => f.write_str("unbounded"),
            RetryPolicy::Attempts(n) => write!(f, "{n} attempts"),
            RetryPolicy::Deadline(d) => write!(f, "{}us deadline", d.as_micros()),
        }
    }
}
