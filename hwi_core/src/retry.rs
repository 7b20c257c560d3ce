//! Retry loops for fallible instruction steps.
//!
//! - [`spin`] - unconditional retry, no bound, no backoff
//! - [`retry`] - honours a [`RetryPolicy`] and reports exhaustion

use hwi_common::instr::{HwError, Instruction};
use hwi_common::policy::RetryPolicy;
use std::time::Instant;
use tracing::{trace, warn};

/// Call `step` until it yields a value.
///
/// Never returns if `step` never succeeds.
#[inline]
pub fn spin<T>(mut step: impl FnMut() -> Option<T>) -> T {
    loop {
        if let Some(value) = step() {
            return value;
        }
    }
}

/// Call `step` under `policy`.
///
/// # Errors
/// Returns `HwError::Exhausted` when a bounded policy gives up. The
/// reported attempt count is the number of times `step` was called.
pub fn retry<T>(
    policy: RetryPolicy,
    instruction: Instruction,
    mut step: impl FnMut() -> Option<T>,
) -> Result<T, HwError> {
    match policy {
        RetryPolicy::Unbounded => Ok(spin(step)),
        RetryPolicy::Attempts(max) => {
            let max = max.get();
            for attempt in 1..=max {
                if let Some(value) = step() {
                    if attempt > 1 {
                        trace!(%instruction, attempt, "Step succeeded after retry");
                    }
                    return Ok(value);
                }
            }
            exhausted(instruction, max)
        }
        RetryPolicy::Deadline(budget) => {
            let start = Instant::now();
            let mut attempts: u32 = 0;
            loop {
                attempts = attempts.saturating_add(1);
                if let Some(value) = step() {
                    if attempts > 1 {
                        trace!(%instruction, attempts, "Step succeeded after retry");
                    }
                    return Ok(value);
                }
                if start.elapsed() >= budget {
                    return exhausted(instruction, attempts);
                }
            }
        }
    }
}

fn exhausted<T>(instruction: Instruction, attempts: u32) -> Result<T, HwError> {
    warn!(%instruction, attempts, "Hardware step exhausted retry budget");
    Err(HwError::Exhausted {
        instruction,
        attempts,
    })
}
