//! C ABI entry points.
//!
//! Every exported symbol is generated from one definition per instruction:
//!
//! | Canonical | Legacy alias | Retry |
//! |-----------|--------------|-------|
//! | `hwi_read_timestamp_counter` | `RDTSC_Wrapper` | - |
//! | `hwi_generate_random32` | `RDRAND32_Wrapper` | unbounded |
//! | `hwi_generate_random64` | `RDRAND64_Wrapper` | unbounded |
//! | `hwi_generate_seed32` | `RDSEED32_Wrapper` | unbounded |
//! | `hwi_generate_seed64` | `RDSEED64_Wrapper` | unbounded |
//! | `hwi_try_generate_*` | - | `max_attempts` |
//!
//! The unbounded functions abort the process if the CPU lacks the
//! instruction. Consumers that cannot rule this out should call
//! `hwi_capabilities` first or use the bounded `hwi_try_*` variants.

use crate::arch;
use crate::retry::{retry, spin};
use hwi_common::instr::{HwError, Instruction};
use hwi_common::policy::RetryPolicy;
use static_assertions::assert_eq_size;
use tracing::error;

/// Status returned by the bounded exports.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwiStatus {
    /// Value written to `out`.
    Ok = 0,
    /// The instruction kept failing for `max_attempts` steps.
    Exhausted = 1,
    /// The CPU lacks the instruction.
    Unsupported = 2,
    /// `max_attempts` was zero or `out` was null.
    InvalidArgument = 3,
}

assert_eq_size!(HwiStatus, i32);

impl From<&HwError> for HwiStatus {
    fn from(err: &HwError) -> Self {
        match err {
            HwError::Exhausted { .. } => HwiStatus::Exhausted,
            HwError::Unsupported(_) => HwiStatus::Unsupported,
            HwError::SourceNotFound(_) | HwError::Config(_) => HwiStatus::InvalidArgument,
        }
    }
}

/// Abort unless the CPU supports `instruction`.
fn require(instruction: Instruction) {
    if !arch::capabilities().supports(instruction) {
        error!(%instruction, "Instruction not supported by this CPU, aborting");
        std::process::abort();
    }
}

macro_rules! export_unbounded {
    ($(#[$doc:meta])* $canonical:ident, $alias:ident: $ty:ty = $instruction:expr, $step:path) => {
        $(#[$doc])*
        #[unsafe(no_mangle)]
        pub extern "C" fn $canonical() -> $ty {
            require($instruction);
            // SAFETY: support checked by `require`.
            spin(|| unsafe { $step() })
        }

        #[doc = concat!("Legacy alias of [`", stringify!($canonical), "`].")]
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub extern "C" fn $alias() -> $ty {
            $canonical()
        }
    };
}

macro_rules! export_bounded {
    ($(#[$doc:meta])* $name:ident: $ty:ty = $instruction:expr, $step:path) => {
        $(#[$doc])*
        ///
        /// # Safety
        /// `out` must be null or valid for writing one value.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(max_attempts: u32, out: *mut $ty) -> HwiStatus {
            let Some(policy) = RetryPolicy::attempts(max_attempts) else {
                return HwiStatus::InvalidArgument;
            };
            if out.is_null() {
                return HwiStatus::InvalidArgument;
            }
            if !arch::capabilities().supports($instruction) {
                return HwiStatus::Unsupported;
            }
            // SAFETY: support checked above.
            match retry(policy, $instruction, || unsafe { $step() }) {
                Ok(value) => {
                    // SAFETY: non-null, validity guaranteed by caller.
                    unsafe { out.write(value) };
                    HwiStatus::Ok
                }
                Err(err) => HwiStatus::from(&err),
            }
        }
    };
}

/// Current time-stamp counter value.
#[unsafe(no_mangle)]
pub extern "C" fn hwi_read_timestamp_counter() -> u64 {
    arch::rdtsc()
}

/// Legacy alias of [`hwi_read_timestamp_counter`].
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "C" fn RDTSC_Wrapper() -> u64 {
    hwi_read_timestamp_counter()
}

export_unbounded!(
    /// 32-bit RDRAND value, retrying until the hardware succeeds.
    hwi_generate_random32, RDRAND32_Wrapper: u32 = Instruction::Rdrand32, arch::rdrand32_step
);
export_unbounded!(
    /// 64-bit RDRAND value, retrying until the hardware succeeds.
    hwi_generate_random64, RDRAND64_Wrapper: u64 = Instruction::Rdrand64, arch::rdrand64_step
);
export_unbounded!(
    /// 32-bit RDSEED value, retrying until the hardware succeeds.
    hwi_generate_seed32, RDSEED32_Wrapper: u32 = Instruction::Rdseed32, arch::rdseed32_step
);
export_unbounded!(
    /// 64-bit RDSEED value, retrying until the hardware succeeds.
    hwi_generate_seed64, RDSEED64_Wrapper: u64 = Instruction::Rdseed64, arch::rdseed64_step
);

export_bounded!(
    /// 32-bit RDRAND value, at most `max_attempts` steps.
    hwi_try_generate_random32: u32 = Instruction::Rdrand32, arch::rdrand32_step
);
export_bounded!(
    /// 64-bit RDRAND value, at most `max_attempts` steps.
    hwi_try_generate_random64: u64 = Instruction::Rdrand64, arch::rdrand64_step
);
export_bounded!(
    /// 32-bit RDSEED value, at most `max_attempts` steps.
    hwi_try_generate_seed32: u32 = Instruction::Rdseed32, arch::rdseed32_step
);
export_bounded!(
    /// 64-bit RDSEED value, at most `max_attempts` steps.
    hwi_try_generate_seed64: u64 = Instruction::Rdseed64, arch::rdseed64_step
);

/// Detected capability bits (see `hwi_common::instr::Capabilities`).
#[unsafe(no_mangle)]
pub extern "C" fn hwi_capabilities() -> u32 {
    arch::capabilities().bits()
}
