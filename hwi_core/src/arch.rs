//! CPU instruction wrappers and capability detection.
//!
//! This is the only module that touches `core::arch`. Every other module
//! reaches the hardware through [`crate::sources::NativeSource`] or the
//! exported C entry points, both of which consult [`capabilities()`] before
//! executing a step.
//!
//! # Safety Contract
//!
//! The `*_step` functions are compiled with the matching `target_feature`
//! enabled. Calling them on a CPU that lacks the feature is undefined
//! behaviour (`#UD` in practice). Check [`capabilities()`] first.
//!
//! On targets other than x86_64 no capability is reported, the step
//! functions always return `None`, and [`rdtsc()`] falls back to a
//! monotonic nanosecond clock.

use hwi_common::instr::Capabilities;
use std::sync::LazyLock;
use tracing::debug;

/// Capabilities of the executing CPU, detected once per process.
static DETECTED: LazyLock<Capabilities> = LazyLock::new(|| {
    let caps = detect();
    debug!(capabilities = %caps, "CPU capabilities detected");
    caps
});

/// Cached capabilities of the executing CPU.
#[inline]
pub fn capabilities() -> Capabilities {
    *DETECTED
}

#[cfg(target_arch = "x86_64")]
mod imp {
    use super::Capabilities;
    use core::arch::x86_64::{
        __cpuid, _rdrand32_step, _rdrand64_step, _rdseed32_step, _rdseed64_step, _rdtsc,
    };

    /// CPUID.80000007H:EDX bit 8.
    const INVARIANT_TSC_BIT: u32 = 1 << 8;
    const EXT_POWER_MGMT_LEAF: u32 = 0x8000_0007;

    pub fn detect() -> Capabilities {
        let mut caps = Capabilities::empty();
        if std::arch::is_x86_feature_detected!("tsc") {
            caps |= Capabilities::TSC;
            if invariant_tsc() {
                caps |= Capabilities::INVARIANT_TSC;
            }
        }
        if std::arch::is_x86_feature_detected!("rdrand") {
            caps |= Capabilities::RDRAND;
        }
        if std::arch::is_x86_feature_detected!("rdseed") {
            caps |= Capabilities::RDSEED;
        }
        caps
    }

    #[allow(unused_unsafe)]
    fn invariant_tsc() -> bool {
        // SAFETY: CPUID is available on every x86_64 CPU.
        let max_ext = unsafe { __cpuid(0x8000_0000) }.eax;
        if max_ext < EXT_POWER_MGMT_LEAF {
            return false;
        }
        // SAFETY: leaf is within the reported extended range.
        let edx = unsafe { __cpuid(EXT_POWER_MGMT_LEAF) }.edx;
        edx & INVARIANT_TSC_BIT != 0
    }

    #[inline]
    #[allow(unused_unsafe)]
    pub fn rdtsc() -> u64 {
        // SAFETY: RDTSC is available on every x86_64 CPU.
        unsafe { _rdtsc() }
    }

    #[inline]
    #[target_feature(enable = "rdrand")]
    #[allow(unused_unsafe)]
    pub unsafe fn rdrand32_step() -> Option<u32> {
        let mut val = 0u32;
        // SAFETY: caller guarantees RDRAND support.
        (unsafe { _rdrand32_step(&mut val) } == 1).then_some(val)
    }

    #[inline]
    #[target_feature(enable = "rdrand")]
    #[allow(unused_unsafe)]
    pub unsafe fn rdrand64_step() -> Option<u64> {
        let mut val = 0u64;
        // SAFETY: caller guarantees RDRAND support.
        (unsafe { _rdrand64_step(&mut val) } == 1).then_some(val)
    }

    #[inline]
    #[target_feature(enable = "rdseed")]
    #[allow(unused_unsafe)]
    pub unsafe fn rdseed32_step() -> Option<u32> {
        let mut val = 0u32;
        // SAFETY: caller guarantees RDSEED support.
        (unsafe { _rdseed32_step(&mut val) } == 1).then_some(val)
    }

    #[inline]
    #[target_feature(enable = "rdseed")]
    #[allow(unused_unsafe)]
    pub unsafe fn rdseed64_step() -> Option<u64> {
        let mut val = 0u64;
        // SAFETY: caller guarantees RDSEED support.
        (unsafe { _rdseed64_step(&mut val) } == 1).then_some(val)
    }
}

#[cfg(not(target_arch = "x86_64"))]
mod imp {
    use super::Capabilities;
    use std::sync::OnceLock;
    use std::time::Instant;

    pub fn detect() -> Capabilities {
        Capabilities::empty()
    }

    pub fn rdtsc() -> u64 {
        static START: OnceLock<Instant> = OnceLock::new();
        let start = START.get_or_init(Instant::now);
        start.elapsed().as_nanos() as u64
    }

    pub unsafe fn rdrand32_step() -> Option<u32> {
        None
    }

    pub unsafe fn rdrand64_step() -> Option<u64> {
        None
    }

    pub unsafe fn rdseed32_step() -> Option<u32> {
        None
    }

    pub unsafe fn rdseed64_step() -> Option<u64> {
        None
    }
}

/// Probe the executing CPU without consulting the cache.
pub fn detect() -> Capabilities {
    imp::detect()
}

/// Read the time-stamp counter.
///
/// Not serializing: the read may be reordered with surrounding loads.
#[inline]
pub fn rdtsc() -> u64 {
    imp::rdtsc()
}

/// One RDRAND attempt (32-bit).
///
/// # Safety
/// The CPU must report [`Capabilities::RDRAND`].
#[inline]
pub unsafe fn rdrand32_step() -> Option<u32> {
    // SAFETY: forwarded to caller.
    unsafe { imp::rdrand32_step() }
}

/// One RDRAND attempt (64-bit).
///
/// # Safety
/// The CPU must report [`Capabilities::RDRAND`].
#[inline]
pub unsafe fn rdrand64_step() -> Option<u64> {
    // SAFETY: forwarded to caller.
    unsafe { imp::rdrand64_step() }
}

/// One RDSEED attempt (32-bit).
///
/// # Safety
/// The CPU must report [`Capabilities::RDSEED`].
#[inline]
pub unsafe fn rdseed32_step() -> Option<u32> {
    // SAFETY: forwarded to caller.
    unsafe { imp::rdseed32_step() }
}

/// One RDSEED attempt (64-bit).
///
/// # Safety
/// The CPU must report [`Capabilities::RDSEED`].
#[inline]
pub unsafe fn rdseed64_step() -> Option<u64> {
    // SAFETY: forwarded to caller.
    unsafe { imp::rdseed64_step() }
}
