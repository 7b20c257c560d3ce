//! Scripted instruction source.
//!
//! Real hardware cannot be made to decline RDRAND/RDSEED on demand. The
//! `SimulatedSource` can: a [`FailurePlan`] decides which steps fail, values
//! come from a seeded `StdRng` so runs are reproducible, and the timestamp is
//! a counter advancing by a fixed tick per read.

use hwi_common::consts::SIMULATION_SOURCE;
use hwi_common::instr::{Capabilities, InstructionSource};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::debug;

/// Default PRNG seed for reproducible runs.
const DEFAULT_SEED: u64 = 0x5EED_0F_4857_1D;

/// Default timestamp increment per read.
const DEFAULT_TICK: u64 = 1;

/// Which steps of a simulated source fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePlan {
    /// Every step succeeds.
    #[default]
    Never,
    /// The next `n` steps fail (across all instructions), then steps succeed.
    Burst(u32),
    /// Every step fails.
    Always,
}

/// Deterministic, scriptable `InstructionSource`.
#[derive(Debug)]
pub struct SimulatedSource {
    caps: Capabilities,
    rng: Mutex<StdRng>,
    clock: AtomicU64,
    tick: u64,
    always_fail: bool,
    pending_failures: AtomicU32,
    steps: AtomicU64,
}

impl SimulatedSource {
    /// Full capabilities, no failures, default seed.
    pub fn new() -> Self {
        Self {
            caps: Capabilities::all(),
            rng: Mutex::new(StdRng::seed_from_u64(DEFAULT_SEED)),
            clock: AtomicU64::new(0),
            tick: DEFAULT_TICK,
            always_fail: false,
            pending_failures: AtomicU32::new(0),
            steps: AtomicU64::new(0),
        }
    }

    /// Reseed the value generator.
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    /// Restrict the simulated CPU's capabilities.
    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Set the timestamp increment per read.
    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    /// Install a failure plan.
    pub fn with_failure_plan(mut self, plan: FailurePlan) -> Self {
        self.apply_plan(plan);
        self
    }

    /// Replace the failure plan on a live source.
    pub fn set_failure_plan(&mut self, plan: FailurePlan) {
        self.apply_plan(plan);
    }

    /// Number of RDRAND/RDSEED steps attempted so far.
    pub fn steps_taken(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    fn apply_plan(&mut self, plan: FailurePlan) {
        debug!(?plan, "Simulated failure plan installed");
        let (always, burst) = match plan {
            FailurePlan::Never => (false, 0),
            FailurePlan::Burst(n) => (false, n),
            FailurePlan::Always => (true, 0),
        };
        self.always_fail = always;
        self.pending_failures.store(burst, Ordering::Relaxed);
    }

    /// Account for one step; `true` if it succeeds.
    fn attempt(&self, required: Capabilities) -> bool {
        if !self.caps.contains(required) {
            return false;
        }
        self.steps.fetch_add(1, Ordering::Relaxed);
        if self.always_fail {
            return false;
        }
        // Err means no failures pending.
        self.pending_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_err()
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionSource for SimulatedSource {
    fn name(&self) -> &'static str {
        SIMULATION_SOURCE
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn read_timestamp(&self) -> u64 {
        // fetch_add wraps; the returned reading wraps with it.
        self.clock
            .fetch_add(self.tick, Ordering::Relaxed)
            .wrapping_add(self.tick)
    }

    fn random32_step(&self) -> Option<u32> {
        self.attempt(Capabilities::RDRAND)
            .then(|| self.rng.lock().r#gen())
    }

    fn random64_step(&self) -> Option<u64> {
        self.attempt(Capabilities::RDRAND)
            .then(|| self.rng.lock().r#gen())
    }

    fn seed32_step(&self) -> Option<u32> {
        self.attempt(Capabilities::RDSEED)
            .then(|| self.rng.lock().r#gen())
    }

    fn seed64_step(&self) -> Option<u64> {
        self.attempt(Capabilities::RDSEED)
            .then(|| self.rng.lock().r#gen())
    }
}

/// Factory function to create a simulated source instance.
pub fn create_source() -> Box<dyn InstructionSource> {
    Box::new(SimulatedSource::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_never_fails() {
        let source = SimulatedSource::new();
        for _ in 0..100 {
            assert!(source.random32_step().is_some());
            assert!(source.seed64_step().is_some());
        }
        assert_eq!(source.steps_taken(), 200);
    }

    #[test]
    fn test_burst_fails_then_recovers() {
        let source = SimulatedSource::new().with_failure_plan(FailurePlan::Burst(3));
        assert_eq!(source.random64_step(), None);
        assert_eq!(source.seed32_step(), None);
        assert_eq!(source.random32_step(), None);
        assert!(source.random32_step().is_some());
        assert!(source.seed64_step().is_some());
    }

    #[test]
    fn test_always_fails() {
        let source = SimulatedSource::new().with_failure_plan(FailurePlan::Always);
        for _ in 0..1000 {
            assert_eq!(source.random64_step(), None);
        }
        assert_eq!(source.steps_taken(), 1000);
    }

    #[test]
    fn test_plan_can_be_replaced() {
        let mut source = SimulatedSource::new().with_failure_plan(FailurePlan::Always);
        assert_eq!(source.seed32_step(), None);
        source.set_failure_plan(FailurePlan::Never);
        assert!(source.seed32_step().is_some());
    }

    #[test]
    fn test_missing_capability_is_not_a_step() {
        let source = SimulatedSource::new().with_capabilities(Capabilities::TSC);
        assert_eq!(source.random32_step(), None);
        assert_eq!(source.seed64_step(), None);
        assert_eq!(source.steps_taken(), 0);
    }

    #[test]
    fn test_same_seed_same_values() {
        let a = SimulatedSource::new().with_seed(42);
        let b = SimulatedSource::new().with_seed(42);
        let xs: Vec<_> = (0..16).filter_map(|_| a.random64_step()).collect();
        let ys: Vec<_> = (0..16).filter_map(|_| b.random64_step()).collect();
        assert_eq!(xs, ys);
        assert_eq!(xs.len(), 16);
    }

    #[test]
    fn test_timestamp_wraps_at_counter_end() {
        let source = SimulatedSource::new().with_tick(u64::MAX);
        assert_eq!(source.read_timestamp(), u64::MAX);
        assert_eq!(source.read_timestamp(), u64::MAX - 1);
        assert_eq!(source.read_timestamp(), u64::MAX - 2);
    }

    #[test]
    fn test_timestamp_advances_by_tick() {
        let source = SimulatedSource::new().with_tick(10);
        assert_eq!(source.read_timestamp(), 10);
        assert_eq!(source.read_timestamp(), 20);
        assert_eq!(source.read_timestamp(), 30);
    }
}
