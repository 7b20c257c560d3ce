//! Access surface behaviour on the running CPU and on the simulated source.
//!
//! Tests touching RDRAND/RDSEED return early when the host lacks them.

use hwi_common::instr::{Capabilities, HwError, Instruction, InstructionSource};
use hwi_common::policy::RetryPolicy;
use hwi_core::export::{
    RDRAND32_Wrapper, RDSEED64_Wrapper, hwi_generate_random32, hwi_read_timestamp_counter,
};
use hwi_core::{FailurePlan, NativeSource, SimulatedSource, Surface};
use proptest::prelude::*;
use std::thread;
use std::time::{Duration, Instant};

fn native_has(cap: Capabilities) -> bool {
    hwi_core::arch::capabilities().contains(cap)
}

#[test]
fn test_sequential_timestamps_non_decreasing() {
    let surface = Surface::native();
    let mut prev = surface.read_timestamp_counter();
    for _ in 0..10_000 {
        let now = surface.read_timestamp_counter();
        assert!(now >= prev, "timestamp went backwards: {prev} -> {now}");
        prev = now;
    }
}

#[test]
fn test_two_threads_read_timestamp_concurrently() {
    let handles: Vec<_> = (0..2)
        .map(|_| {
            thread::spawn(|| {
                let mut prev = hwi_read_timestamp_counter();
                for _ in 0..10_000 {
                    let now = hwi_read_timestamp_counter();
                    assert!(now >= prev);
                    prev = now;
                }
                prev
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().is_ok());
    }
}

#[test]
fn test_thousand_random32_calls_return_promptly() {
    if !native_has(Capabilities::RDRAND) {
        return;
    }
    let start = Instant::now();
    for _ in 0..1_000 {
        let _ = hwi_generate_random32();
    }
    assert!(
        start.elapsed() < Duration::from_secs(5),
        "1000 RDRAND calls took {:?}",
        start.elapsed()
    );
}

#[test]
fn test_random64_uses_full_width() {
    if !native_has(Capabilities::RDRAND) {
        return;
    }
    let surface = Surface::new(NativeSource::new(), RetryPolicy::attempts(100).unwrap());
    let high_bits = (0..64)
        .map(|_| surface.generate_random64().unwrap())
        .fold(0u64, |acc, v| acc | (v >> 32));
    assert_ne!(high_bits, 0, "64 draws never set a bit above 31");
}

#[test]
fn test_random32_abi_and_typed_api_agree_on_width() {
    if !native_has(Capabilities::RDRAND) {
        return;
    }
    let surface = Surface::new(NativeSource::new(), RetryPolicy::attempts(100).unwrap());
    let typed = surface.sample(Instruction::Rdrand32).unwrap();
    assert!(typed <= u64::from(u32::MAX));
    // Values cross the ABI at full 32-bit width, not truncated to 16.
    let abi = (0..64).fold(0u32, |acc, _| acc | RDRAND32_Wrapper());
    assert_ne!(abi >> 16, 0, "64 draws never set a bit above 15");
}

#[test]
fn test_seed64_when_supported() {
    if !native_has(Capabilities::RDSEED) {
        return;
    }
    let draws: Vec<u64> = (0..8).map(|_| RDSEED64_Wrapper()).collect();
    assert!(draws.iter().any(|&v| v != draws[0]));
}

#[test]
fn test_default_seed_policy_survives_contended_draws() {
    if !native_has(Capabilities::RDSEED) {
        return;
    }
    // Concurrent RDSEED drains the conditioner; failure streaks are expected.
    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                let surface = Surface::native();
                for _ in 0..2_000 {
                    surface.generate_seed64()?;
                    surface.generate_seed32()?;
                }
                Ok::<(), HwError>(())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }

    let surface = Surface::native();
    for _ in 0..5_000 {
        assert!(surface.generate_seed64().is_ok());
    }
}

#[test]
fn test_native_unsupported_reported_not_executed() {
    let surface = Surface::native();
    let caps = surface.source().capabilities();
    for instruction in Instruction::ALL {
        if instruction.is_fallible() && !caps.supports(instruction) {
            assert_eq!(
                surface.sample(instruction),
                Err(HwError::Unsupported(instruction))
            );
        }
    }
}

#[test]
fn test_repeated_calls_are_independent() {
    let surface = Surface::with_default_policies(SimulatedSource::new());
    let first: Vec<u32> = (0..8).map(|_| surface.generate_random32().unwrap()).collect();
    let second: Vec<u32> = (0..8).map(|_| surface.generate_random32().unwrap()).collect();
    assert_ne!(first, second);
    assert_eq!(surface.source().steps_taken(), 16);
}

#[test]
fn test_always_failing_hardware_bounded_gives_up() {
    let surface = Surface::new(
        SimulatedSource::new().with_failure_plan(FailurePlan::Always),
        RetryPolicy::attempts(10).unwrap(),
    );
    for instruction in Instruction::ALL.into_iter().filter(|i| i.is_fallible()) {
        assert_eq!(
            surface.sample(instruction),
            Err(HwError::Exhausted {
                instruction,
                attempts: 10,
            })
        );
    }
    assert_eq!(surface.source().steps_taken(), 40);
}

#[test]
fn test_always_failing_hardware_deadline_gives_up() {
    let budget = Duration::from_millis(10);
    let surface = Surface::new(
        SimulatedSource::new().with_failure_plan(FailurePlan::Always),
        RetryPolicy::Deadline(budget),
    );
    let start = Instant::now();
    let result = surface.generate_seed32();
    assert!(start.elapsed() >= budget);
    assert!(matches!(
        result,
        Err(HwError::Exhausted {
            instruction: Instruction::Rdseed32,
            ..
        })
    ));
}

#[test]
fn test_always_failing_hardware_unbounded_keeps_spinning() {
    let surface = Surface::new(
        SimulatedSource::new().with_failure_plan(FailurePlan::Always),
        RetryPolicy::Unbounded,
    );
    let (tx, rx) = std::sync::mpsc::channel();
    // The spinning thread is never joined; it dies with the test process.
    thread::spawn(move || {
        let result = surface.generate_random64();
        let _ = tx.send(result);
    });
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

proptest! {
    #[test]
    fn prop_burst_succeeds_iff_within_attempts(burst in 0u32..64, attempts in 1u32..64) {
        let surface = Surface::new(
            SimulatedSource::new().with_failure_plan(FailurePlan::Burst(burst)),
            RetryPolicy::attempts(attempts).unwrap(),
        );
        let result = surface.generate_random32();
        if burst < attempts {
            prop_assert!(result.is_ok());
            prop_assert_eq!(surface.source().steps_taken(), u64::from(burst) + 1);
        } else {
            prop_assert_eq!(
                result,
                Err(HwError::Exhausted { instruction: Instruction::Rdrand32, attempts })
            );
        }
    }
}
