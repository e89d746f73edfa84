//! # Latency Model Tests
//!
//! Uniform and table-driven cost models, setup-time registration checks, and
//! seeding behaviour of the per-core memory latency model.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use revsim_core::common::{ConfigError, CoreId, SimError};
use revsim_core::config::MemCost;
use revsim_core::soc::memory::MemoryRequest;
use revsim_core::soc::memory::controller::{CostModel, MemoryLatencyModel, TableCost, UniformCost};

fn range(min: u64, max: u64) -> MemCost {
    MemCost::new(0, min, max).unwrap()
}

fn draws(model: &mut MemoryLatencyModel, core: usize, n: usize) -> Vec<u64> {
    (0..n)
        .map(|i| {
            model
                .resolve_latency(&MemoryRequest::load(CoreId(core), i as u64 * 8, 0))
                .unwrap()
        })
        .collect()
}

// ══════════════════════════════════════════════════════════
// 1. Cost models
// ══════════════════════════════════════════════════════════

#[test]
fn test_fixed_range_always_returns_k() {
    let mut cost = UniformCost::new(range(7, 7), 1);
    assert!((0..1000).all(|_| cost.draw() == 7));
    assert_eq!(cost.draws(), 1000);
}

#[test]
fn test_table_cycles_in_order() {
    let mut cost = TableCost::new(vec![1, 4, 10]);
    let seq: Vec<u64> = (0..7).map(|_| cost.draw()).collect();
    assert_eq!(seq, vec![1, 4, 10, 1, 4, 10, 1]);

    cost.reseed(99);
    assert_eq!(cost.draw(), 1);
}

#[test]
fn test_empty_table_yields_one_cycle() {
    let mut cost = TableCost::new(Vec::new());
    assert_eq!(cost.draw(), 1);
    assert_eq!(cost.draw(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_uniform_draws_stay_in_range(min in 1u64..1000, width in 0u64..1000, seed in any::<u64>()) {
        let max = min + width;
        let mut cost = UniformCost::new(range(min, max), seed);
        for _ in 0..10_000 {
            let latency = cost.draw();
            prop_assert!(latency >= min && latency <= max);
        }
    }
}

// ══════════════════════════════════════════════════════════
// 2. Registration
// ══════════════════════════════════════════════════════════

#[test]
fn test_from_ranges_registers_every_core() {
    let mut model = MemoryLatencyModel::from_ranges(
        2,
        &[(CoreId(0), range(1, 1)), (CoreId(1), range(5, 5))],
        0,
    )
    .unwrap();
    assert_eq!(model.num_cores(), 2);
    assert_eq!(draws(&mut model, 0, 3), vec![1, 1, 1]);
    assert_eq!(draws(&mut model, 1, 3), vec![5, 5, 5]);
}

#[test]
fn test_from_ranges_rejects_missing_core() {
    let err = MemoryLatencyModel::from_ranges(2, &[(CoreId(0), range(1, 10))], 0).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingCore {
            key: "memCost",
            core: 1
        }
    ));
}

#[test]
fn test_from_ranges_rejects_out_of_range_core() {
    let err = MemoryLatencyModel::from_ranges(1, &[(CoreId(3), range(1, 10))], 0).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::CoreOutOfRange {
            core: 3,
            num_cores: 1,
            ..
        }
    ));
}

#[test]
fn test_from_ranges_revalidates_range() {
    let inverted = MemCost { min: 9, max: 2 };
    let err = MemoryLatencyModel::from_ranges(1, &[(CoreId(0), inverted)], 0).unwrap_err();
    assert!(matches!(err, ConfigError::InvertedRange { min: 9, max: 2, .. }));
}

#[test]
fn test_unregistered_core_is_an_error() {
    let mut model = MemoryLatencyModel::from_ranges(1, &[(CoreId(0), range(1, 2))], 0).unwrap();
    let err = model
        .resolve_latency(&MemoryRequest::store(CoreId(4), 0, 0))
        .unwrap_err();
    assert!(matches!(err, SimError::UnregisteredCore(CoreId(4))));
}

// ══════════════════════════════════════════════════════════
// 3. Seeding
// ══════════════════════════════════════════════════════════

#[test]
fn test_same_seed_same_sequence() {
    let ranges = [(CoreId(0), range(1, 100))];
    let mut a = MemoryLatencyModel::from_ranges(1, &ranges, 42).unwrap();
    let mut b = MemoryLatencyModel::from_ranges(1, &ranges, 42).unwrap();
    assert_eq!(draws(&mut a, 0, 256), draws(&mut b, 0, 256));
}

#[test]
fn test_different_seed_different_sequence() {
    let ranges = [(CoreId(0), range(1, 100))];
    let mut a = MemoryLatencyModel::from_ranges(1, &ranges, 1).unwrap();
    let mut b = MemoryLatencyModel::from_ranges(1, &ranges, 2).unwrap();
    assert_ne!(draws(&mut a, 0, 256), draws(&mut b, 0, 256));
}

#[test]
fn test_cores_draw_independent_sequences() {
    let ranges = [(CoreId(0), range(1, 100)), (CoreId(1), range(1, 100))];
    let mut interleaved = MemoryLatencyModel::from_ranges(2, &ranges, 7).unwrap();
    let mut alone = MemoryLatencyModel::from_ranges(2, &ranges, 7).unwrap();

    let mut core0 = Vec::new();
    for _ in 0..64 {
        core0.extend(draws(&mut interleaved, 0, 1));
        let _ = draws(&mut interleaved, 1, 3);
    }
    assert_eq!(core0, draws(&mut alone, 0, 64));
}

#[test]
fn test_reseed_restarts_sequence() {
    let ranges = [(CoreId(0), range(1, 1000))];
    let mut model = MemoryLatencyModel::from_ranges(1, &ranges, 5).unwrap();
    let first = draws(&mut model, 0, 32);
    let _ = draws(&mut model, 0, 100);

    model.reseed(5);
    assert_eq!(draws(&mut model, 0, 32), first);
}
