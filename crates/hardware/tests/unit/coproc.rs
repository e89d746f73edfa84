//! # Coprocessor Tests
//!
//! Submission, completion ordering, backpressure, multi-issue, and clock-domain
//! crossing of the queue-based coprocessor, driven on its own event queue.

use crate::common::harness::CoProcBench;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use revsim_core::common::BackpressureError;
use revsim_core::core::coproc::{CoProc, OffloadHandle, OffloadOp};
use revsim_core::stats::StatFormat;

// ══════════════════════════════════════════════════════════
// 1. Single issue
// ══════════════════════════════════════════════════════════

#[test]
fn test_single_issue_completes_in_submission_order() {
    let mut bench = CoProcBench::new(8, 1, 1000);
    let handles: Vec<OffloadHandle> = [(1, 5), (2, 1), (3, 3)]
        .into_iter()
        .map(|(id, cycles)| bench.submit(&OffloadOp::new(id, cycles)).unwrap())
        .collect();

    let end = bench.run();
    let results = bench.collect(&handles);

    let ids: Vec<u32> = results.iter().map(|r| r.inst_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    // Back to back: 5, then 1, then 3 cycles.
    let completed: Vec<u64> = results.iter().map(|r| r.completed_at).collect();
    assert_eq!(completed, vec![5000, 6000, 9000]);
    assert_eq!(end, 9000);
    assert_eq!(bench.coproc.occupancy(), 0);
}

#[test]
fn test_three_back_to_back_offloads_are_non_decreasing() {
    let mut bench = CoProcBench::new(8, 1, 1000);
    let handles: Vec<OffloadHandle> = (0..3)
        .map(|id| bench.submit(&OffloadOp::new(id, 4)).unwrap())
        .collect();
    let _ = bench.run();
    let results = bench.collect(&handles);
    assert!(
        results
            .windows(2)
            .all(|w| w[0].completed_at <= w[1].completed_at)
    );
}

#[test]
fn test_zero_cycle_offload_takes_one_cycle() {
    let mut bench = CoProcBench::new(8, 1, 1000);
    let h = bench.submit(&OffloadOp::new(9, 0)).unwrap();
    let _ = bench.run();
    assert_eq!(bench.collect(&[h])[0].completed_at, 1000);
}

#[test]
fn test_payload_is_returned_with_result() {
    let mut bench = CoProcBench::new(8, 1, 1000);
    let op = OffloadOp::new(4, 2).with_payload(vec![0xde, 0xad]);
    let h = bench.submit(&op).unwrap();
    let _ = bench.run();
    let result = &bench.collect(&[h])[0];
    assert_eq!(result.payload, vec![0xde, 0xad]);
    assert_eq!(result.handle, h);
    assert_eq!(result.submitted_at, 0);
}

// ══════════════════════════════════════════════════════════
// 2. Polling
// ══════════════════════════════════════════════════════════

#[test]
fn test_poll_before_completion_returns_none() {
    let mut bench = CoProcBench::new(8, 1, 1000);
    let h = bench.submit(&OffloadOp::new(1, 10)).unwrap();
    assert_eq!(bench.coproc.poll_completion(h, 0), None);
    assert_eq!(bench.coproc.poll_completion(h, 9_999), None);
    let _ = bench.run();
    assert!(bench.coproc.poll_completion(h, 10_000).is_some());
}

#[test]
fn test_result_is_delivered_once() {
    let mut bench = CoProcBench::new(8, 1, 1000);
    let h = bench.submit(&OffloadOp::new(1, 1)).unwrap();
    let _ = bench.run();
    assert!(bench.coproc.poll_completion(h, u64::MAX).is_some());
    assert_eq!(bench.coproc.poll_completion(h, u64::MAX), None);
}

#[test]
fn test_unknown_handle_polls_none() {
    let mut bench = CoProcBench::new(8, 1, 1000);
    assert_eq!(bench.coproc.poll_completion(OffloadHandle(42), 0), None);
}

// ══════════════════════════════════════════════════════════
// 3. Backpressure
// ══════════════════════════════════════════════════════════

#[test]
fn test_full_queue_rejects_without_changing_occupancy() {
    let mut bench = CoProcBench::new(2, 1, 1000);
    let _ = bench.submit(&OffloadOp::new(1, 4)).unwrap();
    let _ = bench.submit(&OffloadOp::new(2, 4)).unwrap();
    assert_eq!(bench.coproc.occupancy(), 2);

    let err = bench.submit(&OffloadOp::new(3, 4)).unwrap_err();
    assert_eq!(err, BackpressureError { capacity: 2 });
    assert_eq!(bench.coproc.occupancy(), 2);
    assert_eq!(bench.coproc.capacity(), 2);

    // Draining frees the slots again.
    let _ = bench.run();
    assert_eq!(bench.coproc.occupancy(), 0);
    assert!(bench.submit(&OffloadOp::new(3, 4)).is_ok());
}

#[test]
fn test_report_counts_rejections_and_high_water() {
    let mut bench = CoProcBench::new(1, 1, 1000);
    let _ = bench.submit(&OffloadOp::new(1, 2)).unwrap();
    assert!(bench.submit(&OffloadOp::new(2, 2)).is_err());
    let _ = bench.run();

    let mut stats = std::mem::take(&mut bench.stats);
    bench.coproc.report(&mut stats);
    let csv = stats.flush(StatFormat::Csv);
    assert!(csv.contains("cpu.core0.co_proc,ops_executed,count,1,1"));
    assert!(csv.contains("cpu.core0.co_proc,ops_rejected,count,3,1"));
    assert!(csv.contains("cpu.core0.co_proc,queue_high_water,entries,4,1"));
    assert!(csv.contains("cpu.core0.co_proc,busy_cycles,cycles,3,2"));
}

// ══════════════════════════════════════════════════════════
// 4. Multi issue
// ══════════════════════════════════════════════════════════

#[test]
fn test_multi_issue_overlaps_and_may_reorder() {
    let mut bench = CoProcBench::new(8, 2, 1000);
    let long = bench.submit(&OffloadOp::new(1, 10)).unwrap();
    let short = bench.submit(&OffloadOp::new(2, 2)).unwrap();
    let third = bench.submit(&OffloadOp::new(3, 2)).unwrap();
    let _ = bench.run();

    let results = bench.collect(&[long, short, third]);
    assert_eq!(results[0].completed_at, 10_000);
    assert_eq!(results[1].completed_at, 2_000);
    // Starts when the short one frees its slot.
    assert_eq!(results[2].completed_at, 4_000);
}

// ══════════════════════════════════════════════════════════
// 5. Clock crossing
// ══════════════════════════════════════════════════════════

#[test]
fn test_submission_maps_to_next_coproc_edge() {
    // 3 ns coprocessor period; submission at tick 0 starts on cycle 0.
    let mut bench = CoProcBench::new(8, 1, 3000);
    let h = bench.submit(&OffloadOp::new(1, 2)).unwrap();
    let _ = bench.run();
    assert_eq!(bench.collect(&[h])[0].completed_at, 6000);
}

// ══════════════════════════════════════════════════════════
// 6. Tick horizon
// ══════════════════════════════════════════════════════════

#[test]
fn test_unbounded_offload_behind_short_one() {
    let mut bench = CoProcBench::new(8, 1, 1000);
    let short = bench.submit(&OffloadOp::new(1, 5)).unwrap();
    let endless = bench.submit(&OffloadOp::new(2, u64::MAX)).unwrap();

    assert_eq!(bench.run(), 5000);
    assert_eq!(bench.collect(&[short])[0].completed_at, 5000);
    // Its finish edge lies past the last tick, so it never completes.
    assert_eq!(bench.coproc.poll_completion(endless, u64::MAX), None);
    assert_eq!(bench.coproc.occupancy(), 1);

    let mut stats = std::mem::take(&mut bench.stats);
    bench.coproc.report(&mut stats);
    let csv = stats.flush(StatFormat::Csv);
    assert!(csv.contains(&format!("cpu.core0.co_proc,busy_cycles,cycles,3,{}", u64::MAX)));
}

#[test]
fn test_unbounded_offload_keeps_its_slot_in_multi_issue() {
    let mut bench = CoProcBench::new(8, 2, 1000);
    let endless = bench.submit(&OffloadOp::new(1, u64::MAX)).unwrap();
    let first = bench.submit(&OffloadOp::new(2, 3)).unwrap();
    let second = bench.submit(&OffloadOp::new(3, 3)).unwrap();

    assert_eq!(bench.run(), 6000);
    let completed: Vec<u64> = bench
        .collect(&[first, second])
        .iter()
        .map(|r| r.completed_at)
        .collect();
    assert_eq!(completed, vec![3000, 6000]);
    assert_eq!(bench.coproc.poll_completion(endless, u64::MAX), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_any_offload_length_terminates(cycles in any::<u64>()) {
        let mut bench = CoProcBench::new(8, 1, 1000);
        let short = bench.submit(&OffloadOp::new(1, 5)).unwrap();
        let long = bench.submit(&OffloadOp::new(2, cycles)).unwrap();
        let end = bench.run();

        prop_assert_eq!(bench.collect(&[short])[0].completed_at, 5000);
        let finish = 5u64
            .checked_add(cycles.max(1))
            .and_then(|cycle| cycle.checked_mul(1000));
        match finish {
            Some(tick) => {
                prop_assert_eq!(end, tick);
                prop_assert_eq!(bench.collect(&[long])[0].completed_at, tick);
            }
            None => {
                prop_assert_eq!(end, 5000);
                prop_assert!(bench.coproc.poll_completion(long, u64::MAX).is_none());
            }
        }
    }
}
