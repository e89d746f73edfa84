//! Test harness.
//!
//! Builds configurations from JSON snippets, runs operation lists through a full
//! simulator, and drives a coprocessor on its own event queue.

use revsim_core::common::{BackpressureError, CoreId, Tick};
use revsim_core::config::{CoProcSpec, Config, IssueMode, Platform};
use revsim_core::core::coproc::{CoProc, OffloadHandle, OffloadOp, OffloadResult, SimpleCoProc};
use revsim_core::core::workload::{CoreOp, OpStream, Workload};
use revsim_core::sim::clock::ClockDomain;
use revsim_core::sim::event::{Event, EventQueue, Scheduler};
use revsim_core::stats::StatisticsSink;
use revsim_core::{RunSummary, Simulator};
use serde_json::{Value, json};

/// Core clock period at 1 GHz with a 1 ps timebase.
pub const CORE_PERIOD: Tick = 1000;

/// Installs a test log subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("warn")
        .try_init();
}

/// Returns a one-core CPU section with `memCost` `[0:1:10]`.
pub fn cpu_params() -> Value {
    json!({
        "numCores": 1,
        "clock": "1.0GHz",
        "memSize": 1_073_741_824_u64,
        "machine": "[0:RV32I]",
        "startAddr": "[0:0x00000000]",
        "memCost": "[0:1:10]",
    })
}

/// Builds a configuration document, overlaying `cpu` keys onto [`cpu_params`].
pub fn config_with(cpu: Value, co_proc: Option<Value>) -> Config {
    let mut cpu_section = cpu_params();
    if let (Some(base), Value::Object(extra)) = (cpu_section.as_object_mut(), cpu) {
        base.extend(extra);
    }
    if co_proc.is_some() {
        cpu_section["enableCoProc"] = json!(1);
    }
    let doc = json!({
        "program_options": { "timebase": "1ps", "stopAtCycle": "0s" },
        "statistic_load_level": 5,
        "cpu": cpu_section,
        "co_proc": co_proc.unwrap_or_else(|| json!({})),
    });
    serde_json::from_value(doc).unwrap()
}

/// Builds and validates a platform.
pub fn platform_with(cpu: Value, co_proc: Option<Value>) -> Platform {
    config_with(cpu, co_proc).build().unwrap()
}

/// Builds a simulator where core `i` executes `programs[i]`.
pub fn simulator(platform: Platform, programs: Vec<Vec<CoreOp>>) -> Simulator {
    init_tracing();
    let workloads = programs
        .into_iter()
        .map(|ops| Box::new(OpStream::new(ops)) as Box<dyn Workload>)
        .collect();
    Simulator::with_workloads(platform, workloads).unwrap()
}

/// Runs `programs` to completion and returns the simulator and its summary.
pub fn run(platform: Platform, programs: Vec<Vec<CoreOp>>) -> (Simulator, RunSummary) {
    let mut sim = simulator(platform, programs);
    let summary = sim.run().unwrap();
    (sim, summary)
}

/// Shorthand for an offload with no payload.
pub const fn offload(inst_id: u32, cycles: u64) -> CoreOp {
    CoreOp::Offload(OffloadOp::new(inst_id, cycles))
}

/// A coprocessor driven directly on its own event queue.
#[derive(Debug)]
pub struct CoProcBench {
    /// Queue holding only this coprocessor's edges.
    pub queue: EventQueue,
    /// Unit under test.
    pub coproc: SimpleCoProc,
    /// Sink collecting every statistic level.
    pub stats: StatisticsSink,
}

impl CoProcBench {
    /// Creates a bench with a coprocessor of the given depth and issue width, clocked
    /// at `period` ticks.
    pub fn new(queue_depth: usize, issue_width: usize, period: Tick) -> Self {
        let spec = CoProcSpec {
            clock: ClockDomain::new(period),
            queue_depth,
            issue: if issue_width > 1 {
                IssueMode::Multi
            } else {
                IssueMode::Single
            },
            issue_width,
            verbose: 0,
        };
        Self {
            queue: EventQueue::new(),
            coproc: SimpleCoProc::new(CoreId(0), &spec),
            stats: StatisticsSink::new(5),
        }
    }

    /// Submits at the current tick.
    pub fn submit(&mut self, op: &OffloadOp) -> Result<OffloadHandle, BackpressureError> {
        self.coproc
            .submit_offload(op, &mut Scheduler::new(&mut self.queue))
    }

    /// Dispatches coprocessor edges until none remain; returns the last tick.
    pub fn run(&mut self) -> Tick {
        while let Some((_, event)) = self.queue.pop() {
            assert_eq!(event, Event::CoProcTick(CoreId(0)));
            self.coproc
                .clock_tick(&mut Scheduler::new(&mut self.queue), &mut self.stats);
        }
        self.queue.now()
    }

    /// Collects the results of `handles` once everything has finished.
    pub fn collect(&mut self, handles: &[OffloadHandle]) -> Vec<OffloadResult> {
        let now = self.queue.now();
        handles
            .iter()
            .map(|&h| self.coproc.poll_completion(h, now).unwrap())
            .collect()
    }
}
