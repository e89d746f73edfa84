//! # Program Loading Tests

use std::io::Write;

use crate::common::harness::{CORE_PERIOD, config_with, init_tracing};
use pretty_assertions::assert_eq;
use revsim_core::Simulator;
use revsim_core::common::{ConfigError, CoreId};
use revsim_core::core::coproc::OffloadOp;
use revsim_core::core::workload::{CoreOp, TraceWorkload, Workload};
use revsim_core::sim::loader::{self, PROGRAM_ENV};
use serde_json::json;
use tempfile::NamedTempFile;

fn program_file(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

// ══════════════════════════════════════════════════════════
// 1. Trace format
// ══════════════════════════════════════════════════════════

#[test]
fn test_parse_trace() {
    let trace = TraceWorkload::parse(
        "# header comment\n\
         compute 3\n\
         \n\
         LOAD 0x1000      # hex address\n\
         store 4_096\n\
         offload 7 4 0xdeadbeef\n\
         offload 8 2\n\
         wait\n\
         halt\n",
    )
    .unwrap();

    assert_eq!(
        trace.ops(),
        &[
            CoreOp::Compute(3),
            CoreOp::Load(0x1000),
            CoreOp::Store(4096),
            CoreOp::Offload(OffloadOp::new(7, 4).with_payload(vec![0xde, 0xad, 0xbe, 0xef])),
            CoreOp::Offload(OffloadOp::new(8, 2)),
            CoreOp::Wait,
            CoreOp::Halt,
        ]
    );
}

#[test]
fn test_parse_error_names_line() {
    let err = TraceWorkload::parse("compute 1\n# fine\nload\n").unwrap_err();
    assert_eq!(err.line, 3);
    assert!(err.reason.contains("operand"), "{}", err.reason);

    let err = TraceWorkload::parse("jump 4\n").unwrap_err();
    assert_eq!(err.line, 1);
    assert!(err.reason.contains("unknown operation"));

    let err = TraceWorkload::parse("offload 1 2 abc\n").unwrap_err();
    assert!(err.reason.contains("odd number"));

    let err = TraceWorkload::parse("offload 4294967296 1\n").unwrap_err();
    assert!(err.reason.contains("32 bits"));
}

#[test]
fn test_clones_have_independent_cursors() {
    let mut a = TraceWorkload::parse("compute 1\nhalt\n").unwrap();
    assert_eq!(a.next_op(), Some(CoreOp::Compute(1)));
    let mut b = a.clone();
    let mut fresh = TraceWorkload::parse("compute 1\nhalt\n").unwrap();
    assert_eq!(b.next_op(), Some(CoreOp::Halt));
    assert_eq!(fresh.next_op(), Some(CoreOp::Compute(1)));
    assert_eq!(a.next_op(), Some(CoreOp::Halt));
    assert_eq!(a.next_op(), None);
}

// ══════════════════════════════════════════════════════════
// 2. Files
// ══════════════════════════════════════════════════════════

#[test]
fn test_load_program_from_file() {
    let file = program_file("load 0x40\nhalt\n");
    let program = loader::load_program(file.path()).unwrap();
    assert_eq!(program.len(), 2);
}

#[test]
fn test_missing_program_is_config_error() {
    let err = loader::load_program("/nonexistent/revsim/program.trace").unwrap_err();
    assert!(matches!(err, ConfigError::ProgramIo { .. }));
}

#[test]
fn test_bad_program_reports_path_and_line() {
    let file = program_file("compute 1\nstore\n");
    let err = loader::load_program(file.path()).unwrap_err();
    match err {
        ConfigError::Program { path, source } => {
            assert_eq!(path, file.path().display().to_string());
            assert_eq!(source.line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_configured_program_runs_on_every_core() {
    if std::env::var_os(PROGRAM_ENV).is_some() {
        return;
    }
    init_tracing();
    let file = program_file("compute 2\nload 0\nhalt\n");
    let mut config = config_with(
        json!({
            "numCores": 2,
            "machine": "[CORES:RV64I]",
            "startAddr": "[CORES:0]",
            "memCost": "[CORES:1:1]",
        }),
        None,
    );
    config.cpu.program = Some(file.path().display().to_string());

    let mut sim = Simulator::new(&config).unwrap();
    let _ = sim.run().unwrap();
    for core in 0..2 {
        let core = sim.core(CoreId(core)).unwrap();
        assert_eq!(core.counters().instructions_retired, 3);
        assert_eq!(core.halted_at(), Some(3 * CORE_PERIOD));
    }
}

#[test]
fn test_unreadable_program_fails_setup() {
    if std::env::var_os(PROGRAM_ENV).is_some() {
        return;
    }
    let mut config = config_with(json!({}), None);
    config.cpu.program = Some("/nonexistent/revsim/program.trace".to_string());
    assert!(matches!(
        Simulator::new(&config),
        Err(ConfigError::ProgramIo { .. })
    ));
}

#[test]
fn test_resolve_program_without_override() {
    if std::env::var_os(PROGRAM_ENV).is_some() {
        return;
    }
    assert_eq!(
        loader::resolve_program(Some("programs/ex1.trace")),
        Some("programs/ex1.trace".to_string())
    );
    assert_eq!(loader::resolve_program(None), None);
}

// ══════════════════════════════════════════════════════════
// 3. Synthetic workloads
// ══════════════════════════════════════════════════════════

#[test]
fn test_synthetic_workloads_differ_per_core() {
    if std::env::var_os(PROGRAM_ENV).is_some() {
        return;
    }
    let mut config = config_with(
        json!({
            "numCores": 2,
            "machine": "[CORES:RV64I]",
            "startAddr": "[CORES:0]",
            "memCost": "[CORES:1:4]",
        }),
        None,
    );
    config.synthetic.ops = 32;
    let platform = config.build().unwrap();
    let mut workloads = loader::workloads(&config, &platform).unwrap();
    assert_eq!(workloads.len(), 2);

    let drain = |w: &mut Box<dyn Workload>| std::iter::from_fn(|| w.next_op()).collect::<Vec<_>>();
    let first = drain(&mut workloads[0]);
    let second = drain(&mut workloads[1]);
    assert_eq!(first.len(), 32);
    assert_ne!(first, second);
}

#[test]
fn test_synthetic_addresses_stay_in_memory() {
    if std::env::var_os(PROGRAM_ENV).is_some() {
        return;
    }
    let mut config = config_with(json!({ "memSize": 4096 }), None);
    config.synthetic.ops = 2000;
    config.synthetic.address_span = Some(1 << 40);
    let platform = config.build().unwrap();
    let mut workloads = loader::workloads(&config, &platform).unwrap();

    while let Some(op) = workloads[0].next_op() {
        if let CoreOp::Load(address) | CoreOp::Store(address) = op {
            assert!(address < 4096);
            assert_eq!(address % 8, 0);
        }
    }
}

#[test]
fn test_workload_seed_depends_on_core() {
    assert_ne!(loader::workload_seed(1, 0), loader::workload_seed(1, 1));
    assert_eq!(loader::workload_seed(9, 3), loader::workload_seed(9, 3));
}
