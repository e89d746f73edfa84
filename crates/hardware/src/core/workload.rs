//! Operation streams consumed by the core model.
//!
//! A core does not decode instructions; it consumes a stream of abstract
//! operations. This module provides:
//! 1. **CoreOp:** The operation vocabulary (compute, load, store, offload, wait, halt).
//! 2. **TraceWorkload:** A program parsed once from the text trace format.
//! 3. **SyntheticWorkload:** A seeded generator of a weighted operation mix.
//! 4. **OpStream:** An adapter turning any iterator of operations into a workload.
//!
//! # Trace format
//!
//! One operation per line; `#` starts a comment; blank lines are ignored.
//! Numbers are decimal or `0x`-prefixed hexadecimal. Durations must fit in 32 bits.
//!
//! ```text
//! compute 3          # 3 busy core cycles
//! load 0x1000
//! store 0x1008
//! offload 7 4 deadbeef   # inst id 7, 4 coprocessor cycles, payload bytes
//! wait               # block until every outstanding offload completes
//! halt
//! ```

use std::fmt;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::common::TraceError;
use crate::common::constants::{MAX_TRACE_CYCLES, SYNTHETIC_ACCESS_ALIGN};
use crate::config::SyntheticParams;
use crate::core::coproc::OffloadOp;

/// One operation of a core's stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreOp {
    /// Busy for the given number of core cycles (0 is treated as 1).
    Compute(u64),
    /// Blocking load; the core resumes when the response arrives.
    Load(u64),
    /// Posted store; the core continues on the next cycle.
    Store(u64),
    /// Submit an operation to the attached coprocessor.
    Offload(OffloadOp),
    /// Block until every outstanding offload has completed.
    Wait,
    /// Stop the core after outstanding offloads complete.
    Halt,
}

impl fmt::Display for CoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compute(n) => write!(f, "compute {n}"),
            Self::Load(a) => write!(f, "load {a:#x}"),
            Self::Store(a) => write!(f, "store {a:#x}"),
            Self::Offload(op) => write!(f, "offload {} {}", op.inst_id, op.cycles),
            Self::Wait => f.write_str("wait"),
            Self::Halt => f.write_str("halt"),
        }
    }
}

/// Source of operations for one core.
pub trait Workload: Send {
    /// Returns the next operation, or `None` when the stream is exhausted.
    fn next_op(&mut self) -> Option<CoreOp>;
}

impl fmt::Debug for dyn Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Workload")
    }
}

/// Adapts an iterator of operations into a [`Workload`].
#[derive(Debug, Clone)]
pub struct OpStream<I> {
    ops: I,
}

impl<I> OpStream<I>
where
    I: Iterator<Item = CoreOp>,
{
    /// Wraps `ops`.
    pub fn new<T: IntoIterator<IntoIter = I>>(ops: T) -> Self {
        Self {
            ops: ops.into_iter(),
        }
    }
}

impl<I> Workload for OpStream<I>
where
    I: Iterator<Item = CoreOp> + Send,
{
    fn next_op(&mut self) -> Option<CoreOp> {
        self.ops.next()
    }
}

/// A parsed program. Clones share the parsed operations and have their own cursor.
#[derive(Debug, Clone)]
pub struct TraceWorkload {
    ops: Arc<[CoreOp]>,
    cursor: usize,
}

impl TraceWorkload {
    /// Parses a program in the trace format.
    ///
    /// # Errors
    ///
    /// Returns a [`TraceError`] naming the first offending line.
    pub fn parse(text: &str) -> Result<Self, TraceError> {
        let ops = text
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let code = line.split('#').next().unwrap_or("").trim();
                (!code.is_empty()).then_some((index + 1, code))
            })
            .map(|(line, code)| parse_line(code).map_err(|reason| TraceError { line, reason }))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            ops: ops.into(),
            cursor: 0,
        })
    }

    /// Returns the parsed operations.
    pub fn ops(&self) -> &[CoreOp] {
        &self.ops
    }

    /// Returns the number of operations in the program.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` for an empty program.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Workload for TraceWorkload {
    fn next_op(&mut self) -> Option<CoreOp> {
        let op = self.ops.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(op)
    }
}

fn parse_line(code: &str) -> Result<CoreOp, String> {
    let mut tokens = code.split_whitespace();
    let mnemonic = tokens.next().unwrap_or("").to_ascii_lowercase();
    let args: Vec<&str> = tokens.collect();

    let expect_args = |min: usize, max: usize| {
        if args.len() < min || args.len() > max {
            Err(format!(
                "`{mnemonic}` takes {} operand(s), found {}",
                if min == max {
                    min.to_string()
                } else {
                    format!("{min}-{max}")
                },
                args.len()
            ))
        } else {
            Ok(())
        }
    };

    match mnemonic.as_str() {
        "compute" => {
            expect_args(1, 1)?;
            Ok(CoreOp::Compute(parse_cycles(args[0])?))
        }
        "load" => {
            expect_args(1, 1)?;
            Ok(CoreOp::Load(parse_number(args[0])?))
        }
        "store" => {
            expect_args(1, 1)?;
            Ok(CoreOp::Store(parse_number(args[0])?))
        }
        "offload" => {
            expect_args(2, 3)?;
            let inst_id = u32::try_from(parse_number(args[0])?)
                .map_err(|_| format!("instruction id `{}` exceeds 32 bits", args[0]))?;
            let cycles = parse_cycles(args[1])?;
            let payload = args.get(2).map_or(Ok(Vec::new()), |hex| parse_payload(hex))?;
            Ok(CoreOp::Offload(
                OffloadOp::new(inst_id, cycles).with_payload(payload),
            ))
        }
        "wait" => {
            expect_args(0, 0)?;
            Ok(CoreOp::Wait)
        }
        "halt" => {
            expect_args(0, 0)?;
            Ok(CoreOp::Halt)
        }
        other => Err(format!("unknown operation `{other}`")),
    }
}

fn parse_number(token: &str) -> Result<u64, String> {
    let digits = token.replace('_', "");
    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse(),
    };
    parsed.map_err(|e| format!("invalid number `{token}`: {e}"))
}

fn parse_cycles(token: &str) -> Result<u64, String> {
    let cycles = parse_number(token)?;
    if cycles > MAX_TRACE_CYCLES {
        return Err(format!("duration `{token}` exceeds {MAX_TRACE_CYCLES} cycles"));
    }
    Ok(cycles)
}

fn parse_payload(token: &str) -> Result<Vec<u8>, String> {
    let hex = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    if hex.len() % 2 != 0 {
        return Err(format!("payload `{token}` has an odd number of hex digits"));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid payload `{token}`"))
        })
        .collect()
}

/// Seeded generator of a weighted load/store/compute/offload mix.
///
/// Addresses are aligned to [`SYNTHETIC_ACCESS_ALIGN`] and lie inside
/// `[0, span)`, so a synthetic run never faults unless `span` exceeds memory.
#[derive(Debug, Clone)]
pub struct SyntheticWorkload {
    rng: Xoshiro256StarStar,
    remaining: u64,
    weights: [u32; 4],
    max_compute: u64,
    offload_cycles: u64,
    span: u64,
    next_inst: u32,
}

impl SyntheticWorkload {
    /// Creates a generator.
    ///
    /// Offloads are only generated when `with_offloads` is set; otherwise the
    /// offload weight is ignored.
    pub fn new(params: &SyntheticParams, span: u64, seed: u64, with_offloads: bool) -> Self {
        let offload_weight = if with_offloads {
            params.offload_weight
        } else {
            0
        };
        Self {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            remaining: params.ops,
            weights: [
                params.load_weight,
                params.store_weight,
                params.compute_weight,
                offload_weight,
            ],
            max_compute: params.max_compute.max(1),
            offload_cycles: params.offload_cycles,
            span,
            next_inst: 0,
        }
    }

    fn address(&mut self) -> u64 {
        let slots = self.span / SYNTHETIC_ACCESS_ALIGN;
        if slots == 0 {
            return 0;
        }
        self.rng.gen_range(0..slots) * SYNTHETIC_ACCESS_ALIGN
    }
}

impl Workload for SyntheticWorkload {
    fn next_op(&mut self) -> Option<CoreOp> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let total: u32 = self.weights.iter().sum();
        if total == 0 {
            return Some(CoreOp::Compute(1));
        }
        let mut pick = self.rng.gen_range(0..total);
        let mut choice = 0;
        for (index, &weight) in self.weights.iter().enumerate() {
            if pick < weight {
                choice = index;
                break;
            }
            pick -= weight;
        }

        Some(match choice {
            0 => CoreOp::Load(self.address()),
            1 => CoreOp::Store(self.address()),
            2 => CoreOp::Compute(self.rng.gen_range(1..=self.max_compute)),
            _ => {
                let inst_id = self.next_inst;
                self.next_inst = self.next_inst.wrapping_add(1);
                CoreOp::Offload(OffloadOp::new(inst_id, self.offload_cycles))
            }
        })
    }
}
