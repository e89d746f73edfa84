//! Core/coprocessor simulator CLI.
//!
//! This binary provides a single entry point for all simulation modes. It performs:
//! 1. **Run:** Load a JSON configuration, run to the stop condition, and write statistics.
//! 2. **Check:** Validate a configuration and print the resulting platform.
//! 3. **Script run:** Execute a Python script with the `revsim` module injected, for
//!    SST-style parameter scripts and sweeps.

use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::{Parser, Subcommand, ValueEnum};
use pyo3::prelude::*;
use pyo3::types::PyList;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use revsim_core::config::{Config, StopCondition};
use revsim_core::stats::StatFormat;
use revsim_core::{RunSummary, Simulator};

/// Exit status for invalid configuration.
const EXIT_CONFIG: i32 = 2;
/// Exit status for an aborted run or an I/O failure.
const EXIT_FAILURE: i32 = 1;

#[derive(Parser, Debug)]
#[command(
    name = "revsim",
    author,
    version,
    about = "Discrete-event core/coprocessor timing simulator",
    long_about = "Run a JSON configuration, validate one, or run a Python parameter script.\n\nExamples:\n  revsim run -c configs/coproc_ex.json\n  revsim run -c configs/coproc_ex.json --program programs/ex1.trace --stats stats.csv\n  revsim check -c configs/coproc_ex.json\n  revsim scripts/coproc_ex.py"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a configuration to its stop condition and write statistics.
    Run {
        /// JSON configuration file; built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Operation trace each core executes (overrides `cpu.program`).
        #[arg(short, long, env = "REV_EXE")]
        program: Option<String>,

        /// Statistics output file; stdout when omitted.
        #[arg(short, long)]
        stats: Option<PathBuf>,

        /// Statistics output format.
        #[arg(short, long, value_enum, default_value_t = Format::Csv)]
        format: Format,

        /// Seed for every pseudo-random draw (overrides `program_options.seed`).
        #[arg(long)]
        seed: Option<u64>,

        /// Stop time, e.g. `10us` (overrides `program_options.stopAtCycle`).
        #[arg(long)]
        stop_at: Option<String>,

        /// Highest recorded statistic level (overrides `statistic_load_level`).
        #[arg(long)]
        stat_level: Option<u8>,
    },

    /// Validate a configuration without running it.
    Check {
        /// JSON configuration file.
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Run a Python script with `revsim` injected. Script gets argv as sys.argv.
    Script {
        /// Script path (e.g. scripts/coproc_ex.py).
        path: String,

        /// Arguments for the script (sys.argv[1:]).
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for StatFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => Self::Csv,
            Format::Json => Self::Json,
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().is_some_and(|s| s.ends_with(".py")) {
        init_logging(0);
        let mut args = args.into_iter();
        let script = args.next().unwrap_or_default();
        run_python_script(&script, args.collect());
        return;
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Run {
            config,
            program,
            stats,
            format,
            seed,
            stop_at,
            stat_level,
        }) => {
            let mut cfg = load_config(config.as_deref());
            if program.is_some() {
                cfg.cpu.program = program;
            }
            if let Some(seed) = seed {
                cfg.program_options.seed = seed;
            }
            if let Some(stop_at) = stop_at {
                cfg.program_options.stop_at_cycle = stop_at;
            }
            if let Some(level) = stat_level {
                cfg.statistic_load_level = level;
            }
            cmd_run(&cfg, stats.as_deref(), format.into());
        }
        Some(Commands::Check { config }) => cmd_check(&load_config(Some(&config))),
        Some(Commands::Script { path, args }) => run_python_script(&path, args),
        None => {
            eprintln!("revsim: pass a subcommand or a .py script");
            eprintln!();
            eprintln!("  revsim run -c <config.json>      Run a configuration");
            eprintln!("  revsim check -c <config.json>    Validate a configuration");
            eprintln!("  revsim <script.py> [args...]     Run a parameter script");
            eprintln!();
            eprintln!("  revsim --help  for full options");
            process::exit(EXIT_FAILURE);
        }
    }
}

/// Installs the stderr subscriber; `RUST_LOG` overrides the `-v` count.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Reads a JSON configuration, or returns the defaults when `path` is `None`.
///
/// Exits with [`EXIT_CONFIG`] if the file cannot be read or parsed.
fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error: cannot read {}: {e}", path.display());
        process::exit(EXIT_CONFIG);
    });
    let config = Config::from_json(&text).unwrap_or_else(|e| {
        eprintln!("error: {}: {e}", path.display());
        process::exit(EXIT_CONFIG);
    });
    debug!(path = %path.display(), cores = config.cpu.num_cores, "configuration loaded");
    config
}

/// Runs the simulation and writes statistics.
///
/// Configuration errors exit before simulated time advances.
fn cmd_run(config: &Config, stats_path: Option<&Path>, format: StatFormat) {
    let mut sim = Simulator::new(config).unwrap_or_else(|e| {
        eprintln!("configuration error: {e}");
        process::exit(EXIT_CONFIG);
    });

    info!(
        cores = sim.cores().len(),
        coprocessors = sim.platform().coproc.is_some(),
        "platform ready"
    );
    let summary = sim.run().unwrap_or_else(|e| {
        eprintln!("simulation aborted: {e}");
        process::exit(EXIT_FAILURE);
    });
    print_summary(&summary, sim.platform().timebase_fs);

    let text = sim.finish(format);
    match stats_path {
        Some(path) => {
            if let Err(e) = fs::write(path, text) {
                eprintln!("error: cannot write {}: {e}", path.display());
                process::exit(EXIT_FAILURE);
            }
            eprintln!("[*] statistics written to {}", path.display());
        }
        None => print!("{text}"),
    }
}

fn print_summary(summary: &RunSummary, timebase_fs: f64) {
    let seconds = summary.end_tick as f64 * timebase_fs / 1e15;
    eprintln!("==========================================================");
    eprintln!("SIMULATION SUMMARY");
    eprintln!("==========================================================");
    eprintln!("end_tick                 {}", summary.end_tick);
    eprintln!("sim_seconds              {seconds:.9} s");
    eprintln!("stop_reason              {}", summary.stop_reason);
    eprintln!("events                   {}", summary.events);
    eprintln!("----------------------------------------------------------");
}

/// Validates `config` and prints the platform it describes as JSON.
fn cmd_check(config: &Config) {
    let platform = config.build().unwrap_or_else(|e| {
        eprintln!("configuration error: {e}");
        process::exit(EXIT_CONFIG);
    });

    let cores: Vec<_> = platform
        .cores
        .iter()
        .map(|core| {
            serde_json::json!({
                "core": core.id.index(),
                "isa": core.isa.to_string(),
                "startAddr": format!("{:#x}", core.start_addr),
                "memCost": [core.cost.min, core.cost.max],
                "memCostTable": core.cost_table,
                "clockPeriodTicks": core.clock.period(),
            })
        })
        .collect();
    let coproc = platform.coproc.map(|cp| {
        serde_json::json!({
            "clockPeriodTicks": cp.clock.period(),
            "queueDepth": cp.queue_depth,
            "issueWidth": cp.issue_width,
        })
    });
    let stop = match platform.stop {
        StopCondition::Drain => serde_json::Value::Null,
        StopCondition::AtTick(tick) => serde_json::Value::from(tick),
    };
    let report = serde_json::json!({
        "timebaseFs": platform.timebase_fs,
        "stopAtTick": stop,
        "seed": platform.seed,
        "memSize": platform.mem_size,
        "statisticLoadLevel": platform.statistic_load_level,
        "cores": cores,
        "coProc": coproc,
    });
    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(EXIT_FAILURE);
        }
    }
}

/// Runs a Python script with `revsim` injected into `sys.modules` and `sys.argv` set.
///
/// The script is executed as `__main__`. Exits the process with code 1 on script error
/// or missing file.
fn run_python_script(script_path: &str, script_args: Vec<String>) {
    let script_content = fs::read_to_string(script_path).unwrap_or_else(|e| {
        eprintln!("Error reading script {script_path}: {e}");
        process::exit(EXIT_FAILURE);
    });

    let result = Python::with_gil(|py| -> PyResult<()> {
        let sys = py.import("sys")?;
        let path = sys.getattr("path")?;
        let _ = path.call_method1("append", (".",))?;
        let _ = path.call_method1("append", ("python",))?;

        let m = PyModule::new(py, "revsim")?;
        revsim::register_module(&m)?;
        sys.getattr("modules")?.set_item("revsim", m)?;

        let mut full_args = vec![script_path.to_string()];
        full_args.extend(script_args);
        sys.setattr("argv", PyList::new(py, &full_args)?)?;

        let to_c = |s: &str| {
            CString::new(s).map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
        };
        let _ = PyModule::from_code(
            py,
            &to_c(&script_content)?,
            &to_c(script_path)?,
            &to_c("__main__")?,
        )
        .inspect_err(|e| e.print(py))?;
        Ok(())
    });

    if result.is_err() {
        process::exit(EXIT_FAILURE);
    }
}
