//! Command-line front end for `roofline-oracle`.
//!
//! Metric lines go to stdout; logs go to stderr, filtered by `RUST_LOG` or
//! `--log-level`.

use std::error::Error;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use roofline_oracle::measurement::StridePoint;
use roofline_oracle::output::{
    format_estimate_lines, format_stride_table, format_summary, format_trial_line,
};
use roofline_oracle::{
    FitMethod, RooflineEstimator, RooflineReport, StrideProbe, DEFAULT_INTENSITY_RANGE,
    MIN_BANDWIDTH_BYTES,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const MIB: usize = 1024 * 1024;

#[derive(Parser)]
#[command(name = "roofline")]
#[command(about = "Estimate the single-core roofline (memory bandwidth and peak FLOP/s) as distributions")]
#[command(version)]
struct Cli {
    /// Measured trials per probe
    #[arg(short, long, default_value_t = 10)]
    trials: usize,

    /// Discarded warm-up invocations per probe
    #[arg(long, default_value_t = 1)]
    warmup: usize,

    /// Bandwidth working set in MiB (minimum 128)
    #[arg(long, default_value_t = MIN_BANDWIDTH_BYTES / MIB)]
    bandwidth_mib: usize,

    /// FMA chain iterations per compute trial
    #[arg(long, default_value_t = 1_000_000)]
    compute_iterations: u64,

    /// Lower bound of the arithmetic intensity interval (FLOP/byte)
    #[arg(long, default_value_t = DEFAULT_INTENSITY_RANGE.0)]
    ai_min: f64,

    /// Upper bound of the arithmetic intensity interval (FLOP/byte)
    #[arg(long, default_value_t = DEFAULT_INTENSITY_RANGE.1)]
    ai_max: f64,

    /// Monte-Carlo draws per random variable
    #[arg(long, default_value_t = 10_000)]
    draws: usize,

    /// Distribution fitting method
    #[arg(long, value_enum, default_value_t = Fit::Bootstrap)]
    fit: Fit,

    /// Seed for distribution sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Accept working sets below 128 MiB (measures cache, not memory)
    #[arg(long)]
    allow_small_working_set: bool,

    /// Emit the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Also sweep write strides over the bandwidth working set
    #[arg(long)]
    stride_sweep: bool,

    /// Print only the fitted quantities
    #[arg(short, long)]
    quiet: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Fit {
    Bootstrap,
    Kernel,
}

impl From<Fit> for FitMethod {
    fn from(fit: Fit) -> Self {
        match fit {
            Fit::Bootstrap => FitMethod::Bootstrap,
            Fit::Kernel => FitMethod::Kernel,
        }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a RooflineReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    stride_sweep: Option<&'a [StridePoint]>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let bandwidth_bytes = cli.bandwidth_mib.saturating_mul(MIB);
    let mut estimator = RooflineEstimator::new()
        .trials(cli.trials)
        .warmup(cli.warmup)
        .bandwidth_bytes(bandwidth_bytes)
        .compute_iterations(cli.compute_iterations)
        .intensity_range(cli.ai_min, cli.ai_max)
        .draws(cli.draws)
        .fit(cli.fit.into())
        .allow_small_working_set(cli.allow_small_working_set);
    if let Some(seed) = cli.seed {
        estimator = estimator.seed(seed);
    }

    let print_trials = !cli.json && !cli.quiet;
    let report = estimator.run_with_observer(|kind, _, sample| {
        if print_trials {
            println!("{}", format_trial_line(kind, sample));
        }
    })?;

    let stride = if cli.stride_sweep {
        let probe = StrideProbe::new(bandwidth_bytes, StrideProbe::default_strides());
        Some(probe.sweep()?)
    } else {
        None
    };

    if cli.json {
        let output = JsonOutput {
            report: &report,
            stride_sweep: stride.as_deref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print!("{}", format_estimate_lines(&report));
    if !cli.quiet {
        println!();
        print!("{}", format_summary(&report));
        if let Some(points) = &stride {
            println!();
            print!("{}", format_stride_table(points));
        }
    }
    Ok(())
}
