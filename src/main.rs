use std::process::ExitCode;

use clap::Parser;
use mmbench::{
    bench::{summary_table, Harness, RunReport},
    matrix::preview,
    BenchConfig, Kernel, Result, DEFAULT_BLOCK_SIZE, DEFAULT_DIM, DEFAULT_MAX_VALUE,
};

/// Benchmark naive, parallel, blocked and parallel blocked matrix multiplication.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of rows/cols of A and B
    #[arg(short = 'n', long = "dim", default_value_t = DEFAULT_DIM)]
    dim: usize,

    /// Block size for the blocked algorithms
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Maximum value for random initialization of A and B
    #[arg(short, long, default_value_t = DEFAULT_MAX_VALUE)]
    max_value: f32,

    /// Seed for the random initialization (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Timed runs per algorithm
    #[arg(short, long, default_value_t = 1)]
    repeat: usize,

    /// Worker threads for the parallel algorithms (Rayon default if omitted)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Algorithm to run, may be repeated: scalar, parallel, blocked, blocked-parallel
    #[arg(short, long = "kernel")]
    kernels: Vec<Kernel>,

    /// Check every result against the vanilla algorithm
    #[arg(long)]
    verify: bool,

    /// Print the top-left corner of A, B and C, up to MAX_LEN rows/cols
    #[arg(long, value_name = "MAX_LEN")]
    print: Option<usize>,
}

impl From<Args> for BenchConfig {
    fn from(args: Args) -> Self {
        let kernels = if args.kernels.is_empty() {
            Kernel::ALL.to_vec()
        } else {
            args.kernels
        };
        BenchConfig {
            dim: args.dim,
            block_size: args.block_size,
            max_value: args.max_value,
            seed: args.seed,
            repeat: args.repeat,
            threads: args.threads,
            kernels,
            verify: args.verify,
            print: args.print,
        }
    }
}

fn print_matrix(name: &str, data: &[f32], config: &BenchConfig, max_len: usize) {
    println!(
        "Matrix {name} ({n}x{n}, block size {bs}):\n{}",
        preview(data, config.dim, max_len, Some(config.block_size)),
        n = config.dim,
        bs = config.block_size
    );
}

/// The reference's `Took "<ms>" ms` line; with several runs the value is the
/// mean and the line says so.
fn took_line(report: &RunReport) -> String {
    let runs = report.samples_ms.len();
    let started = report.started_at.format("%Y-%m-%d %H:%M:%S%.3f");
    if runs > 1 {
        format!(
            "Took \"{:.0}\" ms (mean of {runs} runs, started {started})",
            report.mean_ms()
        )
    } else {
        format!("Took \"{:.0}\" ms (started {started})", report.mean_ms())
    }
}

fn run(config: BenchConfig) -> Result<()> {
    println!(
        "Creating matrices A and B with col/row count = {} and max init value = {}\n\
         Using block size = {} for blocked mm algorithm",
        config.dim, config.max_value, config.block_size
    );

    let mut harness = Harness::new(config)?;
    let config = harness.config().clone();

    if let Some(max_len) = config.print {
        print_matrix("A", harness.a().as_slice(), &config, max_len);
        print_matrix("B", harness.b().as_slice(), &config, max_len);
    }

    let mut reports = Vec::with_capacity(config.kernels.len());
    for &kernel in &config.kernels {
        println!("Starting calc with {}:", kernel.description());
        let report = harness.run_kernel(kernel)?;
        println!("{}", took_line(&report));
        if let Some(diff) = report.max_abs_diff {
            println!("Max abs diff vs vanilla: {diff:e}");
        }
        if let Some(max_len) = config.print {
            print_matrix("C", harness.c().as_slice(), &config, max_len);
        }
        reports.push(report);
    }

    println!("\n{}", summary_table(&reports));
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = BenchConfig::from(Args::parse());
    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("benchmark aborted: {err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
