//! Benchmark harness: builds the operands, times each kernel and collects
//! reports.

use std::time::Instant;

use chrono::{DateTime, Local};
use rand::{rngs::StdRng, SeedableRng};
use rayon::{ThreadPool, ThreadPoolBuilder};
use statrs::statistics::Statistics;

use crate::{
    config::BenchConfig,
    error::{MatmulError, Result},
    kernel::Kernel,
    matmul::multiply,
    matrix::{max_abs_diff, Matrix},
};

/// Allowed deviation from the scalar reference, relative to the largest
/// reference magnitude.
pub const VERIFY_TOLERANCE: f32 = 1e-3;

/// Timings of one kernel over `repeat` runs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Kernel that was timed.
    pub kernel: Kernel,
    /// Rows and columns of the operands.
    pub dim: usize,
    /// Wall-clock time the first run started.
    pub started_at: DateTime<Local>,
    /// Elapsed milliseconds of each run.
    pub samples_ms: Vec<f64>,
    /// Largest difference from the scalar reference, when verification ran.
    pub max_abs_diff: Option<f32>,
}

impl RunReport {
    /// Mean elapsed milliseconds over all runs.
    pub fn mean_ms(&self) -> f64 {
        self.samples_ms.iter().mean()
    }

    /// Sample standard deviation; zero for a single run.
    pub fn std_dev_ms(&self) -> f64 {
        if self.samples_ms.len() < 2 {
            return 0.0;
        }
        self.samples_ms.iter().std_dev()
    }

    /// Fastest run in milliseconds.
    pub fn min_ms(&self) -> f64 {
        Statistics::min(self.samples_ms.iter())
    }

    /// Slowest run in milliseconds.
    pub fn max_ms(&self) -> f64 {
        Statistics::max(self.samples_ms.iter())
    }

    /// Throughput of the mean run, counting `2 * n^3` floating point operations.
    pub fn gflops(&self) -> f64 {
        let n = self.dim as f64;
        let secs = self.mean_ms() / 1000.0;
        if secs > 0.0 {
            2.0 * n * n * n / secs / 1e9
        } else {
            f64::INFINITY
        }
    }
}

/// Owns A, B and C for the whole benchmark and runs kernels against them.
pub struct Harness {
    config: BenchConfig,
    a: Matrix,
    b: Matrix,
    c: Matrix,
    reference: Option<Vec<f32>>,
    pool: Option<ThreadPool>,
}

impl Harness {
    /// Validates `config`, fills A and B with random values and allocates a
    /// zeroed C.
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let n = config.dim;
        let a = Matrix::random(n, config.max_value, &mut rng)?;
        let b = Matrix::random(n, config.max_value, &mut rng)?;
        let c = Matrix::zeros(n)?;

        let pool = config
            .threads
            .map(|threads| ThreadPoolBuilder::new().num_threads(threads).build())
            .transpose()?;
        log::debug!(
            "harness ready: n={n}, block_size={}, threads={:?}",
            config.block_size,
            config.threads
        );

        Ok(Self {
            config,
            a,
            b,
            c,
            reference: None,
            pool,
        })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn a(&self) -> &Matrix {
        &self.a
    }

    pub fn b(&self) -> &Matrix {
        &self.b
    }

    /// Output of the most recent run.
    pub fn c(&self) -> &Matrix {
        &self.c
    }

    /// Runs every configured kernel in order.
    pub fn run(&mut self) -> Result<Vec<RunReport>> {
        let kernels = self.config.kernels.clone();
        kernels
            .into_iter()
            .map(|kernel| self.run_kernel(kernel))
            .collect()
    }

    /// Times `kernel` over `repeat` runs, zeroing C before each one.
    pub fn run_kernel(&mut self, kernel: Kernel) -> Result<RunReport> {
        let started_at = Local::now();
        let mut samples_ms = Vec::with_capacity(self.config.repeat);

        for run in 0..self.config.repeat {
            self.c.zero();
            let start = Instant::now();
            self.execute(kernel)?;
            let elapsed = start.elapsed().as_secs_f64() * 1000.0;
            log::debug!("{kernel} run {}/{}: {elapsed:.3} ms", run + 1, self.config.repeat);
            samples_ms.push(elapsed);
        }

        let max_abs_diff = if self.config.verify {
            Some(self.verify(kernel)?)
        } else {
            None
        };

        Ok(RunReport {
            kernel,
            dim: self.config.dim,
            started_at,
            samples_ms,
            max_abs_diff,
        })
    }

    fn execute(&mut self, kernel: Kernel) -> Result<()> {
        let n = self.config.dim;
        let block_size = self.config.block_size;
        let a = self.a.as_slice();
        let b = self.b.as_slice();
        let c = self.c.as_mut_slice();

        match &self.pool {
            Some(pool) => pool.install(|| kernel.run(a, b, c, n, block_size)),
            None => kernel.run(a, b, c, n, block_size),
        }
    }

    /// Compares C against the scalar result, computing that result on first use.
    fn verify(&mut self, kernel: Kernel) -> Result<f32> {
        if self.reference.is_none() {
            let mut reference = vec![0.0; self.a.as_slice().len()];
            multiply(
                self.a.as_slice(),
                self.b.as_slice(),
                &mut reference,
                self.config.dim,
            )?;
            self.reference = Some(reference);
        }
        let reference = self.reference.as_deref().unwrap_or_default();

        let scale = reference.iter().fold(0.0f32, |acc, x| acc.max(x.abs()));
        let tolerance = VERIFY_TOLERANCE * scale;
        let diff = max_abs_diff(self.c.as_slice(), reference);

        if diff <= tolerance {
            log::info!("{kernel} verified: max abs diff {diff} (tolerance {tolerance})");
            Ok(diff)
        } else {
            log::warn!("{kernel} failed verification: max abs diff {diff} (tolerance {tolerance})");
            Err(MatmulError::Verification {
                kernel: kernel.name(),
                max_abs_diff: diff,
                tolerance,
            })
        }
    }
}

/// Formats a table comparing the reports, with speedups relative to the first.
pub fn summary_table(reports: &[RunReport]) -> String {
    let Some(baseline) = reports.first().map(RunReport::mean_ms) else {
        return String::new();
    };

    let mut lines = vec![
        "=".repeat(97),
        format!(
            "{:<18} {:>12} {:>12} {:>12} {:>12} {:>12} {:>10}",
            "Kernel", "Mean (ms)", "Std (ms)", "Min (ms)", "Max (ms)", "GFLOPS", "Speedup"
        ),
        "-".repeat(97),
    ];
    lines.extend(reports.iter().map(|report| {
        format!(
            "{:<18} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>9.1}x",
            report.kernel.name(),
            report.mean_ms(),
            report.std_dev_ms(),
            report.min_ms(),
            report.max_ms(),
            report.gflops(),
            baseline / report.mean_ms()
        )
    }));
    lines.push("=".repeat(97));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> BenchConfig {
        BenchConfig {
            dim: 24,
            block_size: 5,
            max_value: 10.0,
            seed: Some(7),
            repeat: 2,
            threads: Some(2),
            verify: true,
            ..BenchConfig::default()
        }
    }

    fn report(kernel: Kernel, samples_ms: Vec<f64>) -> RunReport {
        RunReport {
            kernel,
            dim: 100,
            started_at: Local::now(),
            samples_ms,
            max_abs_diff: None,
        }
    }

    #[test]
    fn test_harness_runs_all_kernels() {
        let mut harness = Harness::new(small_config()).unwrap();
        let reports = harness.run().unwrap();

        assert_eq!(reports.len(), 4);
        for (report, kernel) in reports.iter().zip(Kernel::ALL) {
            assert_eq!(report.kernel, kernel);
            assert_eq!(report.samples_ms.len(), 2);
            assert!(report.samples_ms.iter().all(|&ms| ms >= 0.0));
            assert!(report.max_abs_diff.is_some());
        }
    }

    #[test]
    fn test_seed_makes_inputs_reproducible() {
        let first = Harness::new(small_config()).unwrap();
        let second = Harness::new(small_config()).unwrap();
        assert_eq!(first.a(), second.a());
        assert_eq!(first.b(), second.b());
        assert_ne!(first.a(), first.b());
    }

    #[test]
    fn test_repeated_runs_reset_c() {
        let mut harness = Harness::new(small_config()).unwrap();
        harness.run_kernel(Kernel::Blocked).unwrap();
        let once = harness.c().clone();
        harness.run_kernel(Kernel::Blocked).unwrap();
        assert_eq!(harness.c(), &once);
    }

    #[test]
    fn test_verification_rejects_wrong_result() {
        let config = BenchConfig {
            dim: 8,
            kernels: vec![Kernel::Scalar],
            ..small_config()
        };
        let mut harness = Harness::new(config).unwrap();
        let report = harness.run_kernel(Kernel::Scalar).unwrap();
        assert_eq!(report.max_abs_diff, Some(0.0));

        harness.c.as_mut_slice()[5] += 1e6;

        assert!(matches!(
            harness.verify(Kernel::Scalar),
            Err(MatmulError::Verification {
                kernel: "scalar",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = BenchConfig {
            block_size: 0,
            ..small_config()
        };
        assert!(matches!(
            Harness::new(config),
            Err(MatmulError::Config { .. })
        ));
    }

    #[test]
    fn test_report_statistics() {
        let r = report(Kernel::Scalar, vec![10.0, 20.0, 30.0]);
        assert!((r.mean_ms() - 20.0).abs() < 1e-12);
        assert!((r.std_dev_ms() - 10.0).abs() < 1e-12);
        assert_eq!(r.min_ms(), 10.0);
        assert_eq!(r.max_ms(), 30.0);
        // 2 * 100^3 flops in 20 ms
        assert!((r.gflops() - 0.1).abs() < 1e-12);

        let single = report(Kernel::Parallel, vec![5.0]);
        assert_eq!(single.std_dev_ms(), 0.0);
    }

    #[test]
    fn test_summary_table() {
        let reports = vec![
            report(Kernel::Scalar, vec![40.0]),
            report(Kernel::BlockedParallel, vec![10.0]),
        ];
        let table = summary_table(&reports);
        assert!(table.contains("scalar"));
        assert!(table.contains("blocked-parallel"));
        assert!(table.contains("4.0x"));
        assert!(table.contains("Max (ms)"));
        assert!(table.contains("40.00"));
        assert!(summary_table(&[]).is_empty());
    }
}
