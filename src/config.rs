//! Benchmark configuration.

use crate::{
    error::{config_error, Result},
    kernel::Kernel,
    DEFAULT_BLOCK_SIZE, DEFAULT_DIM, DEFAULT_MAX_VALUE,
};

/// Everything a benchmark run needs, built once by the driver and passed by
/// reference.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Rows and columns of A, B and C.
    pub dim: usize,
    /// Tile extent for the blocked kernels.
    pub block_size: usize,
    /// Random elements are drawn from `[0, max_value)`.
    pub max_value: f32,
    /// Fixed RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Timed runs per kernel.
    pub repeat: usize,
    /// Size of a dedicated worker pool; `None` uses the global Rayon pool.
    pub threads: Option<usize>,
    /// Kernels to run, in order.
    pub kernels: Vec<Kernel>,
    /// Compare every kernel's output against the scalar kernel.
    pub verify: bool,
    /// Print the top-left corner of A, B and C up to this many rows/cols.
    pub print: Option<usize>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            dim: DEFAULT_DIM,
            block_size: DEFAULT_BLOCK_SIZE,
            max_value: DEFAULT_MAX_VALUE,
            seed: None,
            repeat: 1,
            threads: None,
            kernels: Kernel::ALL.to_vec(),
            verify: false,
            print: None,
        }
    }
}

impl BenchConfig {
    /// Rejects values no kernel can run with.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(config_error("matrix dimension must be at least 1"));
        }
        if self.dim.checked_mul(self.dim).is_none() {
            return Err(config_error(format!(
                "matrix dimension {} is too large",
                self.dim
            )));
        }
        if self.block_size == 0 {
            return Err(config_error("block size must be at least 1"));
        }
        if !self.max_value.is_finite() || self.max_value <= 0.0 {
            return Err(config_error(format!(
                "max value must be a positive finite number, got {}",
                self.max_value
            )));
        }
        if self.repeat == 0 {
            return Err(config_error("repeat must be at least 1"));
        }
        if self.threads == Some(0) {
            return Err(config_error("thread count must be at least 1"));
        }
        if self.kernels.is_empty() {
            return Err(config_error("no kernel selected"));
        }
        Ok(())
    }
}
