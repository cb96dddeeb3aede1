//! Named kernel variants and dispatch.

use std::fmt;
use std::str::FromStr;

use crate::{
    blocked::{multiply_blocked, par_multiply_blocked},
    error::{config_error, MatmulError, Result},
    matmul::{multiply, par_multiply},
};

/// One of the four multiplication strategies the harness compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// Naive triple loop, single thread.
    Scalar,
    /// One task per output row on the Rayon pool.
    Parallel,
    /// Cache-blocked, single thread.
    Blocked,
    /// Cache-blocked, one task per row-block on the Rayon pool.
    BlockedParallel,
}

impl Kernel {
    /// All kernels, in the order the benchmark runs them.
    pub const ALL: [Kernel; 4] = [
        Kernel::Scalar,
        Kernel::Parallel,
        Kernel::Blocked,
        Kernel::BlockedParallel,
    ];

    /// Short name used on the command line and in reports.
    pub fn name(self) -> &'static str {
        match self {
            Kernel::Scalar => "scalar",
            Kernel::Parallel => "parallel",
            Kernel::Blocked => "blocked",
            Kernel::BlockedParallel => "blocked-parallel",
        }
    }

    /// Human readable description printed before each run.
    pub fn description(self) -> &'static str {
        match self {
            Kernel::Scalar => "vanilla algorithm",
            Kernel::Parallel => "parallel vanilla algorithm",
            Kernel::Blocked => "blocked algorithm",
            Kernel::BlockedParallel => "parallel blocked algorithm",
        }
    }

    /// Runs this kernel on `n x n` operands. `block_size` is ignored by the
    /// non-blocked variants.
    pub fn run(
        self,
        a: &[f32],
        b: &[f32],
        c: &mut [f32],
        n: usize,
        block_size: usize,
    ) -> Result<()> {
        log::debug!(
            "running {} kernel (n={n}, block_size={block_size})",
            self.name()
        );
        match self {
            Kernel::Scalar => multiply(a, b, c, n),
            Kernel::Parallel => par_multiply(a, b, c, n),
            Kernel::Blocked => multiply_blocked(a, b, c, n, block_size),
            Kernel::BlockedParallel => par_multiply_blocked(a, b, c, n, block_size),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kernel {
    type Err = MatmulError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Kernel::ALL
            .into_iter()
            .find(|kernel| kernel.name() == wanted)
            .ok_or_else(|| {
                config_error(format!(
                    "unknown kernel {s:?}, expected one of: scalar, parallel, blocked, blocked-parallel"
                ))
            })
    }
}
