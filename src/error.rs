//! Error types for mmbench operations.
//!
//! Every kernel checks its operands before touching memory and reports a
//! violated precondition through [`MatmulError`] instead of indexing out of
//! bounds.

use thiserror::Error;

/// Errors that can occur while configuring or running a multiplication.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatmulError {
    /// The matrix dimension is zero or `n * n` does not fit in `usize`.
    #[error("invalid dimension {dim}: {message}")]
    InvalidDimension {
        /// The dimension that was rejected.
        dim: usize,
        /// Human-readable error message.
        message: String,
    },
    /// An operand does not hold exactly `n * n` elements.
    #[error("matrix {operand}: expected {expected} elements, got {actual}")]
    LengthMismatch {
        /// Which operand was wrong (`"A"`, `"B"` or `"C"`).
        operand: &'static str,
        /// Required length, `n * n`.
        expected: usize,
        /// Length that was passed in.
        actual: usize,
    },
    /// Blocked kernels need a tile extent of at least one.
    #[error("invalid block size {block_size}: must be at least 1")]
    InvalidBlockSize {
        /// The block size that was rejected.
        block_size: usize,
    },
    /// Benchmark configuration was rejected.
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message.
        message: String,
    },
    /// A kernel's output disagreed with the scalar reference.
    #[error("kernel {kernel} diverged from the scalar reference: max abs diff {max_abs_diff} exceeds {tolerance}")]
    Verification {
        /// Name of the kernel that failed.
        kernel: &'static str,
        /// Largest element-wise difference observed.
        max_abs_diff: f32,
        /// Allowed difference.
        tolerance: f32,
    },
    /// The dedicated worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl From<rayon::ThreadPoolBuildError> for MatmulError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        MatmulError::ThreadPool(err.to_string())
    }
}

/// Result type alias for mmbench operations.
pub type Result<T> = std::result::Result<T, MatmulError>;

/// Creates an invalid dimension error.
pub fn dimension_error(dim: usize, message: impl Into<String>) -> MatmulError {
    MatmulError::InvalidDimension {
        dim,
        message: message.into(),
    }
}

/// Creates a length mismatch error for one operand.
pub fn length_error(operand: &'static str, expected: usize, actual: usize) -> MatmulError {
    MatmulError::LengthMismatch {
        operand,
        expected,
        actual,
    }
}

/// Creates a configuration error.
pub fn config_error(message: impl Into<String>) -> MatmulError {
    MatmulError::Config {
        message: message.into(),
    }
}
