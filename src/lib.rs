//! Dense square matrix multiplication kernels and the harness that benchmarks
//! them.
//!
//! Four kernels share one calling convention: two input matrices `a` and `b`,
//! an output matrix `c`, all flat row-major slices of `n * n` elements.
//!
//! | kernel | function | threads |
//! |---|---|---|
//! | naive triple loop | [`multiply`] | 1 |
//! | row-parallel | [`par_multiply`] | Rayon pool |
//! | cache-blocked | [`multiply_blocked`] | 1 |
//! | row-block-parallel | [`par_multiply_blocked`] | Rayon pool |
//!
//! The blocked kernels accumulate into `c`, so it has to be zeroed first
//! (see [`zero`]).
//!
//! ```
//! use mmbench::{multiply_blocked, par_multiply, zero};
//!
//! let a: Vec<f32> = (0..16).map(|x| x as f32).collect();
//! let mut c = vec![0.0f32; 16];
//!
//! par_multiply(&a, &a, &mut c, 4).unwrap();
//! assert_eq!(c[0], 56.0);
//!
//! zero(&mut c);
//! multiply_blocked(&a, &a, &mut c, 4, 2).unwrap();
//! assert_eq!(c[15], 506.0);
//! ```

pub mod bench;
pub mod blocked;
pub mod config;
pub mod error;
pub mod kernel;
pub mod matmul;
pub mod matrix;

pub use blocked::{multiply_blocked, par_multiply_blocked};
pub use config::BenchConfig;
pub use error::{MatmulError, Result};
pub use kernel::Kernel;
pub use matmul::{multiply, par_multiply, zero};
pub use matrix::Matrix;

/// Default number of rows and columns.
pub const DEFAULT_DIM: usize = 3000;
/// Default tile extent for the blocked kernels.
pub const DEFAULT_BLOCK_SIZE: usize = 50;
/// Default upper bound for random matrix elements.
pub const DEFAULT_MAX_VALUE: f32 = 10_000.0;
