//! Cache-blocked multiplication kernels.
//!
//! The `i`, `j` and `k` index ranges are cut into tiles of `block_size`
//! elements so that the inner loops only touch about `3 * block_size^2`
//! values of A, B and C at a time. Tiles start at multiples of `block_size`
//! and the last tile in each direction is clipped to `n`.
//!
//! Both kernels here accumulate into C (`acc` starts from the current value of
//! `C[i * n + j]`), so C must be zeroed before the call.

use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};
use std::cmp::min;

use crate::{
    error::{MatmulError, Result},
    matmul::check_operands,
};

/// Validates the operands and returns the effective tile extent.
///
/// A block size larger than `n` behaves exactly like `n` (a single tile), so it
/// is clamped here; this also keeps `n * block_size` from overflowing.
fn check_blocked(a: &[f32], b: &[f32], c: &[f32], n: usize, block_size: usize) -> Result<usize> {
    check_operands(a, b, c, n)?;
    if block_size == 0 {
        return Err(MatmulError::InvalidBlockSize { block_size });
    }
    Ok(min(block_size, n))
}

/// Runs the `j`-tile / `k`-tile loops for one row-block of C.
///
/// `c_block` holds rows `i0..min(i0 + bs, n)` of C, i.e. the rows of a single
/// `i`-tile; local row `r` of the block is global row `i0 + r`.
#[inline(always)]
fn block_row_kernel(a: &[f32], b: &[f32], c_block: &mut [f32], n: usize, bs: usize, i0: usize) {
    let i_end = i0 + c_block.len() / n;

    for j0 in (0..n).step_by(bs) {
        let j_end = min(j0 + bs, n);
        for k0 in (0..n).step_by(bs) {
            let k_end = min(k0 + bs, n);
            for i in i0..i_end {
                let c_row = &mut c_block[(i - i0) * n..(i - i0 + 1) * n];
                let a_row = &a[i * n..(i + 1) * n];
                for j in j0..j_end {
                    let mut acc = c_row[j];
                    for k in k0..k_end {
                        acc += a_row[k] * b[k * n + j];
                    }
                    c_row[j] = acc;
                }
            }
        }
    }
}

/// Cache-blocked multiplication `C += A * B` on a single thread.
///
/// Tile loops nest as `i`-tile, `j`-tile, `k`-tile, then `i`, `j`, `k` inside
/// the tile. Summed over all `k`-tiles each element receives the same
/// products as in [`crate::multiply`], but partial sums are formed in a
/// different order, so for large `n` the last bits may differ. For small
/// integer-valued inputs both kernels agree exactly.
///
/// # Arguments
///
/// * `a` - Slice containing matrix A (`n * n` elements, row-major).
/// * `b` - Slice containing matrix B (`n * n` elements, row-major).
/// * `c` - Mutable slice for matrix C (`n * n` elements), must be zeroed.
/// * `n` - Number of rows and columns of every matrix.
/// * `block_size` - Tile extent; need not divide `n`.
///
/// # Errors
///
/// Fails like [`crate::multiply`] on bad operands, and with
/// [`MatmulError::InvalidBlockSize`] when `block_size == 0`.
pub fn multiply_blocked(
    a: &[f32],
    b: &[f32],
    c: &mut [f32],
    n: usize,
    block_size: usize,
) -> Result<()> {
    let bs = check_blocked(a, b, c, n, block_size)?;

    c.chunks_mut(n * bs)
        .enumerate()
        .for_each(|(t, c_block)| block_row_kernel(a, b, c_block, n, bs, t * bs));
    Ok(())
}

/// Performs cache-blocked `C += A * B` in parallel using Rayon.
///
/// Parallelism strategy:
/// - The outermost loop over `i`-tiles is parallelized. `c` is split with
///   `par_chunks_mut(n * block_size)`, so each task owns the rows of exactly
///   one `i`-tile (the last one may be shorter).
/// - The `j`-tile and `k`-tile loops are serial within each task, so no
///   synchronization is needed on C.
///
/// Every element goes through the same summation order as in
/// [`multiply_blocked`], so both produce identical results. C must be zeroed
/// before the call, and the call returns only after every row-block is done.
pub fn par_multiply_blocked(
    a: &[f32],
    b: &[f32],
    c: &mut [f32],
    n: usize,
    block_size: usize,
) -> Result<()> {
    let bs = check_blocked(a, b, c, n, block_size)?;
    log::debug!(
        "par_multiply_blocked: {} row-block tasks of {bs} rows on {} threads",
        n.div_ceil(bs),
        rayon::current_num_threads()
    );

    c.par_chunks_mut(n * bs)
        .enumerate()
        .for_each(|(t, c_block)| block_row_kernel(a, b, c_block, n, bs, t * bs));
    Ok(())
}
