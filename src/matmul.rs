use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::error::{dimension_error, length_error, Result};

/// Checks that `n` is usable and that every operand holds exactly `n * n`
/// elements. Returns `n * n` on success.
///
/// All kernels call this before reading or writing anything, so a malformed
/// call fails with an error instead of an out-of-bounds access.
pub(crate) fn check_operands(a: &[f32], b: &[f32], c: &[f32], n: usize) -> Result<usize> {
    if n == 0 {
        return Err(dimension_error(n, "dimension must be positive"));
    }
    let len = n
        .checked_mul(n)
        .ok_or_else(|| dimension_error(n, "n * n overflows usize"))?;

    for (operand, actual) in [("A", a.len()), ("B", b.len()), ("C", c.len())] {
        if actual != len {
            return Err(length_error(operand, len, actual));
        }
    }
    Ok(len)
}

/// Sets every element of `c` to zero.
///
/// The blocked kernels accumulate into `C`, so the driver calls this between
/// runs that reuse the same output buffer.
pub fn zero(c: &mut [f32]) {
    c.fill(0.0);
}

/// Computes row `i` of `C = A * B` into `c_row` (the `n` elements of that row).
///
/// One accumulator per output element, `k` innermost.
#[inline(always)]
fn row_kernel(a: &[f32], b: &[f32], c_row: &mut [f32], n: usize, i: usize) {
    let a_row = &a[i * n..(i + 1) * n];
    for (j, c_ij) in c_row.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        for (k, &a_ik) in a_row.iter().enumerate() {
            acc += a_ik * b[k * n + j];
        }
        *c_ij = acc;
    }
}

/// Naive triple-loop multiplication `C = A * B` on a single thread.
///
/// All matrices are `n x n`, row-major, element `(r, c)` at index `r * n + c`.
/// Loop order is `i`, `j`, `k` with a fresh accumulator per `(i, j)`, so the
/// prior content of `c` is overwritten.
///
/// # Arguments
///
/// * `a` - Slice containing matrix A (`n * n` elements).
/// * `b` - Slice containing matrix B (`n * n` elements).
/// * `c` - Mutable slice for matrix C (`n * n` elements), receives the result.
/// * `n` - Number of rows and columns of every matrix.
///
/// # Errors
///
/// Returns [`crate::MatmulError::InvalidDimension`] when `n == 0` and
/// [`crate::MatmulError::LengthMismatch`] when an operand is not `n * n` long.
pub fn multiply(a: &[f32], b: &[f32], c: &mut [f32], n: usize) -> Result<()> {
    check_operands(a, b, c, n)?;

    c.chunks_mut(n)
        .enumerate()
        .for_each(|(i, c_row)| row_kernel(a, b, c_row, n, i));
    Ok(())
}

/// Performs `C = A * B` in parallel using Rayon, one task per output row.
///
/// Parallelism strategy:
/// - `c` is split into its `n` rows with `par_chunks_mut`, so every task owns
///   exactly one row of C and no two tasks can write the same element.
/// - Each task runs the same `j`/`k` loops as [`multiply`]; the result is
///   bit-for-bit identical to the scalar kernel.
/// - Rows are scheduled on the current Rayon pool, which batches them onto
///   its worker threads instead of spawning one thread per row.
///
/// The call returns only after every row has been written.
pub fn par_multiply(a: &[f32], b: &[f32], c: &mut [f32], n: usize) -> Result<()> {
    check_operands(a, b, c, n)?;
    log::debug!(
        "par_multiply: {n} row tasks on {} threads",
        rayon::current_num_threads()
    );

    c.par_chunks_mut(n)
        .enumerate()
        .for_each(|(i, c_row)| row_kernel(a, b, c_row, n, i));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatmulError;

    fn sequence(n: usize) -> Vec<f32> {
        (0..n * n).map(|x| x as f32).collect()
    }

    const EXPECTED_4X4: [f32; 16] = [
        56.0, 62.0, 68.0, 74.0, 152.0, 174.0, 196.0, 218.0, 248.0, 286.0, 324.0, 362.0, 344.0,
        398.0, 452.0, 506.0,
    ];

    #[test]
    fn test_zero() {
        let mut c = sequence(4);
        c[3] = f32::NAN;
        c[7] = -1.5;

        zero(&mut c);

        assert!(c.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_multiply_4x4() {
        let a = sequence(4);
        let mut c = vec![0.0; 16];

        multiply(&a, &a, &mut c, 4).unwrap();

        assert_eq!(c, EXPECTED_4X4);
    }

    #[test]
    fn test_par_multiply_4x4() {
        let a = sequence(4);
        let mut c = vec![0.0; 16];

        par_multiply(&a, &a, &mut c, 4).unwrap();

        assert_eq!(c, EXPECTED_4X4);
    }

    #[test]
    fn test_one_by_one() {
        let mut c = vec![0.0];
        multiply(&[5.0], &[3.0], &mut c, 1).unwrap();
        assert_eq!(c, [15.0]);

        let mut c = vec![0.0];
        par_multiply(&[5.0], &[3.0], &mut c, 1).unwrap();
        assert_eq!(c, [15.0]);
    }

    #[test]
    fn test_multiply_overwrites_prior_content() {
        let a = sequence(4);
        let mut c = vec![123.0; 16];

        multiply(&a, &a, &mut c, 4).unwrap();

        assert_eq!(c, EXPECTED_4X4);
    }

    #[test]
    fn test_identity_multiplication() {
        let n = 5;
        let mut identity = vec![0.0; n * n];
        for i in 0..n {
            identity[i * n + i] = 1.0;
        }
        let b = sequence(n);
        let mut c = vec![0.0; n * n];

        multiply(&identity, &b, &mut c, n).unwrap();
        assert_eq!(c, b);

        zero(&mut c);
        par_multiply(&b, &identity, &mut c, n).unwrap();
        assert_eq!(c, b);
    }

    #[test]
    fn test_check_operands() {
        let a = vec![0.0; 9];
        assert_eq!(check_operands(&a, &a, &a, 3), Ok(9));

        assert!(matches!(
            check_operands(&a, &a, &a, 0),
            Err(MatmulError::InvalidDimension { dim: 0, .. })
        ));
        assert_eq!(
            check_operands(&a, &a[..8], &a, 3),
            Err(length_error("B", 9, 8))
        );
        assert_eq!(
            check_operands(&a, &a, &[0.0; 16], 3),
            Err(length_error("C", 9, 16))
        );
        assert!(matches!(
            check_operands(&a, &a, &a, usize::MAX),
            Err(MatmulError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_rejected_call_leaves_c_untouched() {
        let a = sequence(3);
        let mut c = vec![7.0; 8];

        assert!(multiply(&a, &a, &mut c, 3).is_err());
        assert!(par_multiply(&a, &a, &mut c, 3).is_err());
        assert!(c.iter().all(|&x| x == 7.0));
    }
}
