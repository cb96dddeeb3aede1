//! Owned square matrices and small helpers around them.

use rand::Rng;

use crate::error::{dimension_error, Result};

/// A dense `n x n` matrix of `f32` stored row-major: element `(r, c)` lives at
/// index `r * n + c`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    n: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Creates an `n x n` matrix filled with zeros.
    pub fn zeros(n: usize) -> Result<Self> {
        let len = checked_len(n)?;
        Ok(Self {
            n,
            data: vec![0.0; len],
        })
    }

    /// Creates an `n x n` matrix with every element drawn uniformly from
    /// `[0, max_value)`.
    pub fn random<R: Rng + ?Sized>(n: usize, max_value: f32, rng: &mut R) -> Result<Self> {
        let len = checked_len(n)?;
        let data = (0..len).map(|_| rng.random::<f32>() * max_value).collect();
        Ok(Self { n, data })
    }

    /// Number of rows (and columns).
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Row-major elements.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable row-major elements, as passed to the kernels as C.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Resets every element to zero.
    pub fn zero(&mut self) {
        crate::matmul::zero(&mut self.data);
    }
}

fn checked_len(n: usize) -> Result<usize> {
    if n == 0 {
        return Err(dimension_error(n, "dimension must be positive"));
    }
    n.checked_mul(n)
        .ok_or_else(|| dimension_error(n, "n * n overflows usize"))
}

/// Largest element-wise absolute difference between two equally long slices.
///
/// NaN in either input yields NaN.
pub fn max_abs_diff(x: &[f32], y: &[f32]) -> f32 {
    debug_assert_eq!(x.len(), y.len());
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, |acc, d| if d.is_nan() || acc.is_nan() { f32::NAN } else { acc.max(d) })
}

/// Renders the top-left `max_len x max_len` corner of an `n x n` row-major
/// matrix with one decimal place per element.
///
/// With `block_size`, tile boundaries are drawn: `|` between column tiles and
/// a dashed line between row tiles.
pub fn preview(data: &[f32], n: usize, max_len: usize, block_size: Option<usize>) -> String {
    let rows = n.min(max_len).min(data.len() / n.max(1));
    let cols = n.min(max_len);
    let split = block_size.filter(|&bs| bs > 0);
    let mut out = String::new();

    for i in 0..rows {
        if let Some(bs) = split {
            if i != 0 && i % bs == 0 {
                for j in 0..cols {
                    if j != 0 && j % bs == 0 {
                        out.push_str("- ");
                    }
                    out.push_str("--- ");
                }
                out.push('\n');
            }
        }
        for j in 0..cols {
            if let Some(bs) = split {
                if j != 0 && j % bs == 0 {
                    out.push_str("| ");
                }
            }
            out.push_str(&format!("{:.1} ", data[i * n + j]));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatmulError;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_zeros() {
        let m = Matrix::zeros(3).unwrap();
        assert_eq!(m.dim(), 3);
        assert_eq!(m.as_slice(), [0.0; 9]);
    }

    #[test]
    fn test_rejects_bad_dimension() {
        assert!(matches!(
            Matrix::zeros(0),
            Err(MatmulError::InvalidDimension { dim: 0, .. })
        ));
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            Matrix::random(usize::MAX, 1.0, &mut rng),
            Err(MatmulError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_random_range_and_seed() {
        let mut rng = StdRng::seed_from_u64(42);
        let m = Matrix::random(16, 10_000.0, &mut rng).unwrap();
        assert!(m.as_slice().iter().all(|&x| (0.0..10_000.0).contains(&x)));

        let mut rng = StdRng::seed_from_u64(42);
        let again = Matrix::random(16, 10_000.0, &mut rng).unwrap();
        assert_eq!(m, again);
    }

    #[test]
    fn test_matrix_zero() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut m = Matrix::random(4, 100.0, &mut rng).unwrap();
        m.as_mut_slice()[0] = f32::INFINITY;
        m.zero();
        assert!(m.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_max_abs_diff() {
        assert_eq!(max_abs_diff(&[1.0, 2.0, 3.0], &[1.0, 2.5, 2.0]), 1.0);
        assert_eq!(max_abs_diff(&[], &[]), 0.0);
        assert!(max_abs_diff(&[f32::NAN, 0.0], &[0.0, 0.0]).is_nan());
    }

    #[test]
    fn test_preview_plain() {
        let data: Vec<f32> = (0..9).map(|x| x as f32).collect();
        assert_eq!(preview(&data, 3, 2, None), "0.0 1.0 \n3.0 4.0 \n");
    }

    #[test]
    fn test_preview_with_tiles() {
        let data: Vec<f32> = (0..16).map(|x| x as f32).collect();
        let expected = "0.0 1.0 | 2.0 \n\
                        4.0 5.0 | 6.0 \n\
                        --- --- - --- \n\
                        8.0 9.0 | 10.0 \n";
        assert_eq!(preview(&data, 4, 3, Some(2)), expected);
    }
}
