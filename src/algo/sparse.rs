//! Compressed sparse row matrices and a conjugate gradient solver.
//!
//! Laplacians leave [`LaplacianBuilder`](super::laplacian::LaplacianBuilder) as coordinate
//! triples; this module turns them into CSR form for the contraction solve.

use nalgebra::DVector;

use super::laplacian::Triple;
use crate::error::{Error, Result};

/// Compressed Sparse Row (CSR) matrix.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// `row_ptr[i]..row_ptr[i + 1]` indexes the entries of row `i`.
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate entries at the same (row, col) are summed. Entries outside the matrix
    /// dimensions are rejected.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        mut triplets: Vec<(usize, usize, f64)>,
    ) -> Result<Self> {
        if let Some(&(r, c, _)) = triplets.iter().find(|&&(r, c, _)| r >= rows || c >= cols) {
            return Err(Error::invalid_param(
                "triplet",
                format!("({r}, {c})"),
                "index outside matrix dimensions",
            ));
        }

        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            match (last, values.last_mut()) {
                (Some(key), Some(acc)) if key == (row, col) => *acc += val,
                _ => {
                    col_idx.push(col);
                    values.push(val);
                    row_ptr[row + 1] += 1;
                    last = Some((row, col));
                }
            }
        }

        // Counts to offsets
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Ok(Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Square `n x n` matrix from Laplacian triples.
    pub fn from_triples(n: usize, triples: &[Triple]) -> Result<Self> {
        let triplets = triples.iter().map(|t| (t.row, t.col, t.value)).collect();
        Self::from_triplets(n, n, triplets)
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries after merging duplicates.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate the `(col, value)` entries of one row.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Value at `(i, j)`, zero if not stored.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.row(i).find(|&(c, _)| c == j).map_or(0.0, |(_, v)| v)
    }

    /// Multiply matrix by vector: `y = A * x`.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        debug_assert_eq!(x.len(), self.cols, "vector dimension mismatch");
        DVector::from_iterator(
            self.rows,
            (0..self.rows).map(|i| self.row(i).map(|(c, v)| v * x[c]).sum::<f64>()),
        )
    }

    /// Assemble `a * AᵀA + b * I`, the normal-equation matrix of the stacked system
    /// `[sqrt(a) A; sqrt(b) I]`.
    ///
    /// Each row `k` of `A` contributes `A[k,i] * A[k,j]` for every pair of its entries.
    pub fn normal_matrix(&self, a: f64, b: f64) -> Result<Self> {
        let mut triplets = Vec::with_capacity(self.nnz() * 8 + self.cols);
        for k in 0..self.rows {
            for (i, vi) in self.row(k) {
                for (j, vj) in self.row(k) {
                    triplets.push((i, j, a * vi * vj));
                }
            }
        }
        triplets.extend((0..self.cols).map(|i| (i, i, b)));
        Self::from_triplets(self.cols, self.cols, triplets)
    }
}

/// Solve `A x = b` with the conjugate gradient method.
///
/// `A` must be symmetric positive definite. Convergence is measured by the relative residual
/// norm; running out of iterations is an [`Error::ConvergenceFailed`].
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    x0: Option<&DVector<f64>>,
    max_iter: usize,
    tolerance: f64,
) -> Result<DVector<f64>> {
    let n = b.len();
    if a.nrows() != n || a.ncols() != n {
        return Err(Error::invalid_param(
            "matrix",
            format!("{}x{}", a.nrows(), a.ncols()),
            "must be square and match the right-hand side",
        ));
    }

    let mut x = match x0 {
        Some(x0) => x0.clone(),
        None => DVector::zeros(n),
    };

    let b_norm = b.norm();
    if b_norm < 1e-15 {
        return Ok(DVector::zeros(n));
    }

    let mut r = b - a.mul_vec(&x);
    let mut r_norm_sq = r.dot(&r);
    if r_norm_sq.sqrt() / b_norm < tolerance {
        return Ok(x);
    }

    let mut p = r.clone();

    for _ in 0..max_iter {
        let ap = a.mul_vec(&p);

        let p_ap = p.dot(&ap);
        if p_ap.abs() < 1e-300 {
            break;
        }
        let alpha = r_norm_sq / p_ap;

        x += alpha * &p;
        r -= alpha * &ap;

        let new_r_norm_sq = r.dot(&r);
        if new_r_norm_sq.sqrt() / b_norm < tolerance {
            return Ok(x);
        }

        let beta = new_r_norm_sq / r_norm_sq;
        p = &r + beta * &p;
        r_norm_sq = new_r_norm_sq;
    }

    Err(Error::ConvergenceFailed {
        iterations: max_iter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spd_2x2() -> CsrMatrix {
        // [ 4  1 ]
        // [ 1  3 ]
        CsrMatrix::from_triplets(2, 2, vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)])
            .unwrap()
    }

    #[test]
    fn test_csr_from_triplets() {
        let a = spd_2x2();
        assert_eq!(a.nrows(), 2);
        assert_eq!(a.ncols(), 2);
        assert_eq!(a.nnz(), 4);
        assert_eq!(a.get(1, 0), 1.0);
    }

    #[test]
    fn test_duplicates_are_summed() {
        let a = CsrMatrix::from_triplets(
            2,
            2,
            vec![(0, 0, 2.0), (1, 1, 3.0), (0, 0, 2.0), (0, 1, 1.0)],
        )
        .unwrap();
        assert_eq!(a.nnz(), 3);
        assert_eq!(a.get(0, 0), 4.0);
        assert_eq!(a.get(1, 0), 0.0);
    }

    #[test]
    fn test_empty_rows() {
        let a = CsrMatrix::from_triplets(4, 4, vec![(2, 1, 5.0)]).unwrap();
        let y = a.mul_vec(&DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]));
        assert_eq!(y.as_slice(), &[0.0, 0.0, 10.0, 0.0]);
    }

    #[test]
    fn test_out_of_range_triplet() {
        let result = CsrMatrix::from_triplets(2, 2, vec![(2, 0, 1.0)]);
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_csr_mul_vec() {
        let y = spd_2x2().mul_vec(&DVector::from_vec(vec![1.0, 1.0]));
        assert_relative_eq!(y[0], 5.0);
        assert_relative_eq!(y[1], 4.0);
    }

    #[test]
    fn test_normal_matrix() {
        // A = [1 2; 0 3] -> AᵀA = [1 2; 2 13]
        let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0)])
            .unwrap();
        let n = a.normal_matrix(2.0, 0.5).unwrap();
        assert_relative_eq!(n.get(0, 0), 2.5);
        assert_relative_eq!(n.get(0, 1), 4.0);
        assert_relative_eq!(n.get(1, 0), 4.0);
        assert_relative_eq!(n.get(1, 1), 26.5);
    }

    #[test]
    fn test_cg_simple() {
        // Solution: x = 1/11, y = 7/11
        let a = spd_2x2();
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let x = conjugate_gradient(&a, &b, None, 100, 1e-10).unwrap();

        assert_relative_eq!(x[0], 1.0 / 11.0, epsilon = 1e-8);
        assert_relative_eq!(x[1], 7.0 / 11.0, epsilon = 1e-8);
    }

    #[test]
    fn test_cg_with_initial_guess() {
        let a = spd_2x2();
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let x0 = DVector::from_vec(vec![0.1, 0.6]);
        let x = conjugate_gradient(&a, &b, Some(&x0), 100, 1e-10).unwrap();
        assert!((a.mul_vec(&x) - b).norm() < 1e-8);
    }

    #[test]
    fn test_cg_iteration_limit() {
        let a = CsrMatrix::from_triplets(
            3,
            3,
            vec![(0, 0, 10.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 5.0), (2, 2, 1.0)],
        )
        .unwrap();
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let result = conjugate_gradient(&a, &b, None, 1, 1e-12);
        assert!(matches!(result, Err(Error::ConvergenceFailed { iterations: 1 })));
    }
}
