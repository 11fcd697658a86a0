use alloc::vec;
use alloc::vec::Vec;

use crate::dynmatrix::DynMatrix;
use crate::linalg::LinalgError;
use crate::traits::{LinalgScalar, MatrixMut, MatrixRef};

/// Perform LU decomposition with partial pivoting, in place.
///
/// On return, `a` contains both L and U packed together:
/// - Upper triangle (including diagonal): U
/// - Lower triangle (excluding diagonal): L (diagonal of L is implicitly 1)
///
/// `perm` is filled with the row permutation indices.
/// Returns `true` if the number of row swaps was even.
///
/// Only an exactly zero pivot is reported as [`LinalgError::Singular`]:
/// kernel matrices in Monte Carlo runs are routinely tiny in magnitude, and
/// deciding what counts as "numerically zero" is left to the caller.
pub fn lu_in_place<T: LinalgScalar>(
    a: &mut impl MatrixMut<T>,
    perm: &mut [usize],
) -> Result<bool, LinalgError> {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "LU decomposition requires a square matrix");
    assert_eq!(n, perm.len(), "permutation slice length must match matrix size");

    for (i, p) in perm.iter_mut().enumerate() {
        *p = i;
    }

    let mut even = true;

    for col in 0..n {
        // Partial pivoting: find row with largest modulus in this column
        let mut max_row = col;
        let mut max_val = a.get(col, col).modulus();
        for row in (col + 1)..n {
            let val = a.get(row, col).modulus();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }

        if !max_val.is_finite_value() {
            return Err(LinalgError::NotFinite);
        }
        if max_val == <T::Real as num_traits::Zero>::zero() {
            return Err(LinalgError::Singular);
        }

        if max_row != col {
            perm.swap(col, max_row);
            for j in 0..n {
                let tmp = *a.get(col, j);
                *a.get_mut(col, j) = *a.get(max_row, j);
                *a.get_mut(max_row, j) = tmp;
            }
            even = !even;
        }

        // Column-major elimination:
        // 1. Scale sub-column by 1/pivot (contiguous in col-major)
        // 2. For each column j > col, a[col+1:n, j] -= a[col, j] * a[col+1:n, col]
        let inv_pivot = T::one() / *a.get(col, col);
        for x in a.col_as_mut_slice(col, col + 1).iter_mut() {
            *x = *x * inv_pivot;
        }

        for j in (col + 1)..n {
            let a_col_j = *a.get(col, j);
            if a_col_j == T::zero() {
                continue;
            }
            for i in (col + 1)..n {
                let l = *a.get(i, col);
                let v = a.get_mut(i, j);
                *v = *v - a_col_j * l;
            }
        }
    }

    Ok(even)
}

/// Solve Ax = b given the packed LU decomposition and permutation.
///
/// `lu` is the packed L/U matrix from `lu_in_place`.
/// `perm` is the row permutation from `lu_in_place`.
/// `b` (input) and `x` (output) are separate slices of length n.
pub fn lu_solve<T: LinalgScalar>(lu: &impl MatrixRef<T>, perm: &[usize], b: &[T], x: &mut [T]) {
    let n = lu.nrows();

    // Apply permutation and forward substitution (solve Ly = Pb)
    for i in 0..n {
        let mut sum = b[perm[i]];
        for j in 0..i {
            sum = sum - *lu.get(i, j) * x[j];
        }
        x[i] = sum;
    }

    // Back substitution (solve Ux = y)
    for i in (0..n).rev() {
        let mut sum = x[i];
        for j in (i + 1)..n {
            sum = sum - *lu.get(i, j) * x[j];
        }
        x[i] = sum / *lu.get(i, i);
    }
}

/// LU decomposition of a dynamically-sized square matrix.
///
/// Stores the packed L/U factors and permutation vector.
///
/// # Example
///
/// ```
/// use detflow::DynMatrix;
/// use detflow::linalg::DynLu;
///
/// let a = DynMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 5.0, 3.0]);
/// let lu = DynLu::new(&a).unwrap();
///
/// assert!((lu.det() - 1.0).abs() < 1e-12);
///
/// let inv = lu.inverse();
/// assert!((inv[(0, 0)] - 3.0).abs() < 1e-12);
/// assert!((inv[(0, 1)] + 1.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct DynLu<T> {
    lu: DynMatrix<T>,
    perm: Vec<usize>,
    even: bool,
}

impl<T: LinalgScalar> DynLu<T> {
    /// Decompose a matrix. Returns an error if the matrix is singular.
    pub fn new(a: &DynMatrix<T>) -> Result<Self, LinalgError> {
        assert!(a.is_square(), "LU decomposition requires a square matrix");
        let mut lu = a.clone();
        let mut perm = vec![0usize; a.nrows()];
        let even = lu_in_place(&mut lu, &mut perm)?;
        Ok(Self { lu, perm, even })
    }

    /// Compute the matrix inverse.
    pub fn inverse(&self) -> DynMatrix<T> {
        let n = self.lu.nrows();
        let mut inv = DynMatrix::zeros(n, n, T::zero());
        let mut e = vec![T::zero(); n];

        for col in 0..n {
            if col > 0 {
                e[col - 1] = T::zero();
            }
            e[col] = T::one();
            lu_solve(&self.lu, &self.perm, &e, inv.col_as_mut_slice(col, 0));
        }

        inv
    }

    /// Compute the determinant.
    pub fn det(&self) -> T {
        let mut d = if self.even { T::one() } else { T::zero() - T::one() };
        for i in 0..self.lu.nrows() {
            d = d * self.lu[(i, i)];
        }
        d
    }
}

/// Closed-form determinant for 0×0 through 3×3 matrices.
///
/// Returns `None` for larger sizes. The 3×3 case is the rule of Sarrus.
pub fn det_small<T: LinalgScalar>(m: &DynMatrix<T>) -> Option<T> {
    assert!(m.is_square(), "determinant requires a square matrix");
    match m.nrows() {
        0 => Some(T::one()),
        1 => Some(m[(0, 0)]),
        2 => Some(m[(0, 0)] * m[(1, 1)] - m[(1, 0)] * m[(0, 1)]),
        3 => Some(
            m[(0, 0)] * m[(1, 1)] * m[(2, 2)]
                + m[(0, 1)] * m[(1, 2)] * m[(2, 0)]
                + m[(0, 2)] * m[(1, 0)] * m[(2, 1)]
                - m[(2, 0)] * m[(1, 1)] * m[(0, 2)]
                - m[(2, 1)] * m[(1, 2)] * m[(0, 0)]
                - m[(2, 2)] * m[(1, 0)] * m[(0, 1)],
        ),
        _ => None,
    }
}

/// Determinant: closed form up to 3×3, LU otherwise.
///
/// An exactly singular matrix has determinant zero; NaN entries propagate
/// as NaN.
///
/// ```
/// use detflow::DynMatrix;
/// use detflow::linalg::determinant;
///
/// let m = DynMatrix::from_rows(3, 3, &[6.0_f64, 1.0, 1.0, 4.0, -2.0, 5.0, 2.0, 8.0, 7.0]);
/// assert!((determinant(&m) - (-306.0)).abs() < 1e-10);
/// ```
pub fn determinant<T: LinalgScalar>(m: &DynMatrix<T>) -> T {
    if let Some(d) = det_small(m) {
        return d;
    }
    match DynLu::new(m) {
        Ok(lu) => lu.det(),
        Err(LinalgError::Singular) => T::zero(),
        Err(LinalgError::NotFinite) => {
            let nan = <T::Real as num_traits::Float>::nan();
            T::from_real(nan)
        }
    }
}

/// Inverse via LU decomposition.
pub fn inverse<T: LinalgScalar>(m: &DynMatrix<T>) -> Result<DynMatrix<T>, LinalgError> {
    Ok(DynLu::new(m)?.inverse())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_identity(m: &DynMatrix<f64>, tol: f64) {
        for i in 0..m.nrows() {
            for j in 0..m.ncols() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (m[(i, j)] - expected).abs() < tol,
                    "id[({},{})] = {}, expected {}",
                    i,
                    j,
                    m[(i, j)],
                    expected
                );
            }
        }
    }

    #[test]
    fn lu_solve_3x3() {
        let a = DynMatrix::from_rows(3, 3, &[2.0_f64, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
        let mut lu = a.clone();
        let mut perm = [0usize; 3];
        lu_in_place(&mut lu, &mut perm).unwrap();
        let mut x = [0.0; 3];
        lu_solve(&lu, &perm, &[8.0, -11.0, -3.0], &mut x);
        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
        assert!((x[2] - (-1.0)).abs() < 1e-12);
    }

    #[test]
    fn lu_inverse_5x5() {
        let a = DynMatrix::from_fn(5, 5, |i, j| {
            1.0 / (1.0 + i as f64 + 2.0 * j as f64) + if i == j { 2.0 } else { 0.0 }
        });
        let a_inv = inverse(&a).unwrap();
        assert_identity(&(&a * &a_inv), 1e-12);
        assert_identity(&(&a_inv * &a), 1e-12);
    }

    #[test]
    fn lu_det_matches_closed_form() {
        let a = DynMatrix::from_rows(3, 3, &[6.0_f64, 1.0, 1.0, 4.0, -2.0, 5.0, 2.0, 8.0, 7.0]);
        let lu = DynLu::new(&a).unwrap();
        assert!((lu.det() - (-306.0)).abs() < 1e-10);
        assert!((det_small(&a).unwrap() - (-306.0)).abs() < 1e-10);
    }

    #[test]
    fn det_small_sizes() {
        let e = DynMatrix::<f64>::zeros(0, 0, 0.0);
        assert_eq!(det_small(&e), Some(1.0));
        let a = DynMatrix::from_rows(2, 2, &[3.0_f64, 8.0, 4.0, 6.0]);
        assert_eq!(det_small(&a), Some(-14.0));
        let b = DynMatrix::eye(4, 0.0_f64);
        assert_eq!(det_small(&b), None);
        assert!((determinant(&b) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn singular_det_is_zero() {
        let a = DynMatrix::from_fn(4, 4, |i, j| (i + j) as f64);
        assert_eq!(determinant(&a), 0.0);
        assert_eq!(inverse(&a).unwrap_err(), LinalgError::Singular);
    }

    #[test]
    fn tiny_but_regular_matrix_is_not_singular() {
        let a = DynMatrix::from_fn(4, 4, |i, j| if i == j { 1e-30_f64 } else { 0.0 });
        let d = determinant(&a);
        assert!(d > 0.0);
        let inv = inverse(&a).unwrap();
        assert!((inv[(2, 2)] - 1e30).abs() < 1e16);
    }

    #[test]
    fn nan_is_not_finite() {
        let mut a = DynMatrix::eye(4, 0.0_f64);
        a[(1, 1)] = f64::NAN;
        assert_eq!(inverse(&a).unwrap_err(), LinalgError::NotFinite);
        assert!(determinant(&a).is_nan());
    }

    #[test]
    fn permutation_parity() {
        // Swap rows of the identity: det = -1
        let a = DynMatrix::from_rows(4, 4, &[
            0.0_f64, 1.0, 0.0, 0.0,
            1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);
        assert!((determinant(&a) + 1.0).abs() < 1e-15);
    }
}
