//! Level 1–3 kernels on leading blocks of column-major storage.
//!
//! Every routine takes explicit active dimensions and touches only the
//! leading block of its operands, so capacity-sized matrices can be used
//! without slicing or reallocation. All products are unconjugated, which is
//! what the Sherman–Morrison and Woodbury identities require for complex
//! kernels as well.

use crate::dynmatrix::DynMatrix;
use crate::traits::{MatrixMut, MatrixRef, Scalar};

/// `sum_k a[k] * b[k]` over the first `n` entries.
#[inline]
pub fn dot<T: Scalar>(n: usize, a: &[T], b: &[T]) -> T {
    a[..n]
        .iter()
        .zip(&b[..n])
        .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

/// `y[..n] += alpha * x[..n]`.
#[inline]
pub fn axpy<T: Scalar>(n: usize, alpha: T, x: &[T], y: &mut [T]) {
    for (yi, &xi) in y[..n].iter_mut().zip(&x[..n]) {
        *yi = *yi + alpha * xi;
    }
}

/// `y[..m] = a[..m, ..n] * x[..n]`.
pub fn gemv<T: Scalar>(m: usize, n: usize, a: &DynMatrix<T>, x: &[T], y: &mut [T]) {
    for yi in y[..m].iter_mut() {
        *yi = T::zero();
    }
    for (c, &xc) in x[..n].iter().enumerate() {
        if xc == T::zero() {
            continue;
        }
        axpy(m, xc, a.col_as_slice(c, 0), y);
    }
}

/// `y[..n] = a[..m, ..n]^T * x[..m]`.
pub fn gemv_t<T: Scalar>(m: usize, n: usize, a: &DynMatrix<T>, x: &[T], y: &mut [T]) {
    for (c, yc) in y[..n].iter_mut().enumerate() {
        *yc = dot(m, a.col_as_slice(c, 0), x);
    }
}

/// Rank-1 update `a[..m, ..n] += alpha * u[..m] * v[..n]^T`.
pub fn ger<T: Scalar>(m: usize, n: usize, alpha: T, u: &[T], v: &[T], a: &mut DynMatrix<T>) {
    for (c, &vc) in v[..n].iter().enumerate() {
        let s = alpha * vc;
        if s == T::zero() {
            continue;
        }
        axpy(m, s, u, a.col_as_mut_slice(c, 0));
    }
}

/// `c[..m, ..n] = beta * c[..m, ..n] + alpha * a[..m, ..k] * b[..k, ..n]`.
///
/// `beta == 0` overwrites `c` without reading it.
#[allow(clippy::too_many_arguments)]
pub fn gemm<T: Scalar>(
    m: usize,
    k: usize,
    n: usize,
    alpha: T,
    a: &DynMatrix<T>,
    b: &DynMatrix<T>,
    beta: T,
    c: &mut DynMatrix<T>,
) {
    for j in 0..n {
        let out = &mut c.col_as_mut_slice(j, 0)[..m];
        if beta == T::zero() {
            for o in out.iter_mut() {
                *o = T::zero();
            }
        } else if beta != T::one() {
            for o in out.iter_mut() {
                *o = *o * beta;
            }
        }
        for p in 0..k {
            let s = alpha * b[(p, j)];
            if s == T::zero() {
                continue;
            }
            axpy(m, s, a.col_as_slice(p, 0), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: usize) -> DynMatrix<f64> {
        // 1.0 .. n*n in row-major reading order, plus a poisoned border
        let mut m = DynMatrix::from_fn(n + 2, n + 2, |_, _| f64::NAN);
        for i in 0..n {
            for j in 0..n {
                m[(i, j)] = (i * n + j + 1) as f64;
            }
        }
        m
    }

    #[test]
    fn dot_and_axpy() {
        assert_eq!(dot(2, &[1.0, 2.0, 99.0], &[3.0, 4.0, 99.0]), 11.0);
        let mut y = [1.0, 1.0, 7.0];
        axpy(2, 2.0, &[1.0, 2.0, 5.0], &mut y);
        assert_eq!(y, [3.0, 5.0, 7.0]);
    }

    #[test]
    fn gemv_ignores_border() {
        let a = big(2);
        let mut y = [0.0; 4];
        gemv(2, 2, &a, &[1.0, 1.0, f64::NAN], &mut y);
        assert_eq!(&y[..2], &[3.0, 7.0]);
        gemv_t(2, 2, &a, &[1.0, 1.0], &mut y);
        assert_eq!(&y[..2], &[4.0, 6.0]);
    }

    #[test]
    fn ger_updates_leading_block() {
        let mut a = big(2);
        ger(2, 2, 1.0, &[1.0, 2.0], &[10.0, 100.0], &mut a);
        assert_eq!(a[(0, 0)], 11.0);
        assert_eq!(a[(1, 1)], 204.0);
        assert!(a[(2, 2)].is_nan());
    }

    #[test]
    fn gemm_matches_mul() {
        let a = DynMatrix::from_fn(3, 2, |i, j| (i + 2 * j) as f64 + 1.0);
        let b = DynMatrix::from_fn(2, 4, |i, j| (3 * i + j) as f64 - 2.0);
        let expected = &a * &b;

        let mut c = DynMatrix::from_fn(5, 5, |_, _| 1.0_f64);
        gemm(3, 2, 4, 1.0, &a, &b, 0.0, &mut c);
        for i in 0..3 {
            for j in 0..4 {
                assert_eq!(c[(i, j)], expected[(i, j)]);
            }
        }
        assert_eq!(c[(4, 4)], 1.0);

        // c = c - a*b  ->  zero block
        gemm(3, 2, 4, -1.0, &a, &b, 1.0, &mut c);
        for i in 0..3 {
            for j in 0..4 {
                assert_eq!(c[(i, j)], 0.0);
            }
        }
    }
}
