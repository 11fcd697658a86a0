use num_traits::{Float, Zero};

use crate::traits::LinalgScalar;

use super::DynMatrix;

/// Largest `|a_ij - b_ij|` and `|a_ij + b_ij|` over the leading `n x n` block.
///
/// Both matrices may be larger than `n`; only the leading block is read.
/// Returned as `(max |a - b|, max |a + b|)`.
pub fn max_diff_and_sum<T: LinalgScalar>(
    a: &DynMatrix<T>,
    b: &DynMatrix<T>,
    n: usize,
) -> (T::Real, T::Real) {
    let mut diff = <T::Real as Zero>::zero();
    let mut sum = <T::Real as Zero>::zero();
    for j in 0..n {
        for i in 0..n {
            let (x, y) = (a[(i, j)], b[(i, j)]);
            let d = (x - y).modulus();
            let s = (x + y).modulus();
            // NaN is sticky
            if !diff.is_nan() && !(d <= diff) {
                diff = d;
            }
            if s > sum {
                sum = s;
            }
        }
    }
    (diff, sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_and_sum_leading_block() {
        let a = DynMatrix::from_rows(3, 3, &[1.0_f64, 2.0, 100.0, 3.0, 4.0, 100.0, 100.0, 100.0, 100.0]);
        let b = DynMatrix::from_rows(2, 2, &[1.5_f64, 2.0, 3.0, 3.0]);
        let (d, s) = max_diff_and_sum(&a, &b, 2);
        assert!((d - 1.0).abs() < 1e-15);
        assert!((s - 7.0).abs() < 1e-15);
    }

    #[test]
    fn diff_propagates_nan() {
        let a = DynMatrix::from_rows(1, 1, &[f64::NAN]);
        let b = DynMatrix::from_rows(1, 1, &[1.0_f64]);
        let (d, _) = max_diff_and_sum(&a, &b, 1);
        assert!(d.is_nan());
    }
}
