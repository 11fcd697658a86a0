//! Drift control: periodic regeneration of the maintained state from the kernel.

use num_traits::{Float, ToPrimitive};

use super::{DetError, DetManip};
use crate::dynmatrix::{max_diff_and_sum, DynMatrix};
use crate::kernel::Kernel;
use crate::linalg::{determinant, inverse};
use crate::traits::LinalgScalar;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// When and how strictly the maintained inverse is reconciled against a
/// direct recomputation.
///
/// ```
/// use detflow::StabilityPolicy;
///
/// let p = StabilityPolicy::default()
///     .with_check_interval(20)
///     .with_error_tolerance(1e-6);
/// assert_eq!(p.check_interval, 20);
/// assert_eq!(p.warning_tolerance, 1e-8);
/// assert!(p.is_singular(0.0_f64));
/// assert!(!p.is_singular(1e-200_f64));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StabilityPolicy {
    /// Committed operations between two regenerations.
    pub check_interval: u64,
    /// `|det|` below this is singular. Negative selects the float
    /// normality test instead (zero, subnormal, infinite and NaN are singular).
    pub singular_threshold: f64,
    /// Relative deviation logged as a warning.
    pub warning_tolerance: f64,
    /// Relative deviation reported as [`DetError::Deviation`].
    pub error_tolerance: f64,
}

impl Default for StabilityPolicy {
    fn default() -> Self {
        Self {
            check_interval: 100,
            singular_threshold: -1.0,
            warning_tolerance: 1e-8,
            error_tolerance: 1e-5,
        }
    }
}

impl StabilityPolicy {
    pub fn with_check_interval(mut self, interval: u64) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn with_singular_threshold(mut self, threshold: f64) -> Self {
        self.singular_threshold = threshold;
        self
    }

    pub fn with_warning_tolerance(mut self, tol: f64) -> Self {
        self.warning_tolerance = tol;
        self
    }

    pub fn with_error_tolerance(mut self, tol: f64) -> Self {
        self.error_tolerance = tol;
        self
    }

    /// Whether `det` counts as singular under this policy.
    pub fn is_singular<T: LinalgScalar>(&self, det: T) -> bool {
        let m = det.modulus();
        if self.singular_threshold < 0.0 {
            !m.is_normal()
        } else {
            match m.to_f64() {
                Some(v) => !(v >= self.singular_threshold),
                None => true,
            }
        }
    }
}

impl<X, Y, T, K> DetManip<X, Y, T, K>
where
    X: Clone,
    Y: Clone,
    T: LinalgScalar,
    K: Kernel<X, Y, T>,
{
    /// Whether the maintained determinant is singular under the current policy.
    pub fn is_singular(&self) -> bool {
        self.policy.is_singular(self.det)
    }

    /// Recompute inverse, determinant and sign directly from the kernel,
    /// without comparing against the maintained state.
    pub fn regenerate(&mut self) -> Result<(), DetError> {
        self.assert_idle("regenerate");
        self.regenerate_with(false)
    }

    /// Recompute directly and compare with the maintained inverse first.
    ///
    /// Drift beyond the warning tolerance is logged; beyond the error
    /// tolerance it is returned as [`DetError::Deviation`] and the maintained
    /// state is left as it was.
    pub fn regenerate_and_check(&mut self) -> Result<(), DetError> {
        self.assert_idle("regenerate_and_check");
        self.regenerate_with(true)
    }

    pub(super) fn regenerate_with(&mut self, check: bool) -> Result<(), DetError> {
        let n = self.n;
        self.n_ops = 0;
        if n == 0 {
            self.det = T::one();
            self.sign = 1;
            return Ok(());
        }

        let direct = DynMatrix::from_fn(n, n, |a, b| {
            self.kernel.eval(&self.x_values[a], &self.y_values[b])
        });
        let det = determinant(&direct);
        if self.policy.is_singular(det) {
            log::debug!(target: "detflow", "regenerate: N = {}, singular determinant {:?}", n, det);
            return Err(DetError::Singular);
        }
        let fresh = inverse(&direct)?;

        if check {
            let (diff, sum) = max_diff_and_sum(&fresh, &self.inv, n);
            let diff = diff.to_f64().unwrap_or(f64::NAN);
            let sum = sum.to_f64().unwrap_or(f64::NAN);
            let warn_bound = self.policy.warning_tolerance * sum;
            let err_bound = self.policy.error_tolerance * sum;
            if !(diff < warn_bound) {
                log::warn!(
                    target: "detflow",
                    "inverse drift above warning tolerance: N = {}, max|diff| = {:e}, bound = {:e}",
                    n,
                    diff,
                    warn_bound
                );
                log::trace!(target: "detflow", "maintained inverse: {:?}", self.inv.top_left(n, n));
                log::trace!(target: "detflow", "direct inverse: {:?}", fresh);
            }
            if !(diff < err_bound) {
                return Err(DetError::Deviation {
                    deviation: diff,
                    bound: err_bound,
                });
            }
            log::debug!(target: "detflow", "regenerate: N = {}, deviation {:e}", n, diff);
        } else {
            log::debug!(target: "detflow", "regenerate: N = {}", n);
        }

        self.inv.set_block(0, 0, &fresh);
        self.det = det;
        self.sign = self.rows.sign() * self.cols.sign();
        Ok(())
    }
}
