use alloc::vec::Vec;

use super::{DetError, DetManip, Proposal};
use crate::dynmatrix::DynMatrix;
use crate::kernel::Kernel;
use crate::linalg::{determinant, inverse};
use crate::traits::LinalgScalar;

impl<X, Y, T, K> DetManip<X, Y, T, K>
where
    X: Clone,
    Y: Clone,
    T: LinalgScalar,
    K: Kernel<X, Y, T>,
{
    /// Propose replacing every coordinate at once, with any new size.
    ///
    /// The new matrix is built and factorized directly. For an empty
    /// replacement the ratio is `1 / det(M_old)`.
    ///
    /// # Panics
    ///
    /// If a proposal is pending or `xs` and `ys` differ in length.
    pub fn try_refill(&mut self, xs: Vec<X>, ys: Vec<Y>) -> T {
        self.assert_idle("try_refill");
        assert_eq!(
            xs.len(),
            ys.len(),
            "try_refill: {} x values but {} y values",
            xs.len(),
            ys.len()
        );
        let s = xs.len();
        self.wr.x = xs;
        self.wr.y = ys;
        self.proposal = Proposal::Refill;
        self.new_sign = 1;

        let old = self.determinant();
        if s == 0 {
            self.new_det = T::one();
            return T::one() / old;
        }

        if self.wr.m.nrows() != s {
            self.wr.m = DynMatrix::zeros(s, s, T::zero());
        }
        for b in 0..s {
            for a in 0..s {
                self.wr.m[(a, b)] = self.kernel.eval(&self.wr.x[a], &self.wr.y[b]);
            }
        }
        self.new_det = determinant(&self.wr.m);
        self.new_det / old
    }

    pub(super) fn complete_refill(&mut self) -> Result<(), DetError> {
        let s = self.wr.x.len();
        if s == 0 {
            self.clear();
            return Ok(());
        }
        let fresh = match inverse(&self.wr.m) {
            Ok(fresh) => fresh,
            Err(e) => {
                self.wr.reset();
                return Err(e.into());
            }
        };

        if s > self.nmax {
            self.grow(2 * s);
        }
        core::mem::swap(&mut self.x_values, &mut self.wr.x);
        core::mem::swap(&mut self.y_values, &mut self.wr.y);
        self.wr.reset();
        self.rows.reset_identity(s);
        self.cols.reset_identity(s);
        self.inv.set_block(0, 0, &fresh);
        self.n = s;
        Ok(())
    }
}
