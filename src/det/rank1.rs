//! Rank-1 updates: insert, remove, change row, change column, change both.
//!
//! With `A = inv^-1` the internally ordered matrix, every operation here is a
//! single Sherman–Morrison step (or, for removal, a Schur complement read
//! straight off the stored inverse). Cost is O(N^2) per commit and O(N^2) per
//! try, except `try_remove` which is O(1).

use super::{apply_sign, flip_if_odd, DetManip, Proposal};
use crate::kernel::Kernel;
use crate::linalg::blas;
use crate::traits::LinalgScalar;

impl<X, Y, T, K> DetManip<X, Y, T, K>
where
    X: Clone,
    Y: Clone,
    T: LinalgScalar,
    K: Kernel<X, Y, T>,
{
    /// Propose inserting row `x` at logical position `i` and column `y` at
    /// logical position `j` (`0 <= i, j <= N`). Returns `det(new) / det(old)`.
    ///
    /// # Panics
    ///
    /// If a proposal is already pending or a position is out of range.
    pub fn try_insert(&mut self, i: usize, j: usize, x: X, y: Y) -> T {
        let n = self.prepare_insert("try_insert", i, j);
        for k in 0..n {
            self.w1.new_col[k] = self.kernel.eval(&self.x_values[k], &y);
            self.w1.new_row[k] = self.kernel.eval(&x, &self.y_values[k]);
        }
        let corner = self.kernel.eval(&x, &y);
        self.stage_insert(i, j, x, y, corner)
    }

    /// Like [`try_insert`](Self::try_insert), with the new entries supplied by
    /// the caller: `col_fn(x_k)` for the new column, `row_fn(y_k)` for the new
    /// row and `corner` for `f(x, y)`.
    ///
    /// The values must agree with the kernel; `x` and `y` are still stored so
    /// that later regeneration reproduces them.
    #[allow(clippy::too_many_arguments)]
    pub fn try_insert_with<FC, FR>(
        &mut self,
        i: usize,
        j: usize,
        x: X,
        y: Y,
        col_fn: FC,
        row_fn: FR,
        corner: T,
    ) -> T
    where
        FC: Fn(&X) -> T,
        FR: Fn(&Y) -> T,
    {
        let n = self.prepare_insert("try_insert_with", i, j);
        for k in 0..n {
            self.w1.new_col[k] = col_fn(&self.x_values[k]);
            self.w1.new_row[k] = row_fn(&self.y_values[k]);
        }
        self.stage_insert(i, j, x, y, corner)
    }

    fn prepare_insert(&mut self, op: &str, i: usize, j: usize) -> usize {
        self.assert_idle(op);
        let n = self.n;
        assert!(
            i <= n && j <= n,
            "{}: position ({}, {}) out of range for size {}",
            op,
            i,
            j,
            n
        );
        if n == self.nmax {
            self.grow((2 * self.nmax).max(1));
        }
        n
    }

    fn stage_insert(&mut self, i: usize, j: usize, x: X, y: Y, corner: T) -> T {
        let n = self.n;
        let ksi = if n == 0 {
            self.new_sign = 1;
            corner
        } else {
            let w = &mut self.w1;
            blas::gemv(n, n, &self.inv, &w.new_col, &mut w.inv_col);
            self.new_sign = flip_if_odd(self.sign, i + j);
            corner - blas::dot(n, &w.new_row, &w.inv_col)
        };
        self.w1.ksi = ksi;
        self.new_det = self.det * ksi;
        self.proposal = Proposal::Insert { i, j, x, y };
        apply_sign(self.new_sign * self.sign, ksi)
    }

    pub(super) fn complete_insert(&mut self, i: usize, j: usize, x: X, y: Y) {
        let n = self.n;
        self.x_values.push(x);
        self.y_values.push(y);
        self.rows.insert(i, n);
        self.cols.insert(j, n);
        self.n = n + 1;

        if n == 0 {
            self.inv[(0, 0)] = T::one() / self.w1.ksi;
            return;
        }

        let w = &mut self.w1;
        blas::gemv_t(n, n, &self.inv, &w.new_row, &mut w.inv_row);
        let minus_one = T::zero() - T::one();
        w.inv_row[n] = minus_one;
        w.inv_col[n] = minus_one;

        self.inv.clear_row_col(n, n, n + 1);
        blas::ger(n + 1, n + 1, T::one() / w.ksi, &w.inv_col, &w.inv_row, &mut self.inv);
    }

    /// Propose removing logical row `i` and logical column `j`.
    ///
    /// The ratio is the matching entry of the current inverse, so this is O(1).
    pub fn try_remove(&mut self, i: usize, j: usize) -> T {
        self.assert_idle("try_remove");
        let n = self.n;
        assert!(
            i < n && j < n,
            "try_remove: position ({}, {}) out of range for size {}",
            i,
            j,
            n
        );
        let islot = self.rows.slot(i);
        let jslot = self.cols.slot(j);
        let ksi = self.inv[(jslot, islot)];
        self.w1.ksi = ksi;
        self.new_det = self.det * ksi;
        self.new_sign = flip_if_odd(self.sign, i + j);
        self.proposal = Proposal::Remove { i, j, islot, jslot };
        apply_sign(self.new_sign * self.sign, ksi)
    }

    pub(super) fn complete_remove(&mut self, i: usize, j: usize, islot: usize, jslot: usize) {
        let n = self.n;
        if n == 1 {
            self.clear();
            return;
        }
        let last = n - 1;

        // park the doomed y-slot in the last row and the doomed x-slot in the
        // last column of the inverse
        self.inv.swap_rows_upto(jslot, last, n);
        self.y_values.swap(jslot, last);
        self.inv.swap_cols_upto(islot, last, n);
        self.x_values.swap(islot, last);

        let w = &mut self.w1;
        self.inv.copy_col_into(last, &mut w.inv_col[..last]);
        self.inv.copy_row_into(last, &mut w.inv_row[..last]);
        let alpha = (T::zero() - T::one()) / self.inv[(last, last)];
        blas::ger(last, last, alpha, &w.inv_col, &w.inv_row, &mut self.inv);

        self.rows.remove(i);
        self.cols.remove(j);
        self.rows.replace_slot(last, islot);
        self.cols.replace_slot(last, jslot);
        self.x_values.truncate(last);
        self.y_values.truncate(last);
        self.n = last;
    }

    /// Propose replacing the coordinate of logical row `i` by `x`.
    pub fn try_change_row(&mut self, i: usize, x: X) -> T {
        self.assert_idle("try_change_row");
        let n = self.n;
        assert!(i < n, "try_change_row: row {} out of range for size {}", i, n);
        let islot = self.rows.slot(i);

        for c in 0..n {
            let y = &self.y_values[c];
            self.w1.new_row[c] =
                self.kernel.eval(&x, y) - self.kernel.eval(&self.x_values[islot], y);
        }
        let w = &mut self.w1;
        blas::gemv_t(n, n, &self.inv, &w.new_row, &mut w.inv_row);
        let ksi = T::one() + w.inv_row[islot];
        w.ksi = ksi;

        self.new_det = self.det * ksi;
        self.new_sign = self.sign;
        self.proposal = Proposal::ChangeRow { islot, x };
        ksi
    }

    pub(super) fn complete_change_row(&mut self, islot: usize, x: X) {
        let n = self.n;
        self.x_values[islot] = x;

        let w = &mut self.w1;
        let ksi = w.ksi;
        w.inv_row[islot] = T::zero();
        self.inv.copy_col_into(islot, &mut w.inv_col[..n]);
        let alpha = (T::zero() - T::one()) / ksi;
        blas::ger(n, n, alpha, &w.inv_col, &w.inv_row, &mut self.inv);

        let scale = T::one() / ksi;
        for r in 0..n {
            self.inv[(r, islot)] = self.inv[(r, islot)] * scale;
        }
    }

    /// Propose replacing the coordinate of logical column `j` by `y`.
    pub fn try_change_col(&mut self, j: usize, y: Y) -> T {
        self.assert_idle("try_change_col");
        let n = self.n;
        assert!(j < n, "try_change_col: column {} out of range for size {}", j, n);
        let jslot = self.cols.slot(j);

        for r in 0..n {
            let x = &self.x_values[r];
            self.w1.new_col[r] =
                self.kernel.eval(x, &y) - self.kernel.eval(x, &self.y_values[jslot]);
        }
        let w = &mut self.w1;
        blas::gemv(n, n, &self.inv, &w.new_col, &mut w.inv_col);
        let ksi = T::one() + w.inv_col[jslot];
        w.ksi = ksi;

        self.new_det = self.det * ksi;
        self.new_sign = self.sign;
        self.proposal = Proposal::ChangeCol { jslot, y };
        ksi
    }

    pub(super) fn complete_change_col(&mut self, jslot: usize, y: Y) {
        let n = self.n;
        self.y_values[jslot] = y;

        let w = &mut self.w1;
        let ksi = w.ksi;
        w.inv_col[jslot] = T::zero();
        self.inv.copy_row_into(jslot, &mut w.inv_row[..n]);
        let alpha = (T::zero() - T::one()) / ksi;
        blas::ger(n, n, alpha, &w.inv_col, &w.inv_row, &mut self.inv);

        let scale = T::one() / ksi;
        for c in 0..n {
            self.inv[(jslot, c)] = self.inv[(jslot, c)] * scale;
        }
    }

    /// Propose replacing logical row `i` by `x` and logical column `j` by `y`
    /// at once.
    pub fn try_change_row_col(&mut self, i: usize, j: usize, x: X, y: Y) -> T {
        self.assert_idle("try_change_row_col");
        let n = self.n;
        assert!(
            i < n && j < n,
            "try_change_row_col: position ({}, {}) out of range for size {}",
            i,
            j,
            n
        );
        let islot = self.rows.slot(i);
        let jslot = self.cols.slot(j);

        // column difference against the old y (x-slot indexed), with the
        // corner taking both changes
        for r in 0..n {
            let xr = &self.x_values[r];
            self.w1.new_col[r] =
                self.kernel.eval(xr, &y) - self.kernel.eval(xr, &self.y_values[jslot]);
        }
        self.w1.new_col[islot] = self.kernel.eval(&x, &y)
            - self
                .kernel
                .eval(&self.x_values[islot], &self.y_values[jslot]);
        // row difference against the old x (y-slot indexed), corner excluded
        for c in 0..n {
            let yc = &self.y_values[c];
            self.w1.new_row[c] =
                self.kernel.eval(&x, yc) - self.kernel.eval(&self.x_values[islot], yc);
        }
        self.w1.new_row[jslot] = T::zero();

        let w = &mut self.w1;
        blas::gemv(n, n, &self.inv, &w.new_col, &mut w.inv_col);
        blas::gemv_t(n, n, &self.inv, &w.new_row, &mut w.inv_row);

        let xn = w.inv_col[jslot];
        let yn = w.inv_row[islot];
        let z = blas::dot(n, &w.new_row, &w.inv_col);
        let mnn = self.inv[(jslot, islot)];
        let ksi = (T::one() + xn) * (T::one() + yn) - mnn * z;
        w.ksi = ksi;

        self.new_det = self.det * ksi;
        self.new_sign = self.sign;
        self.proposal = Proposal::ChangeRowCol { islot, jslot, x, y };
        ksi
    }

    pub(super) fn complete_change_row_col(&mut self, islot: usize, jslot: usize, x: X, y: Y) {
        let n = self.n;
        self.x_values[islot] = x;
        self.y_values[jslot] = y;

        let w = &mut self.w1;
        let d = w.ksi;
        let one = T::one();
        let xn = w.inv_col[jslot];
        let yn = w.inv_row[islot];
        let a = (T::zero() - (one + yn)) / d;
        let b = (T::zero() - (one + xn)) / d;
        let z = blas::dot(n, &w.new_row, &w.inv_col) / d;
        let mnn = self.inv[(jslot, islot)] / d;

        // the difference vectors are spent; reuse them for row jslot and
        // column islot of the old inverse
        let row_j = &mut w.new_row[..n];
        self.inv.copy_row_into(jslot, row_j);
        let col_i = &mut w.new_col[..n];
        self.inv.copy_col_into(islot, col_i);

        let (u, v) = (&w.inv_col, &w.inv_row);
        let (row_j, col_i) = (&w.new_row, &w.new_col);
        for c in 0..n {
            for r in 0..n {
                let delta = a * u[r] * row_j[c]
                    + b * col_i[r] * v[c]
                    + mnn * u[r] * v[c]
                    + z * col_i[r] * row_j[c];
                self.inv[(r, c)] = self.inv[(r, c)] + delta;
            }
        }
    }
}
