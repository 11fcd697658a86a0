//! Rank-k batched insertion and removal.
//!
//! Inserting k rows and columns at once is the block form of the rank-1
//! update: the ratio is `det(Ξ)` with `Ξ = D - C A^-1 B` the k×k Schur
//! complement of the enlarged matrix, and the commit is two GEMMs plus the
//! inversion of `Ξ`. Removal reads the k×k sub-block of the inverse at the
//! removed positions and eliminates it in one Schur step.
//!
//! Positions are sorted ascending first. Inserting in ascending order at
//! positions `p_m` into a matrix that grows one step at a time contributes
//! parity `(i_m + j_m)` per step, so the accumulated sign flip is the parity
//! of the total sum. Removal is the exact mirror.

use alloc::vec::Vec;

use super::staging::check_positions;
use super::{apply_sign, flip_if_odd, DetError, DetManip, Proposal};
use crate::dynmatrix::DynMatrix;
use crate::kernel::Kernel;
use crate::linalg::{blas, determinant, inverse};
use crate::traits::LinalgScalar;

fn argsort(pos: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..pos.len()).collect();
    order.sort_by_key(|&a| pos[a]);
    order
}

impl<X, Y, T, K> DetManip<X, Y, T, K>
where
    X: Clone,
    Y: Clone,
    T: LinalgScalar,
    K: Kernel<X, Y, T>,
{
    /// Propose inserting `k = i.len()` rows and columns at once.
    ///
    /// `i[m]` and `j[m]` are the logical positions of row `x[m]` and column
    /// `y[m]` in the enlarged `(N + k) x (N + k)` matrix. Positions are sorted
    /// internally, so the pairs may come in any order.
    ///
    /// # Panics
    ///
    /// If a proposal is pending, the slices differ in length or are empty,
    /// or the positions are not distinct and below `N + k`.
    pub fn try_insert_k(&mut self, i: &[usize], j: &[usize], x: &[X], y: &[Y]) -> T {
        self.assert_idle("try_insert_k");
        let k = i.len();
        assert!(k > 0, "try_insert_k: nothing to insert");
        assert!(
            j.len() == k && x.len() == k && y.len() == k,
            "try_insert_k: argument lengths differ ({}, {}, {}, {})",
            k,
            j.len(),
            x.len(),
            y.len()
        );
        let n = self.n;
        if n + k > self.nmax {
            self.grow((2 * self.nmax).max(n + k));
        }
        self.wk.reserve(self.nmax, k);

        let wk = &mut self.wk;
        wk.i.clear();
        wk.x.clear();
        for a in argsort(i) {
            wk.i.push(i[a]);
            wk.x.push(x[a].clone());
        }
        wk.j.clear();
        wk.y.clear();
        for a in argsort(j) {
            wk.j.push(j[a]);
            wk.y.push(y[a].clone());
        }
        if let Some(bad) = check_positions(&wk.i, n + k) {
            panic!(
                "try_insert_k: row positions {:?} must be distinct and below {} (offending index {})",
                wk.i,
                n + k,
                bad
            );
        }
        if let Some(bad) = check_positions(&wk.j, n + k) {
            panic!(
                "try_insert_k: column positions {:?} must be distinct and below {} (offending index {})",
                wk.j,
                n + k,
                bad
            );
        }

        for l in 0..k {
            for m in 0..k {
                self.wk.ksi[(m, l)] = self.kernel.eval(&self.wk.x[m], &self.wk.y[l]);
            }
        }

        if n == 0 {
            let ratio = determinant(&self.wk.ksi);
            self.new_det = ratio;
            self.new_sign = 1;
            self.proposal = Proposal::InsertK;
            return ratio;
        }

        for l in 0..k {
            for r in 0..n {
                self.wk.new_cols[(r, l)] = self.kernel.eval(&self.x_values[r], &self.wk.y[l]);
            }
        }
        for c in 0..n {
            for m in 0..k {
                self.wk.new_rows[(m, c)] = self.kernel.eval(&self.wk.x[m], &self.y_values[c]);
            }
        }

        let wk = &mut self.wk;
        let one = T::one();
        // inv_cols = A^-1 B, then Ξ -= C A^-1 B
        blas::gemm(n, n, k, one, &self.inv, &wk.new_cols, T::zero(), &mut wk.inv_cols);
        blas::gemm(k, n, k, T::zero() - one, &wk.new_rows, &wk.inv_cols, one, &mut wk.ksi);

        let ratio = determinant(&wk.ksi);
        let parity: usize = wk.i.iter().chain(wk.j.iter()).sum();
        self.new_det = self.det * ratio;
        self.new_sign = flip_if_odd(self.sign, parity);
        self.proposal = Proposal::InsertK;
        apply_sign(self.new_sign * self.sign, ratio)
    }

    pub(super) fn complete_insert_k(&mut self) -> Result<(), DetError> {
        let k = self.wk.k;
        let n = self.n;
        let ksi_inv = inverse(&self.wk.ksi)?;

        self.x_values.append(&mut self.wk.x);
        self.y_values.append(&mut self.wk.y);

        if n == 0 {
            self.inv.set_block(0, 0, &ksi_inv);
            self.rows.reset_identity(k);
            self.cols.reset_identity(k);
            self.n = k;
            return Ok(());
        }

        let wk = &mut self.wk;
        let (zero, one) = (T::zero(), T::one());
        let minus_one = zero - one;
        // inv_rows = C A^-1, extended by -I over the new slots
        blas::gemm(k, n, n, one, &wk.new_rows, &self.inv, zero, &mut wk.inv_rows);
        for m in 0..k {
            for l in 0..k {
                let v = if m == l { minus_one } else { zero };
                wk.inv_rows[(m, n + l)] = v;
                wk.inv_cols[(n + l, m)] = v;
            }
        }

        for m in 0..k {
            self.rows.insert(wk.i[m], n + m);
            self.cols.insert(wk.j[m], n + m);
        }

        let nk = n + k;
        for s in n..nk {
            self.inv.clear_row_col(s, s, nk);
        }
        // inv += inv_cols * Ξ^-1 * inv_rows
        blas::gemm(k, k, nk, one, &ksi_inv, &wk.inv_rows, zero, &mut wk.tmp);
        blas::gemm(nk, k, nk, one, &wk.inv_cols, &wk.tmp, one, &mut self.inv);
        self.n = nk;
        Ok(())
    }

    /// Propose removing the logical rows `i` and logical columns `j`.
    ///
    /// # Panics
    ///
    /// If a proposal is pending, the slices differ in length or are empty,
    /// or the positions are not distinct and below `N`.
    pub fn try_remove_k(&mut self, i: &[usize], j: &[usize]) -> T {
        self.assert_idle("try_remove_k");
        let k = i.len();
        let n = self.n;
        assert!(k > 0, "try_remove_k: nothing to remove");
        assert_eq!(j.len(), k, "try_remove_k: {} rows but {} columns", k, j.len());
        assert!(k <= n, "try_remove_k: cannot remove {} from size {}", k, n);
        self.wk.reserve(self.nmax, k);

        let wk = &mut self.wk;
        wk.i.clear();
        wk.i.extend_from_slice(i);
        wk.i.sort_unstable();
        wk.j.clear();
        wk.j.extend_from_slice(j);
        wk.j.sort_unstable();
        assert!(
            check_positions(&wk.i, n).is_none(),
            "try_remove_k: row positions {:?} must be distinct and below {}",
            wk.i,
            n
        );
        assert!(
            check_positions(&wk.j, n).is_none(),
            "try_remove_k: column positions {:?} must be distinct and below {}",
            wk.j,
            n
        );

        wk.islot.clear();
        wk.islot.extend(wk.i.iter().map(|&p| self.rows.slot(p)));
        wk.jslot.clear();
        wk.jslot.extend(wk.j.iter().map(|&p| self.cols.slot(p)));
        for b in 0..k {
            for a in 0..k {
                wk.ksi[(a, b)] = self.inv[(wk.jslot[a], wk.islot[b])];
            }
        }

        let ratio = determinant(&wk.ksi);
        let parity: usize = wk.i.iter().chain(wk.j.iter()).sum();
        self.new_det = self.det * ratio;
        self.new_sign = flip_if_odd(self.sign, parity);
        self.proposal = Proposal::RemoveK;
        apply_sign(self.new_sign * self.sign, ratio)
    }

    pub(super) fn complete_remove_k(&mut self) -> Result<(), DetError> {
        let k = self.wk.k;
        let n = self.n;
        if n == k {
            self.clear();
            return Ok(());
        }

        let wk = &mut self.wk;
        wk.islot.sort_unstable();
        wk.jslot.sort_unstable();
        let block = DynMatrix::from_fn(k, k, |a, b| self.inv[(wk.jslot[a], wk.islot[b])]);
        let block_inv = inverse(&block)?;

        // move the doomed slots to the tail, highest first
        for t in 1..=k {
            let idx = k - t;
            let target = n - t;
            self.inv.swap_rows_upto(wk.jslot[idx], target, n);
            self.y_values.swap(wk.jslot[idx], target);
            self.inv.swap_cols_upto(wk.islot[idx], target, n);
            self.x_values.swap(wk.islot[idx], target);
        }

        let nn = n - k;
        for a in 0..k {
            for r in 0..nn {
                wk.inv_cols[(r, a)] = self.inv[(r, nn + a)];
            }
            for c in 0..nn {
                wk.inv_rows[(a, c)] = self.inv[(nn + a, c)];
            }
        }
        let (zero, one) = (T::zero(), T::one());
        blas::gemm(k, k, nn, one, &block_inv, &wk.inv_rows, zero, &mut wk.tmp);
        blas::gemm(nn, k, nn, zero - one, &wk.inv_cols, &wk.tmp, one, &mut self.inv);

        self.rows.remove_positions(&wk.i);
        self.cols.remove_positions(&wk.j);
        for idx in (0..k).rev() {
            self.rows.replace_slot(nn + idx, wk.islot[idx]);
            self.cols.replace_slot(nn + idx, wk.jslot[idx]);
        }
        self.x_values.truncate(nn);
        self.y_values.truncate(nn);
        self.n = nn;
        Ok(())
    }
}
