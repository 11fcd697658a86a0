use crate::traits::Scalar;

use super::DynMatrix;

impl<T: Scalar> DynMatrix<T> {
    /// Extract a sub-matrix of size `rows x cols` starting at `(i, j)`.
    ///
    /// Panics if the block extends beyond the matrix bounds.
    ///
    /// ```
    /// use detflow::DynMatrix;
    /// let m = DynMatrix::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
    /// let b = m.block(1, 1, 2, 2);
    /// assert_eq!(b[(0, 0)], 4.0);
    /// assert_eq!(b[(1, 1)], 8.0);
    /// ```
    pub fn block(&self, i: usize, j: usize, rows: usize, cols: usize) -> Self {
        assert!(
            i + rows <= self.nrows && j + cols <= self.ncols,
            "block ({},{}) size {}x{} out of bounds for {}x{} matrix",
            i, j, rows, cols, self.nrows, self.ncols,
        );
        DynMatrix::from_fn(rows, cols, |r, c| self[(i + r, j + c)])
    }

    /// Write a sub-matrix into self starting at position `(i, j)`.
    ///
    /// Panics if the block extends beyond the matrix bounds.
    ///
    /// ```
    /// use detflow::DynMatrix;
    /// let mut m = DynMatrix::zeros(3, 3, 0.0_f64);
    /// let patch = DynMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// m.set_block(1, 1, &patch);
    /// assert_eq!(m[(1, 1)], 1.0);
    /// assert_eq!(m[(2, 2)], 4.0);
    /// ```
    pub fn set_block(&mut self, i: usize, j: usize, src: &DynMatrix<T>) {
        assert!(
            i + src.nrows <= self.nrows && j + src.ncols <= self.ncols,
            "set_block ({},{}) size {}x{} out of bounds for {}x{} matrix",
            i, j, src.nrows, src.ncols, self.nrows, self.ncols,
        );
        for c in 0..src.ncols {
            for r in 0..src.nrows {
                self[(i + r, j + c)] = src[(r, c)];
            }
        }
    }

    /// Extract the top-left corner of size `rows x cols`.
    pub fn top_left(&self, rows: usize, cols: usize) -> Self {
        self.block(0, 0, rows, cols)
    }

    /// Resize to `nrows x ncols`, keeping the overlapping top-left block.
    ///
    /// New entries are zero. Used to grow capacity-sized storage without
    /// losing committed content.
    ///
    /// ```
    /// use detflow::DynMatrix;
    /// let mut m = DynMatrix::from_rows(2, 2, &[1.0_f64, 2.0, 3.0, 4.0]);
    /// m.grow(4, 4);
    /// assert_eq!(m.nrows(), 4);
    /// assert_eq!(m[(1, 0)], 3.0);
    /// assert_eq!(m[(3, 3)], 0.0);
    /// ```
    pub fn grow(&mut self, nrows: usize, ncols: usize) {
        if nrows == self.nrows && ncols == self.ncols {
            return;
        }
        let keep_r = self.nrows.min(nrows);
        let keep_c = self.ncols.min(ncols);
        let mut out = DynMatrix::zeros(nrows, ncols, T::zero());
        for c in 0..keep_c {
            let src = &self.data[c * self.nrows..c * self.nrows + keep_r];
            out.data[c * nrows..c * nrows + keep_r].copy_from_slice(src);
        }
        *self = out;
    }

    /// Swap two rows over the columns `0..ncols`.
    pub fn swap_rows_upto(&mut self, a: usize, b: usize, ncols: usize) {
        if a == b {
            return;
        }
        for c in 0..ncols {
            let base = c * self.nrows;
            self.data.swap(base + a, base + b);
        }
    }

    /// Swap two columns over the rows `0..nrows`.
    pub fn swap_cols_upto(&mut self, a: usize, b: usize, nrows: usize) {
        if a == b {
            return;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let stride = self.nrows;
        let (left, right) = self.data.split_at_mut(hi * stride);
        left[lo * stride..lo * stride + nrows].swap_with_slice(&mut right[..nrows]);
    }

    /// Copy row `r`, columns `0..out.len()`, into `out`.
    pub fn copy_row_into(&self, r: usize, out: &mut [T]) {
        for (c, o) in out.iter_mut().enumerate() {
            *o = self[(r, c)];
        }
    }

    /// Copy column `c`, rows `0..out.len()`, into `out`.
    pub fn copy_col_into(&self, c: usize, out: &mut [T]) {
        let start = c * self.nrows;
        out.copy_from_slice(&self.data[start..start + out.len()]);
    }

    /// Zero row `r` and column `c` over the leading `n x n` block.
    pub fn clear_row_col(&mut self, r: usize, c: usize, n: usize) {
        for j in 0..n {
            self[(r, j)] = T::zero();
        }
        for i in 0..n {
            self[(i, c)] = T::zero();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_roundtrip() {
        let m = DynMatrix::from_fn(4, 4, |i, j| (i * 4 + j) as f64);
        let b = m.block(1, 2, 2, 2);
        assert_eq!(b[(0, 0)], 6.0);
        assert_eq!(b[(1, 1)], 11.0);

        let mut z = DynMatrix::zeros(4, 4, 0.0_f64);
        z.set_block(1, 2, &b);
        assert_eq!(z[(2, 3)], 11.0);
        assert_eq!(z[(0, 0)], 0.0);
    }

    #[test]
    fn grow_preserves_leading_block() {
        let mut m = DynMatrix::from_fn(3, 3, |i, j| (i * 3 + j + 1) as f64);
        m.grow(6, 6);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(m[(i, j)], (i * 3 + j + 1) as f64);
            }
        }
        for i in 0..6 {
            assert_eq!(m[(i, 5)], 0.0);
            assert_eq!(m[(5, i)], 0.0);
        }
    }

    #[test]
    fn swap_cols_either_order() {
        let mut m = DynMatrix::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
        m.swap_cols_upto(2, 0, 3);
        assert_eq!(m[(0, 0)], 2.0);
        assert_eq!(m[(2, 2)], 6.0);
        m.swap_cols_upto(0, 2, 1);
        assert_eq!(m[(0, 0)], 0.0);
        assert_eq!(m[(1, 0)], 5.0);
    }

    #[test]
    fn swap_rows_partial() {
        let mut m = DynMatrix::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
        m.swap_rows_upto(0, 2, 2);
        assert_eq!(m[(0, 0)], 6.0);
        assert_eq!(m[(0, 1)], 7.0);
        assert_eq!(m[(0, 2)], 2.0);
    }

    #[test]
    fn copy_row_and_col() {
        let m = DynMatrix::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
        let mut row = [0.0; 2];
        m.copy_row_into(1, &mut row);
        assert_eq!(row, [3.0, 4.0]);
        let mut col = [0.0; 3];
        m.copy_col_into(2, &mut col);
        assert_eq!(col, [2.0, 5.0, 8.0]);
    }
}
