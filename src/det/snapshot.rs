//! Serializable record of the committed state.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use super::{DetError, DetManip, Permutation, StabilityPolicy};
use crate::dynmatrix::DynMatrix;
use crate::kernel::Kernel;
use crate::traits::LinalgScalar;

/// Committed state of a [`DetManip`], minus the kernel.
///
/// The inverse is stored in storage order, exactly as maintained, so a
/// restore does not need to refactorize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<X, Y, T> {
    pub size: usize,
    /// `size x size`; rows are y-slots, columns are x-slots.
    pub inverse: DynMatrix<T>,
    pub det: T,
    pub sign: i32,
    pub row_slots: Vec<usize>,
    pub col_slots: Vec<usize>,
    pub x_values: Vec<X>,
    pub y_values: Vec<Y>,
    pub operations_since_check: u64,
    pub policy: StabilityPolicy,
}

impl<X, Y, T, K> DetManip<X, Y, T, K>
where
    X: Clone,
    Y: Clone,
    T: LinalgScalar,
    K: Kernel<X, Y, T>,
{
    /// Copy out the committed state. A pending proposal is not part of it.
    pub fn snapshot(&self) -> Snapshot<X, Y, T> {
        Snapshot {
            size: self.n,
            inverse: self.inv.top_left(self.n, self.n),
            det: self.det,
            sign: self.sign,
            row_slots: self.rows.as_slice().to_vec(),
            col_slots: self.cols.as_slice().to_vec(),
            x_values: self.x_values.clone(),
            y_values: self.y_values.clone(),
            operations_since_check: self.n_ops,
            policy: self.policy,
        }
    }

    /// Rebuild an idle engine from a snapshot, with capacity twice its size.
    ///
    /// Only shape consistency is checked; a snapshot taken with a different
    /// kernel is accepted and will be caught by the next stability check.
    pub fn restore(kernel: K, snap: Snapshot<X, Y, T>) -> Result<Self, DetError> {
        let n = snap.size;
        if snap.x_values.len() != n || snap.y_values.len() != n {
            return Err(DetError::Corrupt("value lists do not match size"));
        }
        if snap.inverse.nrows() != n || snap.inverse.ncols() != n {
            return Err(DetError::Corrupt("inverse does not match size"));
        }
        if snap.row_slots.len() != n || snap.col_slots.len() != n {
            return Err(DetError::Corrupt("permutations do not match size"));
        }
        if snap.sign != 1 && snap.sign != -1 {
            return Err(DetError::Corrupt("sign is not +1 or -1"));
        }
        let rows = Permutation::from_slots(snap.row_slots)
            .ok_or(DetError::Corrupt("row permutation is not a bijection"))?;
        let cols = Permutation::from_slots(snap.col_slots)
            .ok_or(DetError::Corrupt("column permutation is not a bijection"))?;

        let mut d = Self::new(kernel, (2 * n).max(1));
        d.inv.set_block(0, 0, &snap.inverse);
        d.n = n;
        d.det = if n == 0 { T::one() } else { snap.det };
        d.sign = snap.sign;
        d.rows = rows;
        d.cols = cols;
        d.x_values = snap.x_values;
        d.y_values = snap.y_values;
        d.n_ops = snap.operations_since_check;
        d.policy = snap.policy;
        Ok(d)
    }
}
