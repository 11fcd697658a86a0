//! Proposal bookkeeping and the scratch buffers each proposal computes into.
//!
//! Nothing here touches committed state: a `try_*` call fills one of the
//! scratch records and parks a [`Proposal`] describing what to commit.

use alloc::vec;
use alloc::vec::Vec;

use crate::dynmatrix::DynMatrix;
use crate::traits::Scalar;

/// The kind of a staged proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Insert,
    Remove,
    ChangeRow,
    ChangeCol,
    ChangeRowCol,
    InsertK,
    RemoveK,
    Refill,
}

impl core::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            OperationKind::Insert => "insert",
            OperationKind::Remove => "remove",
            OperationKind::ChangeRow => "change_row",
            OperationKind::ChangeCol => "change_col",
            OperationKind::ChangeRowCol => "change_row_col",
            OperationKind::InsertK => "insert_k",
            OperationKind::RemoveK => "remove_k",
            OperationKind::Refill => "refill",
        };
        f.write_str(name)
    }
}

/// At most one of these is outstanding. Rank-1 variants carry their own
/// operands; rank-k and refill operands live in their scratch records.
#[derive(Debug, Clone)]
pub(crate) enum Proposal<X, Y> {
    Idle,
    Insert { i: usize, j: usize, x: X, y: Y },
    Remove { i: usize, j: usize, islot: usize, jslot: usize },
    ChangeRow { islot: usize, x: X },
    ChangeCol { jslot: usize, y: Y },
    ChangeRowCol { islot: usize, jslot: usize, x: X, y: Y },
    InsertK,
    RemoveK,
    Refill,
}

impl<X, Y> Proposal<X, Y> {
    pub(crate) fn kind(&self) -> Option<OperationKind> {
        match self {
            Proposal::Idle => None,
            Proposal::Insert { .. } => Some(OperationKind::Insert),
            Proposal::Remove { .. } => Some(OperationKind::Remove),
            Proposal::ChangeRow { .. } => Some(OperationKind::ChangeRow),
            Proposal::ChangeCol { .. } => Some(OperationKind::ChangeCol),
            Proposal::ChangeRowCol { .. } => Some(OperationKind::ChangeRowCol),
            Proposal::InsertK => Some(OperationKind::InsertK),
            Proposal::RemoveK => Some(OperationKind::RemoveK),
            Proposal::Refill => Some(OperationKind::Refill),
        }
    }
}

/// Rank-1 scratch, all vectors of capacity length.
///
/// Naming follows the internal layout: `new_col` and `inv_row` are indexed by
/// x-slot, `new_row` and `inv_col` by y-slot.
#[derive(Debug, Clone)]
pub(crate) struct VectorScratch<T> {
    pub new_col: Vec<T>,
    pub new_row: Vec<T>,
    /// `inv * new_col`
    pub inv_col: Vec<T>,
    /// `inv^T * new_row`
    pub inv_row: Vec<T>,
    pub ksi: T,
}

impl<T: Scalar> VectorScratch<T> {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            new_col: vec![T::zero(); cap],
            new_row: vec![T::zero(); cap],
            inv_col: vec![T::zero(); cap],
            inv_row: vec![T::zero(); cap],
            ksi: T::zero(),
        }
    }

    pub(crate) fn reserve(&mut self, cap: usize) {
        for v in [
            &mut self.new_col,
            &mut self.new_row,
            &mut self.inv_col,
            &mut self.inv_row,
        ] {
            if v.len() < cap {
                v.resize(cap, T::zero());
            }
        }
    }
}

/// Rank-k scratch, sized for a capacity `cap` and a block size `k`.
#[derive(Debug, Clone)]
pub(crate) struct BlockScratch<X, Y, T> {
    pub k: usize,
    cap: usize,
    /// Sorted logical positions.
    pub i: Vec<usize>,
    pub j: Vec<usize>,
    /// Internal slots of the positions, for removal.
    pub islot: Vec<usize>,
    pub jslot: Vec<usize>,
    /// Coordinates in the order of the sorted positions, for insertion.
    pub x: Vec<X>,
    pub y: Vec<Y>,
    /// `cap x k`: kernel values of the new columns against existing x-slots.
    pub new_cols: DynMatrix<T>,
    /// `k x cap`: kernel values of the new rows against existing y-slots.
    pub new_rows: DynMatrix<T>,
    /// `(cap + k) x k`
    pub inv_cols: DynMatrix<T>,
    /// `k x (cap + k)`
    pub inv_rows: DynMatrix<T>,
    /// `k x (cap + k)`
    pub tmp: DynMatrix<T>,
    /// `k x k` Schur complement (insert) or inverse sub-block (remove).
    pub ksi: DynMatrix<T>,
}

impl<X, Y, T: Scalar> BlockScratch<X, Y, T> {
    pub(crate) fn new() -> Self {
        Self {
            k: 0,
            cap: 0,
            i: Vec::new(),
            j: Vec::new(),
            islot: Vec::new(),
            jslot: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            new_cols: DynMatrix::zeros(0, 0, T::zero()),
            new_rows: DynMatrix::zeros(0, 0, T::zero()),
            inv_cols: DynMatrix::zeros(0, 0, T::zero()),
            inv_rows: DynMatrix::zeros(0, 0, T::zero()),
            tmp: DynMatrix::zeros(0, 0, T::zero()),
            ksi: DynMatrix::zeros(0, 0, T::zero()),
        }
    }

    /// Reallocate when the block size changes or the capacity outgrows the buffers.
    pub(crate) fn reserve(&mut self, cap: usize, k: usize) {
        if self.k == k && self.cap >= cap {
            return;
        }
        let z = T::zero();
        self.k = k;
        self.cap = cap;
        self.new_cols = DynMatrix::zeros(cap, k, z);
        self.new_rows = DynMatrix::zeros(k, cap, z);
        self.inv_cols = DynMatrix::zeros(cap + k, k, z);
        self.inv_rows = DynMatrix::zeros(k, cap + k, z);
        self.tmp = DynMatrix::zeros(k, cap + k, z);
        self.ksi = DynMatrix::zeros(k, k, z);
    }
}

/// Refill scratch: the replacement coordinates and the directly built matrix.
#[derive(Debug, Clone)]
pub(crate) struct RefillScratch<X, Y, T> {
    pub x: Vec<X>,
    pub y: Vec<Y>,
    pub m: DynMatrix<T>,
}

impl<X, Y, T: Scalar> RefillScratch<X, Y, T> {
    pub(crate) fn new() -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            m: DynMatrix::zeros(0, 0, T::zero()),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.x.clear();
        self.y.clear();
    }
}

/// Index of the first violation of a strictly increasing, bounded sequence.
pub(crate) fn check_positions(sorted: &[usize], bound: usize) -> Option<usize> {
    for (a, w) in sorted.windows(2).enumerate() {
        if w[0] >= w[1] {
            return Some(a + 1);
        }
    }
    match sorted.last() {
        Some(&last) if last >= bound => Some(sorted.len() - 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_checks() {
        assert_eq!(check_positions(&[], 0), None);
        assert_eq!(check_positions(&[0, 2, 3], 4), None);
        assert_eq!(check_positions(&[0, 2, 2], 4), Some(2));
        assert_eq!(check_positions(&[0, 4], 4), Some(1));
    }

    #[test]
    fn block_scratch_reallocates_on_new_k() {
        let mut b = BlockScratch::<f64, f64, f64>::new();
        b.reserve(4, 2);
        assert_eq!(b.inv_cols.nrows(), 6);
        assert_eq!(b.ksi.ncols(), 2);
        b.reserve(3, 2);
        assert_eq!(b.inv_cols.nrows(), 6);
        b.reserve(4, 3);
        assert_eq!(b.ksi.nrows(), 3);
        assert_eq!(b.new_rows.ncols(), 4);
    }

    #[test]
    fn kind_names() {
        let p: Proposal<f64, f64> = Proposal::Remove {
            i: 0,
            j: 1,
            islot: 0,
            jslot: 1,
        };
        assert_eq!(p.kind(), Some(OperationKind::Remove));
        assert_eq!(alloc::format!("{}", OperationKind::ChangeRowCol), "change_row_col");
        assert_eq!(Proposal::<f64, f64>::Idle.kind(), None);
    }
}
