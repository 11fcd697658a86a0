//! Incremental determinant and inverse maintenance.
//!
//! [`DetManip`] tracks the square matrix `M[i][j] = f(x_i, y_j)` for a caller
//! supplied [`Kernel`] `f`, keeping `det(M)` and `M^-1` current under low-rank
//! changes. Every change goes through a two-phase protocol:
//!
//! 1. `try_*` computes the ratio `det(M_new) / det(M_old)` into scratch
//!    buffers without touching committed state.
//! 2. [`complete_operation`](DetManip::complete_operation) commits the staged
//!    change, or [`reject_last_try`](DetManip::reject_last_try) drops it.
//!
//! ```
//! use detflow::DetManip;
//!
//! let f = |x: &f64, y: &f64| if x == y { 2.0 } else { 0.5 / (1.0 + (x - y).abs()) };
//! let mut d = DetManip::new(f, 8);
//!
//! let r = d.try_insert(0, 0, 1.0, 1.0);
//! assert_eq!(r, 2.0);
//! d.complete_operation().unwrap();
//!
//! let r = d.try_insert(1, 1, 3.0, 3.0);
//! d.complete_operation().unwrap();
//! let expected = (2.0 * 2.0 - (0.5 / 3.0) * (0.5 / 3.0)) / 2.0;
//! assert!((r - expected).abs() < 1e-14);
//! assert!((d.determinant() - 2.0 * expected).abs() < 1e-14);
//! ```
//!
//! Internally the inverse is never reordered: logical rows and columns are
//! mapped to storage slots through two [`Permutation`] tables, so swaps and
//! cyclic rolls cost nothing beyond relabeling.
//!
//! Protocol misuse (a second `try_*` while one is pending, out-of-range
//! indices, mismatched argument lengths) panics. Numerical failures surface
//! as [`DetError`].

mod perm;
mod rank1;
mod rankk;
mod refill;
#[cfg(feature = "serde")]
mod snapshot;
mod stability;
mod staging;


use alloc::vec::Vec;

use crate::dynmatrix::DynMatrix;
use crate::kernel::Kernel;
use crate::linalg::LinalgError;
use crate::traits::LinalgScalar;

pub use perm::{Permutation, Roll};
#[cfg(feature = "serde")]
pub use snapshot::Snapshot;
pub use stability::StabilityPolicy;
pub use staging::OperationKind;

use staging::{BlockScratch, Proposal, RefillScratch, VectorScratch};

/// Capacity used by [`DetManip::from_values`] for an empty sample.
const DEFAULT_CAPACITY: usize = 30;

/// Numerical failures reported by the determinant engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetError {
    /// The determinant (maintained or recomputed) is below the singular threshold.
    Singular,
    /// Maintained inverse drifted from the directly computed one beyond the
    /// error tolerance: `deviation >= bound`.
    Deviation { deviation: f64, bound: f64 },
    /// A dense factorization failed.
    Linalg(LinalgError),
    /// A persisted record is internally inconsistent.
    Corrupt(&'static str),
}

impl core::fmt::Display for DetError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DetError::Singular => write!(f, "determinant is singular"),
            DetError::Deviation { deviation, bound } => write!(
                f,
                "inverse drifted from direct recomputation: deviation {:e} >= bound {:e}",
                deviation, bound
            ),
            DetError::Linalg(e) => write!(f, "linear algebra failure: {}", e),
            DetError::Corrupt(what) => write!(f, "corrupt snapshot: {}", what),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DetError {}

impl From<LinalgError> for DetError {
    fn from(e: LinalgError) -> Self {
        match e {
            LinalgError::Singular => DetError::Singular,
            e => DetError::Linalg(e),
        }
    }
}

#[inline]
pub(crate) fn apply_sign<T: LinalgScalar>(sign: i32, v: T) -> T {
    if sign < 0 {
        T::zero() - v
    } else {
        v
    }
}

#[inline]
pub(crate) fn flip_if_odd(sign: i32, sum: usize) -> i32 {
    if sum % 2 == 0 {
        sign
    } else {
        -sign
    }
}

/// Incrementally maintained determinant and inverse of a kernel matrix.
///
/// `X` and `Y` are the row and column coordinate types, `T` the scalar, `K`
/// the kernel. See the [module docs](self) for the protocol.
#[derive(Clone)]
pub struct DetManip<X, Y, T, K> {
    kernel: K,
    n: usize,
    nmax: usize,
    /// Determinant of the internally ordered matrix.
    det: T,
    /// Permutation parity, so that `det(M) = sign * det`.
    sign: i32,
    /// `nmax x nmax`; leading `n x n` block is live.
    inv: DynMatrix<T>,
    rows: Permutation,
    cols: Permutation,
    x_values: Vec<X>,
    y_values: Vec<Y>,
    n_ops: u64,
    policy: StabilityPolicy,

    proposal: Proposal<X, Y>,
    new_det: T,
    new_sign: i32,
    w1: VectorScratch<T>,
    wk: BlockScratch<X, Y, T>,
    wr: RefillScratch<X, Y, T>,
}

impl<X, Y, T, K> core::fmt::Debug for DetManip<X, Y, T, K>
where
    X: core::fmt::Debug,
    Y: core::fmt::Debug,
    T: LinalgScalar,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DetManip")
            .field("size", &self.n)
            .field("capacity", &self.nmax)
            .field("det", &self.det)
            .field("sign", &self.sign)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("x_values", &self.x_values)
            .field("y_values", &self.y_values)
            .field("pending", &self.proposal.kind())
            .finish()
    }
}

impl<X, Y, T, K> DetManip<X, Y, T, K>
where
    X: Clone,
    Y: Clone,
    T: LinalgScalar,
    K: Kernel<X, Y, T>,
{
    /// Empty engine with room for `capacity` rows before the first reallocation.
    pub fn new(kernel: K, capacity: usize) -> Self {
        Self {
            kernel,
            n: 0,
            nmax: capacity,
            det: T::one(),
            sign: 1,
            inv: DynMatrix::zeros(capacity, capacity, T::zero()),
            rows: Permutation::new(),
            cols: Permutation::new(),
            x_values: Vec::with_capacity(capacity),
            y_values: Vec::with_capacity(capacity),
            n_ops: 0,
            policy: StabilityPolicy::default(),
            proposal: Proposal::Idle,
            new_det: T::one(),
            new_sign: 1,
            w1: VectorScratch::new(capacity),
            wk: BlockScratch::new(),
            wr: RefillScratch::new(),
        }
    }

    /// Engine over an initial sample, with the inverse and determinant
    /// computed directly once. Capacity is twice the sample size.
    ///
    /// # Panics
    ///
    /// If `xs` and `ys` differ in length.
    pub fn from_values(kernel: K, xs: Vec<X>, ys: Vec<Y>) -> Result<Self, DetError> {
        assert_eq!(
            xs.len(),
            ys.len(),
            "from_values: {} x values but {} y values",
            xs.len(),
            ys.len()
        );
        let n = xs.len();
        let cap = if n == 0 { DEFAULT_CAPACITY } else { 2 * n };
        let mut d = Self::new(kernel, cap);
        d.x_values = xs;
        d.y_values = ys;
        d.n = n;
        d.rows.reset_identity(n);
        d.cols.reset_identity(n);
        d.regenerate_with(false)?;
        Ok(d)
    }

    /// Replace the stability policy.
    pub fn with_policy(mut self, policy: StabilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Grow capacity to at least `capacity`, preserving committed content.
    ///
    /// # Panics
    ///
    /// While a proposal is pending.
    pub fn reserve(&mut self, capacity: usize) {
        self.assert_idle("reserve");
        self.grow(capacity);
    }

    pub(crate) fn grow(&mut self, capacity: usize) {
        if capacity <= self.nmax {
            return;
        }
        self.inv.grow(capacity, capacity);
        self.w1.reserve(capacity);
        self.x_values.reserve(capacity - self.x_values.len());
        self.y_values.reserve(capacity - self.y_values.len());
        self.nmax = capacity;
    }

    /// Back to size zero with `det = 1`, `sign = +1`. Capacity is kept and any
    /// pending proposal is dropped.
    pub fn clear(&mut self) {
        self.n = 0;
        self.det = T::one();
        self.sign = 1;
        self.rows.clear();
        self.cols.clear();
        self.x_values.clear();
        self.y_values.clear();
        self.proposal = Proposal::Idle;
        self.wr.reset();
    }

    // ---- protocol ----

    #[track_caller]
    pub(crate) fn assert_idle(&self, op: &str) {
        if let Some(kind) = self.proposal.kind() {
            panic!(
                "{}: a {} proposal is pending; complete or reject it first",
                op, kind
            );
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.proposal, Proposal::Idle)
    }

    /// Kind of the outstanding proposal, if any.
    pub fn pending_kind(&self) -> Option<OperationKind> {
        self.proposal.kind()
    }

    /// Commit the staged proposal.
    ///
    /// After the commit the stability controller runs when the operation
    /// counter passes the check interval or the new determinant is singular.
    /// An `Err` from rank-k or refill commits leaves the previous committed
    /// state intact; an `Err` from the stability check leaves the committed
    /// change in place with a state that should be rebuilt.
    ///
    /// # Panics
    ///
    /// If no proposal is pending.
    pub fn complete_operation(&mut self) -> Result<(), DetError> {
        let proposal = core::mem::replace(&mut self.proposal, Proposal::Idle);
        match proposal {
            Proposal::Idle => panic!("complete_operation: no proposal is pending"),
            Proposal::Insert { i, j, x, y } => self.complete_insert(i, j, x, y),
            Proposal::Remove {
                i,
                j,
                islot,
                jslot,
            } => self.complete_remove(i, j, islot, jslot),
            Proposal::ChangeRow { islot, x } => self.complete_change_row(islot, x),
            Proposal::ChangeCol { jslot, y } => self.complete_change_col(jslot, y),
            Proposal::ChangeRowCol { islot, jslot, x, y } => {
                self.complete_change_row_col(islot, jslot, x, y)
            }
            Proposal::InsertK => self.complete_insert_k()?,
            Proposal::RemoveK => self.complete_remove_k()?,
            Proposal::Refill => self.complete_refill()?,
        }

        if self.n == 0 {
            self.det = T::one();
            self.sign = 1;
        } else {
            self.det = self.new_det;
            self.sign = self.new_sign;
        }

        self.n_ops += 1;
        if self.n_ops > self.policy.check_interval || self.is_singular() {
            self.regenerate_with(true)?;
        }
        Ok(())
    }

    /// Drop the staged proposal. Committed state is untouched.
    ///
    /// # Panics
    ///
    /// If no proposal is pending.
    pub fn reject_last_try(&mut self) {
        assert!(
            !self.is_idle(),
            "reject_last_try: no proposal is pending"
        );
        self.proposal = Proposal::Idle;
        self.wr.reset();
    }

    // ---- shortcuts ----

    /// `try_insert` + `complete_operation`; returns the ratio.
    pub fn insert(&mut self, i: usize, j: usize, x: X, y: Y) -> Result<T, DetError> {
        let r = self.try_insert(i, j, x, y);
        self.complete_operation()?;
        Ok(r)
    }

    /// Insert as the last row and column.
    pub fn insert_at_end(&mut self, x: X, y: Y) -> Result<T, DetError> {
        let n = self.n;
        self.insert(n, n, x, y)
    }

    pub fn remove(&mut self, i: usize, j: usize) -> Result<T, DetError> {
        let r = self.try_remove(i, j);
        self.complete_operation()?;
        Ok(r)
    }

    pub fn remove_at_end(&mut self) -> Result<T, DetError> {
        assert!(self.n > 0, "remove_at_end: matrix is empty");
        let last = self.n - 1;
        self.remove(last, last)
    }

    pub fn change_row(&mut self, i: usize, x: X) -> Result<T, DetError> {
        let r = self.try_change_row(i, x);
        self.complete_operation()?;
        Ok(r)
    }

    pub fn change_col(&mut self, j: usize, y: Y) -> Result<T, DetError> {
        let r = self.try_change_col(j, y);
        self.complete_operation()?;
        Ok(r)
    }

    pub fn change_row_col(&mut self, i: usize, j: usize, x: X, y: Y) -> Result<T, DetError> {
        let r = self.try_change_row_col(i, j, x, y);
        self.complete_operation()?;
        Ok(r)
    }

    pub fn insert_k(
        &mut self,
        i: &[usize],
        j: &[usize],
        x: &[X],
        y: &[Y],
    ) -> Result<T, DetError> {
        let r = self.try_insert_k(i, j, x, y);
        self.complete_operation()?;
        Ok(r)
    }

    pub fn remove_k(&mut self, i: &[usize], j: &[usize]) -> Result<T, DetError> {
        let r = self.try_remove_k(i, j);
        self.complete_operation()?;
        Ok(r)
    }

    /// Two rows at `i0, i1` and two columns at `j0, j1` (positions in the
    /// enlarged matrix).
    pub fn try_insert2(
        &mut self,
        i: [usize; 2],
        j: [usize; 2],
        x: [X; 2],
        y: [Y; 2],
    ) -> T {
        self.try_insert_k(&i, &j, &x, &y)
    }

    pub fn try_remove2(&mut self, i: [usize; 2], j: [usize; 2]) -> T {
        self.try_remove_k(&i, &j)
    }

    pub fn insert2(
        &mut self,
        i: [usize; 2],
        j: [usize; 2],
        x: [X; 2],
        y: [Y; 2],
    ) -> Result<T, DetError> {
        let r = self.try_insert2(i, j, x, y);
        self.complete_operation()?;
        Ok(r)
    }

    /// Append two rows and two columns.
    pub fn insert2_at_end(&mut self, x: [X; 2], y: [Y; 2]) -> Result<T, DetError> {
        let n = self.n;
        self.insert2([n, n + 1], [n, n + 1], x, y)
    }

    pub fn remove2(&mut self, i: [usize; 2], j: [usize; 2]) -> Result<T, DetError> {
        let r = self.try_remove2(i, j);
        self.complete_operation()?;
        Ok(r)
    }

    pub fn remove2_at_end(&mut self) -> Result<T, DetError> {
        assert!(self.n >= 2, "remove2_at_end: size {} is below 2", self.n);
        let n = self.n;
        self.remove2([n - 2, n - 1], [n - 2, n - 1])
    }

    pub fn refill(&mut self, xs: Vec<X>, ys: Vec<Y>) -> Result<T, DetError> {
        let r = self.try_refill(xs, ys);
        self.complete_operation()?;
        Ok(r)
    }

    // ---- permutation-only operations ----

    /// Exchange logical rows `i` and `j`. Flips the sign unless `i == j`.
    pub fn swap_row(&mut self, i: usize, j: usize) {
        self.assert_idle("swap_row");
        assert!(
            i < self.n && j < self.n,
            "swap_row: rows ({}, {}) out of range for size {}",
            i,
            j,
            self.n
        );
        if i == j {
            return;
        }
        self.rows.swap(i, j);
        self.sign = -self.sign;
    }

    /// Exchange logical columns `i` and `j`. Flips the sign unless `i == j`.
    pub fn swap_col(&mut self, i: usize, j: usize) {
        self.assert_idle("swap_col");
        assert!(
            i < self.n && j < self.n,
            "swap_col: columns ({}, {}) out of range for size {}",
            i,
            j,
            self.n
        );
        if i == j {
            return;
        }
        self.cols.swap(i, j);
        self.sign = -self.sign;
    }

    /// Cyclically shift all rows or all columns by one position.
    ///
    /// Returns the sign multiplier `(-1)^(N-1)`, which is also folded into
    /// the tracked sign.
    ///
    /// ```
    /// use detflow::{DetManip, Roll};
    ///
    /// let f = |x: &f64, y: &f64| if x == y { 1.0_f64 } else { 0.1 };
    /// let mut d = DetManip::from_values(f, vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
    /// let det = d.determinant();
    /// assert_eq!(d.roll_matrix(Roll::Down), -1);
    /// assert!((d.determinant() + det).abs() < 1e-14);
    /// assert_eq!(d.roll_matrix(Roll::Up), -1);
    /// assert!((d.determinant() - det).abs() < 1e-14);
    /// ```
    pub fn roll_matrix(&mut self, roll: Roll) -> i32 {
        self.assert_idle("roll_matrix");
        if self.n < 2 {
            return 1;
        }
        match roll {
            Roll::None => return 1,
            Roll::Down => self.rows.roll_forward(),
            Roll::Up => self.rows.roll_backward(),
            Roll::Right => self.cols.roll_forward(),
            Roll::Left => self.cols.roll_backward(),
        }
        let s = flip_if_odd(1, self.n - 1);
        self.sign *= s;
        s
    }

    // ---- accessors ----

    /// Current size N.
    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.nmax
    }

    #[inline]
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Determinant of the logical matrix.
    #[inline]
    pub fn determinant(&self) -> T {
        apply_sign(self.sign, self.det)
    }

    /// Permutation parity tracked separately from the magnitude.
    #[inline]
    pub fn sign(&self) -> i32 {
        self.sign
    }

    /// Row coordinate of logical row `i`.
    pub fn get_x(&self, i: usize) -> &X {
        &self.x_values[self.rows.slot(i)]
    }

    /// Column coordinate of logical column `j`.
    pub fn get_y(&self, j: usize) -> &Y {
        &self.y_values[self.cols.slot(j)]
    }

    /// Row coordinates in logical order.
    pub fn x_values(&self) -> Vec<X> {
        self.rows
            .as_slice()
            .iter()
            .map(|&s| self.x_values[s].clone())
            .collect()
    }

    /// Column coordinates in logical order.
    pub fn y_values(&self) -> Vec<Y> {
        self.cols
            .as_slice()
            .iter()
            .map(|&s| self.y_values[s].clone())
            .collect()
    }

    /// Row coordinates in storage order.
    pub fn x_values_internal(&self) -> &[X] {
        &self.x_values
    }

    /// Column coordinates in storage order.
    pub fn y_values_internal(&self) -> &[Y] {
        &self.y_values
    }

    pub fn row_permutation(&self) -> &Permutation {
        &self.rows
    }

    pub fn col_permutation(&self) -> &Permutation {
        &self.cols
    }

    /// Entry `(i, j)` of the logical inverse.
    pub fn inverse_matrix_at(&self, i: usize, j: usize) -> T {
        assert!(
            i < self.n && j < self.n,
            "inverse_matrix_at: ({}, {}) out of range for size {}",
            i,
            j,
            self.n
        );
        self.inv[(self.cols.slot(i), self.rows.slot(j))]
    }

    /// Logical inverse as an `N x N` matrix.
    pub fn inverse_matrix(&self) -> DynMatrix<T> {
        DynMatrix::from_fn(self.n, self.n, |i, j| {
            self.inv[(self.cols.slot(i), self.rows.slot(j))]
        })
    }

    /// Leading `N x N` block of the stored inverse, in storage order
    /// (rows are y-slots, columns are x-slots).
    pub fn inverse_matrix_internal(&self) -> DynMatrix<T> {
        self.inv.top_left(self.n, self.n)
    }

    /// Logical matrix, evaluated through the kernel.
    pub fn matrix(&self) -> DynMatrix<T> {
        DynMatrix::from_fn(self.n, self.n, |i, j| {
            self.kernel.eval(self.get_x(i), self.get_y(j))
        })
    }

    /// Visit every stored pair with its inverse entry:
    /// `f(x_a, y_b, inv[b][a])` over all storage slots `a, b`.
    pub fn for_each_entry(&self, mut f: impl FnMut(&X, &Y, T)) {
        for a in 0..self.n {
            for b in 0..self.n {
                f(&self.x_values[a], &self.y_values[b], self.inv[(b, a)]);
            }
        }
    }

    /// Operations committed since the last regeneration.
    #[inline]
    pub fn operations_since_check(&self) -> u64 {
        self.n_ops
    }

    // ---- policy ----

    pub fn policy(&self) -> &StabilityPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: StabilityPolicy) {
        self.policy = policy;
    }

    pub fn check_interval(&self) -> u64 {
        self.policy.check_interval
    }

    pub fn set_check_interval(&mut self, interval: u64) {
        self.policy.check_interval = interval;
    }

    pub fn singular_threshold(&self) -> f64 {
        self.policy.singular_threshold
    }

    /// Negative values select the float-normality test.
    pub fn set_singular_threshold(&mut self, threshold: f64) {
        self.policy.singular_threshold = threshold;
    }

    pub fn warning_tolerance(&self) -> f64 {
        self.policy.warning_tolerance
    }

    pub fn set_warning_tolerance(&mut self, tol: f64) {
        self.policy.warning_tolerance = tol;
    }

    pub fn error_tolerance(&self) -> f64 {
        self.policy.error_tolerance
    }

    pub fn set_error_tolerance(&mut self, tol: f64) {
        self.policy.error_tolerance = tol;
    }
}
