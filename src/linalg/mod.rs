//! Dense kernels used by the determinant engine.
//!
//! - [`lu`]: LU with partial pivoting: determinant, solve, inverse, plus
//!   closed-form determinants for 1×1 through 3×3 blocks.
//! - [`blas`]: level 1–3 kernels (`dot`, `gemv`, `gemv_t`, `ger`, `gemm`)
//!   that operate on the *leading block* of a capacity-sized [`DynMatrix`],
//!   so the engine never reallocates when the active size changes.
//!
//! [`DynMatrix`]: crate::DynMatrix

pub mod blas;
pub(crate) mod lu;

pub use lu::{det_small, determinant, inverse, lu_in_place, lu_solve, DynLu};

/// Errors from linear algebra operations.
///
/// ```
/// use detflow::DynMatrix;
/// use detflow::linalg::{inverse, LinalgError};
///
/// let singular = DynMatrix::from_rows(2, 2, &[1.0_f64, 2.0, 2.0, 4.0]);
/// assert_eq!(inverse(&singular).unwrap_err(), LinalgError::Singular);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinalgError {
    /// Matrix is exactly singular (a zero pivot survived partial pivoting).
    Singular,
    /// A pivot was NaN or infinite.
    NotFinite,
}

impl core::fmt::Display for LinalgError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LinalgError::Singular => write!(f, "matrix is singular"),
            LinalgError::NotFinite => write!(f, "matrix contains NaN or infinite values"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LinalgError {}
