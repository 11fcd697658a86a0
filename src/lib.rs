//! # detflow
//!
//! Incremental determinant and inverse maintenance for Monte Carlo samplers,
//! no-std compatible (with `alloc`). A caller-supplied kernel `f(x, y)` defines
//! the matrix entries; the engine keeps `det(M)` and `M^-1` up to date under
//! row/column insertions, removals and replacements, and returns the
//! Metropolis ratio `det(M_new) / det(M_old)` of each proposal before it is
//! committed.
//!
//! ## Quick start
//!
//! ```
//! use detflow::DetManip;
//!
//! let f = |x: &f64, y: &f64| 1.0 / (1.0 + (x - y) * (x - y));
//! let mut d = DetManip::new(f, 16);
//!
//! d.insert_at_end(0.0, 0.0).unwrap();
//! d.insert_at_end(2.0, 2.0).unwrap();
//!
//! // propose moving row 0 from x = 0 to x = 0.5
//! let ratio = d.try_change_row(0, 0.5);
//! if ratio.abs() > 0.5 {
//!     d.complete_operation().unwrap();
//! } else {
//!     d.reject_last_try();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`det`]: [`DetManip`], the try/complete/reject engine: rank-1 insert,
//!   remove and change operations, rank-k batched insert/remove, full refill,
//!   permutation-only swaps and rolls, and the [`StabilityPolicy`] driven
//!   drift control that periodically regenerates the state from the kernel.
//!
//! - [`dynmatrix`]: Heap-allocated `DynMatrix<T>` with runtime dimensions,
//!   column-major storage. Capacity-sized storage grows in place with
//!   [`DynMatrix::grow`]; block, swap and drift-comparison helpers serve the engine.
//!
//! - [`linalg`]: LU with partial pivoting (determinant, solve, inverse),
//!   closed-form small determinants, and leading-block BLAS-style kernels.
//!
//! - [`kernel`]: the [`Kernel`] trait, implemented for every
//!   `Fn(&X, &Y) -> T`.
//!
//! - [`traits`]: Element trait hierarchy:
//!   - [`Scalar`]: all matrix elements (`Copy + PartialEq + Debug + Zero + One + Num`)
//!   - [`FloatScalar`]: real floats, used for moduli and tolerances
//!   - [`LinalgScalar`]: real floats and complex numbers, the engine's scalars
//!   - [`MatrixRef`] / [`MatrixMut`]: generic read/write access for algorithms
//!
//! ## Complex kernels
//!
//! Enable the `complex` feature to run the engine over `Complex<f32>` /
//! `Complex<f64>`. All updates use unconjugated products, so determinants of
//! complex kernel matrices come out exactly as for real ones.
//!
//! ## Logging
//!
//! The stability controller reports through the [`log`] facade under the
//! `detflow` target: `warn` when drift exceeds the warning tolerance, `debug`
//! on every regeneration. No logger is installed by the crate.
//!
//! ## Cargo features
//!
//! | Feature   | Default  | Description |
//! |-----------|----------|-------------|
//! | `std`     | yes      | Hardware FPU via system libm, `std::error::Error` impls |
//! | `libm`    | baseline | Pure-Rust software float fallback |
//! | `complex` | no       | `Complex<f32>` / `Complex<f64>` support via `num-complex` |
//! | `serde`   | no       | `Serialize`/`Deserialize` for `DynMatrix`, `StabilityPolicy` and `Snapshot` |
//! | `all`     | no       | All features: `std` + `complex` + `serde` |

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod det;
pub mod dynmatrix;
pub mod kernel;
pub mod linalg;
pub mod traits;

#[cfg(feature = "serde")]
pub use det::Snapshot;
pub use det::{DetError, DetManip, OperationKind, Permutation, Roll, StabilityPolicy};
pub use dynmatrix::{DynMatrix, DynMatrixf32, DynMatrixf64};
#[cfg(feature = "complex")]
pub use dynmatrix::{DynMatrixz32, DynMatrixz64};
pub use kernel::Kernel;
pub use linalg::LinalgError;
pub use traits::{FloatScalar, LinalgScalar, MatrixMut, MatrixRef, Scalar};

#[cfg(feature = "complex")]
pub use num_complex::Complex;
