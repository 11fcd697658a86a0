//! The matrix-entry capability supplied by the caller.

/// Scalar function of two coordinates defining matrix entries on demand:
/// entry `(i, j)` of the tracked matrix is `eval(x_i, y_j)`.
///
/// Blanket-implemented for every `Fn(&X, &Y) -> T`, so plain closures work:
///
/// ```
/// use detflow::Kernel;
///
/// let k = |x: &f64, y: &f64| (x - y).exp();
/// assert_eq!(k.eval(&1.0, &1.0), 1.0);
/// ```
///
/// Implementations must be pure: the engine re-evaluates entries when it
/// regenerates its state and expects the same values back.
pub trait Kernel<X, Y, T> {
    fn eval(&self, x: &X, y: &Y) -> T;
}

impl<X, Y, T, F> Kernel<X, Y, T> for F
where
    F: Fn(&X, &Y) -> T,
{
    #[inline]
    fn eval(&self, x: &X, y: &Y) -> T {
        self(x, y)
    }
}
