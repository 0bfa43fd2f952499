//! Finite-difference helpers for verifying analytic gradients.

use ndarray::{Dimension, NdIndex};
use crate::utils::{ArrayF, EPSILON, F, GenericResult};

/// Centered difference approximation of the gradient of `f` at `x`.
/// `f` receives a perturbed copy of `x`, one element at a time, and `x` itself is never modified.
pub fn eval_numerical_gradient<D, Func>(mut f: Func, x: &ArrayF<D>, h: F) -> GenericResult<ArrayF<D>>
where
    D: Dimension,
    D::Pattern: NdIndex<D>,
    Func: FnMut(&ArrayF<D>) -> GenericResult<F>,
{
    let mut grad = ArrayF::<D>::zeros(x.raw_dim());
    let mut probe = x.clone();

    for (index, target) in grad.indexed_iter_mut() {
        let old = x[index.clone()];

        probe[index.clone()] = old + h;
        let plus = f(&probe)?;
        probe[index.clone()] = old - h;
        let minus = f(&probe)?;
        probe[index] = old;

        *target = (plus - minus) / (2.0 * h);
    }

    Ok(grad)
}

/// Largest element-wise relative error between two arrays of the same shape
pub fn rel_error<D: Dimension>(x: &ArrayF<D>, y: &ArrayF<D>) -> F {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| (a - b).abs() / (a.abs() + b.abs()).max(EPSILON))
        .fold(0.0, F::max)
}

/// True when every element either agrees in relative terms or both values are numerically zero.
/// Gradients that vanish analytically (biases feeding a batch normalization) only show rounding
/// noise numerically, which a pure relative comparison would reject.
pub fn gradients_match<D: Dimension>(analytic: &ArrayF<D>, numeric: &ArrayF<D>, tolerance: F) -> bool {
    analytic.shape() == numeric.shape()
        && analytic.iter()
        .zip(numeric.iter())
        .all(|(a, b)| {
            let diff = (a - b).abs();
            diff < 1e-8 || diff / (a.abs() + b.abs()).max(EPSILON) < tolerance
        })
}
