//! Multiclass SVM (structured hinge) loss over a linear classifier.
//!
//! Inputs have dimension D, there are C classes and minibatches hold N examples:
//! * `weights`: (D, C)
//! * `inputs`: (N, D)
//! * `labels`: (N,), with `labels[i] < C`
//!
//! Both implementations return the mean hinge loss plus `reg * sum(W^2)` and the gradient with
//! respect to `weights`, which gets `2 * reg * W` added. They are kept side by side so one can be
//! checked and benchmarked against the other.

mod svm_naive;
mod svm_vectorized;

pub use svm_naive::svm_loss_naive;
pub use svm_vectorized::svm_loss_vectorized;

use crate::utils::{check_labels, Array2F, F, GenericResult, Labels};

/// Distance the correct class score has to keep from every other score
pub const DELTA: F = 1.0;

fn check_inputs(weights: &Array2F, inputs: &Array2F, labels: &Labels, reg: F) -> GenericResult<()> {
    anyhow::ensure!(
        weights.nrows() == inputs.ncols(),
        "Weights have shape {:?} but inputs have {} features", weights.shape(), inputs.ncols()
    );
    anyhow::ensure!(inputs.nrows() > 0, "Batch is empty");
    anyhow::ensure!(reg >= 0.0, "Regularization strength must be non-negative, got {}", reg);
    check_labels(labels, inputs.nrows(), weights.ncols())
}
