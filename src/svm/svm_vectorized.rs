use ndarray::{Axis, Zip};
use crate::svm::{check_inputs, DELTA};
use crate::utils::{sum_squares, Array1F, Array2F, F, GenericResult, Labels};

/// Structured SVM loss without explicit loops over classes. Same inputs and outputs as
/// [`svm_loss_naive`](crate::svm::svm_loss_naive).
pub fn svm_loss_vectorized(weights: &Array2F, inputs: &Array2F, labels: &Labels, reg: F) -> GenericResult<(F, Array2F)> {
    check_inputs(weights, inputs, labels, reg)?;

    let num_train = inputs.nrows() as F;
    let scores = inputs.dot(weights);
    let correct_scores: Array1F = Zip::from(scores.rows())
        .and(labels)
        .map_collect(|row, &label| row[label]);

    let mut margins = (scores - &correct_scores.insert_axis(Axis(1)) + DELTA).mapv_into(|o| o.max(0.0));
    Zip::from(margins.rows_mut())
        .and(labels)
        .for_each(|mut row, &label| row[label] = 0.0);

    let loss = margins.sum() / num_train + reg * sum_squares(weights);

    // Each positive margin pulls its own column up and the correct column down
    let mut coefficients = margins.mapv_into(|o| if o > 0.0 { 1.0 } else { 0.0 });
    let positive_counts = coefficients.sum_axis(Axis(1));
    Zip::from(coefficients.rows_mut())
        .and(labels)
        .and(&positive_counts)
        .for_each(|mut row, &label, &count| row[label] = -count);

    let mut grad = inputs.t().dot(&coefficients) / num_train;
    grad.scaled_add(2.0 * reg, weights);

    Ok((loss, grad))
}
