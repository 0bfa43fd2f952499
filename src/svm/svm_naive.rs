use crate::svm::{check_inputs, DELTA};
use crate::utils::{sum_squares, Array2F, F, GenericResult, Labels};

/// Structured SVM loss with explicit loops over examples and classes.
/// The loss and the gradient are accumulated in the same pass.
pub fn svm_loss_naive(weights: &Array2F, inputs: &Array2F, labels: &Labels, reg: F) -> GenericResult<(F, Array2F)> {
    check_inputs(weights, inputs, labels, reg)?;

    let num_classes = weights.ncols();
    let num_train = inputs.nrows();
    let mut grad = Array2F::zeros(weights.raw_dim());
    let mut loss = 0.0;

    for (i, example) in inputs.outer_iter().enumerate() {
        let scores = example.dot(weights);
        let correct = labels[i];
        let correct_score = scores[correct];

        for j in 0..num_classes {
            if j == correct {
                continue;
            }
            let margin = scores[j] - correct_score + DELTA;
            if margin > 0.0 {
                loss += margin;
                grad.column_mut(j).scaled_add(1.0, &example);
                grad.column_mut(correct).scaled_add(-1.0, &example);
            }
        }
    }

    loss /= num_train as F;
    grad /= num_train as F;

    loss += reg * sum_squares(weights);
    grad.scaled_add(2.0 * reg, weights);

    Ok((loss, grad))
}
