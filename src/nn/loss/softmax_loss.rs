use ndarray::{Axis, Zip};
use crate::utils::{check_labels, Array2F, F, GenericResult, Labels};

/// Row-wise softmax, shifted by each row's maximum so the exponentials can't overflow
pub fn softmax(scores: &Array2F) -> Array2F {
    let mut e = scores.to_owned();
    e.rows_mut().into_iter().for_each(|mut row| {
        let max = row.fold(F::NEG_INFINITY, |acc, &o| acc.max(o));
        row.mapv_inplace(|o| (o - max).exp());
        let sum = row.sum();
        row /= sum;
    });
    e
}

/// Mean cross-entropy of the softmax of `scores` (N, C) against `labels`, and its gradient with
/// respect to `scores`
pub fn softmax_loss(scores: &Array2F, labels: &Labels) -> GenericResult<(F, Array2F)> {
    check_labels(labels, scores.nrows(), scores.ncols())?;
    anyhow::ensure!(scores.nrows() > 0, "Batch is empty");

    let n = scores.nrows() as F;
    let mut probs = softmax(scores);
    let loss = Zip::from(probs.rows())
        .and(labels)
        .fold(0.0, |acc, row, &label| acc - row[label].ln()) / n;

    Zip::from(probs.rows_mut())
        .and(labels)
        .for_each(|mut row, &label| row[label] -= 1.0);
    probs /= n;

    debug_assert!(probs.sum_axis(Axis(1)).iter().all(|o| o.abs() < 1e-9));
    Ok((loss, probs))
}
