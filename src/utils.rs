use ndarray::{Array, Array1, Array2, ArrayBase, azip, Data, Dimension, IxDyn};

/// Every computation runs in double precision so finite-difference checks stay meaningful
pub type F = f64;
pub type ArrayF<D> = Array<F, D>;
pub type Array1F = Array1<F>;
pub type Array2F = Array2<F>;
pub type ArrayDynF = Array<F, IxDyn>;

/// Class indices, one per example
pub type Labels = Array1<usize>;

pub type GenericResult<T> = anyhow::Result<T>;

pub fn arrays_almost_equal<D: Dimension>(arr1: &ArrayF<D>, arr2: &ArrayF<D>) -> bool {
    arr1.shape() == arr2.shape() && azip!(arr1, arr2).all(|a, b| (a - b).abs() < 0.001)
}

/// Sum of the squares of all elements
pub fn sum_squares<S: Data<Elem=F>, D: Dimension>(array: &ArrayBase<S, D>) -> F {
    array.iter().map(|o| o * o).sum()
}

/// Fails when any label is not a valid column of a matrix with `classes` columns
pub fn check_labels(labels: &Labels, examples: usize, classes: usize) -> GenericResult<()> {
    anyhow::ensure!(
        labels.len() == examples,
        "Expected {} labels but got {}", examples, labels.len()
    );
    if let Some((index, label)) = labels.iter().enumerate().find(|(_, &o)| o >= classes) {
        anyhow::bail!("Label {} of example {} is out of range for {} classes", label, index, classes);
    }
    Ok(())
}

/// Index of the highest score in each row
pub fn argmax_rows(scores: &Array2F) -> Labels {
    scores.outer_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .reduce(|acc, val| if val.1 > acc.1 { val } else { acc })
                .map(|o| o.0)
                .unwrap_or(0)
        })
        .collect()
}

pub const EPSILON: F = 1e-8;

#[cfg(test)]
mod tests {
    use ndarray::array;
    use super::*;

    #[test]
    fn test_check_labels() {
        assert!(check_labels(&array![0, 2, 1], 3, 3).is_ok());
        assert!(check_labels(&array![0, 3, 1], 3, 3).is_err());
        assert!(check_labels(&array![0, 1], 3, 3).is_err());
    }

    #[test]
    fn test_argmax_rows() {
        let scores: Array2F = array![[0.1, 0.7, 0.2], [0.9, -1.0, 0.3], [0.0, 0.0, 0.5]];
        assert_eq!(argmax_rows(&scores), array![1, 0, 2]);
    }

    #[test]
    fn test_sum_squares() {
        let values: Array2F = array![[1.0, -2.0], [3.0, 0.5]];
        assert!((sum_squares(&values) - 14.25).abs() < 1e-12);
    }
}
