use crate::nn::generic_storage::ParamStore;
use crate::utils::{argmax_rows, Array2F, F, GenericResult, Labels};

/// Result of a [`Classifier::loss`] call
#[derive(Debug)]
pub enum NetOutput {
    /// Test-time forward pass: class scores of shape (N, C)
    Scores(Array2F),
    /// Training-time forward and backward pass. `grads` has the same keys as the network's parameters.
    Loss { loss: F, grads: ParamStore },
}

impl NetOutput {
    pub fn into_scores(self) -> GenericResult<Array2F> {
        match self {
            NetOutput::Scores(scores) => Ok(scores),
            NetOutput::Loss { .. } => Err(anyhow::anyhow!("Expected scores but the network computed a loss")),
        }
    }

    pub fn into_loss(self) -> GenericResult<(F, ParamStore)> {
        match self {
            NetOutput::Loss { loss, grads } => Ok((loss, grads)),
            NetOutput::Scores(_) => Err(anyhow::anyhow!("Expected a loss but the network only computed scores")),
        }
    }
}

/// A network trained by softmax loss whose parameters are updated from outside, between calls
pub trait Classifier {
    /// Without labels, runs a test-time forward pass and returns the scores.
    /// With labels, runs a training-time forward and backward pass and returns the regularized
    /// loss and the gradient of every parameter.
    fn loss(&mut self, inputs: &Array2F, labels: Option<&Labels>) -> GenericResult<NetOutput>;

    fn params(&self) -> &ParamStore;

    fn params_mut(&mut self) -> &mut ParamStore;

    /// Class with the highest test-time score for each example
    fn predict(&mut self, inputs: &Array2F) -> GenericResult<Labels> {
        let scores = self.loss(inputs, None)?.into_scores()?;
        Ok(argmax_rows(&scores))
    }

    /// Fraction of the examples whose predicted class matches `labels`
    fn check_accuracy(&mut self, inputs: &Array2F, labels: &Labels) -> GenericResult<F> {
        anyhow::ensure!(
            labels.len() == inputs.nrows(),
            "Expected {} labels but got {}", inputs.nrows(), labels.len()
        );
        anyhow::ensure!(!labels.is_empty(), "Batch is empty");

        let predicted = self.predict(inputs)?;
        let correct = predicted.iter().zip(labels.iter()).filter(|(a, b)| a == b).count();
        Ok(correct as F / labels.len() as F)
    }
}
