use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use tracing::{debug, trace};
use crate::nn::classifier::{Classifier, NetOutput};
use crate::nn::generic_storage::{ParamKey, ParamStore};
use crate::nn::layers::affine_layer::{affine_backward, affine_forward, AffineLayer};
use crate::nn::layers::affine_relu_layer::{affine_relu_backward, affine_relu_forward};
use crate::nn::layers::nn_layers::{InitData, StepOps};
use crate::nn::loss::softmax_loss::softmax_loss;
use crate::utils::{check_labels, sum_squares, Array2F, F, GenericResult, Labels};

/// Two-layer fully-connected network: `affine - relu - affine - softmax`.
/// Input dimension D, hidden dimension H, C classes. Parameters are stored as `W1`, `b1`, `W2`
/// and `b2`.
pub struct TwoLayerNet {
    params: ParamStore,
    reg: F,
    input_dim: usize,
    num_classes: usize,
}

impl TwoLayerNet {
    /// Weights are drawn from a gaussian with standard deviation `weight_scale`; biases start at zero
    pub fn new(input_dim: usize, hidden_dim: usize, num_classes: usize, weight_scale: F, reg: F) -> GenericResult<Self> {
        Self::build(input_dim, hidden_dim, num_classes, weight_scale, reg, &mut StdRng::from_entropy())
    }

    /// Same as [`TwoLayerNet::new`] with reproducible weights
    pub fn with_seed(input_dim: usize, hidden_dim: usize, num_classes: usize, weight_scale: F, reg: F, seed: u64) -> GenericResult<Self> {
        Self::build(input_dim, hidden_dim, num_classes, weight_scale, reg, &mut StdRng::seed_from_u64(seed))
    }

    fn build(input_dim: usize, hidden_dim: usize, num_classes: usize, weight_scale: F, reg: F, rng: &mut StdRng) -> GenericResult<Self> {
        anyhow::ensure!(
            input_dim > 0 && hidden_dim > 0 && num_classes > 0,
            "Layer sizes must be positive: input {}, hidden {}, classes {}", input_dim, hidden_dim, num_classes
        );
        anyhow::ensure!(reg >= 0.0, "Regularization strength must be non-negative, got {}", reg);
        anyhow::ensure!(weight_scale >= 0.0, "Weight scale must be non-negative, got {}", weight_scale);

        let mut params = ParamStore::new();
        for (layer, in_values, out_values) in [(1, input_dim, hidden_dim), (2, hidden_dim, num_classes)] {
            AffineLayer::init(InitData {
                params: &mut params,
                layer,
                in_values,
                out_values,
                weight_scale,
                rng: &mut *rng,
            })?;
        }

        debug!("Created two-layer net {} -> {} -> {} with reg {}", input_dim, hidden_dim, num_classes, reg);
        Ok(Self { params, reg, input_dim, num_classes })
    }

    pub fn reg(&self) -> F {
        self.reg
    }
}

impl Classifier for TwoLayerNet {
    fn loss(&mut self, inputs: &Array2F, labels: Option<&Labels>) -> GenericResult<NetOutput> {
        anyhow::ensure!(
            inputs.ncols() == self.input_dim,
            "Expected {} features but inputs have {}", self.input_dim, inputs.ncols()
        );
        if let Some(labels) = labels {
            check_labels(labels, inputs.nrows(), self.num_classes)?;
        }

        let w1 = self.params.matrix(&ParamKey::weights(1))?;
        let b1 = self.params.vector(&ParamKey::biases(1))?;
        let w2 = self.params.matrix(&ParamKey::weights(2))?;
        let b2 = self.params.vector(&ParamKey::biases(2))?;

        let (hidden, hidden_cache) = affine_relu_forward(inputs.clone(), w1, b1)?;
        let (scores, scores_cache) = affine_forward(hidden, w2, b2)?;

        let labels = match labels {
            Some(labels) => labels,
            None => return Ok(NetOutput::Scores(scores)),
        };

        let (data_loss, scores_grad) = softmax_loss(&scores, labels)?;
        let (hidden_grad, mut w2_grad, b2_grad) = affine_backward(&scores_grad, scores_cache)?;
        let (_, mut w1_grad, b1_grad) = affine_relu_backward(hidden_grad, hidden_cache)?;

        let reg = self.reg;
        let loss = data_loss + 0.5 * reg * (sum_squares(&w1) + sum_squares(&w2));
        w1_grad.scaled_add(reg, &w1);
        w2_grad.scaled_add(reg, &w2);
        trace!("Two-layer net loss {} on a batch of {}", loss, inputs.nrows());

        let mut grads = ParamStore::new();
        grads.insert(ParamKey::weights(1), w1_grad.into_dyn());
        grads.insert(ParamKey::biases(1), b1_grad.into_dyn());
        grads.insert(ParamKey::weights(2), w2_grad.into_dyn());
        grads.insert(ParamKey::biases(2), b2_grad.into_dyn());
        Ok(NetOutput::Loss { loss, grads })
    }

    fn params(&self) -> &ParamStore {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamStore {
        &mut self.params
    }
}
