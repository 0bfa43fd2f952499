pub mod fc_forward;
pub mod fc_backward;

use std::iter::once;
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use tracing::{debug, trace};
use crate::nn::batch_config::{BatchMode, BnParam, DropoutParam, LnParam};
use crate::nn::classifier::{Classifier, NetOutput};
use crate::nn::generic_storage::{ParamKey, ParamStore};
use crate::nn::layers::nn_layers::{init_step, Block, InitData, Step};
use crate::nn::loss::softmax_loss::softmax_loss;
use crate::nn::train_config::{FcNetConfig, Normalization};
use crate::utils::{check_labels, sum_squares, Array2F, F, GenericResult, Labels};

/// Fully-connected network with any number of hidden layers:
/// `{affine - [batch/layer norm] - relu - [dropout]} x (L - 1) - affine - softmax`.
///
/// Block `i` owns `Wi` and `bi`, plus `gammai` and `betai` when it normalizes. The running statistics of
/// batch normalization and the dropout configuration are shared state that every [`Classifier::loss`]
/// call switches to train or test mode.
pub struct FullyConnectedNet {
    config: FcNetConfig,
    blocks: Vec<Block>,
    params: ParamStore,
    /// One per hidden block, only with batch normalization
    bn_params: Vec<BnParam>,
    ln_param: LnParam,
    dropout_param: Option<DropoutParam>,
}

impl FullyConnectedNet {
    pub fn new(config: FcNetConfig) -> GenericResult<Self> {
        Self::build(config, &mut StdRng::from_entropy())
    }

    /// Same as [`FullyConnectedNet::new`] with reproducible weights. Dropout masks are seeded
    /// separately, by [`FcNetConfig::seed`].
    pub fn with_seed(config: FcNetConfig, seed: u64) -> GenericResult<Self> {
        Self::build(config, &mut StdRng::seed_from_u64(seed))
    }

    fn build(config: FcNetConfig, rng: &mut StdRng) -> GenericResult<Self> {
        config.validate()?;

        let blocks = build_blocks(&config);
        let mut params = ParamStore::new();
        for block in blocks.iter() {
            for &step in block.steps.iter() {
                init_step(step, InitData {
                    params: &mut params,
                    layer: block.layer,
                    in_values: block.in_values,
                    out_values: block.out_values,
                    weight_scale: config.weight_scale,
                    rng: &mut *rng,
                })?;
            }
        }

        let bn_params = match config.normalization {
            Normalization::BatchNorm => config.hidden_dims.iter()
                .map(|&o| BnParam::new(o, &config.bn_config))
                .collect(),
            _ => Vec::new(),
        };
        let dropout_param = if config.uses_dropout() {
            Some(DropoutParam::new(config.dropout_keep, config.seed)?)
        } else {
            None
        };

        debug!(
            "Created fully-connected net with {} layers, hidden {:?}, normalization {}, dropout keep {}",
            blocks.len(), config.hidden_dims, config.normalization, config.dropout_keep
        );
        Ok(Self {
            config,
            blocks,
            params,
            bn_params,
            ln_param: LnParam::default(),
            dropout_param,
        })
    }

    /// Hidden blocks plus the output block
    pub fn num_layers(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn config(&self) -> &FcNetConfig {
        &self.config
    }

    pub fn normalization(&self) -> Normalization {
        self.config.normalization
    }

    pub fn uses_dropout(&self) -> bool {
        self.dropout_param.is_some()
    }

    pub fn reg(&self) -> F {
        self.config.reg
    }

    pub fn bn_params(&self) -> &[BnParam] {
        &self.bn_params
    }

    fn set_mode(&mut self, mode: BatchMode) {
        for param in self.bn_params.iter_mut() {
            param.mode = mode;
        }
        if let Some(param) = self.dropout_param.as_mut() {
            param.mode = mode;
        }
    }

    /// `0.5 * reg * sum(W^2)` over the weights of every block
    fn reg_loss(&self) -> GenericResult<F> {
        let mut total = 0.0;
        for block in self.blocks.iter() {
            total += sum_squares(&self.params.matrix(&ParamKey::weights(block.layer))?);
        }
        Ok(0.5 * self.config.reg * total)
    }
}

fn build_blocks(config: &FcNetConfig) -> Vec<Block> {
    let dims: Vec<usize> = once(config.input_dim)
        .chain(config.hidden_dims.iter().copied())
        .chain(once(config.num_classes))
        .collect();
    let output_layer = dims.len() - 1;

    dims.windows(2)
        .enumerate()
        .map(|(index, window)| {
            let layer = index + 1;
            let mut steps = vec![Step::Affine];
            if layer != output_layer {
                match config.normalization {
                    Normalization::BatchNorm => steps.push(Step::BatchNorm),
                    Normalization::LayerNorm => steps.push(Step::LayerNorm),
                    Normalization::None => {}
                }
                steps.push(Step::Relu);
                if config.uses_dropout() {
                    steps.push(Step::Dropout);
                }
            }
            Block { layer, in_values: window[0], out_values: window[1], steps }
        })
        .collect()
}

impl Classifier for FullyConnectedNet {
    fn loss(&mut self, inputs: &Array2F, labels: Option<&Labels>) -> GenericResult<NetOutput> {
        anyhow::ensure!(
            inputs.ncols() == self.config.input_dim,
            "Expected {} features but inputs have {}", self.config.input_dim, inputs.ncols()
        );
        anyhow::ensure!(inputs.nrows() > 0, "Batch is empty");
        if let Some(labels) = labels {
            check_labels(labels, inputs.nrows(), self.config.num_classes)?;
        }

        let mode = if labels.is_some() { BatchMode::Train } else { BatchMode::Test };
        self.set_mode(mode);
        let (scores, caches) = fc_forward::forward(self, inputs.clone())?;

        let labels = match labels {
            Some(labels) => labels,
            None => return Ok(NetOutput::Scores(scores)),
        };

        let (data_loss, scores_grad) = softmax_loss(&scores, labels)?;
        let loss = data_loss + self.reg_loss()?;
        let grads = fc_backward::backward(self, scores_grad, caches)?;
        trace!("Fully-connected net loss {} on a batch of {}", loss, inputs.nrows());
        Ok(NetOutput::Loss { loss, grads })
    }

    fn params(&self) -> &ParamStore {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamStore {
        &mut self.params
    }
}
