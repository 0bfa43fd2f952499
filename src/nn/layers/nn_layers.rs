use ndarray_rand::rand::rngs::StdRng;
use crate::nn::batch_config::{BnParam, DropoutParam, LnParam};
use crate::nn::generic_storage::ParamStore;
use crate::nn::layers::activation::relu_layer::{ReluCache, ReluLayer};
use crate::nn::layers::affine_layer::{AffineCache, AffineLayer};
use crate::nn::layers::dropout_layer::{DropoutCache, DropoutLayer};
use crate::nn::layers::normalization::batchnorm_layer::{BatchNormCache, BatchNormLayer};
use crate::nn::layers::normalization::layernorm_layer::{LayerNormCache, LayerNormLayer};
use crate::utils::{Array2F, F, GenericResult};

/// One operation of a block. A hidden block is always some prefix-preserving subset of
/// `Affine -> BatchNorm | LayerNorm -> Relu -> Dropout`, and the output block is a single `Affine`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Matrix multiplication with the block's weights, plus its biases.
    /// ### Trainable
    /// * Weights
    /// * Biases
    Affine,

    /// Normalizes each feature over the batch, then scales and shifts it.
    /// Uses batch statistics while training and running statistics otherwise.
    /// ### Trainable
    /// * Gamma
    /// * Beta
    BatchNorm,

    /// Normalizes each example over its features, then scales and shifts it.
    /// ### Trainable
    /// * Gamma
    /// * Beta
    LayerNorm,

    /// Rectified Linear Unit: `max(x, 0)`
    Relu,

    /// Randomly nullifies activations while training and rescales the kept ones.
    Dropout,
}

/// Values saved by a forward step for its backward step, tagged by the kind of step that made them
#[derive(Debug)]
pub enum StepCache {
    Affine(AffineCache),
    BatchNorm(BatchNormCache),
    LayerNorm(LayerNormCache),
    Relu(ReluCache),
    Dropout(DropoutCache),
}

/// A numbered block of steps. Block `layer` owns the parameters keyed with that index.
#[derive(Clone, Debug)]
pub struct Block {
    pub layer: usize,
    pub in_values: usize,
    pub out_values: usize,
    pub steps: Vec<Step>,
}

pub struct InitData<'a> {
    pub params: &'a mut ParamStore,
    pub layer: usize,
    pub in_values: usize,
    pub out_values: usize,
    pub weight_scale: F,
    pub rng: &'a mut StdRng,
}

pub struct ForwardData<'a> {
    pub inputs: Array2F,
    pub layer: usize,
    pub params: &'a ParamStore,
    pub bn_param: Option<&'a mut BnParam>,
    pub ln_param: &'a LnParam,
    pub dropout_param: Option<&'a DropoutParam>,
}

pub struct BackwardData<'a> {
    pub grad: Array2F,
    pub layer: usize,
    /// Strength of the L2 penalty `0.5 * reg * sum(W^2)` on weights
    pub reg: F,
    pub params: &'a ParamStore,
    pub grads: &'a mut ParamStore,
}

pub type EmptyLayerResult = GenericResult<()>;
pub type LayerResult = GenericResult<Array2F>;
pub type StepOutput<C> = GenericResult<(Array2F, C)>;

pub trait StepOps {
    type Cache;

    fn init(_data: InitData) -> EmptyLayerResult { Ok(()) }

    fn forward(data: ForwardData) -> StepOutput<Self::Cache>;

    fn backward(cache: Self::Cache, data: BackwardData) -> LayerResult;
}

/// Call **init** in the appropriate layer. Not intended to be called directly.
pub fn init_step(step: Step, data: InitData) -> EmptyLayerResult {
    use Step::*;
    match step {
        Affine => AffineLayer::init(data),
        BatchNorm => BatchNormLayer::init(data),
        LayerNorm => LayerNormLayer::init(data),
        Relu => ReluLayer::init(data),
        Dropout => DropoutLayer::init(data),
    }
}

/// Call **forward** in the appropriate layer and tag its cache. Not intended to be called directly.
pub fn forward_step(step: Step, data: ForwardData) -> StepOutput<StepCache> {
    use Step::*;
    Ok(match step {
        Affine => {
            let (out, cache) = AffineLayer::forward(data)?;
            (out, StepCache::Affine(cache))
        }
        BatchNorm => {
            let (out, cache) = BatchNormLayer::forward(data)?;
            (out, StepCache::BatchNorm(cache))
        }
        LayerNorm => {
            let (out, cache) = LayerNormLayer::forward(data)?;
            (out, StepCache::LayerNorm(cache))
        }
        Relu => {
            let (out, cache) = ReluLayer::forward(data)?;
            (out, StepCache::Relu(cache))
        }
        Dropout => {
            let (out, cache) = DropoutLayer::forward(data)?;
            (out, StepCache::Dropout(cache))
        }
    })
}

/// Call **backward** in the layer that produced `cache`. Not intended to be called directly.
pub fn backward_step(cache: StepCache, data: BackwardData) -> LayerResult {
    match cache {
        StepCache::Affine(c) => AffineLayer::backward(c, data),
        StepCache::BatchNorm(c) => BatchNormLayer::backward(c, data),
        StepCache::LayerNorm(c) => LayerNormLayer::backward(c, data),
        StepCache::Relu(c) => ReluLayer::backward(c, data),
        StepCache::Dropout(c) => DropoutLayer::backward(c, data),
    }
}
