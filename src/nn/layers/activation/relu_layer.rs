use crate::nn::layers::nn_layers::*;
use crate::utils::{Array2F, GenericResult};

#[derive(Debug)]
pub struct ReluCache {
    inputs: Array2F,
}

/// * For x > 0: x
/// * Otherwise: 0
pub fn relu_forward(inputs: Array2F) -> (Array2F, ReluCache) {
    let out = inputs.mapv(|o| if o > 0.0 { o } else { 0.0 });
    (out, ReluCache { inputs })
}

/// The gradient only flows through the inputs that were positive
pub fn relu_backward(grad: Array2F, cache: ReluCache) -> GenericResult<Array2F> {
    anyhow::ensure!(
        grad.shape() == cache.inputs.shape(),
        "ReLU gradient has shape {:?} but its inputs had shape {:?}", grad.shape(), cache.inputs.shape()
    );
    Ok(grad * cache.inputs.mapv_into(|o| if o > 0.0 { 1.0 } else { 0.0 }))
}

pub struct ReluLayer;

impl StepOps for ReluLayer {
    type Cache = ReluCache;

    fn forward(data: ForwardData) -> StepOutput<ReluCache> {
        Ok(relu_forward(data.inputs))
    }

    fn backward(cache: ReluCache, data: BackwardData) -> LayerResult {
        relu_backward(data.grad, cache)
    }
}
