use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use crate::nn::batch_config::DropoutParam;
use crate::nn::layers::nn_layers::*;
use crate::utils::{Array2F, GenericResult};

/// Holds the scaled mask when the forward step ran in training mode
#[derive(Debug)]
pub struct DropoutCache {
    mask: Option<Array2F>,
}

/// Inverted dropout: while training, each value is kept with probability `param.keep` and the kept
/// values are divided by it, so nothing has to change at test time, when the inputs pass unchanged.
pub fn dropout_forward(inputs: Array2F, param: &DropoutParam) -> (Array2F, DropoutCache) {
    if !param.mode.is_training() {
        return (inputs, DropoutCache { mask: None });
    }

    let keep = param.keep;
    let dist = Uniform::new(0.0, 1.0);
    let random = match param.seed {
        Some(seed) => Array2F::random_using(inputs.raw_dim(), dist, &mut StdRng::seed_from_u64(seed)),
        None => Array2F::random(inputs.raw_dim(), dist),
    };
    let mask = random.mapv_into(|o| if o < keep { 1.0 / keep } else { 0.0 });

    let result = inputs * &mask;
    (result, DropoutCache { mask: Some(mask) })
}

pub fn dropout_backward(grad: Array2F, cache: DropoutCache) -> GenericResult<Array2F> {
    match cache.mask {
        Some(mask) => {
            anyhow::ensure!(
                grad.shape() == mask.shape(),
                "Dropout gradient has shape {:?} but the mask has shape {:?}", grad.shape(), mask.shape()
            );
            Ok(grad * &mask)
        }
        None => Ok(grad),
    }
}

pub struct DropoutLayer;

impl StepOps for DropoutLayer {
    type Cache = DropoutCache;

    fn forward(data: ForwardData) -> StepOutput<DropoutCache> {
        let ForwardData { inputs, dropout_param, .. } = data;
        let param = dropout_param.ok_or_else(|| anyhow::anyhow!("Dropout step without a dropout configuration"))?;
        Ok(dropout_forward(inputs, param))
    }

    fn backward(cache: DropoutCache, data: BackwardData) -> LayerResult {
        dropout_backward(data.grad, cache)
    }
}
