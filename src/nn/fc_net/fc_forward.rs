use tracing::trace;
use crate::nn::fc_net::FullyConnectedNet;
use crate::nn::layers::nn_layers::*;
use crate::utils::{Array2F, GenericResult};

/// Caches of every step, grouped by block, in the order they ran
pub type NetCache = Vec<Vec<StepCache>>;

/// Runs every block in order. The mode of each step must already be set on the shared params.
/// Batch normalization steps update their running statistics here when training.
pub fn forward(net: &mut FullyConnectedNet, inputs: Array2F) -> GenericResult<(Array2F, NetCache)> {
    let FullyConnectedNet { blocks, params, bn_params, ln_param, dropout_param, .. } = net;

    let mut caches = Vec::with_capacity(blocks.len());
    let mut out = inputs;
    for (index, block) in blocks.iter().enumerate() {
        let mut block_caches = Vec::with_capacity(block.steps.len());
        for &step in block.steps.iter() {
            let bn_param = match step {
                Step::BatchNorm => bn_params.get_mut(index),
                _ => None,
            };
            let (result, cache) = forward_step(step, ForwardData {
                inputs: out,
                layer: block.layer,
                params,
                bn_param,
                ln_param,
                dropout_param: dropout_param.as_ref(),
            })?;
            out = result;
            block_caches.push(cache);
        }
        trace!("Block {} produced {:?}", block.layer, out.shape());
        caches.push(block_caches);
    }
    Ok((out, caches))
}
