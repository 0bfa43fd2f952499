use crate::nn::fc_net::fc_forward::NetCache;
use crate::nn::fc_net::FullyConnectedNet;
use crate::nn::generic_storage::ParamStore;
use crate::nn::layers::nn_layers::*;
use crate::utils::{Array2F, GenericResult};

/// Propagates the scores' gradient back through every block, consuming the caches in reverse.
/// Weight gradients include the `reg * W` term; the gradient of the inputs is discarded.
pub fn backward(net: &FullyConnectedNet, scores_grad: Array2F, caches: NetCache) -> GenericResult<ParamStore> {
    anyhow::ensure!(
        caches.len() == net.blocks.len(),
        "Expected caches for {} blocks but got {}", net.blocks.len(), caches.len()
    );

    let mut grads = ParamStore::new();
    let mut grad = scores_grad;
    for (block, block_caches) in net.blocks.iter().zip(caches).rev() {
        for cache in block_caches.into_iter().rev() {
            grad = backward_step(cache, BackwardData {
                grad,
                layer: block.layer,
                reg: net.config.reg,
                params: &net.params,
                grads: &mut grads,
            })?;
        }
    }
    Ok(grads)
}
