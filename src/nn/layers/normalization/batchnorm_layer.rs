use ndarray::{ArrayView1, Axis};
use crate::nn::batch_config::{BatchMode, BnParam};
use crate::nn::generic_storage::ParamKey;
use crate::nn::layers::nn_layers::*;
use crate::nn::layers::normalization::{check_norm_params, init_norm_params};
use crate::utils::{Array1F, Array2F, F, GenericResult};

#[derive(Debug)]
pub struct BatchNormCache {
    mode: BatchMode,
    normalized: Array2F,
    centered: Array2F,
    inv_std: Array1F,
    gamma: Array1F,
}

/// Normalizes every feature (column) to zero mean and unit variance, then applies
/// `gamma * x + beta`.
///
/// In training mode the statistics come from the batch, with the biased variance, and the running
/// statistics in `param` move towards them by `1 - momentum`. In test mode the running statistics
/// are used and left untouched.
pub fn batchnorm_forward(inputs: &Array2F, gamma: ArrayView1<F>, beta: ArrayView1<F>, param: &mut BnParam) -> GenericResult<(Array2F, BatchNormCache)> {
    check_norm_params(inputs, gamma, beta)?;
    anyhow::ensure!(
        param.running_mean.len() == inputs.ncols(),
        "Running statistics have {} features but inputs have {}", param.running_mean.len(), inputs.ncols()
    );

    let (centered, var) = match param.mode {
        BatchMode::Train => {
            let mean = inputs.mean_axis(Axis(0)).ok_or_else(|| anyhow::anyhow!("Batch is empty"))?;
            let centered = inputs - &mean;
            let var = centered.mapv(|o| o * o).sum_axis(Axis(0)) / inputs.nrows() as F;

            let momentum = param.momentum;
            param.running_mean = &param.running_mean * momentum + &(&mean * (1.0 - momentum));
            param.running_var = &param.running_var * momentum + &(&var * (1.0 - momentum));
            (centered, var)
        }
        BatchMode::Test => (inputs - &param.running_mean, param.running_var.clone()),
    };

    let eps = param.eps;
    let inv_std = var.mapv_into(|o| 1.0 / (o + eps).sqrt());
    let normalized = &centered * &inv_std;
    let out = &normalized * &gamma + &beta;

    Ok((out, BatchNormCache {
        mode: param.mode,
        normalized,
        centered,
        inv_std,
        gamma: gamma.to_owned(),
    }))
}

fn check_grad(grad: &Array2F, cache: &BatchNormCache) -> GenericResult<()> {
    anyhow::ensure!(
        grad.shape() == cache.normalized.shape(),
        "Batch normalization gradient has shape {:?} but its output had shape {:?}", grad.shape(), cache.normalized.shape()
    );
    Ok(())
}

/// Backward pass that follows the computational graph one node at a time.
/// Returns the gradients with respect to the inputs, gamma and beta.
pub fn batchnorm_backward(grad: &Array2F, cache: BatchNormCache) -> GenericResult<(Array2F, Array1F, Array1F)> {
    check_grad(grad, &cache)?;
    let BatchNormCache { mode, normalized, centered, inv_std, gamma } = cache;

    let beta_grad = grad.sum_axis(Axis(0));
    let gamma_grad = (grad * &normalized).sum_axis(Axis(0));
    let normalized_grad = grad * &gamma;

    if mode == BatchMode::Test {
        return Ok((normalized_grad * &inv_std, gamma_grad, beta_grad));
    }

    let n = grad.nrows() as F;
    // d(1 / sqrt(var + eps)) / d(var) = -0.5 * inv_std^3
    let var_grad = (&normalized_grad * &centered).sum_axis(Axis(0)) * &inv_std.mapv(|o| -0.5 * o.powi(3));
    let mean_grad = (&normalized_grad * &inv_std).sum_axis(Axis(0)).mapv_into(|o| -o)
        + &(&var_grad * &(centered.sum_axis(Axis(0)) * (-2.0 / n)));

    let inputs_grad = &normalized_grad * &inv_std
        + &(&centered * &(&var_grad * (2.0 / n)))
        + &(mean_grad / n);
    Ok((inputs_grad, gamma_grad, beta_grad))
}

/// Same result as [`batchnorm_backward`], with the inputs' gradient simplified on paper to
/// `gamma * inv_std / N * (N * dout - sum(dout) - x_hat * sum(dout * x_hat))`
pub fn batchnorm_backward_alt(grad: &Array2F, cache: BatchNormCache) -> GenericResult<(Array2F, Array1F, Array1F)> {
    check_grad(grad, &cache)?;
    let BatchNormCache { mode, normalized, inv_std, gamma, .. } = cache;

    let beta_grad = grad.sum_axis(Axis(0));
    let gamma_grad = (grad * &normalized).sum_axis(Axis(0));
    let scale = &gamma * &inv_std;

    if mode == BatchMode::Test {
        return Ok((grad * &scale, gamma_grad, beta_grad));
    }

    let n = grad.nrows() as F;
    let inputs_grad = (grad * n - &beta_grad - &(&normalized * &gamma_grad)) * &(scale / n);
    Ok((inputs_grad, gamma_grad, beta_grad))
}

pub struct BatchNormLayer;

impl StepOps for BatchNormLayer {
    type Cache = BatchNormCache;

    fn init(data: InitData) -> EmptyLayerResult {
        init_norm_params(data)
    }

    fn forward(data: ForwardData) -> StepOutput<BatchNormCache> {
        let ForwardData { inputs, layer, params, bn_param, .. } = data;
        let param = bn_param.ok_or_else(|| anyhow::anyhow!("Batch normalization step {} has no running statistics", layer))?;
        let gamma = params.vector(&ParamKey::gamma(layer))?;
        let beta = params.vector(&ParamKey::beta(layer))?;
        batchnorm_forward(&inputs, gamma, beta, param)
    }

    fn backward(cache: BatchNormCache, data: BackwardData) -> LayerResult {
        let BackwardData { grad, layer, grads, .. } = data;
        let (inputs_grad, gamma_grad, beta_grad) = batchnorm_backward_alt(&grad, cache)?;
        grads.insert(ParamKey::gamma(layer), gamma_grad.into_dyn());
        grads.insert(ParamKey::beta(layer), beta_grad.into_dyn());
        Ok(inputs_grad)
    }
}
