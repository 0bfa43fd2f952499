use ndarray::{ArrayView1, Axis};
use crate::nn::batch_config::LnParam;
use crate::nn::generic_storage::ParamKey;
use crate::nn::layers::nn_layers::*;
use crate::nn::layers::normalization::{check_norm_params, init_norm_params};
use crate::utils::{Array1F, Array2F, F, GenericResult};

#[derive(Debug)]
pub struct LayerNormCache {
    normalized: Array2F,
    inv_std: Array1F,
    gamma: Array1F,
}

/// Normalizes every example (row) over its features, then applies `gamma * x + beta` per feature.
/// Training and test batches are handled the same way and no running statistics are kept.
pub fn layernorm_forward(inputs: &Array2F, gamma: ArrayView1<F>, beta: ArrayView1<F>, param: &LnParam) -> GenericResult<(Array2F, LayerNormCache)> {
    check_norm_params(inputs, gamma, beta)?;

    let mean = inputs.mean_axis(Axis(1)).ok_or_else(|| anyhow::anyhow!("Examples have no features"))?;
    let centered = inputs - &mean.insert_axis(Axis(1));
    let var = centered.mapv(|o| o * o).sum_axis(Axis(1)) / inputs.ncols() as F;

    let eps = param.eps;
    let inv_std = var.mapv_into(|o| 1.0 / (o + eps).sqrt());
    let normalized = centered * &inv_std.view().insert_axis(Axis(1));
    let out = &normalized * &gamma + &beta;

    Ok((out, LayerNormCache { normalized, inv_std, gamma: gamma.to_owned() }))
}

/// Returns the gradients with respect to the inputs, gamma and beta
pub fn layernorm_backward(grad: &Array2F, cache: LayerNormCache) -> GenericResult<(Array2F, Array1F, Array1F)> {
    let LayerNormCache { normalized, inv_std, gamma } = cache;
    anyhow::ensure!(
        grad.shape() == normalized.shape(),
        "Layer normalization gradient has shape {:?} but its output had shape {:?}", grad.shape(), normalized.shape()
    );

    let beta_grad = grad.sum_axis(Axis(0));
    let gamma_grad = (grad * &normalized).sum_axis(Axis(0));

    // Same closed form as batch normalization, transposed: statistics run over each row
    let d = grad.ncols() as F;
    let normalized_grad = grad * &gamma;
    let row_sum = normalized_grad.sum_axis(Axis(1)).insert_axis(Axis(1));
    let row_dot = (&normalized_grad * &normalized).sum_axis(Axis(1)).insert_axis(Axis(1));
    let scale = (inv_std / d).insert_axis(Axis(1));

    let inputs_grad = (normalized_grad * d - &row_sum - &(&normalized * &row_dot)) * &scale;
    Ok((inputs_grad, gamma_grad, beta_grad))
}

pub struct LayerNormLayer;

impl StepOps for LayerNormLayer {
    type Cache = LayerNormCache;

    fn init(data: InitData) -> EmptyLayerResult {
        init_norm_params(data)
    }

    fn forward(data: ForwardData) -> StepOutput<LayerNormCache> {
        let ForwardData { inputs, layer, params, ln_param, .. } = data;
        let gamma = params.vector(&ParamKey::gamma(layer))?;
        let beta = params.vector(&ParamKey::beta(layer))?;
        layernorm_forward(&inputs, gamma, beta, ln_param)
    }

    fn backward(cache: LayerNormCache, data: BackwardData) -> LayerResult {
        let BackwardData { grad, layer, grads, .. } = data;
        let (inputs_grad, gamma_grad, beta_grad) = layernorm_backward(&grad, cache)?;
        grads.insert(ParamKey::gamma(layer), gamma_grad.into_dyn());
        grads.insert(ParamKey::beta(layer), beta_grad.into_dyn());
        Ok(inputs_grad)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use ndarray_rand::rand::rngs::StdRng;
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Normal;
    use ndarray_rand::RandomExt;
    use crate::gradient_check::{eval_numerical_gradient, rel_error};
    use crate::utils::arrays_almost_equal;
    use super::*;

    #[test]
    fn test_forward_known_values() {
        let inputs: Array2F = array![[1.0, 3.0], [2.0, 10.0]];
        let param = LnParam { eps: 0.0 };
        let (out, _) = layernorm_forward(&inputs, array![1.0, 2.0].view(), array![0.5, 0.0].view(), &param).unwrap();

        let expected: Array2F = array![[-0.5, 2.0], [-0.5, 2.0]];
        assert!(arrays_almost_equal(&out, &expected));
    }

    #[test]
    fn test_rows_are_standardized() {
        let mut rng = StdRng::seed_from_u64(3);
        let inputs = Array2F::random_using((4, 30), Normal::new(5.0, 3.0).unwrap(), &mut rng);
        let (out, _) = layernorm_forward(&inputs, Array1F::ones(30).view(), Array1F::zeros(30).view(), &LnParam::default()).unwrap();

        let mean = out.mean_axis(Axis(1)).unwrap();
        let std = out.std_axis(Axis(1), 0.0);
        assert!(arrays_almost_equal(&mean, &Array1F::zeros(4)));
        assert!(arrays_almost_equal(&std, &Array1F::ones(4)));
    }

    #[test]
    fn test_numerical_gradient() {
        let mut rng = StdRng::seed_from_u64(9);
        let inputs = Array2F::random_using((4, 5), Normal::new(5.0, 3.0).unwrap(), &mut rng);
        let gamma = Array1F::random_using(5, Normal::new(1.0, 0.5).unwrap(), &mut rng);
        let beta = Array1F::random_using(5, Normal::new(0.0, 0.5).unwrap(), &mut rng);
        let grad = Array2F::random_using((4, 5), Normal::new(0.0, 1.0).unwrap(), &mut rng);
        let param = LnParam::default();

        let loss = |x: &Array2F, g: &Array1F, b: &Array1F| -> GenericResult<F> {
            Ok((layernorm_forward(x, g.view(), b.view(), &param)?.0 * &grad).sum())
        };

        let (_, cache) = layernorm_forward(&inputs, gamma.view(), beta.view(), &param).unwrap();
        let (inputs_grad, gamma_grad, beta_grad) = layernorm_backward(&grad, cache).unwrap();

        let num_inputs_grad = eval_numerical_gradient(|x| loss(x, &gamma, &beta), &inputs, 1e-5).unwrap();
        let num_gamma_grad = eval_numerical_gradient(|g| loss(&inputs, g, &beta), &gamma, 1e-5).unwrap();
        let num_beta_grad = eval_numerical_gradient(|b| loss(&inputs, &gamma, b), &beta, 1e-5).unwrap();

        assert!(rel_error(&inputs_grad, &num_inputs_grad) < 1e-5);
        assert!(rel_error(&gamma_grad, &num_gamma_grad) < 1e-5);
        assert!(rel_error(&beta_grad, &num_beta_grad) < 1e-5);
    }
}
