use ndarray::{ArrayView1, ArrayView2, Axis};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use crate::nn::generic_storage::ParamKey;
use crate::nn::layers::nn_layers::*;
use crate::utils::{Array1F, Array2F, F, GenericResult};

#[derive(Debug)]
pub struct AffineCache {
    inputs: Array2F,
    weights: Array2F,
}

/// Computes `inputs . weights + biases`.
/// * `inputs`: (N, D)
/// * `weights`: (D, M)
/// * `biases`: (M,)
pub fn affine_forward(inputs: Array2F, weights: ArrayView2<F>, biases: ArrayView1<F>) -> GenericResult<(Array2F, AffineCache)> {
    anyhow::ensure!(
        inputs.ncols() == weights.nrows(),
        "Affine inputs have {} features but weights have shape {:?}", inputs.ncols(), weights.shape()
    );
    anyhow::ensure!(
        biases.len() == weights.ncols(),
        "Affine biases have length {} but weights have shape {:?}", biases.len(), weights.shape()
    );

    let out = inputs.dot(&weights) + &biases;
    Ok((out, AffineCache { inputs, weights: weights.to_owned() }))
}

/// Returns the gradients with respect to the inputs, the weights and the biases, in that order
pub fn affine_backward(grad: &Array2F, cache: AffineCache) -> GenericResult<(Array2F, Array2F, Array1F)> {
    let AffineCache { inputs, weights } = cache;
    anyhow::ensure!(
        grad.dim() == (inputs.nrows(), weights.ncols()),
        "Affine gradient has shape {:?} but the output had shape {:?}", grad.shape(), (inputs.nrows(), weights.ncols())
    );

    let inputs_grad = grad.dot(&weights.t());
    let weights_grad = inputs.t().dot(grad);
    let biases_grad = grad.sum_axis(Axis(0));
    Ok((inputs_grad, weights_grad, biases_grad))
}

pub struct AffineLayer;

impl StepOps for AffineLayer {
    type Cache = AffineCache;

    /// Weights are drawn from a zero-mean gaussian with `weight_scale` as standard deviation, biases start at zero
    fn init(data: InitData) -> EmptyLayerResult {
        let InitData { params, layer, in_values, out_values, weight_scale, rng } = data;
        let dist = Normal::new(0.0, weight_scale)?;
        let weights = Array2F::random_using((in_values, out_values), dist, rng);
        let biases = Array1F::zeros(out_values);

        params.insert(ParamKey::weights(layer), weights.into_dyn());
        params.insert(ParamKey::biases(layer), biases.into_dyn());
        Ok(())
    }

    fn forward(data: ForwardData) -> StepOutput<AffineCache> {
        let ForwardData { inputs, layer, params, .. } = data;
        let weights = params.matrix(&ParamKey::weights(layer))?;
        let biases = params.vector(&ParamKey::biases(layer))?;
        affine_forward(inputs, weights, biases)
    }

    /// Adds `reg * W` to the weights' gradient. Biases are never regularized.
    fn backward(cache: AffineCache, data: BackwardData) -> LayerResult {
        let BackwardData { grad, layer, reg, params, grads } = data;
        let (inputs_grad, mut weights_grad, biases_grad) = affine_backward(&grad, cache)?;

        weights_grad.scaled_add(reg, &params.matrix(&ParamKey::weights(layer))?);
        grads.insert(ParamKey::weights(layer), weights_grad.into_dyn());
        grads.insert(ParamKey::biases(layer), biases_grad.into_dyn());
        Ok(inputs_grad)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use ndarray_rand::rand::rngs::StdRng;
    use ndarray_rand::rand::SeedableRng;
    use crate::gradient_check::{eval_numerical_gradient, rel_error};
    use crate::nn::generic_storage::ParamStore;
    use crate::utils::arrays_almost_equal;
    use super::*;

    fn get_inputs() -> (Array2F, Array2F, Array1F) {
        let inputs: Array2F = array![[0.9, 0.7, 0.0, 0.5, 0.6], [0.3, 0.2, 0.6, 0.8, 0.2]];
        let weights: Array2F = array![
            [0.9, 0.5, 0.4],
            [0.9, 0.6, 0.6],
            [0.2, 0.3, 0.3],
            [0.7, 0.0, 0.9],
            [0.3, 0.1, 0.3]
        ];
        let biases: Array1F = array![0.8, 0.1, 0.9];
        (inputs, weights, biases)
    }

    #[test]
    fn test_forward() {
        let (inputs, weights, biases) = get_inputs();
        let expected: Array2F = array![[2.77, 1.03, 2.31], [1.99, 0.57, 2.1]];
        let (result, _) = affine_forward(inputs, weights.view(), biases.view()).unwrap();
        assert!(arrays_almost_equal(&result, &expected));
    }

    #[test]
    fn test_backward() {
        let (inputs, weights, biases) = get_inputs();
        let grad: Array2F = array![[-2.37, -0.43, -2.11], [-1.79, -0.37, -1.8]];
        let (_, cache) = affine_forward(inputs.clone(), weights.view(), biases.view()).unwrap();
        let (inputs_grad, weights_grad, biases_grad) = affine_backward(&grad, cache).unwrap();

        let expected_inputs_grad: Array2F = array![
            [-3.192, -3.657, -1.236, -3.558, -1.387],
            [-2.516, -2.913, -1.009, -2.873, -1.114]
        ];
        let expected_biases_grad: Array1F = array![-4.16, -0.8, -3.91];
        assert!(arrays_almost_equal(&inputs_grad, &expected_inputs_grad));
        assert!(arrays_almost_equal(&weights_grad, &inputs.t().dot(&grad)));
        assert!(arrays_almost_equal(&biases_grad, &expected_biases_grad));
    }

    #[test]
    fn test_numerical_gradient() {
        let (inputs, weights, biases) = get_inputs();
        let grad: Array2F = array![[0.3, -1.2, 0.5], [0.1, 0.4, -0.7]];
        let (_, cache) = affine_forward(inputs.clone(), weights.view(), biases.view()).unwrap();
        let (inputs_grad, weights_grad, _) = affine_backward(&grad, cache).unwrap();

        let num_inputs_grad = eval_numerical_gradient(
            |x| Ok((affine_forward(x.clone(), weights.view(), biases.view())?.0 * &grad).sum()),
            &inputs,
            1e-5,
        ).unwrap();
        let num_weights_grad = eval_numerical_gradient(
            |w| Ok((affine_forward(inputs.clone(), w.view(), biases.view())?.0 * &grad).sum()),
            &weights,
            1e-5,
        ).unwrap();
        assert!(rel_error(&inputs_grad, &num_inputs_grad) < 1e-7);
        assert!(rel_error(&weights_grad, &num_weights_grad) < 1e-7);
    }

    #[test]
    fn test_shape_mismatch() {
        let (inputs, weights, biases) = get_inputs();
        assert!(affine_forward(inputs.t().to_owned(), weights.view(), biases.view()).is_err());
        assert!(affine_forward(inputs, weights.view(), array![1.0].view()).is_err());
    }

    #[test]
    fn test_init_shapes() {
        let mut params = ParamStore::new();
        let mut rng = StdRng::seed_from_u64(0);
        AffineLayer::init(InitData {
            params: &mut params,
            layer: 2,
            in_values: 4,
            out_values: 3,
            weight_scale: 1e-2,
            rng: &mut rng,
        }).unwrap();

        assert_eq!(params.matrix(&ParamKey::weights(2)).unwrap().shape(), &[4, 3]);
        assert!(params.vector(&ParamKey::biases(2)).unwrap().iter().all(|&o| o == 0.0));
        assert!(params.matrix(&ParamKey::weights(2)).unwrap().iter().all(|o| o.abs() < 0.1));
    }
}
