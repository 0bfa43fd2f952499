pub mod batchnorm_layer;
pub mod layernorm_layer;

use ndarray::ArrayView1;
use crate::nn::generic_storage::ParamKey;
use crate::nn::layers::nn_layers::{EmptyLayerResult, InitData};
use crate::utils::{Array1F, Array2F, F, GenericResult};

/// Gamma starts at one and beta at zero, so a fresh normalization step only standardizes
fn init_norm_params(data: InitData) -> EmptyLayerResult {
    let InitData { params, layer, out_values, .. } = data;
    params.insert(ParamKey::gamma(layer), Array1F::ones(out_values).into_dyn());
    params.insert(ParamKey::beta(layer), Array1F::zeros(out_values).into_dyn());
    Ok(())
}

fn check_norm_params(inputs: &Array2F, gamma: ArrayView1<F>, beta: ArrayView1<F>) -> GenericResult<()> {
    anyhow::ensure!(
        gamma.len() == inputs.ncols() && beta.len() == inputs.ncols(),
        "Inputs have {} features but gamma has {} and beta has {}", inputs.ncols(), gamma.len(), beta.len()
    );
    Ok(())
}
