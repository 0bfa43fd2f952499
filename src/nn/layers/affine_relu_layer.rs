//! Affine transform followed by a ReLU, fused into a single call for fixed topologies

use ndarray::{ArrayView1, ArrayView2};
use crate::nn::layers::activation::relu_layer::{relu_backward, relu_forward, ReluCache};
use crate::nn::layers::affine_layer::{affine_backward, affine_forward, AffineCache};
use crate::utils::{Array1F, Array2F, F, GenericResult};

#[derive(Debug)]
pub struct AffineReluCache {
    affine: AffineCache,
    relu: ReluCache,
}

pub fn affine_relu_forward(inputs: Array2F, weights: ArrayView2<F>, biases: ArrayView1<F>) -> GenericResult<(Array2F, AffineReluCache)> {
    let (scores, affine) = affine_forward(inputs, weights, biases)?;
    let (out, relu) = relu_forward(scores);
    Ok((out, AffineReluCache { affine, relu }))
}

pub fn affine_relu_backward(grad: Array2F, cache: AffineReluCache) -> GenericResult<(Array2F, Array2F, Array1F)> {
    let AffineReluCache { affine, relu } = cache;
    let grad = relu_backward(grad, relu)?;
    affine_backward(&grad, affine)
}
