pub mod nn_layers;
pub mod affine_layer;
pub mod affine_relu_layer;
pub mod activation;
pub mod normalization;
pub mod dropout_layer;
