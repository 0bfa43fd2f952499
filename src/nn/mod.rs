pub mod layers;
pub mod batch_config;
pub mod loss;
pub mod generic_storage;
pub mod train_config;
pub mod classifier;
pub mod two_layer_net;
pub mod fc_net;

#[cfg(test)]
mod integration_testing;
