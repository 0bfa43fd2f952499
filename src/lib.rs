//! Linear and fully-connected image classifiers with hand-written backward passes:
//! a multiclass SVM loss, a two-layer network and a fully-connected network with optional
//! batch/layer normalization and dropout.

pub mod utils;
pub mod gradient_check;
pub mod svm;
pub mod nn;

pub use nn::classifier::{Classifier, NetOutput};
pub use nn::fc_net::FullyConnectedNet;
pub use nn::generic_storage::{ParamKey, ParamStore};
pub use nn::train_config::{FcNetConfig, Normalization};
pub use nn::two_layer_net::TwoLayerNet;
