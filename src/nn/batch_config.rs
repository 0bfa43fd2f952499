use crate::utils::{Array1F, F, GenericResult};

/// Whether the current batch is used for training or only for evaluation.
/// Batch normalization and dropout behave differently in each mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchMode {
    Train,
    Test,
}

impl BatchMode {
    pub fn is_training(&self) -> bool {
        matches!(self, BatchMode::Train)
    }
}

/// Hyperparameters of every batch normalization step
#[derive(Clone, Debug)]
pub struct BnConfig {
    pub eps: F,
    pub momentum: F,
}

impl Default for BnConfig {
    fn default() -> Self {
        Self {
            eps: 1e-5,
            momentum: 0.9,
        }
    }
}

/// State passed to a batch normalization step: the mode of the current batch and the running
/// statistics that test-time batches are normalized with
#[derive(Clone, Debug)]
pub struct BnParam {
    pub mode: BatchMode,
    pub eps: F,
    pub momentum: F,
    pub running_mean: Array1F,
    pub running_var: Array1F,
}

impl BnParam {
    pub fn new(features: usize, config: &BnConfig) -> Self {
        Self {
            mode: BatchMode::Train,
            eps: config.eps,
            momentum: config.momentum,
            running_mean: Array1F::zeros(features),
            running_var: Array1F::zeros(features),
        }
    }
}

/// Layer normalization does not depend on the batch, so it only needs its epsilon
#[derive(Clone, Debug)]
pub struct LnParam {
    pub eps: F,
}

impl Default for LnParam {
    fn default() -> Self {
        Self { eps: 1e-5 }
    }
}

/// Shared by every dropout step of a network
#[derive(Clone, Debug)]
pub struct DropoutParam {
    pub mode: BatchMode,
    /// Probability of keeping each activation
    pub keep: F,
    /// When set, every train-mode call draws the same mask for the same input shape
    pub seed: Option<u64>,
}

impl DropoutParam {
    pub fn new(keep: F, seed: Option<u64>) -> GenericResult<Self> {
        anyhow::ensure!(
            keep > 0.0 && keep <= 1.0,
            "Dropout keep probability must be in (0, 1], got {}", keep
        );
        Ok(Self {
            mode: BatchMode::Train,
            keep,
            seed,
        })
    }
}
