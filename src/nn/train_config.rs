use std::fmt::{Display, Formatter};
use std::str::FromStr;
use crate::nn::batch_config::BnConfig;
use crate::utils::{F, GenericResult};

/// Normalization applied after the affine step of every hidden block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Normalization {
    #[default]
    None,
    BatchNorm,
    LayerNorm,
}

impl FromStr for Normalization {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Normalization::None),
            "batch" | "batchnorm" => Ok(Normalization::BatchNorm),
            "layer" | "layernorm" => Ok(Normalization::LayerNorm),
            other => Err(anyhow::anyhow!("Unknown normalization '{}'", other)),
        }
    }
}

impl Display for Normalization {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Normalization::None => "none",
            Normalization::BatchNorm => "batchnorm",
            Normalization::LayerNorm => "layernorm",
        };
        write!(f, "{}", name)
    }
}

/// Architecture and hyperparameters of a [`FullyConnectedNet`](crate::nn::fc_net::FullyConnectedNet)
#[derive(Clone, Debug)]
pub struct FcNetConfig {
    /// Size of each hidden layer
    pub hidden_dims: Vec<usize>,
    pub input_dim: usize,
    pub num_classes: usize,
    /// Probability of keeping an activation. 1 disables dropout entirely.
    pub dropout_keep: F,
    pub normalization: Normalization,
    pub bn_config: BnConfig,
    /// L2 regularization strength
    pub reg: F,
    /// Standard deviation of the initial weights
    pub weight_scale: F,
    /// Makes every dropout mask reproducible, which numeric gradient checks need
    pub seed: Option<u64>,
}

impl Default for FcNetConfig {
    fn default() -> Self {
        Self {
            hidden_dims: vec![100],
            input_dim: 3 * 32 * 32,
            num_classes: 10,
            dropout_keep: 1.0,
            normalization: Normalization::None,
            bn_config: BnConfig::default(),
            reg: 0.0,
            weight_scale: 1e-2,
            seed: None,
        }
    }
}

impl FcNetConfig {
    pub fn uses_dropout(&self) -> bool {
        self.dropout_keep != 1.0
    }

    pub fn validate(&self) -> GenericResult<()> {
        anyhow::ensure!(!self.hidden_dims.is_empty(), "At least one hidden layer is required");
        anyhow::ensure!(
            self.input_dim > 0 && self.num_classes > 0 && self.hidden_dims.iter().all(|&o| o > 0),
            "Layer sizes must be positive: input {}, hidden {:?}, classes {}", self.input_dim, self.hidden_dims, self.num_classes
        );
        anyhow::ensure!(
            self.dropout_keep > 0.0 && self.dropout_keep <= 1.0,
            "Dropout keep probability must be in (0, 1], got {}", self.dropout_keep
        );
        anyhow::ensure!(self.reg >= 0.0, "Regularization strength must be non-negative, got {}", self.reg);
        anyhow::ensure!(self.weight_scale >= 0.0, "Weight scale must be non-negative, got {}", self.weight_scale);
        anyhow::ensure!(self.bn_config.eps > 0.0, "Batch normalization epsilon must be positive");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.bn_config.momentum),
            "Batch normalization momentum must be in [0, 1], got {}", self.bn_config.momentum
        );
        Ok(())
    }
}
