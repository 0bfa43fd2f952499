use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use ndarray::{ArrayView1, ArrayView2, Ix1, Ix2};
use crate::utils::{ArrayDynF, F, GenericResult};

/// What a parameter does inside its layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamRole {
    Weights,
    Biases,
    /// Normalization scale
    Gamma,
    /// Normalization shift
    Beta,
}

/// Identifies a parameter by its 1-based layer index and role.
/// Displays as `W1`, `b1`, `gamma1` or `beta1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamKey {
    pub layer: usize,
    pub role: ParamRole,
}

impl ParamKey {
    pub fn weights(layer: usize) -> Self {
        Self { layer, role: ParamRole::Weights }
    }

    pub fn biases(layer: usize) -> Self {
        Self { layer, role: ParamRole::Biases }
    }

    pub fn gamma(layer: usize) -> Self {
        Self { layer, role: ParamRole::Gamma }
    }

    pub fn beta(layer: usize) -> Self {
        Self { layer, role: ParamRole::Beta }
    }
}

impl Display for ParamKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.role {
            ParamRole::Weights => "W",
            ParamRole::Biases => "b",
            ParamRole::Gamma => "gamma",
            ParamRole::Beta => "beta",
        };
        write!(f, "{}{}", prefix, self.layer)
    }
}

/// Centralized storage for trainable parameters, and for their gradients, which use the same keys.
/// Weights are stored as 2D arrays and every other role as 1D arrays.
#[derive(Clone, Debug, Default)]
pub struct ParamStore {
    values: HashMap<ParamKey, ArrayDynF>,
}

impl ParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ParamKey, value: ArrayDynF) -> Option<ArrayDynF> {
        self.values.insert(key, value)
    }

    pub fn get(&self, key: &ParamKey) -> Option<&ArrayDynF> {
        self.values.get(key)
    }

    pub fn get_mut(&mut self, key: &ParamKey) -> Option<&mut ArrayDynF> {
        self.values.get_mut(key)
    }

    pub fn contains(&self, key: &ParamKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys in layer order, weights before biases before gamma before beta
    pub fn keys(&self) -> Vec<ParamKey> {
        let mut keys: Vec<_> = self.values.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item=(&ParamKey, &ArrayDynF)> {
        self.values.iter()
    }

    fn require(&self, key: &ParamKey) -> GenericResult<&ArrayDynF> {
        self.values.get(key).ok_or_else(|| anyhow::anyhow!("Parameter {} is missing", key))
    }

    pub fn matrix(&self, key: &ParamKey) -> GenericResult<ArrayView2<F>> {
        Ok(self.require(key)?.view().into_dimensionality::<Ix2>()?)
    }

    pub fn vector(&self, key: &ParamKey) -> GenericResult<ArrayView1<F>> {
        Ok(self.require(key)?.view().into_dimensionality::<Ix1>()?)
    }
}
