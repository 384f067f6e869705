// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Training and topology configuration loaded from TOML files or
//! constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! input_shape = [28, 28]
//! cost = "bce"
//!
//! [training]
//! epochs = 5
//! batch_size = 32
//! learning_rate = 0.1
//! seed = 42
//! partial_batch = "keep"
//!
//! [[layers]]
//! kind = "conv2d"
//! filters = 8
//! kernel_size = 3
//! padding = "same"
//!
//! [[layers]]
//! kind = "pool2d"
//! pool_size = 2
//! mode = "max"
//!
//! [[layers]]
//! kind = "dense"
//! neurons = 10
//!
//! [[layers]]
//! kind = "activation"
//! function = "sigmoid"
//! ```

use crate::layer::{Activation, Padding, PoolMode};
use crate::{CostFunction, Network, NetworkError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tensor_core::Shape;

/// What to do with the trailing samples that do not fill a whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialBatch {
    /// Train on them as a smaller final batch.
    #[default]
    Keep,
    /// Skip them for this epoch.
    Drop,
}

/// Hyper-parameters for [`Network::fit`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of passes over the training set.
    pub epochs: usize,
    /// Samples per gradient step.
    pub batch_size: usize,
    /// Gradient-descent step size.
    pub learning_rate: f32,
    /// Seed for [`rng`](TrainingConfig::rng); `None` draws from OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub partial_batch: PartialBatch,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            learning_rate: 0.1,
            seed: None,
            partial_batch: PartialBatch::Keep,
        }
    }
}

impl TrainingConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, NetworkError> {
        from_toml(&read(path)?)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, NetworkError> {
        from_toml(toml_str)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, NetworkError> {
        to_toml(self)
    }

    /// Checks that every hyper-parameter is usable.
    pub fn validate(&self) -> Result<(), NetworkError> {
        if self.epochs == 0 {
            return Err(NetworkError::config("epochs must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(NetworkError::config("batch_size must be at least 1"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(NetworkError::config(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// Returns the generator used for initialisation and shuffling.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// One entry of [`NetworkConfig::layers`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerDef {
    Dense {
        neurons: usize,
    },
    Activation {
        function: String,
    },
    Conv2d {
        filters: usize,
        kernel_size: usize,
        #[serde(default = "default_padding")]
        padding: String,
    },
    Pool2d {
        pool_size: usize,
        #[serde(default = "default_pool_mode")]
        mode: String,
    },
}

fn default_padding() -> String {
    "valid".to_string()
}

fn default_pool_mode() -> String {
    "max".to_string()
}

/// A complete network description: topology, cost and training settings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NetworkConfig {
    /// Per-sample input shape.
    pub input_shape: Shape,
    /// Cost function name: `"mse"` or `"bce"` (aliases accepted).
    pub cost: String,
    #[serde(default)]
    pub training: TrainingConfig,
    pub layers: Vec<LayerDef>,
}

impl NetworkConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, NetworkError> {
        from_toml(&read(path)?)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, NetworkError> {
        from_toml(toml_str)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, NetworkError> {
        to_toml(self)
    }

    /// Resolves the cost function name.
    pub fn cost_function(&self) -> Result<CostFunction, NetworkError> {
        CostFunction::from_str_loose(&self.cost).ok_or_else(|| {
            NetworkError::config(format!(
                "unknown cost '{}'; expected 'mse' or 'bce'",
                self.cost
            ))
        })
    }

    /// Builds the described network, drawing initial weights from `rng`.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network, NetworkError> {
        self.training.validate()?;
        let cost = self.cost_function()?;
        let mut builder = Network::builder(self.input_shape.clone());
        for def in &self.layers {
            builder = match def {
                LayerDef::Dense { neurons } => builder.dense(*neurons, rng),
                LayerDef::Activation { function } => {
                    let activation = Activation::from_str_loose(function).ok_or_else(|| {
                        NetworkError::config(format!(
                            "unknown activation '{function}'; expected 'sigmoid', 'relu' or 'leaky_relu'"
                        ))
                    })?;
                    builder.activation(activation)
                }
                LayerDef::Conv2d {
                    filters,
                    kernel_size,
                    padding,
                } => {
                    let padding = Padding::from_str_loose(padding).ok_or_else(|| {
                        NetworkError::config(format!(
                            "unknown padding '{padding}'; expected 'valid' or 'same'"
                        ))
                    })?;
                    builder.conv2d(*filters, *kernel_size, padding, rng)
                }
                LayerDef::Pool2d { pool_size, mode } => {
                    let mode = PoolMode::from_str_loose(mode).ok_or_else(|| {
                        NetworkError::config(format!(
                            "unknown pool mode '{mode}'; expected 'max' or 'average'"
                        ))
                    })?;
                    builder.pool2d(*pool_size, mode)
                }
            };
        }
        builder.build(cost)
    }
}

fn read(path: &Path) -> Result<String, NetworkError> {
    std::fs::read_to_string(path).map_err(|e| {
        NetworkError::config(format!("cannot read config '{}': {e}", path.display()))
    })
}

fn from_toml<T: serde::de::DeserializeOwned>(toml_str: &str) -> Result<T, NetworkError> {
    toml::from_str(toml_str).map_err(|e| NetworkError::config(format!("TOML parse error: {e}")))
}

fn to_toml<T: serde::Serialize>(value: &T) -> Result<String, NetworkError> {
    toml::to_string_pretty(value)
        .map_err(|e| NetworkError::config(format!("TOML serialise error: {e}")))
}
