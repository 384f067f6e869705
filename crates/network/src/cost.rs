// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Cost functions and their gradients.
//!
//! [`CostFunction::value`] reports the mean over every element of a batch.
//! [`CostFunction::derivative`] is the gradient of the *per-sample* mean
//! cost; layers divide their accumulated parameter gradients by the number
//! of samples seen, so the two together descend the batch-mean cost.

use crate::NetworkError;
use tensor_core::Tensor;

/// Outputs are clamped to `[EPSILON, 1 - EPSILON]` before taking logs.
const EPSILON: f32 = 1e-7;

/// Cost used to score network outputs against targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostFunction {
    /// `mean((out - target)^2)`.
    MeanSquaredError,
    /// `-mean(target * ln(out) + (1 - target) * ln(1 - out))`.
    BinaryCrossEntropy,
}

impl CostFunction {
    /// Parses a cost name, accepting common aliases (`"mse"`, `"bce"`,
    /// `"cross_entropy"`).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "mean_squared_error" | "mse" | "l2" => Some(Self::MeanSquaredError),
            "binary_cross_entropy" | "bce" | "cross_entropy" | "log_loss" => {
                Some(Self::BinaryCrossEntropy)
            }
            _ => None,
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MeanSquaredError => "mean_squared_error",
            Self::BinaryCrossEntropy => "binary_cross_entropy",
        }
    }

    /// Mean cost over every element of `output`.
    pub fn value(&self, output: &Tensor, target: &Tensor) -> Result<f32, NetworkError> {
        let per_element = match self {
            Self::MeanSquaredError => output.zip_map(target, |o, t| (o - t) * (o - t))?,
            Self::BinaryCrossEntropy => output.zip_map(target, |o, t| {
                let o = o.clamp(EPSILON, 1.0 - EPSILON);
                -(t * o.ln() + (1.0 - t) * (1.0 - o).ln())
            })?,
        };
        Ok(per_element.average())
    }

    /// Gradient of the per-sample mean cost with respect to `output`.
    ///
    /// `output` and `target` carry a leading batch axis; the result has the
    /// shape of `output`.
    pub fn derivative(&self, output: &Tensor, target: &Tensor) -> Result<Tensor, NetworkError> {
        let per_sample = (output.size() / output.dims()[0]).max(1) as f32;
        let grad = match self {
            Self::MeanSquaredError => {
                output.zip_map(target, |o, t| 2.0 * (o - t) / per_sample)?
            }
            Self::BinaryCrossEntropy => output.zip_map(target, |o, t| {
                let o = o.clamp(EPSILON, 1.0 - EPSILON);
                (o - t) / (o * (1.0 - o)) / per_sample
            })?,
        };
        Ok(grad)
    }
}

impl std::fmt::Display for CostFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
