// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for layer construction and training.

use tensor_core::TensorError;

/// Errors that can occur while building or training a network.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Invalid layer parameters, an inconsistent layer chain, bad
    /// hyper-parameters or an unreadable configuration file.
    #[error("configuration error: {0}")]
    Config(String),

    /// A tensor operation failed inside a layer or cost function.
    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),

    /// `backward` was called on a layer that has not run `forward`.
    #[error("layer '{layer}' has no cached forward pass")]
    MissingCache { layer: &'static str },

    /// Feature and label tensors disagree with each other or with the
    /// network's input and output shapes.
    #[error("invalid training data: {0}")]
    InvalidData(String),
}

impl NetworkError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
