// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`Layer`] trait and layer implementations.
//!
//! Every layer works on batched tensors: the leading axis indexes samples
//! and the remaining axes must equal the layer's per-sample
//! [`input_shape`](Layer::input_shape).
//!
//! Training follows a fixed protocol per batch:
//! 1. [`reset_accumulated_gradient`](Layer::reset_accumulated_gradient)
//! 2. [`forward`](Layer::forward), caching what backward needs
//! 3. [`backward`](Layer::backward), accumulating parameter gradients and
//!    returning the gradient for the previous layer
//! 4. [`update_parameters`](Layer::update_parameters)
//!
//! [`infer`](Layer::infer) computes the same output as `forward` without
//! touching any cache, so predictions never disturb an ongoing training step.

pub mod activation;
pub mod conv2d;
pub mod dense;
pub mod pool2d;

pub use activation::{Activation, ActivationLayer, CustomActivation};
pub use conv2d::{Conv2D, Padding};
pub use dense::Dense;
pub use pool2d::{Pool2D, PoolMode};

use crate::NetworkError;
use tensor_core::{Shape, Tensor, TensorError};

/// A differentiable stage of a feed-forward network.
pub trait Layer: std::fmt::Debug {
    /// Short lowercase name of the layer type (e.g. `"dense"`).
    fn kind(&self) -> &'static str;

    /// Per-sample input shape, batch axis excluded.
    fn input_shape(&self) -> &Shape;

    /// Per-sample output shape, batch axis excluded.
    fn output_shape(&self) -> &Shape;

    /// Computes the batched output and caches what `backward` needs.
    fn forward(&mut self, x: &Tensor) -> Result<Tensor, NetworkError>;

    /// Computes the batched output without modifying the layer.
    fn infer(&self, x: &Tensor) -> Result<Tensor, NetworkError>;

    /// Given the gradient of the cost with respect to this layer's last
    /// output, accumulates parameter gradients and returns the gradient with
    /// respect to its last input. Parameters are left untouched.
    fn backward(&mut self, dy: &Tensor) -> Result<Tensor, NetworkError>;

    /// Applies one gradient-descent step using the accumulated gradients,
    /// averaged over the samples seen since the last reset.
    fn update_parameters(&mut self, _learning_rate: f32) {}

    /// Clears accumulated gradients and the sample counter.
    fn reset_accumulated_gradient(&mut self) {}

    /// Number of trainable scalars.
    fn parameter_count(&self) -> usize {
        0
    }

    /// One-line description used by [`Network::summary`](crate::Network::summary).
    fn describe(&self) -> String {
        format!(
            "{:<10} in (*, {}) out (*, {}) params {}",
            self.kind(),
            join_dims(self.input_shape()),
            join_dims(self.output_shape()),
            self.parameter_count()
        )
    }
}

fn join_dims(shape: &Shape) -> String {
    shape
        .dims()
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Checks that `x` is a batch of `per_sample`-shaped samples and returns the
/// batch size.
pub(crate) fn batch_size(
    op: &'static str,
    x: &Tensor,
    per_sample: &Shape,
) -> Result<usize, NetworkError> {
    if x.rank() == per_sample.rank() + 1 && &x.dims()[1..] == per_sample.dims() {
        Ok(x.dims()[0])
    } else {
        Err(TensorError::ShapeMismatch {
            op,
            lhs: x.shape().clone(),
            rhs: per_sample.with_leading(x.dims()[0]),
        }
        .into())
    }
}

/// In-place `param -= step * grad`.
pub(crate) fn descend(param: &mut Tensor, grad: &Tensor, step: f32) {
    for (p, g) in param.data_mut().iter_mut().zip(grad.data()) {
        *p -= step * g;
    }
}
