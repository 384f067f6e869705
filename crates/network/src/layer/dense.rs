// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fully connected layer.

use super::{batch_size, descend, Layer};
use crate::NetworkError;
use rand::Rng;
use tensor_core::{Shape, Tensor, TensorError};

/// Fully connected layer: `y = flatten(x) · W + b`.
///
/// Inputs of any per-sample rank are flattened, so a dense layer can follow
/// a convolution or pooling stage directly.
#[derive(Debug, Clone)]
pub struct Dense {
    input_shape: Shape,
    output_shape: Shape,
    /// `[in_size, neurons]`.
    weights: Tensor,
    /// `[neurons]`.
    biases: Tensor,
    weight_grad: Tensor,
    bias_grad: Tensor,
    samples: usize,
    cached_input: Option<Tensor>,
}

impl Dense {
    /// Creates a dense layer with Xavier-uniform weights and zero biases.
    ///
    /// # Errors
    /// Returns [`NetworkError::Config`] if `neurons` is zero.
    pub fn new<R: Rng + ?Sized>(
        input_shape: impl Into<Shape>,
        neurons: usize,
        rng: &mut R,
    ) -> Result<Self, NetworkError> {
        if neurons == 0 {
            return Err(NetworkError::config("dense layer needs at least one neuron"));
        }
        let input_shape = input_shape.into();
        let fan_in = input_shape.num_elements();
        let limit = (6.0 / (fan_in + neurons) as f32).sqrt();
        let weights = Tensor::uniform([fan_in, neurons], -limit, limit, rng)?;
        tracing::debug!("dense {input_shape} -> [{neurons}], xavier limit {limit:.4}");

        Ok(Self {
            input_shape,
            output_shape: Shape::vector(neurons),
            weight_grad: Tensor::zeros([fan_in, neurons])?,
            bias_grad: Tensor::zeros([neurons])?,
            weights,
            biases: Tensor::zeros([neurons])?,
            samples: 0,
            cached_input: None,
        })
    }

    /// Replaces the weight matrix; `weights` must be `[in_size, neurons]`.
    pub fn set_weights(&mut self, weights: Tensor) -> Result<(), NetworkError> {
        Self::check_same_shape("set_weights", &self.weights, &weights)?;
        self.weights = weights;
        Ok(())
    }

    /// Replaces the bias vector; `biases` must be `[neurons]`.
    pub fn set_biases(&mut self, biases: Tensor) -> Result<(), NetworkError> {
        Self::check_same_shape("set_biases", &self.biases, &biases)?;
        self.biases = biases;
        Ok(())
    }

    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    pub fn biases(&self) -> &Tensor {
        &self.biases
    }

    /// Number of samples whose gradients are currently accumulated.
    pub fn accumulated_samples(&self) -> usize {
        self.samples
    }

    fn check_same_shape(op: &'static str, current: &Tensor, new: &Tensor) -> Result<(), NetworkError> {
        if current.shape() == new.shape() {
            Ok(())
        } else {
            Err(TensorError::ShapeMismatch {
                op,
                lhs: current.shape().clone(),
                rhs: new.shape().clone(),
            }
            .into())
        }
    }

    /// Returns the flattened `[batch, in_size]` input and the output.
    fn compute(&self, x: &Tensor) -> Result<(Tensor, Tensor), NetworkError> {
        let batch = batch_size("dense forward", x, &self.input_shape)?;
        let flat = x.reshape([batch, self.weights.dims()[0]])?;
        let y = flat.dot(&self.weights)?.add(&self.biases)?;
        Ok((flat, y))
    }
}

impl Layer for Dense {
    fn kind(&self) -> &'static str {
        "dense"
    }

    fn input_shape(&self) -> &Shape {
        &self.input_shape
    }

    fn output_shape(&self) -> &Shape {
        &self.output_shape
    }

    fn forward(&mut self, x: &Tensor) -> Result<Tensor, NetworkError> {
        let (flat, y) = self.compute(x)?;
        self.cached_input = Some(flat);
        Ok(y)
    }

    fn infer(&self, x: &Tensor) -> Result<Tensor, NetworkError> {
        Ok(self.compute(x)?.1)
    }

    fn backward(&mut self, dy: &Tensor) -> Result<Tensor, NetworkError> {
        let x = self
            .cached_input
            .as_ref()
            .ok_or(NetworkError::MissingCache { layer: "dense" })?;
        let batch = batch_size("dense backward", dy, &self.output_shape)?;
        if batch != x.dims()[0] {
            return Err(TensorError::ShapeMismatch {
                op: "dense backward",
                lhs: dy.shape().clone(),
                rhs: self.output_shape.with_leading(x.dims()[0]),
            }
            .into());
        }

        self.weight_grad.accumulate(&x.transpose()?.dot(dy)?)?;
        self.bias_grad.accumulate(&dy.sum_axis(0)?)?;
        self.samples += batch;

        let dx = dy.dot_transpose(&self.weights)?;
        Ok(dx.into_reshaped(self.input_shape.with_leading(batch))?)
    }

    fn update_parameters(&mut self, learning_rate: f32) {
        if self.samples == 0 {
            return;
        }
        let step = learning_rate / self.samples as f32;
        descend(&mut self.weights, &self.weight_grad, step);
        descend(&mut self.biases, &self.bias_grad, step);
    }

    fn reset_accumulated_gradient(&mut self) {
        self.weight_grad.fill(0.0);
        self.bias_grad.fill(0.0);
        self.samples = 0;
    }

    fn parameter_count(&self) -> usize {
        self.weights.size() + self.biases.size()
    }
}
