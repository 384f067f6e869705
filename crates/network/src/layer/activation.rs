// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element-wise activation layer.

use super::{batch_size, Layer};
use crate::NetworkError;
use tensor_core::{Shape, Tensor};

/// Slope of [`Activation::LeakyReLU`] for negative inputs.
pub const LEAKY_RELU_SLOPE: f32 = 0.01;

/// A user-supplied activation.
///
/// `derivative(x, dy)` receives the pre-activation input `x` and the
/// upstream gradient `dy`, and returns the gradient with respect to `x`.
#[derive(Debug, Clone, Copy)]
pub struct CustomActivation {
    pub name: &'static str,
    pub function: fn(f32) -> f32,
    pub derivative: fn(f32, f32) -> f32,
}

/// Activation applied element-wise by an [`ActivationLayer`].
#[derive(Debug, Clone, Copy)]
pub enum Activation {
    Sigmoid,
    ReLU,
    LeakyReLU,
    Custom(CustomActivation),
}

impl Activation {
    /// Parses a built-in activation name. Custom activations are only
    /// available programmatically.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sigmoid" | "logistic" => Some(Self::Sigmoid),
            "relu" => Some(Self::ReLU),
            "leaky_relu" | "leakyrelu" | "lrelu" => Some(Self::LeakyReLU),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sigmoid => "sigmoid",
            Self::ReLU => "relu",
            Self::LeakyReLU => "leaky_relu",
            Self::Custom(c) => c.name,
        }
    }

    /// Applies the activation to a single value.
    pub fn apply(&self, x: f32) -> f32 {
        match self {
            Self::Sigmoid => sigmoid(x),
            Self::ReLU => x.max(0.0),
            Self::LeakyReLU => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_RELU_SLOPE * x
                }
            }
            Self::Custom(c) => (c.function)(x),
        }
    }

    /// Gradient with respect to the input `x`, given upstream gradient `dy`.
    pub fn gradient(&self, x: f32, dy: f32) -> f32 {
        match self {
            Self::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s) * dy
            }
            Self::ReLU => {
                if x > 0.0 {
                    dy
                } else {
                    0.0
                }
            }
            Self::LeakyReLU => {
                if x > 0.0 {
                    dy
                } else {
                    LEAKY_RELU_SLOPE * dy
                }
            }
            Self::Custom(c) => (c.derivative)(x, dy),
        }
    }
}

impl std::fmt::Display for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Parameter-free layer applying an [`Activation`] to every element.
#[derive(Debug, Clone)]
pub struct ActivationLayer {
    shape: Shape,
    activation: Activation,
    cached_input: Option<Tensor>,
}

impl ActivationLayer {
    pub fn new(shape: impl Into<Shape>, activation: Activation) -> Self {
        Self {
            shape: shape.into(),
            activation,
            cached_input: None,
        }
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }
}

impl Layer for ActivationLayer {
    fn kind(&self) -> &'static str {
        "activation"
    }

    fn input_shape(&self) -> &Shape {
        &self.shape
    }

    fn output_shape(&self) -> &Shape {
        &self.shape
    }

    fn forward(&mut self, x: &Tensor) -> Result<Tensor, NetworkError> {
        let y = self.infer(x)?;
        self.cached_input = Some(x.clone());
        Ok(y)
    }

    fn infer(&self, x: &Tensor) -> Result<Tensor, NetworkError> {
        batch_size("activation forward", x, &self.shape)?;
        let activation = self.activation;
        Ok(x.map(|v| activation.apply(v)))
    }

    fn backward(&mut self, dy: &Tensor) -> Result<Tensor, NetworkError> {
        let x = self
            .cached_input
            .as_ref()
            .ok_or(NetworkError::MissingCache { layer: "activation" })?;
        let activation = self.activation;
        Ok(x.zip_map(dy, |v, d| activation.gradient(v, d))?)
    }

    fn describe(&self) -> String {
        format!(
            "{:<10} {} over {} params 0",
            self.kind(),
            self.activation,
            self.shape
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::test_util::check_input_gradient;

    fn softplus(x: f32) -> f32 {
        (1.0 + x.exp()).ln()
    }

    fn softplus_grad(x: f32, dy: f32) -> f32 {
        dy / (1.0 + (-x).exp())
    }

    #[test]
    fn test_from_str_loose() {
        assert!(matches!(Activation::from_str_loose("ReLU"), Some(Activation::ReLU)));
        assert!(matches!(
            Activation::from_str_loose("leaky-relu"),
            Some(Activation::LeakyReLU)
        ));
        assert!(Activation::from_str_loose("tanh").is_none());
    }

    #[test]
    fn test_builtin_values() {
        assert_eq!(Activation::Sigmoid.apply(0.0), 0.5);
        assert_eq!(Activation::ReLU.apply(-2.0), 0.0);
        assert_eq!(Activation::ReLU.apply(3.0), 3.0);
        assert!((Activation::LeakyReLU.apply(-2.0) + 0.02).abs() < 1e-7);
        assert_eq!(Activation::Sigmoid.gradient(0.0, 2.0), 0.5);
        assert_eq!(Activation::ReLU.gradient(-1.0, 5.0), 0.0);
        assert_eq!(Activation::ReLU.gradient(1.0, 5.0), 5.0);
    }

    #[test]
    fn test_layer_forward_backward() {
        let mut layer = ActivationLayer::new([3], Activation::ReLU);
        let x = Tensor::from_vec([1, 3], vec![-1.0, 0.5, 2.0]).unwrap();
        let y = layer.forward(&x).unwrap();
        assert_eq!(y.data(), &[0.0, 0.5, 2.0]);
        let dx = layer.backward(&Tensor::filled([1, 3], 3.0).unwrap()).unwrap();
        assert_eq!(dx.data(), &[0.0, 3.0, 3.0]);
        assert_eq!(layer.parameter_count(), 0);
    }

    #[test]
    fn test_custom_activation() {
        let custom = Activation::Custom(CustomActivation {
            name: "softplus",
            function: softplus,
            derivative: softplus_grad,
        });
        assert_eq!(custom.name(), "softplus");
        let mut layer = ActivationLayer::new([4], custom);
        let x = Tensor::from_vec([2, 4], vec![-2.0, -0.5, 0.3, 1.5, 0.0, 1.0, -1.0, 2.0]).unwrap();
        let probe = Tensor::from_vec([2, 4], vec![1.0, -1.0, 0.5, 2.0, 1.0, 1.0, -0.5, 0.25]).unwrap();
        check_input_gradient(&mut layer, &x, &probe, 1e-2);
    }

    #[test]
    fn test_sigmoid_gradient_numerically() {
        let mut layer = ActivationLayer::new([2, 2], Activation::Sigmoid);
        let x = Tensor::from_vec([1, 2, 2], vec![-1.0, 0.0, 0.5, 2.0]).unwrap();
        let probe = Tensor::filled([1, 2, 2], 1.0).unwrap();
        check_input_gradient(&mut layer, &x, &probe, 1e-3);
    }

    #[test]
    fn test_backward_shape_mismatch() {
        let mut layer = ActivationLayer::new([3], Activation::Sigmoid);
        layer.forward(&Tensor::zeros([2, 3]).unwrap()).unwrap();
        assert!(layer.backward(&Tensor::zeros([3, 3]).unwrap()).is_err());
    }
}
