// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Non-overlapping 2-D pooling.

use super::{batch_size, Layer};
use crate::NetworkError;
use tensor_core::{Shape, Tensor};

/// Reduction applied to each pooling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolMode {
    /// Window maximum. Tied maxima share the gradient evenly.
    Max,
    /// Window mean. Every position receives `gradient / window_size`.
    Average,
}

impl PoolMode {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "max" | "max_pool" | "maxpool" => Some(Self::Max),
            "average" | "avg" | "mean" | "avg_pool" | "avgpool" => Some(Self::Average),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Average => "average",
        }
    }
}

/// Pools `pool_size x pool_size` windows with stride `pool_size`.
///
/// Accepts `(H, W)` or `(H, W, C)` samples; channels are pooled
/// independently and a rank-2 input produces a rank-2 output.
#[derive(Debug, Clone)]
pub struct Pool2D {
    input_shape: Shape,
    output_shape: Shape,
    pool_size: usize,
    mode: PoolMode,
    cached_input: Option<Tensor>,
}

impl Pool2D {
    /// # Errors
    /// Returns [`NetworkError::Config`] unless the input is rank 2 or 3 and
    /// a non-zero `pool_size` divides both spatial dimensions.
    pub fn new(
        input_shape: impl Into<Shape>,
        pool_size: usize,
        mode: PoolMode,
    ) -> Result<Self, NetworkError> {
        let input_shape = input_shape.into();
        let dims = input_shape.dims();
        if dims.len() != 2 && dims.len() != 3 {
            return Err(NetworkError::config(format!(
                "pool2d expects an (H, W) or (H, W, C) input, got {input_shape}"
            )));
        }
        input_shape
            .check()
            .map_err(|e| NetworkError::config(format!("pool2d: {e}")))?;
        if pool_size == 0 || dims[0] % pool_size != 0 || dims[1] % pool_size != 0 {
            return Err(NetworkError::config(format!(
                "pool size {pool_size} does not divide the spatial dimensions of {input_shape}"
            )));
        }
        let mut out = dims.to_vec();
        out[0] /= pool_size;
        out[1] /= pool_size;

        Ok(Self {
            output_shape: Shape::new(out),
            input_shape,
            pool_size,
            mode,
            cached_input: None,
        })
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn mode(&self) -> PoolMode {
        self.mode
    }

    /// `(H, W, C)` of one input sample.
    fn geometry(&self) -> (usize, usize, usize) {
        let d = self.input_shape.dims();
        (d[0], d[1], d.get(2).copied().unwrap_or(1))
    }

    /// Calls `f(window_offsets, output_offset)` for every window of every
    /// sample in a batch of `batch` samples.
    fn for_each_window(&self, batch: usize, mut f: impl FnMut(&[usize], usize)) {
        let (h, w, c) = self.geometry();
        let p = self.pool_size;
        let (oh, ow) = (h / p, w / p);
        let mut window = Vec::with_capacity(p * p);
        for n in 0..batch {
            for i in 0..oh {
                for j in 0..ow {
                    for ch in 0..c {
                        window.clear();
                        for a in 0..p {
                            for b in 0..p {
                                window.push(((n * h + i * p + a) * w + j * p + b) * c + ch);
                            }
                        }
                        f(&window, ((n * oh + i) * ow + j) * c + ch);
                    }
                }
            }
        }
    }
}

impl Layer for Pool2D {
    fn kind(&self) -> &'static str {
        "pool2d"
    }

    fn input_shape(&self) -> &Shape {
        &self.input_shape
    }

    fn output_shape(&self) -> &Shape {
        &self.output_shape
    }

    fn forward(&mut self, x: &Tensor) -> Result<Tensor, NetworkError> {
        let y = self.infer(x)?;
        self.cached_input = Some(x.clone());
        Ok(y)
    }

    fn infer(&self, x: &Tensor) -> Result<Tensor, NetworkError> {
        let batch = batch_size("pool2d forward", x, &self.input_shape)?;
        let src = x.data();
        let mut out = Tensor::zeros(self.output_shape.with_leading(batch))?;
        let dst = out.data_mut();
        let mode = self.mode;
        self.for_each_window(batch, |window, o| {
            dst[o] = match mode {
                PoolMode::Max => window
                    .iter()
                    .map(|&k| src[k])
                    .fold(f32::NEG_INFINITY, f32::max),
                PoolMode::Average => {
                    window.iter().map(|&k| src[k]).sum::<f32>() / window.len() as f32
                }
            };
        });
        Ok(out)
    }

    fn backward(&mut self, dy: &Tensor) -> Result<Tensor, NetworkError> {
        let x = self
            .cached_input
            .as_ref()
            .ok_or(NetworkError::MissingCache { layer: "pool2d" })?;
        let batch = x.dims()[0];
        if dy.shape() != &self.output_shape.with_leading(batch) {
            return Err(tensor_core::TensorError::ShapeMismatch {
                op: "pool2d backward",
                lhs: dy.shape().clone(),
                rhs: self.output_shape.with_leading(batch),
            }
            .into());
        }

        let src = x.data();
        let grad = dy.data();
        let mut dx = Tensor::zeros(x.shape().clone())?;
        let dst = dx.data_mut();
        let mode = self.mode;
        self.for_each_window(batch, |window, o| match mode {
            PoolMode::Max => {
                let max = window
                    .iter()
                    .map(|&k| src[k])
                    .fold(f32::NEG_INFINITY, f32::max);
                let ties = window.iter().filter(|&&k| src[k] == max).count();
                let share = grad[o] / ties as f32;
                for &k in window {
                    if src[k] == max {
                        dst[k] += share;
                    }
                }
            }
            PoolMode::Average => {
                let share = grad[o] / window.len() as f32;
                for &k in window {
                    dst[k] += share;
                }
            }
        });
        Ok(dx)
    }

    fn describe(&self) -> String {
        format!(
            "{:<10} {} {}x{} in (*, {}) out (*, {}) params 0",
            self.kind(),
            self.mode.as_str(),
            self.pool_size,
            self.pool_size,
            self.input_shape,
            self.output_shape
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::test_util::check_input_gradient;

    fn window() -> Tensor {
        Tensor::from_vec([1, 2, 2], vec![1.0, 4.0, 3.0, 2.0]).unwrap()
    }

    #[test]
    fn test_max_forward_backward() {
        let mut layer = Pool2D::new([2, 2], 2, PoolMode::Max).unwrap();
        let y = layer.forward(&window()).unwrap();
        assert_eq!(y.dims(), &[1, 1, 1]);
        assert_eq!(y.item(), 4.0);
        let dx = layer.backward(&Tensor::filled([1, 1, 1], 2.0).unwrap()).unwrap();
        assert_eq!(dx.data(), &[0.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_average_forward_backward() {
        let mut layer = Pool2D::new([2, 2], 2, PoolMode::Average).unwrap();
        let y = layer.forward(&window()).unwrap();
        assert_eq!(y.item(), 2.5);
        let dx = layer.backward(&Tensor::filled([1, 1, 1], 4.0).unwrap()).unwrap();
        assert_eq!(dx.data(), &[1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_max_ties_share_gradient() {
        let mut layer = Pool2D::new([2, 2], 2, PoolMode::Max).unwrap();
        let x = Tensor::from_vec([1, 2, 2], vec![5.0, 5.0, 1.0, 5.0]).unwrap();
        layer.forward(&x).unwrap();
        let dx = layer.backward(&Tensor::filled([1, 1, 1], 3.0).unwrap()).unwrap();
        assert_eq!(dx.data(), &[1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_multichannel_batch() {
        let mut layer = Pool2D::new([4, 4, 2], 2, PoolMode::Max).unwrap();
        assert_eq!(layer.output_shape().dims(), &[2, 2, 2]);
        // Channel 0 holds k, channel 1 holds -k.
        let data: Vec<f32> = (0..32)
            .map(|i| if i % 2 == 0 { (i / 2) as f32 } else { -((i / 2) as f32) })
            .collect();
        let x = Tensor::from_vec([1, 4, 4, 2], data).unwrap();
        let y = layer.forward(&x).unwrap();
        assert_eq!(y.dims(), &[1, 2, 2, 2]);
        assert_eq!(y.data(), &[5.0, -0.0, 7.0, -2.0, 13.0, -8.0, 15.0, -10.0]);
    }

    #[test]
    fn test_construction_checks() {
        assert!(matches!(
            Pool2D::new([5, 4], 2, PoolMode::Max),
            Err(NetworkError::Config(_))
        ));
        assert!(Pool2D::new([4, 4], 0, PoolMode::Max).is_err());
        assert!(Pool2D::new([16], 2, PoolMode::Max).is_err());
        assert!(Pool2D::new([2, 4, 4, 1], 2, PoolMode::Max).is_err());
        assert!(matches!(
            Pool2D::new([0, 4], 2, PoolMode::Max),
            Err(NetworkError::Config(_))
        ));
    }

    #[test]
    fn test_average_gradient_numerically() {
        let mut layer = Pool2D::new([4, 2, 1], 2, PoolMode::Average).unwrap();
        let x = Tensor::from_vec([1, 4, 2, 1], vec![0.1, 0.7, -0.3, 0.2, 0.9, -0.5, 0.4, 0.0])
            .unwrap();
        let probe = Tensor::from_vec([1, 2, 1, 1], vec![1.5, -2.0]).unwrap();
        check_input_gradient(&mut layer, &x, &probe, 1e-3);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(PoolMode::from_str_loose("AVG"), Some(PoolMode::Average));
        assert_eq!(PoolMode::from_str_loose("max"), Some(PoolMode::Max));
        assert_eq!(PoolMode::from_str_loose("min"), None);
    }
}
