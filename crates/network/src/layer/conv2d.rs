// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! 2-D convolution layer.
//!
//! Forward runs the engine's valid convolution on each (optionally padded)
//! sample and adds a per-filter bias. Backward reuses the same primitive:
//!
//! * `dK[:, :, c, :]` is the valid convolution of padded input channel `c`
//!   with the output gradient used as a `(H', W', 1, F)` kernel.
//! * `dx` is the valid convolution of the output gradient, zero-padded by
//!   `k - 1` on every side, with the spatially flipped kernel whose channel
//!   axes are swapped, cropped back to the unpadded input.

use super::{batch_size, descend, Layer};
use crate::NetworkError;
use rand::Rng;
use tensor_core::{AxisRange, PadSide, Selector, Shape, Tensor, TensorError};

/// Spatial padding applied before convolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    /// No padding: output is `(H - k + 1, W - k + 1)`.
    #[default]
    Valid,
    /// `(k - 1) / 2` zeros on every side: output is `(H, W)`. Needs an odd
    /// kernel size.
    Same,
}

impl Padding {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "valid" | "none" => Some(Self::Valid),
            "same" | "zero" => Some(Self::Same),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Same => "same",
        }
    }
}

/// Convolution with `filters` square kernels of size `kernel_size`.
#[derive(Debug, Clone)]
pub struct Conv2D {
    input_shape: Shape,
    output_shape: Shape,
    padding: Padding,
    /// `[k, k, C_in, F]`.
    kernel: Tensor,
    /// `[F]`.
    bias: Tensor,
    kernel_grad: Tensor,
    bias_grad: Tensor,
    samples: usize,
    /// Padded `(Hp, Wp, C_in)` samples of the last forward batch.
    cached_input: Option<Vec<Tensor>>,
}

impl Conv2D {
    /// Creates a convolution layer over `(H, W)` or `(H, W, C_in)` samples.
    ///
    /// Kernels are Xavier-uniform initialised, biases start at zero.
    ///
    /// # Errors
    /// Returns [`NetworkError::Config`] for a rank other than 2 or 3, zero
    /// filters or kernel size, an even kernel with [`Padding::Same`], or a
    /// kernel larger than the input with [`Padding::Valid`].
    pub fn new<R: Rng + ?Sized>(
        input_shape: impl Into<Shape>,
        filters: usize,
        kernel_size: usize,
        padding: Padding,
        rng: &mut R,
    ) -> Result<Self, NetworkError> {
        let input_shape = input_shape.into();
        let dims = input_shape.dims();
        if dims.len() != 2 && dims.len() != 3 {
            return Err(NetworkError::config(format!(
                "conv2d expects an (H, W) or (H, W, C) input, got {input_shape}"
            )));
        }
        if filters == 0 || kernel_size == 0 {
            return Err(NetworkError::config(
                "conv2d needs at least one filter and a non-zero kernel size",
            ));
        }
        let (h, w) = (dims[0], dims[1]);
        let c_in = dims.get(2).copied().unwrap_or(1);
        let (oh, ow) = match padding {
            Padding::Same if kernel_size % 2 == 0 => {
                return Err(NetworkError::config(format!(
                    "same padding needs an odd kernel size, got {kernel_size}"
                )))
            }
            Padding::Same => (h, w),
            Padding::Valid if kernel_size > h || kernel_size > w => {
                return Err(NetworkError::config(format!(
                    "kernel size {kernel_size} exceeds input {input_shape}"
                )))
            }
            Padding::Valid => (h - kernel_size + 1, w - kernel_size + 1),
        };

        let kernel_dims = [kernel_size, kernel_size, c_in, filters];
        let area = kernel_size * kernel_size;
        let limit = (6.0 / (area * (c_in + filters)) as f32).sqrt();
        let kernel = Tensor::uniform(kernel_dims, -limit, limit, rng)?;
        tracing::debug!(
            "conv2d {input_shape} -> [{oh}, {ow}, {filters}], kernel {kernel_size}x{kernel_size} {}",
            padding.as_str()
        );

        Ok(Self {
            output_shape: Shape::new(vec![oh, ow, filters]),
            input_shape,
            padding,
            kernel_grad: Tensor::zeros(kernel_dims)?,
            kernel,
            bias: Tensor::zeros([filters])?,
            bias_grad: Tensor::zeros([filters])?,
            samples: 0,
            cached_input: None,
        })
    }

    pub fn kernel(&self) -> &Tensor {
        &self.kernel
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    /// Kernel gradient accumulated since the last reset.
    pub fn kernel_gradient(&self) -> &Tensor {
        &self.kernel_grad
    }

    /// Replaces the kernel; `kernel` must be `[k, k, C_in, F]`.
    pub fn set_kernel(&mut self, kernel: Tensor) -> Result<(), NetworkError> {
        if kernel.shape() != self.kernel.shape() {
            return Err(TensorError::ShapeMismatch {
                op: "set_kernel",
                lhs: self.kernel.shape().clone(),
                rhs: kernel.shape().clone(),
            }
            .into());
        }
        self.kernel = kernel;
        Ok(())
    }

    fn kernel_size(&self) -> usize {
        self.kernel.dims()[0]
    }

    fn filters(&self) -> usize {
        self.kernel.dims()[3]
    }

    fn pad_amount(&self) -> usize {
        match self.padding {
            Padding::Valid => 0,
            Padding::Same => (self.kernel_size() - 1) / 2,
        }
    }

    /// `(H, W, C_in)` of one input sample.
    fn geometry(&self) -> (usize, usize, usize) {
        let d = self.input_shape.dims();
        (d[0], d[1], d.get(2).copied().unwrap_or(1))
    }

    /// Splits a batch into padded `(Hp, Wp, C_in)` samples.
    fn padded_samples(&self, x: &Tensor) -> Result<Vec<Tensor>, NetworkError> {
        let batch = batch_size("conv2d forward", x, &self.input_shape)?;
        let (h, w, c) = self.geometry();
        let pad = self.pad_amount();
        (0..batch)
            .map(|n| -> Result<Tensor, NetworkError> {
                let sample = x.slice(0, n, n + 1)?.into_reshaped([h, w, c])?;
                if pad == 0 {
                    Ok(sample)
                } else {
                    Ok(sample.pad(&[0, 1], &[PadSide::Both, PadSide::Both], &[pad, pad])?)
                }
            })
            .collect()
    }

    fn convolve(&self, samples: &[Tensor]) -> Result<Tensor, NetworkError> {
        let mut out = Vec::with_capacity(samples.len() * self.output_shape.num_elements());
        for sample in samples {
            let y = sample.conv2d(&self.kernel)?.add(&self.bias)?;
            out.extend_from_slice(y.data());
        }
        Ok(Tensor::from_vec(
            self.output_shape.with_leading(samples.len()),
            out,
        )?)
    }

    /// `Kf[a, b, f, c] = K[k-1-a, k-1-b, c, f]`.
    fn flipped_kernel(&self) -> Result<Tensor, TensorError> {
        let (k, c_in, f) = (self.kernel_size(), self.geometry().2, self.filters());
        let src = self.kernel.data();
        let mut data = Vec::with_capacity(src.len());
        for a in 0..k {
            for b in 0..k {
                for fi in 0..f {
                    for ci in 0..c_in {
                        let (sa, sb) = (k - 1 - a, k - 1 - b);
                        data.push(src[((sa * k + sb) * c_in + ci) * f + fi]);
                    }
                }
            }
        }
        Tensor::from_vec([k, k, f, c_in], data)
    }
}

impl Layer for Conv2D {
    fn kind(&self) -> &'static str {
        "conv2d"
    }

    fn input_shape(&self) -> &Shape {
        &self.input_shape
    }

    fn output_shape(&self) -> &Shape {
        &self.output_shape
    }

    fn forward(&mut self, x: &Tensor) -> Result<Tensor, NetworkError> {
        let samples = self.padded_samples(x)?;
        let y = self.convolve(&samples)?;
        self.cached_input = Some(samples);
        Ok(y)
    }

    fn infer(&self, x: &Tensor) -> Result<Tensor, NetworkError> {
        self.convolve(&self.padded_samples(x)?)
    }

    fn backward(&mut self, dy: &Tensor) -> Result<Tensor, NetworkError> {
        let samples = self
            .cached_input
            .as_ref()
            .ok_or(NetworkError::MissingCache { layer: "conv2d" })?;
        let batch = batch_size("conv2d backward", dy, &self.output_shape)?;
        if batch != samples.len() {
            return Err(TensorError::ShapeMismatch {
                op: "conv2d backward",
                lhs: dy.shape().clone(),
                rhs: self.output_shape.with_leading(samples.len()),
            }
            .into());
        }

        let (h, w, c_in) = self.geometry();
        let (k, f) = (self.kernel_size(), self.filters());
        let (oh, ow) = (self.output_shape.dims()[0], self.output_shape.dims()[1]);
        let pad = self.pad_amount();
        let flipped = self.flipped_kernel()?;

        let mut kernel_grad = Tensor::zeros(self.kernel.shape().clone())?;
        let mut bias_grad = Tensor::zeros([f])?;
        let mut dx = Vec::with_capacity(batch * h * w * c_in);

        for (n, xp) in samples.iter().enumerate() {
            let g = dy.slice(0, n, n + 1)?.into_reshaped([oh, ow, f])?;

            let g_kernel = g.reshape([oh, ow, 1, f])?;
            for c in 0..c_in {
                let channel = xp
                    .sub_tensor(&[Selector::All, Selector::All, Selector::Index(c)])?
                    .into_reshaped([xp.dims()[0], xp.dims()[1], 1])?;
                // (k, k, F), scattered into kernel_grad[:, :, c, :]
                let dk_c = channel.conv2d(&g_kernel)?;
                let dst = kernel_grad.data_mut();
                for (ab, row) in dk_c.data().chunks_exact(f).enumerate() {
                    let base = (ab * c_in + c) * f;
                    for (d, &v) in dst[base..base + f].iter_mut().zip(row) {
                        *d += v;
                    }
                }
            }

            bias_grad.accumulate(&g.reshape([oh * ow, f])?.sum_axis(0)?)?;

            let full = g.pad(&[0, 1], &[PadSide::Both, PadSide::Both], &[k - 1, k - 1])?;
            let dxp = full.conv2d(&flipped)?;
            let dx_n = dxp.sub_tensor_ranges(&[
                AxisRange::Range(pad, pad + h),
                AxisRange::Range(pad, pad + w),
                AxisRange::All,
            ])?;
            dx.extend_from_slice(dx_n.data());
        }

        self.kernel_grad.accumulate(&kernel_grad)?;
        self.bias_grad.accumulate(&bias_grad)?;
        self.samples += batch;
        Ok(Tensor::from_vec(self.input_shape.with_leading(batch), dx)?)
    }

    fn update_parameters(&mut self, learning_rate: f32) {
        if self.samples == 0 {
            return;
        }
        let step = learning_rate / self.samples as f32;
        descend(&mut self.kernel, &self.kernel_grad, step);
        descend(&mut self.bias, &self.bias_grad, step);
    }

    fn reset_accumulated_gradient(&mut self) {
        self.kernel_grad.fill(0.0);
        self.bias_grad.fill(0.0);
        self.samples = 0;
    }

    fn parameter_count(&self) -> usize {
        self.kernel.size() + self.bias.size()
    }

    fn describe(&self) -> String {
        format!(
            "{:<10} {}x{}x{} {} in (*, {}) out (*, {}) params {}",
            self.kind(),
            self.kernel_size(),
            self.kernel_size(),
            self.filters(),
            self.padding.as_str(),
            self.input_shape,
            self.output_shape,
            self.parameter_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::test_util::check_input_gradient;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_output_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let valid = Conv2D::new([6, 5, 2], 4, 3, Padding::Valid, &mut rng).unwrap();
        assert_eq!(valid.output_shape().dims(), &[4, 3, 4]);
        assert_eq!(valid.parameter_count(), 3 * 3 * 2 * 4 + 4);

        let same = Conv2D::new([28, 28], 8, 3, Padding::Same, &mut rng).unwrap();
        assert_eq!(same.output_shape().dims(), &[28, 28, 8]);
    }

    #[test]
    fn test_construction_checks() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Conv2D::new([6, 6], 2, 2, Padding::Same, &mut rng).is_err());
        assert!(Conv2D::new([2, 2], 2, 3, Padding::Valid, &mut rng).is_err());
        assert!(Conv2D::new([6], 2, 3, Padding::Valid, &mut rng).is_err());
        assert!(Conv2D::new([6, 6], 0, 3, Padding::Valid, &mut rng).is_err());
    }

    #[test]
    fn test_same_padding_identity_kernel() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut layer = Conv2D::new([3, 3], 1, 3, Padding::Same, &mut rng).unwrap();
        let mut kernel = Tensor::zeros([3, 3, 1, 1]).unwrap();
        kernel.set(&[1, 1, 0, 0], 1.0).unwrap();
        layer.set_kernel(kernel).unwrap();

        let x = Tensor::from_vec([1, 3, 3], (1..=9).map(|v| v as f32).collect()).unwrap();
        let y = layer.forward(&x).unwrap();
        assert_eq!(y.dims(), &[1, 3, 3, 1]);
        assert_eq!(y.data(), x.data());
    }

    #[test]
    fn test_input_gradient_valid() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut layer = Conv2D::new([5, 4, 2], 3, 3, Padding::Valid, &mut rng).unwrap();
        let x = Tensor::uniform([2, 5, 4, 2], -1.0, 1.0, &mut rng).unwrap();
        let probe = Tensor::uniform([2, 3, 2, 3], -1.0, 1.0, &mut rng).unwrap();
        check_input_gradient(&mut layer, &x, &probe, 2e-3);
    }

    #[test]
    fn test_input_gradient_same() {
        let mut rng = StdRng::seed_from_u64(22);
        let mut layer = Conv2D::new([4, 4], 2, 3, Padding::Same, &mut rng).unwrap();
        let x = Tensor::uniform([1, 4, 4], -1.0, 1.0, &mut rng).unwrap();
        let probe = Tensor::uniform([1, 4, 4, 2], -1.0, 1.0, &mut rng).unwrap();
        check_input_gradient(&mut layer, &x, &probe, 2e-3);
    }

    #[test]
    fn test_kernel_gradient_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut layer = Conv2D::new([4, 4, 2], 2, 3, Padding::Same, &mut rng).unwrap();
        let x = Tensor::uniform([2, 4, 4, 2], -1.0, 1.0, &mut rng).unwrap();
        let probe = Tensor::uniform([2, 4, 4, 2], -1.0, 1.0, &mut rng).unwrap();

        layer.reset_accumulated_gradient();
        layer.forward(&x).unwrap();
        layer.backward(&probe).unwrap();
        let analytic = layer.kernel_gradient().clone();

        let base = layer.kernel().clone();
        let h = 1e-2;
        for i in 0..base.size() {
            let mut plus = base.clone();
            plus.data_mut()[i] += h;
            layer.set_kernel(plus).unwrap();
            let f_plus = layer.infer(&x).unwrap().mul(&probe).unwrap().sum();

            let mut minus = base.clone();
            minus.data_mut()[i] -= h;
            layer.set_kernel(minus).unwrap();
            let f_minus = layer.infer(&x).unwrap().mul(&probe).unwrap().sum();

            let numeric = (f_plus - f_minus) / (2.0 * h);
            assert!(
                (numeric - analytic.data()[i]).abs() < 2e-3,
                "dK[{i}]: numeric {numeric} vs analytic {}",
                analytic.data()[i]
            );
        }
    }

    #[test]
    fn test_bias_gradient_and_update() {
        let mut rng = StdRng::seed_from_u64(24);
        let mut layer = Conv2D::new([3, 3, 1], 2, 3, Padding::Valid, &mut rng).unwrap();
        let x = Tensor::uniform([2, 3, 3, 1], -1.0, 1.0, &mut rng).unwrap();
        layer.reset_accumulated_gradient();
        layer.forward(&x).unwrap();
        layer.backward(&Tensor::filled([2, 1, 1, 2], 1.0).unwrap()).unwrap();
        // db = [2, 2] over 2 samples: bias -= 0.5 * 2 / 2.
        layer.update_parameters(0.5);
        assert_eq!(layer.bias().data(), &[-0.5, -0.5]);
    }
}
