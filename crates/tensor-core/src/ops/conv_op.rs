// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Valid (unpadded) 2-D convolution.

use crate::{Tensor, TensorError};

impl Tensor {
    /// Convolves an `(H, W, C_in)` image with a `(kH, kW, C_in, C_out)`
    /// kernel.
    ///
    /// No padding is applied: the output is `(H - kH + 1, W - kW + 1, C_out)`
    /// and each output element is the sum of the input window multiplied
    /// element-wise by the kernel slice of its output channel. Callers that
    /// need a "same"-sized output pad the input first with
    /// [`Tensor::pad`](Tensor::pad).
    ///
    /// # Errors
    /// Returns [`TensorError::Unsupported`] for operands of the wrong rank and
    /// [`TensorError::ShapeMismatch`] if the channel counts differ or the
    /// kernel is larger than the image.
    pub fn conv2d(&self, kernel: &Tensor) -> Result<Tensor, TensorError> {
        if self.rank() != 3 || kernel.rank() != 4 {
            return Err(TensorError::Unsupported {
                op: "conv2d",
                detail: format!(
                    "expects an (H, W, C) image and a (kH, kW, C, F) kernel, got {} and {}",
                    self.shape(),
                    kernel.shape()
                ),
            });
        }
        let (h, w, c_in) = (self.dims()[0], self.dims()[1], self.dims()[2]);
        let (kh, kw, k_in, c_out) = (
            kernel.dims()[0],
            kernel.dims()[1],
            kernel.dims()[2],
            kernel.dims()[3],
        );
        if k_in != c_in || kh > h || kw > w || kh == 0 || kw == 0 {
            return Err(TensorError::shape_mismatch("conv2d", self.shape(), kernel.shape()));
        }

        let (oh, ow) = (h - kh + 1, w - kw + 1);
        let x = self.data();
        let k = kernel.data();
        let mut out = vec![0.0f32; oh * ow * c_out];

        for i in 0..oh {
            for j in 0..ow {
                let acc = &mut out[(i * ow + j) * c_out..(i * ow + j + 1) * c_out];
                for a in 0..kh {
                    for b in 0..kw {
                        let x_base = ((i + a) * w + (j + b)) * c_in;
                        let k_base = (a * kw + b) * c_in * c_out;
                        for c in 0..c_in {
                            let xv = x[x_base + c];
                            let k_row = &k[k_base + c * c_out..k_base + (c + 1) * c_out];
                            for (o, &kv) in acc.iter_mut().zip(k_row) {
                                *o += xv * kv;
                            }
                        }
                    }
                }
            }
        }

        Tensor::from_vec([oh, ow, c_out], out)
    }
}
