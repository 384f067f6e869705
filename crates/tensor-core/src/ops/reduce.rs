// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reductions: totals, per-axis sums, maximum and mean.

use crate::{Tensor, TensorError};

impl Tensor {
    /// Returns the sum of all elements.
    pub fn sum(&self) -> f32 {
        self.data().iter().sum()
    }

    /// Sums over `axis`, removing it.
    ///
    /// The result has rank `rank - 1`; reducing a rank-1 tensor yields the
    /// one-element shape `[1]`.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Tensor;
    /// let t = Tensor::from_vec([2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    /// assert_eq!(t.sum_axis(0).unwrap().data(), &[5.0, 7.0, 9.0]);
    /// assert_eq!(t.sum_axis(1).unwrap().data(), &[6.0, 15.0]);
    /// ```
    pub fn sum_axis(&self, axis: usize) -> Result<Tensor, TensorError> {
        let dims = self.dims();
        if axis >= dims.len() {
            return Err(TensorError::IndexOutOfBounds {
                op: "sum_axis",
                axis,
                index: axis,
                dim: dims.len(),
            });
        }

        let inner: usize = dims[axis + 1..].iter().product();
        let len = dims[axis];
        let outer = self.size() / (inner * len).max(1);
        let result_dims: Vec<usize> = dims
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != axis)
            .map(|(_, &d)| d)
            .collect();

        let src = self.data();
        let mut out = vec![0.0f32; outer * inner];
        for o in 0..outer {
            let dst = &mut out[o * inner..(o + 1) * inner];
            for i in 0..len {
                let row = &src[(o * len + i) * inner..(o * len + i + 1) * inner];
                for (d, &v) in dst.iter_mut().zip(row) {
                    *d += v;
                }
            }
        }

        Tensor::from_vec(result_dims, out)
    }

    /// Returns the largest element (`NEG_INFINITY` for an empty tensor).
    pub fn max(&self) -> f32 {
        self.data().iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Returns `sum() / size()`.
    pub fn average(&self) -> f32 {
        self.sum() / self.size() as f32
    }
}
