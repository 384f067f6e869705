// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dot products, outer products, and matrix transposition.

use crate::{Shape, Tensor, TensorError};

impl Tensor {
    /// Rank-dependent dot product.
    ///
    /// | `self`        | `other`       | result                                       |
    /// |---------------|---------------|----------------------------------------------|
    /// | `[K]`         | `[K]`         | inner product, shape `[1]`                   |
    /// | `[M, K]`      | `[K, N]`      | matrix product `[M, N]`                      |
    /// | single value  | any           | `other` scaled by the value                  |
    /// | any           | single value  | `self` scaled by the value                   |
    /// | `[.., K]`     | `[K]`         | last axis contracted, shape `[..]`           |
    /// | `[.., K]`     | `[.., K, N]`  | last axis of `self` against the second-to-last axis of `other` |
    ///
    /// The last row follows the usual N-D `dot` convention: the result shape
    /// is `self[..-1] ++ other[..-2] ++ [N]`.
    ///
    /// # Errors
    /// Returns [`TensorError::ShapeMismatch`] if the contracted lengths differ.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Tensor;
    /// let a = Tensor::from_vec([2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// let b = Tensor::from_vec([2, 2], vec![5.0, 6.0, 7.0, 8.0]).unwrap();
    /// assert_eq!(a.dot(&b).unwrap().data(), &[19.0, 22.0, 43.0, 50.0]);
    /// ```
    pub fn dot(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        let (ra, rb) = (self.rank(), other.rank());

        if ra == 1 && rb == 1 && self.size() == other.size() {
            let value = self
                .data()
                .iter()
                .zip(other.data())
                .map(|(a, b)| a * b)
                .sum();
            return Ok(Tensor::scalar(value));
        }

        if ra == 2 && rb == 2 {
            if !self.shape().is_matmul_compatible(other.shape()) {
                return Err(TensorError::shape_mismatch("dot", self.shape(), other.shape()));
            }
            let (m, k, n) = (self.dims()[0], self.dims()[1], other.dims()[1]);
            let mut out = vec![0.0; m * n];
            matmul_f32_generic(self.data(), other.data(), &mut out, m, k, n);
            return Tensor::from_vec([m, n], out);
        }

        if ra == 1 && self.size() == 1 {
            return Ok(other.scale(self.item()));
        }
        if rb == 1 && other.size() == 1 {
            return Ok(self.scale(other.item()));
        }

        let k = self.shape().last();
        if rb == 1 {
            if other.size() != k {
                return Err(TensorError::shape_mismatch("dot", self.shape(), other.shape()));
            }
            let v = other.data();
            let out: Vec<f32> = self
                .data()
                .chunks_exact(k)
                .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
                .collect();
            return Tensor::from_vec(self.dims()[..ra - 1].to_vec(), out);
        }

        // General case: [.., K] · [.., K, N].
        let b_dims = other.dims();
        if b_dims[rb - 2] != k {
            return Err(TensorError::shape_mismatch("dot", self.shape(), other.shape()));
        }
        let n = b_dims[rb - 1];
        let m = self.size() / k;
        let batches = other.size() / (k * n);
        let a = self.data();
        let b = other.data();
        let mut out = vec![0.0; m * batches * n];
        for row in 0..m {
            let a_row = &a[row * k..(row + 1) * k];
            for batch in 0..batches {
                let b_mat = &b[batch * k * n..(batch + 1) * k * n];
                let c_row = &mut out[(row * batches + batch) * n..(row * batches + batch + 1) * n];
                matmul_f32_generic(a_row, b_mat, c_row, 1, k, n);
            }
        }
        let mut result_dims = self.dims()[..ra - 1].to_vec();
        result_dims.extend_from_slice(&b_dims[..rb - 2]);
        result_dims.push(n);
        Tensor::from_vec(result_dims, out)
    }

    /// Computes `self · otherᵀ` for two matrices without materialising the
    /// transpose.
    ///
    /// `self` is `[M, K]`, `other` is `[N, K]`, the result is `[M, N]`.
    pub fn dot_transpose(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        if self.rank() != 2 || other.rank() != 2 {
            return Err(TensorError::Unsupported {
                op: "dot_transpose",
                detail: format!("expects two matrices, got {} and {}", self.shape(), other.shape()),
            });
        }
        let (m, k) = (self.dims()[0], self.dims()[1]);
        let n = other.dims()[0];
        if other.dims()[1] != k {
            return Err(TensorError::shape_mismatch(
                "dot_transpose",
                self.shape(),
                other.shape(),
            ));
        }

        let a = self.data();
        let b = other.data();
        let mut out = vec![0.0; m * n];
        for i in 0..m {
            let a_row = &a[i * k..(i + 1) * k];
            for j in 0..n {
                let b_row = &b[j * k..(j + 1) * k];
                out[i * n + j] = a_row.iter().zip(b_row).map(|(x, y)| x * y).sum();
            }
        }
        Tensor::from_vec([m, n], out)
    }

    /// Outer product: the result shape is `self.shape ++ other.shape`, and
    /// block `i` holds `other` scaled by element `i` of `self`.
    pub fn tensor_product(&self, other: &Tensor) -> Tensor {
        let mut dims = self.dims().to_vec();
        dims.extend_from_slice(other.dims());
        let mut out = Vec::with_capacity(self.size() * other.size());
        for &a in self.data() {
            out.extend(other.data().iter().map(|&b| a * b));
        }
        Tensor::from_parts(Shape::new(dims), out)
    }

    /// Swaps the two axes of a matrix.
    pub fn transpose(&self) -> Result<Tensor, TensorError> {
        if self.rank() != 2 {
            return Err(TensorError::Unsupported {
                op: "transpose",
                detail: format!("expects a matrix, got {}", self.shape()),
            });
        }
        let (rows, cols) = (self.dims()[0], self.dims()[1]);
        let src = self.data();
        let mut out = vec![0.0; rows * cols];
        for i in 0..rows {
            for j in 0..cols {
                out[j * rows + i] = src[i * cols + j];
            }
        }
        Tensor::from_vec([cols, rows], out)
    }
}

/// Generic (portable) f32 matrix multiplication, `c = a @ b`.
///
/// Uses a simple ikj loop order for better cache locality on the `b` matrix.
/// Not SIMD-optimised, but correct and reasonably cache-friendly.
fn matmul_f32_generic(a: &[f32], b: &[f32], c: &mut [f32], m: usize, k: usize, n: usize) {
    c.iter_mut().for_each(|x| *x = 0.0);

    // ikj loop order: the inner loop is a saxpy on a row of C, which is
    // sequential in memory.
    for i in 0..m {
        for p in 0..k {
            let a_ip = a[i * k + p];
            let c_row = &mut c[i * n..(i + 1) * n];
            let b_row = &b[p * n..(p + 1) * n];
            for j in 0..n {
                c_row[j] += a_ip * b_row[j];
            }
        }
    }
}
