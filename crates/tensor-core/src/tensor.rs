// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type: construction, addressing, and shape changes.

use crate::{Shape, TensorError};
use rand::Rng;

/// An owned, n-dimensional `f32` tensor stored in contiguous memory.
///
/// `Tensor` has value semantics: cloning copies the buffer, and every
/// sub-tensor, slice or reshape materialises a new, independent tensor.
///
/// # Memory Layout
/// Data is stored in row-major (C) order. The element at multi-index
/// `(i0, .., ir-1)` lives at flat offset `Σ ik * product(shape[k+1..])`.
/// The buffer length always equals `shape.num_elements()`, and every
/// dimension is positive, so a tensor is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Tensor;
    /// let t = Tensor::zeros([2, 3]).unwrap();
    /// assert_eq!(t.size(), 6);
    /// assert!(t.data().iter().all(|&x| x == 0.0));
    /// assert!(Tensor::zeros([2, 0]).is_err());
    /// ```
    pub fn zeros(shape: impl Into<Shape>) -> Result<Self, TensorError> {
        Self::filled(shape, 0.0)
    }

    /// Creates a tensor with every element set to `value`.
    ///
    /// Returns [`TensorError::InvalidShape`] if any dimension is zero.
    pub fn filled(shape: impl Into<Shape>, value: f32) -> Result<Self, TensorError> {
        let shape = shape.into();
        shape.check()?;
        let size = shape.num_elements();
        Ok(Self {
            shape,
            data: vec![value; size],
        })
    }

    /// Creates a one-element tensor of shape `[1]`.
    pub fn scalar(value: f32) -> Self {
        Self {
            shape: Shape::scalar(),
            data: vec![value],
        }
    }

    /// Creates a tensor from a shape and a row-major buffer.
    ///
    /// Returns an error if the shape has a zero dimension or the buffer
    /// length does not match it.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Tensor;
    /// let t = Tensor::from_vec([3], vec![1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.data(), &[1.0, 2.0, 3.0]);
    /// assert!(Tensor::from_vec([2, 2], vec![1.0]).is_err());
    /// ```
    pub fn from_vec(shape: impl Into<Shape>, data: Vec<f32>) -> Result<Self, TensorError> {
        let shape = shape.into();
        shape.check()?;
        let expected = shape.num_elements();
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates a tensor from a slice of values.
    pub fn from_slice(shape: impl Into<Shape>, values: &[f32]) -> Result<Self, TensorError> {
        Self::from_vec(shape, values.to_vec())
    }

    /// Creates a tensor with elements drawn uniformly from `[low, high)`.
    ///
    /// Returns an error for a zero dimension, or a range that is empty or not
    /// finite.
    pub fn uniform<R: Rng + ?Sized>(
        shape: impl Into<Shape>,
        low: f32,
        high: f32,
        rng: &mut R,
    ) -> Result<Self, TensorError> {
        let shape = shape.into();
        shape.check()?;
        if !low.is_finite() || !high.is_finite() || low >= high || !(high - low).is_finite() {
            return Err(TensorError::Unsupported {
                op: "uniform",
                detail: format!("invalid range [{low}, {high})"),
            });
        }
        let data = (0..shape.num_elements())
            .map(|_| rng.gen_range(low..high))
            .collect();
        Ok(Self { shape, data })
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the dimensions of the tensor.
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Returns the number of axes.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Returns the number of elements.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns the row-major data buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the row-major data buffer mutably.
    ///
    /// The buffer length is fixed; only values can change.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the tensor and returns its buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Returns the first element; the value of a one-element tensor.
    pub fn item(&self) -> f32 {
        self.data[0]
    }

    /// Fills the tensor with a constant value.
    pub fn fill(&mut self, value: f32) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    // ── Addressing ─────────────────────────────────────────────

    /// Computes the flat offset of a multi-index.
    ///
    /// The offset accumulates a running sub-block size that starts at the
    /// tensor size and is divided by each successive dimension.
    ///
    /// # Errors
    /// Returns an indexing error if `index.len() != rank` or any component is
    /// out of bounds.
    pub fn offset(&self, index: &[usize]) -> Result<usize, TensorError> {
        let dims = self.shape.dims();
        if index.len() != dims.len() {
            return Err(TensorError::IndexCountMismatch {
                op: "offset",
                expected: dims.len(),
                actual: index.len(),
            });
        }
        let mut block = self.size();
        let mut flat = 0;
        for (axis, (&i, &dim)) in index.iter().zip(dims).enumerate() {
            if i >= dim {
                return Err(TensorError::IndexOutOfBounds {
                    op: "offset",
                    axis,
                    index: i,
                    dim,
                });
            }
            block /= dim;
            flat += block * i;
        }
        Ok(flat)
    }

    /// Reads the element at `index`.
    pub fn get(&self, index: &[usize]) -> Result<f32, TensorError> {
        Ok(self.data[self.offset(index)?])
    }

    /// Writes `value` at `index`.
    pub fn set(&mut self, index: &[usize], value: f32) -> Result<(), TensorError> {
        let flat = self.offset(index)?;
        self.data[flat] = value;
        Ok(())
    }

    // ── Shape changes ──────────────────────────────────────────

    /// Returns a copy with the same data under `new_shape`.
    ///
    /// # Errors
    /// Returns [`TensorError::ReshapeSize`] if the element counts differ.
    pub fn reshape(&self, new_shape: impl Into<Shape>) -> Result<Tensor, TensorError> {
        self.clone().into_reshaped(new_shape)
    }

    /// Same as [`reshape`](Tensor::reshape) but reuses the buffer.
    pub fn into_reshaped(self, new_shape: impl Into<Shape>) -> Result<Tensor, TensorError> {
        let new_shape = new_shape.into();
        if new_shape.num_elements() != self.size() {
            return Err(TensorError::ReshapeSize {
                from: self.shape,
                to: new_shape,
            });
        }
        Ok(Tensor {
            shape: new_shape,
            data: self.data,
        })
    }

    /// Collapses the axes `from_axis..` into a single trailing axis.
    ///
    /// `flatten(1)` turns a `[batch, h, w, c]` tensor into `[batch, h*w*c]`.
    pub fn flatten(&self, from_axis: usize) -> Result<Tensor, TensorError> {
        let dims = self.dims();
        if from_axis >= dims.len() {
            return Err(TensorError::IndexOutOfBounds {
                op: "flatten",
                axis: from_axis,
                index: from_axis,
                dim: dims.len(),
            });
        }
        let mut new_dims = dims[..from_axis].to_vec();
        new_dims.push(dims[from_axis..].iter().product());
        self.reshape(new_dims)
    }

    // ── Element-wise maps ──────────────────────────────────────

    /// Applies `f` to every element.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Combines two same-shaped tensors element by element.
    pub fn zip_map(
        &self,
        other: &Tensor,
        f: impl Fn(f32, f32) -> f32,
    ) -> Result<Tensor, TensorError> {
        if self.shape != other.shape {
            return Err(TensorError::shape_mismatch("zip_map", &self.shape, &other.shape));
        }
        Ok(Tensor {
            shape: self.shape.clone(),
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    pub(crate) fn from_parts(shape: Shape, data: Vec<f32>) -> Tensor {
        debug_assert_eq!(shape.num_elements(), data.len());
        Tensor { shape, data }
    }
}
