// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dimension lists for row-major tensors.

use crate::TensorError;
use std::fmt;

/// The dimensions of a [`crate::Tensor`], outermost first.
///
/// There is no distinct rank-0 shape: a scalar is the one-element shape `[1]`,
/// and `Shape::new(vec![])` normalises to it. Every dimension of a tensor's
/// shape is positive; [`Shape::check`] enforces this at tensor construction.
/// Serialises as a plain list of dimensions, e.g. `[28, 28, 1]`, and
/// deserialising rejects zero dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(into = "Vec<usize>")]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a shape from its dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        if dims.is_empty() {
            return Self::scalar();
        }
        Self { dims }
    }

    /// Creates a shape, rejecting zero-sized dimensions.
    pub fn checked(dims: Vec<usize>) -> Result<Self, TensorError> {
        let shape = Self::new(dims);
        shape.check()?;
        Ok(shape)
    }

    /// Returns [`TensorError::InvalidShape`] if any dimension is zero.
    pub fn check(&self) -> Result<(), TensorError> {
        if self.dims.contains(&0) {
            return Err(TensorError::InvalidShape(self.clone()));
        }
        Ok(())
    }

    /// Creates the one-element shape `[1]` used for scalars.
    pub fn scalar() -> Self {
        Self { dims: vec![1] }
    }

    /// `[len]`.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// `[rows, cols]`.
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Product of all dimensions.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Innermost dimension.
    pub fn last(&self) -> usize {
        self.dims[self.dims.len() - 1]
    }

    /// Returns a new shape with `leading` prepended (e.g. a batch axis).
    pub fn with_leading(&self, leading: usize) -> Shape {
        let mut dims = Vec::with_capacity(self.dims.len() + 1);
        dims.push(leading);
        dims.extend_from_slice(&self.dims);
        Shape { dims }
    }

    /// Row-major strides: `strides[i] == product(dims[i+1..])`.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1usize; self.dims.len()];
        let mut running = 1;
        for (stride, &d) in strides.iter_mut().zip(&self.dims).rev() {
            *stride = running;
            running *= d;
        }
        strides
    }

    /// Returns `true` if `other` may be broadcast onto `self` in an
    /// element-wise operation.
    ///
    /// This is the single broadcasting rule used by every element-wise
    /// operator. `other` is compatible when:
    /// - both shapes hold the same number of elements, or
    /// - `other` holds a single element, or
    /// - after dropping leading 1-sized axes, `other`'s dimensions equal the
    ///   trailing dimensions of `self`.
    ///
    /// In every compatible case element `i` of `self` pairs with element
    /// `i % other.num_elements()` of `other`.
    pub fn is_broadcast_compatible(&self, other: &Shape) -> bool {
        if self.num_elements() == other.num_elements() || other.num_elements() == 1 {
            return true;
        }
        let first_real = other
            .dims
            .iter()
            .position(|&d| d != 1)
            .unwrap_or(other.dims.len());
        let trailing = &other.dims[first_real..];
        trailing.len() <= self.dims.len()
            && self.dims[self.dims.len() - trailing.len()..] == *trailing
    }

    /// `true` when `self` is `[M, K]` and `other` is `[K, N]`.
    pub fn is_matmul_compatible(&self, other: &Shape) -> bool {
        self.rank() == 2 && other.rank() == 2 && self.dims[1] == other.dims[0]
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.dims).finish()
    }
}

impl<'de> serde::Deserialize<'de> for Shape {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dims = Vec::<usize>::deserialize(deserializer)?;
        Shape::checked(dims).map_err(serde::de::Error::custom)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self::new(dims.to_vec())
    }
}

impl From<&Shape> for Shape {
    fn from(shape: &Shape) -> Self {
        shape.clone()
    }
}

impl From<Shape> for Vec<usize> {
    fn from(shape: Shape) -> Self {
        shape.dims
    }
}
