// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor operations.

use crate::Shape;

/// Errors that can occur during tensor operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TensorError {
    /// A shape has a zero-sized dimension.
    #[error("invalid shape {0}: every dimension must be positive")]
    InvalidShape(Shape),

    /// The provided buffer length does not match the element count of the shape.
    #[error("buffer size mismatch: expected {expected} elements, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Two tensors have incompatible shapes for the requested operation.
    #[error("incompatible shapes for {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// The number of indices or selectors differs from the tensor rank.
    #[error("{op} expects {expected} indices, got {actual}")]
    IndexCountMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An index lies outside its axis.
    #[error("{op}: index {index} out of bounds for axis {axis} of size {dim}")]
    IndexOutOfBounds {
        op: &'static str,
        axis: usize,
        index: usize,
        dim: usize,
    },

    /// A half-open range `[start, end)` is empty or exceeds its axis.
    #[error("{op}: invalid range [{start}, {end}) for axis {axis} of size {dim}")]
    InvalidRange {
        op: &'static str,
        axis: usize,
        start: usize,
        end: usize,
        dim: usize,
    },

    /// A shuffle pattern is not a permutation of the leading axis.
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),

    /// A reshape target does not hold the same number of elements.
    #[error("cannot reshape {from} ({} elements) into {to} ({} elements)", .from.num_elements(), .to.num_elements())]
    ReshapeSize { from: Shape, to: Shape },

    /// The operation is not defined for the given operand ranks.
    #[error("unsupported operation {op}: {detail}")]
    Unsupported { op: &'static str, detail: String },
}

impl TensorError {
    /// Returns `true` for the indexing-error family (bad index count,
    /// out-of-bounds index or range, invalid permutation).
    pub fn is_index_error(&self) -> bool {
        matches!(
            self,
            Self::IndexCountMismatch { .. }
                | Self::IndexOutOfBounds { .. }
                | Self::InvalidRange { .. }
                | Self::InvalidPermutation(_)
        )
    }

    pub(crate) fn shape_mismatch(op: &'static str, lhs: &Shape, rhs: &Shape) -> Self {
        Self::ShapeMismatch {
            op,
            lhs: lhs.clone(),
            rhs: rhs.clone(),
        }
    }
}
