// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Dense, row-major `f32` tensors for small neural-network workloads.
//!
//! This crate provides:
//! - [`Tensor`]: an owned n-dimensional tensor with flat contiguous storage.
//! - [`Shape`]: dimension lists with stride and compatibility helpers.
//! - Element-wise arithmetic with a single trailing-dimension broadcast rule.
//! - Sub-tensor extraction and assignment, zero padding, axis slicing.
//! - Reductions, generalised dot products, valid 2-D convolution.
//! - Leading-axis permutations for shuffling datasets.
//!
//! # Broadcasting
//! A binary element-wise operation `a ∘ b` is accepted when the shapes are
//! equal, when `b` holds a single element, or when `b` (with leading
//! size-1 axes dropped) equals the trailing dimensions of `a`. Element `i`
//! of the result is `a[i] ∘ b[i % b.size()]`; the result has `a`'s shape.
//!
//! # Errors
//! Every fallible operation returns [`TensorError`]; none of them panic on
//! bad shapes or indices.

mod error;
mod ops;
mod shape;
mod tensor;

pub use error::TensorError;
pub use ops::{invert_permutation, AxisRange, PadSide, Selector};
pub use shape::Shape;
pub use tensor::Tensor;
