// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor operations.
//!
//! Every operation is an inherent method on [`Tensor`](crate::Tensor) and
//! allocates its result; the in-place exceptions are
//! [`accumulate`](crate::Tensor::accumulate), [`scale`](crate::Tensor::scale)
//! and the `set_sub_tensor*` writers.

mod arith;
mod conv_op;
mod dot_op;
mod permute;
mod reduce;
mod subtensor;

pub use permute::invert_permutation;
pub use subtensor::{AxisRange, PadSide, Selector};
