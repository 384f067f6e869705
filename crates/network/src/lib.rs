// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # network
//!
//! Feed-forward neural networks built from `tensor-core` tensors and trained
//! by mini-batch gradient descent.
//!
//! The crate provides:
//! - [`Layer`]: the trait every trainable stage implements, with
//!   [`Dense`](layer::Dense), [`ActivationLayer`](layer::ActivationLayer),
//!   [`Conv2D`](layer::Conv2D) and [`Pool2D`](layer::Pool2D).
//! - [`Network`] / [`NetworkBuilder`]: a shape-checked layer chain with
//!   `fit`, `predict` and `evaluate`.
//! - [`CostFunction`]: mean squared error and binary cross-entropy.
//! - [`TrainingConfig`] / [`NetworkConfig`]: TOML-backed configuration.
//! - [`History`]: per-epoch costs, exportable as JSON.
//!
//! # Logging
//! The crate emits `tracing` events (network summary and per-epoch costs at
//! `info`, per-batch costs at `debug`) and never installs a subscriber.
//!
//! # Randomness
//! Weight initialisation and shuffling draw from a caller-supplied
//! [`rand::Rng`]; seed it for reproducible runs.

mod config;
mod cost;
mod error;
mod history;
pub mod layer;
mod network;

pub use config::{LayerDef, NetworkConfig, PartialBatch, TrainingConfig};
pub use cost::CostFunction;
pub use error::NetworkError;
pub use history::{EpochRecord, History};
pub use layer::Layer;
pub use network::{Network, NetworkBuilder};
