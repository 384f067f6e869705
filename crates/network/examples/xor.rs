// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Example: learn XOR with a 2-4-1 sigmoid network.
//!
//! Prints the network summary, per-epoch costs through `tracing`, the final
//! predictions and the training history as JSON.
//!
//! ```bash
//! RUST_LOG=info cargo run -p network --example xor
//! ```

use anyhow::Context;
use network::layer::Activation;
use network::{CostFunction, Network, TrainingConfig};
use tensor_core::Tensor;

fn main() -> anyhow::Result<()> {
    // Initialise tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = TrainingConfig {
        epochs: 2000,
        batch_size: 4,
        learning_rate: 2.0,
        seed: Some(1),
        ..Default::default()
    };
    let mut rng = config.rng();

    let x = Tensor::from_vec([4, 2], vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0])?;
    let y = Tensor::from_vec([4, 1], vec![0.0, 1.0, 1.0, 0.0])?;

    let mut net = Network::builder([2])
        .dense(4, &mut rng)
        .activation(Activation::Sigmoid)
        .dense(1, &mut rng)
        .activation(Activation::Sigmoid)
        .build(CostFunction::MeanSquaredError)?;
    println!("{}\n", net.summary());

    let history = net.fit((&x, &y), (&x, &y), &config, &mut rng)?;
    println!("{}\n", history.summary());

    let predictions = net.predict(&x)?;
    for (i, p) in predictions.data().iter().enumerate() {
        let a = x.get(&[i, 0])?;
        let b = x.get(&[i, 1])?;
        println!("{a} xor {b} -> {p:.3} (target {})", y.get(&[i, 0])?);
    }

    let json = net
        .history()
        .to_json()
        .context("serialising training history")?;
    println!("\nhistory: {} bytes of JSON", json.len());
    Ok(())
}
