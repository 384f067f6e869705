// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The feed-forward [`Network`] and its builder.
//!
//! ```text
//! x ─▶ layer 0 ─▶ layer 1 ─▶ … ─▶ layer n ─▶ cost(y)
//!      ◀─ dx ──── ◀─ dx ──── … ◀── dC/dy ◀──┘
//! ```
//!
//! Training runs mini-batch gradient descent: every batch resets the
//! layers' accumulated gradients, runs forward through the chain, computes
//! the cost gradient, back-propagates in reverse order and then lets each
//! layer apply its averaged update.

use crate::config::{PartialBatch, TrainingConfig};
use crate::history::{EpochRecord, History};
use crate::layer::{
    batch_size, Activation, ActivationLayer, Conv2D, Dense, Layer, Padding, Pool2D, PoolMode,
};
use crate::{CostFunction, NetworkError};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Instant;
use tensor_core::{Shape, Tensor};

/// Samples per forward pass in [`Network::evaluate`].
const EVAL_CHUNK: usize = 256;

/// An ordered chain of layers trained against a cost function.
#[derive(Debug)]
pub struct Network {
    layers: Vec<Box<dyn Layer>>,
    cost: CostFunction,
    history: History,
}

impl Network {
    /// Creates a network from an explicit layer chain.
    ///
    /// # Errors
    /// Returns [`NetworkError::Config`] if the chain is empty or a layer's
    /// input shape differs from its predecessor's output shape.
    pub fn new(layers: Vec<Box<dyn Layer>>, cost: CostFunction) -> Result<Self, NetworkError> {
        if layers.is_empty() {
            return Err(NetworkError::config("a network needs at least one layer"));
        }
        for layer in &layers {
            layer
                .input_shape()
                .check()
                .map_err(|e| NetworkError::config(format!("{} layer: {e}", layer.kind())))?;
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].output_shape() != pair[1].input_shape() {
                return Err(NetworkError::config(format!(
                    "layer {} ({}) outputs {} but layer {} ({}) expects {}",
                    i,
                    pair[0].kind(),
                    pair[0].output_shape(),
                    i + 1,
                    pair[1].kind(),
                    pair[1].input_shape()
                )));
            }
        }

        let network = Self {
            layers,
            cost,
            history: History::new(),
        };
        tracing::info!("{}", network.summary());
        Ok(network)
    }

    /// Starts a builder for samples of `input_shape`.
    pub fn builder(input_shape: impl Into<Shape>) -> NetworkBuilder {
        NetworkBuilder::new(input_shape)
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub fn cost(&self) -> CostFunction {
        self.cost
    }

    /// Per-sample input shape of the first layer.
    pub fn input_shape(&self) -> &Shape {
        self.layers[0].input_shape()
    }

    /// Per-sample output shape of the last layer.
    pub fn output_shape(&self) -> &Shape {
        self.layers[self.layers.len() - 1].output_shape()
    }

    /// Epoch records from every call to [`fit`](Network::fit).
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.parameter_count()).sum()
    }

    /// Returns a multi-line description of the layer chain.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Network: {} layers, {} params, cost {}",
            self.layers.len(),
            self.parameter_count(),
            self.cost
        );
        for (i, layer) in self.layers.iter().enumerate() {
            out.push_str(&format!("\n  [{i}] {}", layer.describe()));
        }
        out
    }

    /// Runs a forward pass without touching any training state.
    pub fn predict(&self, x: &Tensor) -> Result<Tensor, NetworkError> {
        batch_size("predict", x, self.input_shape())?;
        let mut out = x.clone();
        for layer in &self.layers {
            out = layer.infer(&out)?;
        }
        Ok(out)
    }

    /// Mean cost of the network's predictions against `y`.
    pub fn evaluate(&self, x: &Tensor, y: &Tensor) -> Result<f32, NetworkError> {
        self.check_data("evaluation", x, y)?;
        self.evaluate_chunked(x, y, EVAL_CHUNK)
    }

    /// Trains for `config.epochs` epochs.
    ///
    /// See [`fit_until`](Network::fit_until).
    pub fn fit<R: Rng + ?Sized>(
        &mut self,
        train: (&Tensor, &Tensor),
        test: (&Tensor, &Tensor),
        config: &TrainingConfig,
        rng: &mut R,
    ) -> Result<&History, NetworkError> {
        self.fit_until(train, test, config, rng, |_| false)
    }

    /// Trains until `config.epochs` epochs have run or `stop` returns `true`
    /// for the record of a finished epoch.
    ///
    /// Each epoch shuffles features and labels with one shared permutation,
    /// trains batch by batch, and then appends the forward-only train and
    /// test costs to the history. `train` and `test` are `(features,
    /// labels)` pairs with a leading sample axis.
    ///
    /// # Errors
    /// [`NetworkError::Config`] for invalid hyper-parameters,
    /// [`NetworkError::InvalidData`] if the data does not fit the network, and
    /// any layer error raised during training.
    pub fn fit_until<R: Rng + ?Sized>(
        &mut self,
        train: (&Tensor, &Tensor),
        test: (&Tensor, &Tensor),
        config: &TrainingConfig,
        rng: &mut R,
        mut stop: impl FnMut(&EpochRecord) -> bool,
    ) -> Result<&History, NetworkError> {
        config.validate()?;
        let (train_x, train_y) = train;
        let (test_x, test_y) = test;
        let n = self.check_data("training", train_x, train_y)?;
        self.check_data("test", test_x, test_y)?;

        let bs = config.batch_size;
        let remainder = n % bs;
        let batches = match config.partial_batch {
            PartialBatch::Keep => n.div_ceil(bs),
            PartialBatch::Drop => n / bs,
        };
        if batches == 0 {
            return Err(NetworkError::InvalidData(format!(
                "{n} training samples do not fill a single batch of {bs}"
            )));
        }
        if remainder != 0 && config.partial_batch == PartialBatch::Drop {
            tracing::warn!("dropping the last {remainder} samples of every epoch");
        }
        tracing::info!(
            "training on {n} samples ({} test) for {} epochs: {batches} batches of {bs}, learning rate {}",
            test_x.dims()[0],
            config.epochs,
            config.learning_rate
        );

        let first_epoch = self.history.len() + 1;
        let mut order: Vec<usize> = (0..n).collect();
        for epoch in first_epoch..first_epoch + config.epochs {
            let start = Instant::now();
            order.shuffle(rng);
            let xs = train_x.shuffle_with(&order)?;
            let ys = train_y.shuffle_with(&order)?;

            for b in 0..batches {
                let (from, to) = (b * bs, ((b + 1) * bs).min(n));
                let cost = self.train_batch(
                    &xs.slice(0, from, to)?,
                    &ys.slice(0, from, to)?,
                    config.learning_rate,
                )?;
                tracing::debug!(epoch, batch = b, size = to - from, cost, "batch done");
            }

            let record = EpochRecord {
                epoch,
                train_cost: self.evaluate_chunked(train_x, train_y, bs)?,
                test_cost: self.evaluate_chunked(test_x, test_y, bs)?,
                duration: start.elapsed(),
            };
            tracing::info!(
                epoch,
                train_cost = record.train_cost,
                test_cost = record.test_cost,
                "epoch finished in {:.2}ms",
                record.duration.as_secs_f64() * 1000.0
            );
            let halt = stop(&record);
            self.history.push(record);
            if halt {
                tracing::info!("stopping early after epoch {epoch}");
                break;
            }
        }

        Ok(&self.history)
    }

    /// One gradient-descent step on a single batch; returns its cost.
    fn train_batch(&mut self, x: &Tensor, y: &Tensor, learning_rate: f32) -> Result<f32, NetworkError> {
        for layer in &mut self.layers {
            layer.reset_accumulated_gradient();
        }

        let mut out = x.clone();
        for layer in &mut self.layers {
            out = layer.forward(&out)?;
        }

        let cost = self.cost.value(&out, y)?;
        let mut grad = self.cost.derivative(&out, y)?;
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(&grad)?;
        }

        for layer in &mut self.layers {
            layer.update_parameters(learning_rate);
        }
        Ok(cost)
    }

    /// Sample-weighted mean cost over `chunk`-sized forward passes.
    fn evaluate_chunked(&self, x: &Tensor, y: &Tensor, chunk: usize) -> Result<f32, NetworkError> {
        let n = x.dims()[0];
        let mut total = 0.0;
        for from in (0..n).step_by(chunk) {
            let to = (from + chunk).min(n);
            let out = self.predict(&x.slice(0, from, to)?)?;
            total += self.cost.value(&out, &y.slice(0, from, to)?)? * (to - from) as f32;
        }
        Ok(total / n as f32)
    }

    /// Validates a feature/label pair and returns its sample count.
    fn check_data(&self, what: &str, x: &Tensor, y: &Tensor) -> Result<usize, NetworkError> {
        let n = x.dims()[0];
        if y.dims()[0] != n {
            return Err(NetworkError::InvalidData(format!(
                "{what} features hold {n} samples but labels hold {}",
                y.dims()[0]
            )));
        }
        if batch_size("features", x, self.input_shape()).is_err() {
            return Err(NetworkError::InvalidData(format!(
                "{what} features have shape {}, expected [{n}, ..{}]",
                x.shape(),
                self.input_shape()
            )));
        }
        if batch_size("labels", y, self.output_shape()).is_err() {
            return Err(NetworkError::InvalidData(format!(
                "{what} labels have shape {}, expected [{n}, ..{}]",
                y.shape(),
                self.output_shape()
            )));
        }
        Ok(n)
    }
}

/// Incremental construction of a [`Network`].
///
/// Each added layer takes its input shape from the previous layer's output.
/// The first construction error is kept and reported by
/// [`build`](NetworkBuilder::build), so calls can be chained.
///
/// # Example
/// ```
/// use network::{layer::Activation, CostFunction, Network};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let net = Network::builder([2])
///     .dense(4, &mut rng)
///     .activation(Activation::Sigmoid)
///     .dense(1, &mut rng)
///     .activation(Activation::Sigmoid)
///     .build(CostFunction::MeanSquaredError)
///     .unwrap();
/// assert_eq!(net.output_shape().dims(), &[1]);
/// ```
#[derive(Debug)]
pub struct NetworkBuilder {
    input_shape: Shape,
    layers: Vec<Box<dyn Layer>>,
    error: Option<NetworkError>,
}

impl NetworkBuilder {
    pub fn new(input_shape: impl Into<Shape>) -> Self {
        let input_shape = input_shape.into();
        let error = input_shape
            .check()
            .err()
            .map(|e| NetworkError::config(format!("network input: {e}")));
        Self {
            input_shape,
            layers: Vec::new(),
            error,
        }
    }

    /// Output shape of the chain built so far.
    pub fn current_shape(&self) -> &Shape {
        self.layers
            .last()
            .map_or(&self.input_shape, |l| l.output_shape())
    }

    pub fn dense<R: Rng + ?Sized>(self, neurons: usize, rng: &mut R) -> Self {
        let layer = Dense::new(self.current_shape().clone(), neurons, rng);
        self.push(layer)
    }

    pub fn activation(self, activation: Activation) -> Self {
        let layer = ActivationLayer::new(self.current_shape().clone(), activation);
        self.push(Ok(layer))
    }

    pub fn conv2d<R: Rng + ?Sized>(
        self,
        filters: usize,
        kernel_size: usize,
        padding: Padding,
        rng: &mut R,
    ) -> Self {
        let layer = Conv2D::new(self.current_shape().clone(), filters, kernel_size, padding, rng);
        self.push(layer)
    }

    pub fn pool2d(self, pool_size: usize, mode: PoolMode) -> Self {
        let layer = Pool2D::new(self.current_shape().clone(), pool_size, mode);
        self.push(layer)
    }

    /// Appends a pre-built layer, which must accept the current shape.
    pub fn layer(self, layer: impl Layer + 'static) -> Self {
        if layer.input_shape() != self.current_shape() {
            let err = NetworkError::config(format!(
                "{} layer expects {} but the previous output is {}",
                layer.kind(),
                layer.input_shape(),
                self.current_shape()
            ));
            return self.push::<ActivationLayer>(Err(err));
        }
        self.push(Ok(layer))
    }

    pub fn build(self, cost: CostFunction) -> Result<Network, NetworkError> {
        match self.error {
            Some(err) => Err(err),
            None => Network::new(self.layers, cost),
        }
    }

    fn push<L: Layer + 'static>(mut self, layer: Result<L, NetworkError>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match layer {
            Ok(layer) => self.layers.push(Box::new(layer)),
            Err(err) => self.error = Some(err),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn xor() -> (Tensor, Tensor) {
        (
            Tensor::from_vec([4, 2], vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0]).unwrap(),
            Tensor::from_vec([4, 1], vec![0.0, 1.0, 1.0, 0.0]).unwrap(),
        )
    }

    fn xor_net(rng: &mut StdRng) -> Network {
        Network::builder([2])
            .dense(4, rng)
            .activation(Activation::Sigmoid)
            .dense(1, rng)
            .activation(Activation::Sigmoid)
            .build(CostFunction::MeanSquaredError)
            .unwrap()
    }

    #[test]
    fn test_builder_chains_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let net = Network::builder([8, 8])
            .conv2d(3, 3, Padding::Same, &mut rng)
            .pool2d(2, PoolMode::Max)
            .dense(5, &mut rng)
            .build(CostFunction::MeanSquaredError)
            .unwrap();
        assert_eq!(net.layers()[0].output_shape().dims(), &[8, 8, 3]);
        assert_eq!(net.layers()[1].output_shape().dims(), &[4, 4, 3]);
        assert_eq!(net.output_shape().dims(), &[5]);
        assert_eq!(net.parameter_count(), (27 + 3) + (48 * 5 + 5));
        assert!(net.summary().contains("pool2d"));
    }

    #[test]
    fn test_builder_reports_first_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = Network::builder([5, 5])
            .pool2d(2, PoolMode::Max)
            .dense(0, &mut rng)
            .build(CostFunction::MeanSquaredError);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("pool size"), "{err}");
    }

    #[test]
    fn test_zero_sized_input_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = Network::builder([0, 3])
            .activation(Activation::Sigmoid)
            .build(CostFunction::MeanSquaredError);
        assert!(matches!(result, Err(NetworkError::Config(_))));

        let result = Network::builder([2, 0])
            .dense(2, &mut rng)
            .build(CostFunction::MeanSquaredError);
        assert!(matches!(result, Err(NetworkError::Config(_))));

        let layer: Box<dyn Layer> = Box::new(ActivationLayer::new([4, 0], Activation::ReLU));
        assert!(matches!(
            Network::new(vec![layer], CostFunction::MeanSquaredError),
            Err(NetworkError::Config(_))
        ));
    }

    #[test]
    fn test_layer_shape_mismatch_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let wrong = Dense::new([3], 2, &mut rng).unwrap();
        let result = Network::builder([2])
            .dense(4, &mut rng)
            .layer(wrong)
            .build(CostFunction::MeanSquaredError);
        assert!(matches!(result, Err(NetworkError::Config(_))));

        let layers: Vec<Box<dyn Layer>> = vec![
            Box::new(Dense::new([2], 4, &mut rng).unwrap()),
            Box::new(Dense::new([3], 1, &mut rng).unwrap()),
        ];
        assert!(Network::new(layers, CostFunction::MeanSquaredError).is_err());
        assert!(Network::new(Vec::new(), CostFunction::MeanSquaredError).is_err());
    }

    #[test]
    fn test_predict_does_not_disturb_training_state() {
        let mut rng = StdRng::seed_from_u64(1);
        let net = xor_net(&mut rng);
        let (x, _) = xor();
        let a = net.predict(&x).unwrap();
        let b = net.predict(&x).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dims(), &[4, 1]);
    }

    #[test]
    fn test_fit_records_history() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut net = xor_net(&mut rng);
        let (x, y) = xor();
        let config = TrainingConfig {
            epochs: 3,
            batch_size: 4,
            learning_rate: 0.5,
            ..Default::default()
        };
        let history = net.fit((&x, &y), (&x, &y), &config, &mut rng).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.train_costs(), history.test_costs());

        // A second call continues the epoch numbering.
        net.fit((&x, &y), (&x, &y), &config, &mut rng).unwrap();
        assert_eq!(net.history().last().map(|r| r.epoch), Some(6));
    }

    #[test]
    fn test_fit_until_stops_early() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut net = xor_net(&mut rng);
        let (x, y) = xor();
        let config = TrainingConfig {
            epochs: 50,
            batch_size: 2,
            ..Default::default()
        };
        let history = net
            .fit_until((&x, &y), (&x, &y), &config, &mut rng, |r| r.epoch == 4)
            .unwrap();
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_partial_batch_drop_without_full_batch() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut net = xor_net(&mut rng);
        let (x, y) = xor();
        let config = TrainingConfig {
            epochs: 1,
            batch_size: 8,
            partial_batch: PartialBatch::Drop,
            ..Default::default()
        };
        assert!(matches!(
            net.fit((&x, &y), (&x, &y), &config, &mut rng),
            Err(NetworkError::InvalidData(_))
        ));

        let keep = TrainingConfig {
            partial_batch: PartialBatch::Keep,
            ..config
        };
        assert!(net.fit((&x, &y), (&x, &y), &keep, &mut rng).is_ok());
    }

    #[test]
    fn test_invalid_data_rejected() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut net = xor_net(&mut rng);
        let (x, y) = xor();
        let config = TrainingConfig::default();

        let short_y = y.slice(0, 0, 3).unwrap();
        assert!(matches!(
            net.fit((&x, &short_y), (&x, &y), &config, &mut rng),
            Err(NetworkError::InvalidData(_))
        ));

        let wide_x = Tensor::zeros([4, 3]).unwrap();
        assert!(matches!(
            net.evaluate(&wide_x, &y),
            Err(NetworkError::InvalidData(_))
        ));

        let bad = TrainingConfig {
            epochs: 0,
            ..Default::default()
        };
        assert!(matches!(
            net.fit((&x, &y), (&x, &y), &bad, &mut rng),
            Err(NetworkError::Config(_))
        ));
    }

    #[test]
    fn test_evaluate_matches_cost_of_predictions() {
        let mut rng = StdRng::seed_from_u64(6);
        let net = xor_net(&mut rng);
        let (x, y) = xor();
        let direct = net.cost().value(&net.predict(&x).unwrap(), &y).unwrap();
        let chunked = net.evaluate_chunked(&x, &y, 3).unwrap();
        assert!((direct - chunked).abs() < 1e-6);
        assert!((net.evaluate(&x, &y).unwrap() - direct).abs() < 1e-6);
    }
}
