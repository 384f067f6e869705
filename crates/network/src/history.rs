// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-epoch training history.
//!
//! [`History`] is the hand-off point for reporting: it records the train and
//! test cost after every epoch and can be exported as JSON for plotting.

use std::time::Duration;

/// Costs measured after a single training epoch.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EpochRecord {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Mean cost over the training set, forward-only, after the epoch.
    pub train_cost: f32,
    /// Mean cost over the test set, forward-only, after the epoch.
    pub test_cost: f32,
    /// Wall-clock time of the epoch, including evaluation.
    pub duration: Duration,
}

/// Append-only sequence of [`EpochRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct History {
    records: Vec<EpochRecord>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn push(&mut self, record: EpochRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[EpochRecord] {
        &self.records
    }

    pub fn first(&self) -> Option<&EpochRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&EpochRecord> {
        self.records.last()
    }

    /// Training cost per epoch, in order.
    pub fn train_costs(&self) -> Vec<f32> {
        self.records.iter().map(|r| r.train_cost).collect()
    }

    /// Test cost per epoch, in order.
    pub fn test_costs(&self) -> Vec<f32> {
        self.records.iter().map(|r| r.test_cost).collect()
    }

    /// Total wall-clock time across all recorded epochs.
    pub fn total_duration(&self) -> Duration {
        self.records.iter().map(|r| r.duration).sum()
    }

    /// Returns a one-line human-readable summary.
    pub fn summary(&self) -> String {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => format!(
                "Training: {} epochs in {:.2}ms, train cost {:.6} -> {:.6}, test cost {:.6} -> {:.6}",
                self.len(),
                self.total_duration().as_secs_f64() * 1000.0,
                first.train_cost,
                last.train_cost,
                first.test_cost,
                last.test_cost,
            ),
            _ => "Training: 0 epochs".to_string(),
        }
    }

    /// Serialises the history as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
