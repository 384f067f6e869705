// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Axis slicing and leading-axis permutations.

use crate::{Tensor, TensorError};
use rand::Rng;

impl Tensor {
    /// Returns the half-open range `[start, end)` along `axis`, keeping every
    /// other axis intact.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Tensor;
    /// let t = Tensor::from_vec([2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    /// let s = t.slice(1, 1, 3).unwrap();
    /// assert_eq!(s.dims(), &[2, 2]);
    /// assert_eq!(s.data(), &[2.0, 3.0, 5.0, 6.0]);
    /// ```
    pub fn slice(&self, axis: usize, start: usize, end: usize) -> Result<Tensor, TensorError> {
        let dims = self.dims();
        if axis >= dims.len() {
            return Err(TensorError::IndexOutOfBounds {
                op: "slice",
                axis,
                index: axis,
                dim: dims.len(),
            });
        }
        if start >= end || end > dims[axis] {
            return Err(TensorError::InvalidRange {
                op: "slice",
                axis,
                start,
                end,
                dim: dims[axis],
            });
        }

        let inner: usize = dims[axis + 1..].iter().product();
        let block = dims[axis] * inner;
        let mut new_dims = dims.to_vec();
        new_dims[axis] = end - start;

        let mut out = Vec::with_capacity(new_dims.iter().product());
        for chunk in self.data().chunks_exact(block) {
            out.extend_from_slice(&chunk[start * inner..end * inner]);
        }
        Tensor::from_vec(new_dims, out)
    }

    /// Randomly reorders the slices along axis 0.
    ///
    /// Performs `2·N + rng(N)` random pairwise swaps of leading-axis slices.
    /// This is cheap but does **not** produce a uniformly distributed
    /// permutation; use [`shuffle_with`](Tensor::shuffle_with) with a
    /// uniformly drawn pattern when the distribution matters.
    pub fn shuffle<R: Rng + ?Sized>(&self, rng: &mut R) -> Tensor {
        let mut result = self.clone();
        let n = self.dims()[0];
        if n < 2 {
            return result;
        }
        let block = self.size() / n;
        let swaps = 2 * n + rng.gen_range(0..n);
        for _ in 0..swaps {
            let a = rng.gen_range(0..n);
            let b = rng.gen_range(0..n);
            swap_blocks(result.data_mut(), block, a, b);
        }
        result
    }

    /// Applies an exact permutation to the slices along axis 0.
    ///
    /// Slice `i` of the result is slice `pattern[i]` of `self`. The
    /// permutation is applied in place cycle by cycle with pairwise swaps, and
    /// is undone by `shuffle_with(&invert_permutation(pattern)?)`.
    ///
    /// # Errors
    /// Returns [`TensorError::InvalidPermutation`] unless `pattern` is a
    /// permutation of `0..shape[0]`.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{invert_permutation, Tensor};
    /// let t = Tensor::from_vec([3, 1], vec![10.0, 20.0, 30.0]).unwrap();
    /// let p = [2, 0, 1];
    /// let s = t.shuffle_with(&p).unwrap();
    /// assert_eq!(s.data(), &[30.0, 10.0, 20.0]);
    /// let back = s.shuffle_with(&invert_permutation(&p).unwrap()).unwrap();
    /// assert_eq!(back, t);
    /// ```
    pub fn shuffle_with(&self, pattern: &[usize]) -> Result<Tensor, TensorError> {
        let n = self.dims()[0];
        if pattern.len() != n {
            return Err(TensorError::InvalidPermutation(format!(
                "pattern has {} entries for an axis of size {n}",
                pattern.len()
            )));
        }
        validate_permutation(pattern)?;

        let mut result = self.clone();
        let block = self.size() / n.max(1);
        let mut visited = vec![false; n];
        for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut j = start;
            while pattern[j] != start {
                let next = pattern[j];
                swap_blocks(result.data_mut(), block, j, next);
                visited[next] = true;
                j = next;
            }
        }
        Ok(result)
    }
}

/// Returns the inverse of a permutation: `inverse[pattern[i]] == i`.
pub fn invert_permutation(pattern: &[usize]) -> Result<Vec<usize>, TensorError> {
    validate_permutation(pattern)?;
    let mut inverse = vec![0; pattern.len()];
    for (i, &p) in pattern.iter().enumerate() {
        inverse[p] = i;
    }
    Ok(inverse)
}

fn validate_permutation(pattern: &[usize]) -> Result<(), TensorError> {
    let mut seen = vec![false; pattern.len()];
    for &p in pattern {
        if p >= pattern.len() {
            return Err(TensorError::InvalidPermutation(format!(
                "entry {p} is out of range for {} slices",
                pattern.len()
            )));
        }
        if std::mem::replace(&mut seen[p], true) {
            return Err(TensorError::InvalidPermutation(format!(
                "entry {p} appears more than once"
            )));
        }
    }
    Ok(())
}

fn swap_blocks(data: &mut [f32], block: usize, a: usize, b: usize) {
    if a == b {
        return;
    }
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    let (head, tail) = data.split_at_mut(hi * block);
    head[lo * block..(lo + 1) * block].swap_with_slice(&mut tail[..block]);
}
