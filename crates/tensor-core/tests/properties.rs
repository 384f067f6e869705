// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Property tests for the tensor engine.

use proptest::prelude::*;
use tensor_core::{invert_permutation, AxisRange, Selector, Tensor};

/// A tensor of rank 1..=4 with small dimensions and integral values, so sums
/// are exact in f32.
fn arb_tensor() -> impl Strategy<Value = Tensor> {
    prop::collection::vec(1usize..=4, 1..=4).prop_flat_map(|dims| {
        let size: usize = dims.iter().product();
        prop::collection::vec(-50i32..50, size).prop_map(move |values| {
            let data = values.into_iter().map(|v| v as f32).collect();
            Tensor::from_vec(dims.clone(), data).unwrap()
        })
    })
}

/// A tensor together with a valid multi-index into it.
fn arb_tensor_and_index() -> impl Strategy<Value = (Tensor, Vec<usize>)> {
    arb_tensor().prop_flat_map(|t| {
        let index: Vec<_> = t.dims().iter().map(|&d| 0..d).collect();
        (Just(t), index)
    })
}

/// A tensor with a leading axis of at least two slices, and a permutation of
/// that axis.
fn arb_tensor_and_permutation() -> impl Strategy<Value = (Tensor, Vec<usize>)> {
    (2usize..=6, 1usize..=3).prop_flat_map(|(n, width)| {
        let data = prop::collection::vec(-10i32..10, n * width);
        let pattern = Just((0..n).collect::<Vec<usize>>()).prop_shuffle();
        (data, pattern).prop_map(move |(values, pattern)| {
            let data = values.into_iter().map(|v| v as f32).collect();
            (Tensor::from_vec([n, width], data).unwrap(), pattern)
        })
    })
}

/// A tensor with one random selector per axis.
fn arb_tensor_and_selectors() -> impl Strategy<Value = (Tensor, Vec<Selector>)> {
    arb_tensor().prop_flat_map(|t| {
        let selectors: Vec<BoxedStrategy<Selector>> = t
            .dims()
            .iter()
            .map(|&d| prop_oneof![Just(Selector::All), (0..d).prop_map(Selector::Index)].boxed())
            .collect();
        (Just(t), selectors)
    })
}

/// A tensor with one random axis range per axis.
fn arb_tensor_and_ranges() -> impl Strategy<Value = (Tensor, Vec<AxisRange>)> {
    arb_tensor().prop_flat_map(|t| {
        let ranges: Vec<BoxedStrategy<AxisRange>> = t
            .dims()
            .iter()
            .map(|&d| {
                prop_oneof![
                    Just(AxisRange::All),
                    (0..d).prop_map(AxisRange::Index),
                    (0..d).prop_flat_map(move |start| {
                        (start + 1..=d).prop_map(move |end| AxisRange::Range(start, end))
                    }),
                ]
                .boxed()
            })
            .collect();
        (Just(t), ranges)
    })
}

proptest! {
    #[test]
    fn reshape_round_trip(t in arb_tensor()) {
        let flat = t.reshape([t.size()]).unwrap();
        prop_assert_eq!(flat.data(), t.data());
        let back = flat.reshape(t.shape().clone()).unwrap();
        prop_assert_eq!(back, t);
    }

    #[test]
    fn reshape_rejects_other_sizes(t in arb_tensor()) {
        prop_assert!(t.reshape([t.size() + 1]).is_err());
    }

    #[test]
    fn get_after_set((t, index) in arb_tensor_and_index(), value in -100.0f32..100.0) {
        let mut t = t;
        t.set(&index, value).unwrap();
        prop_assert_eq!(t.get(&index).unwrap(), value);
    }

    #[test]
    fn get_out_of_bounds_fails((t, index) in arb_tensor_and_index(), axis in 0usize..4) {
        let axis = axis % t.rank();
        let mut index = index;
        index[axis] = t.dims()[axis];
        prop_assert!(t.get(&index).unwrap_err().is_index_error());
    }

    #[test]
    fn sub_tensor_write_read_symmetry((t, index) in arb_tensor_and_index()) {
        // Fix axis 0, keep the rest.
        let mut selectors = vec![Selector::All; t.rank()];
        selectors[0] = Selector::Index(index[0]);
        let mut target = Tensor::zeros(t.shape().clone()).unwrap();
        let part = t.sub_tensor(&selectors).unwrap();
        target.set_sub_tensor(&selectors, &part).unwrap();
        prop_assert_eq!(target.sub_tensor(&selectors).unwrap(), part);
    }

    #[test]
    fn ranged_sub_tensor_write_read_symmetry((t, index) in arb_tensor_and_index()) {
        let ranges: Vec<AxisRange> = index
            .iter()
            .zip(t.dims())
            .map(|(&start, &dim)| AxisRange::Range(start, dim))
            .collect();
        let part = t.sub_tensor_ranges(&ranges).unwrap();
        let mut target = Tensor::filled(t.shape().clone(), 7.0).unwrap();
        target.set_sub_tensor_ranges(&ranges, &part).unwrap();
        prop_assert_eq!(target.sub_tensor_ranges(&ranges).unwrap(), part);
    }

    #[test]
    fn writing_own_sub_tensor_back_is_identity((t, selectors) in arb_tensor_and_selectors()) {
        let part = t.sub_tensor(&selectors).unwrap();
        let mut written = t.clone();
        written.set_sub_tensor(&selectors, &part).unwrap();
        prop_assert_eq!(written, t);
    }

    #[test]
    fn writing_own_ranged_sub_tensor_back_is_identity((t, ranges) in arb_tensor_and_ranges()) {
        let part = t.sub_tensor_ranges(&ranges).unwrap();
        let mut written = t.clone();
        written.set_sub_tensor_ranges(&ranges, &part).unwrap();
        prop_assert_eq!(written, t);
    }

    #[test]
    fn sum_axis_drops_one_axis(t in arb_tensor(), axis in 0usize..4) {
        let axis = axis % t.rank();
        let reduced = t.sum_axis(axis).unwrap();
        prop_assert_eq!(reduced.rank(), (t.rank() - 1).max(1));
        prop_assert_eq!(reduced.sum(), t.sum());
    }

    #[test]
    fn shuffle_with_inverse_restores((t, pattern) in arb_tensor_and_permutation()) {
        let inverse = invert_permutation(&pattern).unwrap();
        let shuffled = t.shuffle_with(&pattern).unwrap();
        prop_assert_eq!(shuffled.shuffle_with(&inverse).unwrap(), t);
    }

    #[test]
    fn broadcast_row_matches_explicit_repeat(t in arb_tensor()) {
        // The last axis of t is always a valid broadcast operand.
        let last = t.shape().last();
        let row = Tensor::from_vec([last], (0..last).map(|i| i as f32).collect()).unwrap();
        let sum = t.add(&row).unwrap();
        for (i, (&s, &x)) in sum.data().iter().zip(t.data()).enumerate() {
            prop_assert_eq!(s, x + (i % last) as f32);
        }
    }
}

#[test]
fn matrix_product_example() {
    let a = Tensor::from_vec([2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let b = Tensor::from_vec([2, 2], vec![5.0, 6.0, 7.0, 8.0]).unwrap();
    let c = a.dot(&b).unwrap();
    assert_eq!(c.dims(), &[2, 2]);
    assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);
}
