// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for tensor operations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tensor_core::Tensor;

fn bench_matmul(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let mut group = c.benchmark_group("dot");
    for n in [16usize, 64, 128] {
        let a = Tensor::uniform([n, n], -1.0, 1.0, &mut rng).unwrap();
        let b = Tensor::uniform([n, n], -1.0, 1.0, &mut rng).unwrap();
        group.bench_with_input(BenchmarkId::new("matmul", n), &n, |bench, _| {
            bench.iter(|| black_box(&a).dot(black_box(&b)))
        });
        group.bench_with_input(BenchmarkId::new("dot_transpose", n), &n, |bench, _| {
            bench.iter(|| black_box(&a).dot_transpose(black_box(&b)))
        });
    }
    group.finish();
}

fn bench_conv2d(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let image = Tensor::uniform([28, 28, 1], 0.0, 1.0, &mut rng).unwrap();
    let kernel = Tensor::uniform([3, 3, 1, 8], -0.5, 0.5, &mut rng).unwrap();
    c.bench_function("conv2d 28x28x1 k3 f8", |bench| {
        bench.iter(|| black_box(&image).conv2d(black_box(&kernel)))
    });
}

fn bench_reduce(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let t = Tensor::uniform([64, 32, 16], -1.0, 1.0, &mut rng).unwrap();
    let mut group = c.benchmark_group("sum_axis");
    for axis in 0..3 {
        group.bench_with_input(BenchmarkId::from_parameter(axis), &axis, |bench, &axis| {
            bench.iter(|| black_box(&t).sum_axis(axis))
        });
    }
    group.finish();
}

fn bench_shuffle(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let t = Tensor::uniform([1000, 16], 0.0, 1.0, &mut rng).unwrap();
    let pattern: Vec<usize> = (0..1000).rev().collect();
    c.bench_function("shuffle_with 1000x16", |bench| {
        bench.iter(|| black_box(&t).shuffle_with(black_box(&pattern)))
    });
}

criterion_group!(benches, bench_matmul, bench_conv2d, bench_reduce, bench_shuffle);
criterion_main!(benches);
