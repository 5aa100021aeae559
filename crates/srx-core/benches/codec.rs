// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Encode/decode throughput over a small reflected graph.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use srx_core::Archive;
use srx_dry_tests::{linked_pair, Sample};

fn bench_encode(c: &mut Criterion) {
    let sample = Sample { a: -7, b: true };
    c.bench_function("encode_flat_struct", |b| {
        b.iter(|| {
            let mut ar = Archive::new();
            ar.serialize(black_box(&sample));
            ar.raw_data().len()
        });
    });

    let (node_a, _node_b) = linked_pair(1, 2);
    c.bench_function("encode_cyclic_graph", |b| {
        b.iter(|| {
            let mut ar = Archive::new();
            ar.serialize(black_box(&*node_a));
            ar.raw_data().len()
        });
    });
}

fn bench_decode(c: &mut Criterion) {
    let sample = Sample { a: -7, b: true };
    let mut ar = Archive::new();
    ar.serialize(&sample);
    let bytes = ar.raw_data().to_vec();

    c.bench_function("decode_flat_struct", |b| {
        b.iter(|| Archive::from_bytes(black_box(&bytes)).unwrap());
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
