#[macro_use]
extern crate criterion;

use std::fs::File;
use std::io::Read;

use sourmash_relay::cmd::{serialize_sketch, sketch_reader, SketchParameters};

use criterion::Criterion;

fn sketch(c: &mut Criterion) {
    let params = SketchParameters::default();

    let mut data: Vec<u8> = vec![];
    let mut f = File::open("tests/test-data/genome.fa").unwrap();
    let _ = f.read_to_end(&mut data);

    let data_lower = data.to_ascii_lowercase();
    let data_errors: Vec<u8> = data
        .iter()
        .enumerate()
        .map(|(i, x)| if i % 89 == 1 && !matches!(*x, b'\n' | b'>') { b'N' } else { *x })
        .collect();

    let mut gz_data: Vec<u8> = vec![];
    File::open("tests/test-data/genome.fa.gz")
        .unwrap()
        .read_to_end(&mut gz_data)
        .unwrap();

    let mut group = c.benchmark_group("sketch_reader");
    group.sample_size(10);

    group.bench_function("valid", |b| {
        b.iter(|| sketch_reader(&data[..], "genome.fa", &params).unwrap());
    });

    group.bench_function("lowercase", |b| {
        b.iter(|| sketch_reader(&data_lower[..], "genome.fa", &params).unwrap());
    });

    group.bench_function("invalid kmers", |b| {
        b.iter(|| sketch_reader(&data_errors[..], "genome.fa", &params).unwrap());
    });

    group.bench_function("gzip", |b| {
        b.iter(|| sketch_reader(&gz_data[..], "genome.fa.gz", &params).unwrap());
    });
    group.finish();
}

fn serialize(c: &mut Criterion) {
    let params = SketchParameters::builder().scaled(1).build();

    let mut data: Vec<u8> = vec![];
    let mut f = File::open("tests/test-data/genome.fa").unwrap();
    let _ = f.read_to_end(&mut data);
    let sig = sketch_reader(&data[..], "genome.fa", &params).unwrap();

    c.bench_function("serialize_sketch", |b| {
        b.iter(|| serialize_sketch(&[sig.clone()]).unwrap());
    });
}

criterion_group!(compute, sketch, serialize);
criterion_main!(compute);
