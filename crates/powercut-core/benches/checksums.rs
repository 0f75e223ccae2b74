//! Benchmarks for the checksum engine and the verdict pipeline.
//!
//! Run with: cargo bench -p powercut-core

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use powercut_core::checksum::{ChecksumAlgorithm, ChecksumConfig, ChecksumEngine};
use powercut_core::{classify, IntegrityReport};
use std::hint::black_box;
use std::io::Cursor;

/// Generate test data of the specified size
fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Hashing throughput per algorithm and input size
fn bench_checksum_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum");

    let sizes = [
        (64 * 1024, "64KB"),
        (1024 * 1024, "1MB"),
        (16 * 1024 * 1024, "16MB"),
    ];

    for (size, size_name) in sizes {
        let data = generate_test_data(size);
        group.throughput(Throughput::Bytes(size as u64));

        for algorithm in ChecksumAlgorithm::all() {
            group.bench_with_input(
                BenchmarkId::new(algorithm.name(), size_name),
                &data,
                |b, data| {
                    b.iter(|| {
                        let mut cursor = Cursor::new(data);
                        ChecksumEngine::new()
                            .calculate(
                                black_box(&mut cursor),
                                black_box(*algorithm),
                                Some(data.len() as u64),
                            )
                            .unwrap()
                    });
                },
            );
        }
    }

    group.finish();
}

/// Effect of the read block size on the default (MD5) baseline digest
fn bench_block_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_size");

    let data_size = 16 * 1024 * 1024;
    let data = generate_test_data(data_size);

    let block_sizes = [
        (64 * 1024, "64KB"),
        (1024 * 1024, "1MB"),
        (4 * 1024 * 1024, "4MB"),
        (16 * 1024 * 1024, "16MB"),
    ];

    group.throughput(Throughput::Bytes(data_size as u64));

    for (block_size, block_name) in block_sizes {
        group.bench_with_input(
            BenchmarkId::new("MD5", block_name),
            &block_size,
            |b, &block_size| {
                b.iter(|| {
                    let mut cursor = Cursor::new(&data);
                    let config = ChecksumConfig::new().block_size(block_size);
                    ChecksumEngine::with_config(config)
                        .calculate(
                            black_box(&mut cursor),
                            black_box(ChecksumAlgorithm::Md5),
                            Some(data.len() as u64),
                        )
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

/// Classifying every possible integrity report
fn bench_classify(c: &mut Criterion) {
    let reports: Vec<IntegrityReport> = (0u8..16)
        .map(|bits| {
            IntegrityReport::new(bits & 8 != 0, bits & 4 != 0, bits & 2 != 0, bits & 1 != 0)
        })
        .collect();

    c.bench_function("classify_all_16", |b| {
        b.iter(|| {
            for report in &reports {
                black_box(classify(black_box(report)));
            }
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(50);
    targets = bench_checksum_algorithms, bench_block_sizes, bench_classify
}
criterion_main!(benches);
