//! Performance benchmarks for GridFile
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gridfile::config::{AdaptorProperties, Credential};
use gridfile::core::{ConflictPolicy, Connector, CopyOperation, EndpointSpec, TransferEngine};
use gridfile::fs::{AdaptorKind, AdaptorRegistry};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Create a test file of the specified size
fn create_test_file(dir: &Path, name: &str, size: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();

    let chunk_size = 64 * 1024;
    let chunk: Vec<u8> = (0..chunk_size).map(|i| (i % 256) as u8).collect();
    let mut remaining = size;

    while remaining > 0 {
        let to_write = remaining.min(chunk_size);
        file.write_all(&chunk[..to_write]).unwrap();
        remaining -= to_write;
    }

    path
}

fn connector() -> Connector {
    Connector::new(
        AdaptorRegistry::builtin(),
        AdaptorKind::File,
        Credential::default(),
        Credential::default(),
        AdaptorProperties::default(),
    )
}

fn operation(source: &Path, target: &Path, recursive: bool) -> CopyOperation {
    CopyOperation {
        source: EndpointSpec::parse(&source.display().to_string(), AdaptorKind::File, None),
        target: EndpointSpec::parse(&target.display().to_string(), AdaptorKind::File, None),
        recursive,
        conflict_policy: ConflictPolicy::Replace,
    }
}

fn bench_copy_tree(c: &mut Criterion) {
    let src_dir = TempDir::new().unwrap();
    let dst_dir = TempDir::new().unwrap();

    // 10 directories of 100 small files
    for i in 0..10 {
        let subdir = src_dir.path().join(format!("subdir_{}", i));
        std::fs::create_dir_all(&subdir).unwrap();
        for j in 0..100 {
            create_test_file(&subdir, &format!("file_{}.txt", j), 1024);
        }
    }

    let connector = connector();
    let op = operation(src_dir.path(), &dst_dir.path().join("tree"), true);

    c.bench_function("copy_tree_1000_small_files", |b| {
        b.iter(|| {
            let mut engine = TransferEngine::new(
                &connector,
                Box::new(std::io::empty()),
                Box::new(std::io::sink()),
            );
            black_box(engine.run(&op).unwrap())
        });
    });
}

fn bench_copy_large_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_file_copy");
    let connector = connector();

    for size in [1024 * 1024, 10 * 1024 * 1024, 100 * 1024 * 1024].iter() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();

        let src_file = create_test_file(src_dir.path(), "large.bin", *size);
        let op = operation(&src_file, &dst_dir.path().join("large.bin"), false);

        group.throughput(Throughput::Bytes(*size as u64));
        for buffer_size in [16 * 1024, 1024 * 1024] {
            group.bench_with_input(
                BenchmarkId::new(
                    humansize::format_size(buffer_size as u64, humansize::BINARY),
                    humansize::format_size(*size as u64, humansize::BINARY),
                ),
                size,
                |b, _| {
                    b.iter(|| {
                        let mut engine = TransferEngine::new(
                            &connector,
                            Box::new(std::io::empty()),
                            Box::new(std::io::sink()),
                        )
                        .with_buffer_size(buffer_size);
                        black_box(engine.run(&op).unwrap())
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_stream_out(c: &mut Criterion) {
    let src_dir = TempDir::new().unwrap();
    let size = 10 * 1024 * 1024;
    let src_file = create_test_file(src_dir.path(), "stream.bin", size);
    let connector = connector();

    let op = CopyOperation {
        source: EndpointSpec::parse(&src_file.display().to_string(), AdaptorKind::File, None),
        target: EndpointSpec::parse("-", AdaptorKind::File, None),
        recursive: false,
        conflict_policy: ConflictPolicy::Create,
    };

    let mut group = c.benchmark_group("stream_out");
    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("10MiB_to_sink", |b| {
        b.iter(|| {
            let mut engine = TransferEngine::new(
                &connector,
                Box::new(std::io::empty()),
                Box::new(std::io::sink()),
            );
            black_box(engine.run(&op).unwrap())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_copy_tree, bench_copy_large_file, bench_stream_out);

criterion_main!(benches);
