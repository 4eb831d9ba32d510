use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use sales_insights::analyze_dataset;
use sales_insights::ingest::{IngestOptions, load_dataset};
use tempfile::TempDir;

fn generate_sales(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("sales.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "Order Number,Part Number,Qty Shipped,Date Ordered,Price").expect("header");
    for i in 0..rows {
        let part = i % 400;
        let qty = (i % 17) + 1;
        let month = (i % 24) / 2 + 1;
        let year = 2023 + (i % 24) / 12;
        let day = (i % 28) + 1;
        let price = if i % 97 == 0 {
            "call".to_string()
        } else {
            format!("{}.{:02}", (i % 250) + 5, i % 100)
        };
        writeln!(
            file,
            "PO-{i},BR-{part:04},{qty},{year}-{month:02}-{day:02},{price}"
        )
        .expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_pipeline(c: &mut Criterion) {
    let (temp_dir, csv_path) = generate_sales(50_000);
    let dataset = load_dataset(&csv_path, &IngestOptions::default()).expect("load dataset");

    let mut group = c.benchmark_group("pipeline");

    group.bench_function("load_csv", |b| {
        b.iter_batched(
            || (),
            |_| {
                load_dataset(&csv_path, &IngestOptions::default()).expect("load dataset");
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("analyze_dataset", |b| {
        b.iter(|| analyze_dataset(&dataset).expect("analyze"));
    });

    drop(temp_dir);
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
