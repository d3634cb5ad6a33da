use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use incident_digest::{digest, ScanConfig};

/// Export-shaped CSV: ids repeat every `entities` rows, as updates to the same ticket do.
fn incident_log(rows: usize, entities: usize) -> String {
    let categories = ["Category 26", "Category 53", "Category 9", "Category 46"];
    let mut out = String::from("number,category,priority,opened_at,resolved_at,closed_at\n");
    for i in 0..rows {
        let day = 1 + (i % 27);
        out.push_str(&format!(
            "INC{:07},{},{} - Moderate,{:02}/03/2016 {:02}:{:02},{:02}/03/2016 {:02}:00,?\n",
            i % entities,
            categories[i % categories.len()],
            1 + i % 4,
            day,
            i % 24,
            i % 60,
            day + 1,
            (i * 7) % 24,
        ));
    }
    out
}

fn bench_sequential_scan(c: &mut Criterion) {
    let input = incident_log(50_000, 8_000);
    let config = ScanConfig::default();

    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("sequential_50k", |b| {
        b.iter(|| black_box(digest(black_box(input.as_bytes()), &config).unwrap()));
    });
    group.finish();
}

fn bench_sharded_scan(c: &mut Criterion) {
    let input = incident_log(200_000, 25_000);

    let mut group = c.benchmark_group("sharded");
    group.throughput(Throughput::Elements(200_000));
    group.sample_size(20);
    for threads in [1usize, 2, 4] {
        let config = ScanConfig {
            max_rows: None,
            threads,
            ..ScanConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(threads), &config, |b, config| {
            b.iter(|| black_box(digest(black_box(input.as_bytes()), config).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sequential_scan, bench_sharded_scan);
criterion_main!(benches);
