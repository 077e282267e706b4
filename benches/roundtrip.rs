use criterion::{black_box, criterion_group, criterion_main, Criterion};

use doczip::train;

fn synthetic_records(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            format!(
                "{{\"id\":{},\"user\":\"user{}\",\"status\":\"active\",\"region\":\"us-east-{}\"}}",
                i,
                i % 50,
                i % 4
            )
            .into_bytes()
        })
        .collect()
}

fn bench_roundtrip(c: &mut Criterion) {
    let build = synthetic_records(200);
    let validation = synthetic_records(50);
    let model = train(&build, &validation).unwrap();
    let doc = b"{\"id\":9999,\"user\":\"user7\",\"status\":\"active\",\"region\":\"us-east-2\"}";
    let packed = model.compress(doc).unwrap();

    c.bench_function("compress_record", |b| {
        b.iter(|| model.compress(black_box(doc)).unwrap())
    });
    c.bench_function("decompress_record", |b| {
        b.iter(|| model.decompress(black_box(&packed)).unwrap())
    });
    c.bench_function("train_200_records", |b| {
        b.iter(|| train(black_box(&build), black_box(&validation)).unwrap())
    });
}

criterion_group!(benches, bench_roundtrip);
criterion_main!(benches);
