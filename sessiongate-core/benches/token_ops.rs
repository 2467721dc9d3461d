//! Benchmarks for the token hot paths: sign, verify and refresh

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use sessiongate_core::auth::*;

const PAYLOAD_FIELDS: &[usize] = &[1, 8, 64];

fn payload(fields: usize) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = (0..fields)
        .map(|i| (format!("field{}", i), json!(format!("value-{}", i))))
        .collect();
    serde_json::Value::Object(map)
}

fn generators() -> Vec<(&'static str, TokenGenerator)> {
    let options = SignOptions::new().expires_in(TimeSpan::hours(1));
    vec![
        ("hs256", TokenGenerator::hmac(Some(b"bench-secret"), options.clone())),
        ("eddsa", TokenGenerator::ed25519(KeyPair::generate(), options)),
    ]
}

fn bench_sign(c: &mut Criterion) {
    let mut group = c.benchmark_group("sign");

    for (name, generator) in generators() {
        for &fields in PAYLOAD_FIELDS {
            let payload = payload(fields);
            group.bench_with_input(BenchmarkId::new(name, fields), &fields, |b, _| {
                b.iter(|| black_box(generator.sign(&payload, &SignOptions::new()).unwrap()));
            });
        }
    }

    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify");

    for (name, generator) in generators() {
        for &fields in PAYLOAD_FIELDS {
            let token = generator.sign(&payload(fields), &SignOptions::new()).unwrap();
            group.bench_with_input(BenchmarkId::new(name, fields), &fields, |b, _| {
                b.iter(|| black_box(generator.verify(&token).unwrap()));
            });
        }
    }

    group.finish();
}

fn bench_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh");
    let refresh = RefreshOptions::new().jwtid("bench-refresh");

    for (name, generator) in generators() {
        let token = generator.sign(&payload(8), &SignOptions::new()).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| black_box(generator.refresh(&token, &refresh).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sign, bench_verify, bench_refresh);
criterion_main!(benches);
