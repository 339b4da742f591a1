//! Performance benchmarks for the deimos engine

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use deimos::fingerprint::patterns::match_banner;
use deimos::ports::port_info;
use deimos::vuln::{risk_score, Severity, Vulnerability};

/// Benchmark banner pattern matching across the protocol families
fn bench_banner_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("banner_matching");

    group.bench_function("openssh_banner", |b| {
        b.iter(|| {
            match_banner(
                black_box("SSH-2.0-OpenSSH_8.9p1 Ubuntu-3ubuntu0.6"),
                black_box(22),
            )
        })
    });

    group.bench_function("http_response_head", |b| {
        b.iter(|| {
            match_banner(
                black_box("HTTP/1.1 200 OK\r\nServer: nginx/1.18.0\r\nContent-Length: 612\r\n\r\n"),
                black_box(80),
            )
        })
    });

    group.bench_function("unmatched_banner", |b| {
        b.iter(|| match_banner(black_box("proprietary wire protocol v3"), black_box(47808)))
    });

    group.finish();
}

/// Benchmark reference-data lookup over the whole port space
fn bench_port_lookup(c: &mut Criterion) {
    c.bench_function("port_info_sweep_1000", |b| {
        b.iter(|| {
            for port in black_box(1u16..=1000) {
                black_box(port_info(port));
            }
        })
    });
}

/// Benchmark the risk-score reduction
fn bench_risk_score(c: &mut Criterion) {
    let findings: Vec<Vulnerability> = [
        Severity::Critical,
        Severity::High,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ]
    .iter()
    .map(|&s| Vulnerability::new(s, "finding", "description", "recommendation"))
    .collect();

    c.bench_function("risk_score_6_findings", |b| {
        b.iter(|| risk_score(black_box(&findings)))
    });
}

criterion_group!(
    benches,
    bench_banner_matching,
    bench_port_lookup,
    bench_risk_score
);
criterion_main!(benches);
