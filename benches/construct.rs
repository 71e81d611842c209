//! Constructor-pipeline benchmarks.
//!
//! Measures hash-consing and simplification throughput on layered formulas,
//! without involving the SAT backend.
//!
//! Run with:
//! ```bash
//! cargo bench --bench construct
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use eqcheck::context::Context;
use eqcheck::reference::Ref;

/// Builds a balanced tree of alternating OR/ITE layers over `n` atoms.
fn build_layered(ctx: &mut Context<String>, n: usize, rng: &mut ChaCha8Rng) -> Ref {
    let mut layer: Vec<Ref> = (0..n)
        .map(|k| {
            let t = ctx.get_term(format!("x{}", k));
            if rng.gen_bool(0.5) {
                -t
            } else {
                t
            }
        })
        .collect();

    let mut level = 0usize;
    while layer.len() > 1 {
        let mut next = Vec::with_capacity(layer.len() / 2 + 1);
        for pair in layer.chunks(2) {
            if pair.len() == 1 {
                next.push(pair[0]);
            } else if level % 2 == 0 {
                next.push(ctx.get_or([pair[0], pair[1]]));
            } else {
                let i = pair[0];
                let t = pair[1];
                next.push(ctx.ifelse(i, t, -t));
            }
        }
        layer = next;
        level += 1;
    }
    layer[0]
}

fn bench_layered_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("layered_construction");
    for &n in &[16usize, 64, 256] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut rng = ChaCha8Rng::seed_from_u64(42);
                let mut ctx = Context::new();
                build_layered(&mut ctx, n, &mut rng)
            });
        });
    }
    group.finish();
}

fn bench_reconstruction_hits(c: &mut Criterion) {
    // Re-building an existing DAG only exercises the interning fast path.
    c.bench_function("reconstruction_hits", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut ctx = Context::new();
        build_layered(&mut ctx, 256, &mut rng);
        b.iter(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            build_layered(&mut ctx, 256, &mut rng)
        });
    });
}

criterion_group!(benches, bench_layered_construction, bench_reconstruction_hits);
criterion_main!(benches);
