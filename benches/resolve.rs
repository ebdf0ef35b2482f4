//! Benchmarks for dependency resolution
//!
//! Measures how the resolver scales with batch size, including batches whose
//! dependencies never resolve.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rifs_core::{CommandOperation, Operation, OperationCore, OperationId, ResolvePolicy, Workspace};
use rifs_pipeline::{JobFactory, Resolver};
use std::path::Path;

const SIZES: &[usize] = &[10, 100, 500];

fn operation(root: &Path, name: String, depend_on: Vec<OperationId>) -> CommandOperation {
    let core = OperationCore::new(name, Workspace::create_in(root).unwrap()).with_depend_on(depend_on);
    CommandOperation::new(core, ["echo", "bench"])
}

fn resolver_from(ops: Vec<CommandOperation>) -> Resolver {
    let factory = JobFactory::default();
    let mut resolver = Resolver::new();
    for op in ops {
        let job = factory
            .convert(&op, None, &op.core().submission_fields)
            .unwrap();
        resolver.inject(Box::new(op), job);
    }
    resolver
}

/// Each operation depends on the previous one, injected in reverse.
fn reversed_chain(root: &Path, n: usize) -> Vec<CommandOperation> {
    let mut ops: Vec<CommandOperation> = Vec::with_capacity(n);
    for i in 0..n {
        let deps = ops.last().map(|op| vec![op.core().id()]).unwrap_or_default();
        ops.push(operation(root, format!("step{i}"), deps));
    }
    ops.reverse();
    ops
}

/// One sink depending on every other operation, injected first.
fn fan_in(root: &Path, n: usize) -> Vec<CommandOperation> {
    let sources: Vec<CommandOperation> = (0..n.saturating_sub(1))
        .map(|i| operation(root, format!("source{i}"), vec![]))
        .collect();
    let sink = operation(
        root,
        "sink".into(),
        sources.iter().map(|op| op.core().id()).collect(),
    );
    std::iter::once(sink).chain(sources).collect()
}

/// Chain with a dangling dependency at the head; nothing resolves.
fn broken_chain(root: &Path, n: usize) -> Vec<CommandOperation> {
    let mut ops: Vec<CommandOperation> = Vec::with_capacity(n);
    for i in 0..n {
        let deps = match ops.last() {
            Some(op) => vec![op.core().id()],
            None => vec![OperationId::new()],
        };
        ops.push(operation(root, format!("step{i}"), deps));
    }
    ops
}

fn bench_resolve(c: &mut Criterion) {
    let root = tempfile::tempdir().unwrap();
    let mut group = c.benchmark_group("resolve");

    for &n in SIZES {
        group.bench_with_input(BenchmarkId::new("reversed_chain", n), &n, |b, &n| {
            b.iter_batched(
                || resolver_from(reversed_chain(root.path(), n)),
                |resolver| black_box(resolver.resolve(ResolvePolicy::Strict)),
                criterion::BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("fan_in", n), &n, |b, &n| {
            b.iter_batched(
                || resolver_from(fan_in(root.path(), n)),
                |resolver| black_box(resolver.resolve(ResolvePolicy::Strict)),
                criterion::BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("broken_chain_force", n), &n, |b, &n| {
            b.iter_batched(
                || resolver_from(broken_chain(root.path(), n)),
                |resolver| black_box(resolver.resolve(ResolvePolicy::Force)),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
