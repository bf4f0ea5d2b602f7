//! Performance benchmarks for merging, downgrading and encoding documents.
//!
//! Run with: cargo bench --bench merge_benchmark

use cdx_tools::merge::{flat_merge, hierarchical_merge, MergeOptions};
use cdx_tools::model::{Bom, Component, ComponentType, Dependency, SpecVersion};
use cdx_tools::serialization::{self, Format};
use cdx_tools::{downgrade, ListMergeStrategy};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

/// Generate a document with `count` library components, half of them
/// shared with every other document built with the same `count`.
fn generate_bom(prefix: &str, count: usize) -> Bom {
    let mut bom = Bom::new(SpecVersion::V1_6);
    bom.metadata_mut().component = Some(
        Component::new(ComponentType::Application, prefix)
            .with_version("1.0.0")
            .with_bom_ref(prefix),
    );

    let mut components = Vec::with_capacity(count);
    for i in 0..count {
        let name = if i % 2 == 0 {
            format!("shared-{i}")
        } else {
            format!("{prefix}-{i}")
        };
        let version = format!("1.{}.{}", i % 10, i % 100);
        let purl = format!("pkg:npm/{name}@{version}");
        components.push(
            Component::new(ComponentType::Library, name)
                .with_version(version)
                .with_purl(purl.clone())
                .with_bom_ref(purl),
        );
    }

    let refs: Vec<String> = components.iter().filter_map(|c| c.bom_ref.clone()).collect();
    let mut dependencies = vec![Dependency::with_depends_on(prefix, refs.clone())];
    dependencies.extend(refs.into_iter().map(Dependency::new));

    bom.components = Some(components);
    bom.dependencies = Some(dependencies);
    bom
}

fn generate_set(documents: usize, count: usize) -> Vec<Bom> {
    (0..documents)
        .map(|i| generate_bom(&format!("app{i}"), count))
        .collect()
}

fn options(strategy: ListMergeStrategy) -> MergeOptions {
    MergeOptions::intermediate(strategy)
}

fn bench_flat_merge_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_merge_scaling");

    for size in [100, 500, 1000] {
        let boms = generate_set(4, size);
        for (label, strategy) in [
            ("careful", ListMergeStrategy::Careful),
            ("quick", ListMergeStrategy::Quick),
        ] {
            let opts = options(strategy);
            group.bench_with_input(BenchmarkId::new(label, size), &boms, |b, boms| {
                b.iter(|| {
                    let _ = black_box(flat_merge(black_box(boms), None, &opts));
                })
            });
        }
    }

    group.finish();
}

fn bench_hierarchical_merge(c: &mut Criterion) {
    let boms = generate_set(4, 500);
    let subject = Component::new(ComponentType::Application, "platform").with_version("1");
    let opts = options(ListMergeStrategy::Careful);

    c.bench_function("hierarchical_merge_4x500", |b| {
        b.iter(|| {
            let _ = black_box(hierarchical_merge(
                black_box(&boms),
                Some(subject.clone()),
                &opts,
            ));
        })
    });
}

fn bench_downgrade(c: &mut Criterion) {
    let mut group = c.benchmark_group("downgrade");
    let bom = generate_bom("app", 1000);

    for target in [SpecVersion::V1_4, SpecVersion::V1_2, SpecVersion::V1_0] {
        group.bench_with_input(
            BenchmarkId::from_parameter(target.as_str()),
            &target,
            |b, &target| {
                b.iter(|| black_box(downgrade(black_box(&bom), target)));
            },
        );
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_1000_components");
    let bom = generate_bom("app", 1000);

    for format in Format::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(format.extension()),
            &format,
            |b, &format| {
                b.iter(|| {
                    let _ = black_box(serialization::serialize(&bom, format, SpecVersion::V1_6));
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_flat_merge_scaling,
    bench_hierarchical_merge,
    bench_downgrade,
    bench_encode,
);
criterion_main!(benches);
