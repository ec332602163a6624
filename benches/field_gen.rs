//! Benchmarks for firefly generation and uniform serialization.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use portal_scene::gpu::shaders;
use portal_scene::{FieldPolicy, ParticleField, ShaderParameters};

const AMBIENT: FieldPolicy = FieldPolicy::Ambient {
    half_extent: 2.0,
    height: 1.2,
};

fn bench_field_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_generation");

    for count in [30u32, 1_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("ambient", count), &count, |b, &count| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| black_box(ParticleField::generate_with(count, AMBIENT, &mut rng)))
        });
    }

    let field = ParticleField::generate_with(100_000, AMBIENT, &mut StdRng::seed_from_u64(42));
    group.bench_function("instances_100k", |b| b.iter(|| black_box(field.instances())));

    group.finish();
}

fn bench_uniforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("uniforms");

    let mut params = ShaderParameters::new();
    params.install_fireflies(2.0, 100.0, Vec2::new(2560.0, 1440.0));

    group.bench_function("advance_time", |b| {
        let mut t = 0.0_f32;
        b.iter(|| {
            t += 1.0 / 60.0;
            params.advance_time(black_box(t));
        })
    });

    group.bench_function("firefly_bytes", |b| {
        let uniforms = params.fireflies().cloned().unwrap_or_default();
        b.iter(|| black_box(uniforms.to_bytes()))
    });

    group.bench_function("firefly_shader", |b| {
        let uniforms = params.fireflies().cloned().unwrap_or_default();
        b.iter(|| black_box(shaders::fireflies(&uniforms)))
    });

    group.finish();
}

criterion_group!(benches, bench_field_generation, bench_uniforms);
criterion_main!(benches);
