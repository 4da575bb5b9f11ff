//! Benchmark the nearest classified face lookup.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sthana::core::{AnchorId, Transform, Vec3};
use sthana::mesh::{
    MeshAnchor, MeshClassification, MeshGeometry, MeshSearchConfig, nearest_classified_face,
};

/// Room-sized mesh: a `side x side` grid of anchors 0.5m apart, each holding
/// a `faces x faces` patch of triangles 2cm apart.
fn room_mesh(side: usize, faces: usize) -> Vec<MeshAnchor> {
    let mut anchors = Vec::with_capacity(side * side);
    for i in 0..side {
        for j in 0..side {
            let mut vertices = Vec::with_capacity(faces * faces * 3);
            let mut indices = Vec::with_capacity(faces * faces);
            let mut classes = Vec::with_capacity(faces * faces);
            for u in 0..faces {
                for v in 0..faces {
                    let x = u as f32 * 0.02;
                    let z = v as f32 * 0.02;
                    let base = vertices.len() as u32;
                    vertices.push(Vec3::new(x, 0.0, z));
                    vertices.push(Vec3::new(x + 0.02, 0.0, z));
                    vertices.push(Vec3::new(x, 0.0, z + 0.02));
                    indices.push([base, base + 1, base + 2]);
                    classes.push(MeshClassification::from_raw(((u + v) % 8) as u8));
                }
            }
            let origin = Vec3::new(i as f32 * 0.5, 0.0, j as f32 * 0.5);
            anchors.push(MeshAnchor::new(
                AnchorId((i * side + j) as u64),
                Transform::from_translation(origin),
                MeshGeometry::new(vertices, indices, classes),
            ));
        }
    }
    anchors
}

fn bench_lookup_hit(c: &mut Criterion) {
    let mesh = room_mesh(8, 24);
    let config = MeshSearchConfig::default();
    let target = Vec3::new(1.71, 0.0, 2.13);

    c.bench_function("mesh_lookup_hit", |b| {
        b.iter(|| {
            let found = nearest_classified_face(black_box(target), &mesh, &config);
            black_box(found)
        })
    });
}

fn bench_lookup_miss(c: &mut Criterion) {
    let mesh = room_mesh(8, 24);
    let config = MeshSearchConfig::default();
    // Above the floor: every anchor in range is walked to the end
    let target = Vec3::new(1.71, 0.5, 2.13);

    c.bench_function("mesh_lookup_miss", |b| {
        b.iter(|| {
            let found = nearest_classified_face(black_box(target), &mesh, &config);
            black_box(found)
        })
    });
}

fn bench_lookup_mesh_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh_lookup_anchors");
    let config = MeshSearchConfig::default();

    for side in [4, 8, 16].iter() {
        let mesh = room_mesh(*side, 16);
        let target = Vec3::new(*side as f32 * 0.25, 0.0, *side as f32 * 0.25);
        group.bench_with_input(BenchmarkId::from_parameter(side * side), side, |b, _| {
            b.iter(|| {
                let found = nearest_classified_face(black_box(target), &mesh, &config);
                black_box(found)
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_lookup_hit,
    bench_lookup_miss,
    bench_lookup_mesh_size
);
criterion_main!(benches);
