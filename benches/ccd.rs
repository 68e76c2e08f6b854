//! Continuous-collision benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --bench ccd
//! Filter:     cargo bench --bench ccd -- shape_pair

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use swept::math::Vec3;
use swept::{
    continuous_collide, Aabb, BvhModel, CcdRequest, Geometry, InterpMotion, Obb, Shape, Transform,
};

fn moving(from: Vec3, to: Vec3) -> InterpMotion {
    InterpMotion::new(
        Transform::from_translation(from),
        Transform::from_translation(to),
    )
}

/// Axis-aligned grid of triangles in the xy plane, `n x n` cells.
fn grid_mesh(n: u32) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let mut vertices = Vec::new();
    let mut triangles = Vec::new();
    for y in 0..=n {
        for x in 0..=n {
            vertices.push(Vec3::new(x as f64 / n as f64, y as f64 / n as f64, 0.0));
        }
    }
    let stride = n + 1;
    for y in 0..n {
        for x in 0..n {
            let v0 = y * stride + x;
            triangles.push([v0, v0 + 1, v0 + stride]);
            triangles.push([v0 + 1, v0 + stride + 1, v0 + stride]);
        }
    }
    (vertices, triangles)
}

fn bench_shape_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("shape_pair");
    let req = CcdRequest::default();

    let sphere = Geometry::Shape(Shape::Sphere { radius: 1.0 });
    group.bench_function("sphere_sphere_hit", |b| {
        b.iter(|| {
            let mut m1 = moving(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
            let mut m2 = moving(Vec3::new(3.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
            continuous_collide(&sphere, &mut m1, &sphere, &mut m2, &req).unwrap()
        });
    });

    let cube = Geometry::Shape(Shape::Box {
        half_extents: Vec3::splat(0.5),
    });
    group.bench_function("sphere_box_miss", |b| {
        b.iter(|| {
            let mut m1 = moving(Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 2.0, 0.0));
            let mut m2 = InterpMotion::stationary(Transform::IDENTITY);
            continuous_collide(&sphere, &mut m1, &cube, &mut m2, &req).unwrap()
        });
    });
    group.finish();
}

fn bench_mesh_mesh(c: &mut Criterion) {
    let req = CcdRequest::default();

    {
        let mut group = c.benchmark_group("mesh_mesh/aabb");
        for &n in &[4u32, 8, 16] {
            let (v, t) = grid_mesh(n);
            let a = Geometry::AabbMesh(BvhModel::<Aabb>::from_mesh(v.clone(), t.clone()));
            let b = Geometry::AabbMesh(BvhModel::<Aabb>::from_mesh(v, t));
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, _| {
                bench.iter(|| {
                    let mut m1 = InterpMotion::stationary(Transform::IDENTITY);
                    let mut m2 = moving(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 0.5));
                    continuous_collide(&a, &mut m1, &b, &mut m2, &req).unwrap()
                });
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("mesh_mesh/obb");
        for &n in &[4u32, 8, 16] {
            let (v, t) = grid_mesh(n);
            let a = Geometry::ObbMesh(BvhModel::<Obb>::from_mesh(v.clone(), t.clone()));
            let b = Geometry::ObbMesh(BvhModel::<Obb>::from_mesh(v, t));
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, _| {
                bench.iter(|| {
                    let mut m1 = InterpMotion::stationary(Transform::IDENTITY);
                    let mut m2 = moving(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 0.5));
                    continuous_collide(&a, &mut m1, &b, &mut m2, &req).unwrap()
                });
            });
        }
        group.finish();
    }
}

criterion_group!(benches, bench_shape_pair, bench_mesh_mesh);
criterion_main!(benches);
