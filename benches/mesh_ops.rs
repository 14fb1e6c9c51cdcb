//! Benchmarks for Laplacian assembly and simulation steps.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use geomsim::mesh::primitives;
use geomsim::prelude::*;
use geomsim::sim::{step, MassModel, SimulationState};
use nalgebra::Point3;

/// Lattice of `n³` cubes, each split into six tetrahedra around its main diagonal.
fn create_lattice_body(n: usize) -> TetrahedralBody {
    let index = |i: usize, j: usize, k: usize| (k * (n + 1) + j) * (n + 1) + i;

    let mut points = Vec::with_capacity((n + 1).pow(3));
    for k in 0..=n {
        for j in 0..=n {
            for i in 0..=n {
                points.push(Point3::new(i as f64, j as f64, k as f64 + 1.0) * 0.1);
            }
        }
    }

    let mut tetras = Vec::with_capacity(6 * n * n * n);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let c = |di, dj, dk| index(i + di, j + dj, k + dk);
                let (v0, v7) = (c(0, 0, 0), c(1, 1, 1));
                for [a, b] in [
                    [c(1, 0, 0), c(1, 1, 0)],
                    [c(1, 1, 0), c(0, 1, 0)],
                    [c(0, 1, 0), c(0, 1, 1)],
                    [c(0, 1, 1), c(0, 0, 1)],
                    [c(0, 0, 1), c(1, 0, 1)],
                    [c(1, 0, 1), c(1, 0, 0)],
                ] {
                    tetras.push([v0, a, b, v7]);
                }
            }
        }
    }

    TetrahedralBody::new(points, tetras, 0).unwrap()
}

fn bench_laplacian(c: &mut Criterion) {
    let mesh = primitives::torus(2.0, 0.5, 96, 64);
    let topology = MeshTopology::from_mesh(&mesh).unwrap();

    let mut group = c.benchmark_group("laplacian_torus_6144");
    for kind in [LaplacianKind::Cotangent, LaplacianKind::Combinatorial] {
        let parallel = LaplacianOptions::default().with_kind(kind);
        let sequential = parallel.clone().sequential();
        group.bench_with_input(BenchmarkId::new("parallel", kind), &parallel, |b, options| {
            b.iter(|| LaplacianBuilder::new(&topology, options).build().unwrap())
        });
        group.bench_with_input(BenchmarkId::new("sequential", kind), &sequential, |b, options| {
            b.iter(|| LaplacianBuilder::new(&topology, options).build().unwrap())
        });
    }
    group.finish();
}

fn bench_simulation_step(c: &mut Criterion) {
    let body = create_lattice_body(8);

    let mut group = c.benchmark_group("step_lattice_8");
    for model in PhysicsModel::ALL {
        let params = SimulationParams::for_model(model).with_mass(MassModel::Density(1000.0));
        let state = SimulationState::new(&body, &params).unwrap();
        group.bench_function(model.to_string(), |b| {
            let mut state = state.clone();
            b.iter(|| step(&mut state, 1e-5, 0.0).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_laplacian, bench_simulation_step);
criterion_main!(benches);
