//! End-to-end geometry pipelines: file round trips, Laplacians, compression, skeletons.

use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use geomsim::algo::skeleton::{skeletonize, SkeletonOptions};
use geomsim::algo::spectral::{DenseEigenSolver, SpectralOperatorClient};
use geomsim::io;
use geomsim::mesh::{primitives, HalfEdgeMesh, VertexId};
use geomsim::prelude::*;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("geomsim-it-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn empty_mesh_is_reported() {
    let err = MeshTopology::from_mesh(&HalfEdgeMesh::new()).unwrap_err();
    assert!(matches!(err, Error::EmptyMesh));
    assert_eq!(err.kind(), ErrorKind::Topology);
}

#[test]
fn laplacian_rows_sum_to_zero_for_every_kind() {
    let mesh = primitives::torus(2.0, 0.7, 24, 12);
    let topology = MeshTopology::from_mesh(&mesh).unwrap();
    for kind in [
        LaplacianKind::Cotangent,
        LaplacianKind::CotangentClamped,
        LaplacianKind::Combinatorial,
        LaplacianKind::Normalized,
    ] {
        let options = LaplacianOptions::default().with_kind(kind);
        let laplacian = LaplacianBuilder::new(&topology, &options).build().unwrap();
        for (i, sum) in laplacian.row_sums().into_iter().enumerate() {
            assert!(sum.abs() < 1e-9, "{kind} row {i} sums to {sum}");
        }
    }
}

#[test]
fn full_rank_compression_reproduces_loaded_mesh() {
    let dir = temp_dir("compress");
    let path = dir.join("ico.ply");
    io::save(&primitives::icosahedron(), &path).unwrap();
    let mesh = io::load(&path).unwrap();

    let topology = MeshTopology::from_mesh(&mesh).unwrap();
    let client = SpectralOperatorClient::new(&topology);
    let solver = DenseEigenSolver::default();
    for kind in [LaplacianKind::Cotangent, LaplacianKind::Combinatorial] {
        let options = LaplacianOptions::default().with_kind(kind);
        let laplacian = LaplacianBuilder::new(&topology, &options).build().unwrap();

        let full = client.compress(&laplacian, 12, &solver).unwrap();
        assert!(full.max_difference < 1e-9, "{kind}: {}", full.max_difference);
        for (i, p) in full.positions.iter().enumerate() {
            assert_relative_eq!(*p, *mesh.position(VertexId::new(i)), epsilon = 1e-9);
        }

        let coarse = client.compress(&laplacian, 2, &solver).unwrap();
        assert!(coarse.max_difference > full.max_difference);
        assert!(coarse.min_difference <= coarse.max_difference);
    }

    let laplacian = LaplacianBuilder::new(&topology, &LaplacianOptions::default())
        .build()
        .unwrap();
    let err = client.compress(&laplacian, 13, &solver).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn skeleton_contracts_sphere() {
    let mesh = primitives::icosahedron();
    let options = SkeletonOptions::default().with_iterations(3);
    let skeleton = skeletonize(&mesh, &options).unwrap();
    let contracted = skeleton.to_mesh(&mesh).unwrap();
    assert!(contracted.surface_area() < mesh.surface_area());

    let torus = primitives::torus(2.0, 0.5, 12, 8);
    assert!(matches!(
        skeletonize(&torus, &options),
        Err(Error::NotGenusZero { euler: 0 })
    ));
}

#[test]
fn tetgen_body_lines_up_with_surface() {
    let dir = temp_dir("tetgen");
    let surface_path = dir.join("ball.stl");
    io::save(&primitives::octahedron(), &surface_path).unwrap();
    let surface = io::load(&surface_path).unwrap();
    assert_eq!(surface.num_vertices(), 6);

    let prefix = dir.join("ball");
    io::tetgen::save_input(&surface, &prefix).unwrap();

    // Extend the PLC nodes with the center point, as TetGen would.
    let node_path = io::tetgen::with_suffix(&prefix, ".node");
    let mut node = String::from("7 3 0 0\n");
    for (i, p) in surface.positions().iter().enumerate() {
        node.push_str(&format!("{} {:.17} {:.17} {:.17}\n", i + 1, p.x, p.y, p.z));
    }
    node.push_str("7 0 0 0\n");
    fs::write(&node_path, node).unwrap();

    let mut ele = String::from("8 4 0\n");
    for (t, f) in surface.face_ids().enumerate() {
        let [a, b, c] = surface.face_triangle(f);
        ele.push_str(&format!(
            "{} {} {} {} 7\n",
            t + 1,
            a.index() + 1,
            b.index() + 1,
            c.index() + 1
        ));
    }
    fs::write(io::tetgen::with_suffix(&prefix, ".ele"), ele).unwrap();

    let body = io::tetgen::load(&prefix, surface.num_vertices()).unwrap();
    assert_eq!(body.num_tetras(), 8);
    assert!(body.boundary_faces().is_empty());
    body.check_boundary_matches(&surface, 1e-12).unwrap();
    assert_relative_eq!(body.total_volume(), surface_volume(&surface), epsilon = 1e-9);

    fs::remove_dir_all(&dir).unwrap();
}

/// Enclosed volume by the divergence theorem.
fn surface_volume(mesh: &HalfEdgeMesh) -> f64 {
    mesh.face_ids()
        .map(|f| {
            let [a, b, c] = mesh.face_positions(f);
            a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
        })
        .sum::<f64>()
        .abs()
}
