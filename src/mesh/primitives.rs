//! Small closed meshes used by tests, benchmarks and the CLI ground plane.

use nalgebra::Point3;

use super::builder::build_from_triangles;
use super::halfedge::HalfEdgeMesh;

fn build(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> HalfEdgeMesh {
    // Inputs are static and well-formed.
    match build_from_triangles(vertices, faces) {
        Ok(mesh) => mesh,
        Err(e) => unreachable!("primitive mesh is malformed: {e}"),
    }
}

/// An irregular tetrahedron with outward-facing triangles.
pub fn tetrahedron() -> HalfEdgeMesh {
    let vertices = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.5, 1.0, 0.0),
        Point3::new(0.5, 0.5, 1.0),
    ];
    let faces = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
    build(&vertices, &faces)
}

/// Regular octahedron with vertices on the coordinate axes.
///
/// Vertex order: `+x, -x, +y, -y, +z, -z`.
pub fn octahedron() -> HalfEdgeMesh {
    let vertices = [
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let faces = [
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];
    build(&vertices, &faces)
}

/// Regular icosahedron inscribed in the unit sphere.
pub fn icosahedron() -> HalfEdgeMesh {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let s = 1.0 / (1.0 + t * t).sqrt();
    let raw = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ];
    let vertices: Vec<Point3<f64>> = raw
        .iter()
        .map(|&(x, y, z)| Point3::new(x * s, y * s, z * s))
        .collect();
    let faces = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    build(&vertices, &faces)
}

/// Closed torus around the z axis with `rings x sides` vertices.
///
/// Both `rings` and `sides` must be at least 3.
pub fn torus(major_radius: f64, minor_radius: f64, rings: usize, sides: usize) -> HalfEdgeMesh {
    let rings = rings.max(3);
    let sides = sides.max(3);
    let tau = std::f64::consts::TAU;

    let mut vertices = Vec::with_capacity(rings * sides);
    for i in 0..rings {
        let theta = tau * i as f64 / rings as f64;
        for j in 0..sides {
            let phi = tau * j as f64 / sides as f64;
            let r = major_radius + minor_radius * phi.cos();
            vertices.push(Point3::new(
                r * theta.cos(),
                r * theta.sin(),
                minor_radius * phi.sin(),
            ));
        }
    }

    let index = |i: usize, j: usize| (i % rings) * sides + (j % sides);
    let mut faces = Vec::with_capacity(rings * sides * 2);
    for i in 0..rings {
        for j in 0..sides {
            let a = index(i, j);
            let b = index(i + 1, j);
            let c = index(i + 1, j + 1);
            let d = index(i, j + 1);
            faces.push([a, b, c]);
            faces.push([a, c, d]);
        }
    }
    build(&vertices, &faces)
}

/// Square ground plane of two triangles at height `z`, facing +z.
pub fn ground_plane(half_size: f64, z: f64) -> HalfEdgeMesh {
    let s = half_size;
    let vertices = [
        Point3::new(-s, -s, z),
        Point3::new(s, -s, z),
        Point3::new(s, s, z),
        Point3::new(-s, s, z),
    ];
    build(&vertices, &[[0, 1, 2], [0, 2, 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_primitives() {
        for (mesh, euler) in [
            (tetrahedron(), 2),
            (octahedron(), 2),
            (icosahedron(), 2),
            (torus(2.0, 0.5, 8, 6), 0),
        ] {
            assert!(mesh.is_valid());
            assert!(mesh.is_closed());
            assert_eq!(mesh.euler_characteristic(), euler);
        }
    }

    #[test]
    fn test_icosahedron_on_unit_sphere() {
        let mesh = icosahedron();
        for v in mesh.vertex_ids() {
            assert!((mesh.position(v).coords.norm() - 1.0).abs() < 1e-12);
            assert_eq!(mesh.valence(v), 5);
        }
    }

    #[test]
    fn test_ground_plane_is_open() {
        let mesh = ground_plane(5.0, 0.0);
        assert!(!mesh.is_closed());
        assert!((mesh.surface_area() - 100.0).abs() < 1e-12);
    }
}
