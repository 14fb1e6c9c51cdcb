//! Tetrahedral volume meshes.
//!
//! A [`TetrahedralBody`] is the volumetric companion of a closed surface mesh. Its first
//! `n_vertices_boundary` points are the surface vertices in surface order; the remaining points
//! lie inside. Topology is fixed after construction, only point positions change.

use nalgebra::{Matrix3, Point3};

use crate::error::{Error, Result};
use crate::mesh::{HalfEdgeMesh, VertexId};

/// Local vertex pairs forming the six edges of a tetrahedron.
pub const TETRA_EDGES: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/// Unsigned volume of the tetrahedron `abcd`: `|dot(b - a, cross(c - a, d - a))| / 6`.
pub fn tetra_volume(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    (b - a).dot(&(c - a).cross(&(d - a))).abs() / 6.0
}

/// Edge matrix `[p1 - p0, p2 - p0, p3 - p0]` (edges as columns).
pub fn edge_matrix(p: &[Point3<f64>; 4]) -> Matrix3<f64> {
    Matrix3::from_columns(&[p[1] - p[0], p[2] - p[0], p[3] - p[0]])
}

/// A tetrahedralized solid.
#[derive(Debug, Clone)]
pub struct TetrahedralBody {
    points: Vec<Point3<f64>>,
    tetras: Vec<[usize; 4]>,
    n_vertices_boundary: usize,
    boundary_faces: Vec<[usize; 3]>,
}

impl TetrahedralBody {
    /// Create a body from points and tetrahedra.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyMesh`] without points, [`Error::InvalidTetraIndex`] for an out-of-range
    /// tetra corner, [`Error::BoundaryMismatch`] if `n_vertices_boundary` exceeds the point count.
    pub fn new(
        points: Vec<Point3<f64>>,
        tetras: Vec<[usize; 4]>,
        n_vertices_boundary: usize,
    ) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::EmptyMesh);
        }
        if n_vertices_boundary > points.len() {
            return Err(Error::BoundaryMismatch {
                details: format!(
                    "{n_vertices_boundary} boundary vertices but only {} points",
                    points.len()
                ),
            });
        }
        for (t, tetra) in tetras.iter().enumerate() {
            if let Some(&vertex) = tetra.iter().find(|&&v| v >= points.len()) {
                return Err(Error::InvalidTetraIndex { tetra: t, vertex });
            }
        }

        Ok(Self {
            points,
            tetras,
            n_vertices_boundary,
            boundary_faces: Vec::new(),
        })
    }

    /// Attach the boundary triangles reported by the tetrahedralizer.
    pub fn with_boundary_faces(mut self, faces: Vec<[usize; 3]>) -> Result<Self> {
        for (f, face) in faces.iter().enumerate() {
            if let Some(&vertex) = face.iter().find(|&&v| v >= self.points.len()) {
                return Err(Error::InvalidVertexIndex { face: f, vertex });
            }
        }
        self.boundary_faces = faces;
        Ok(self)
    }

    /// Number of points.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.points.len()
    }

    /// Number of points shared with the surface mesh.
    #[inline]
    pub fn num_vertices_boundary(&self) -> usize {
        self.n_vertices_boundary
    }

    /// Number of tetrahedra.
    #[inline]
    pub fn num_tetras(&self) -> usize {
        self.tetras.len()
    }

    /// Point positions.
    #[inline]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Tetrahedra as four point indices each.
    #[inline]
    pub fn tetras(&self) -> &[[usize; 4]] {
        &self.tetras
    }

    /// Boundary triangles, empty if none were loaded.
    #[inline]
    pub fn boundary_faces(&self) -> &[[usize; 3]] {
        &self.boundary_faces
    }

    /// Overwrite all point positions. The count must not change.
    pub fn set_points(&mut self, points: &[Point3<f64>]) -> Result<()> {
        if points.len() != self.points.len() {
            return Err(Error::invalid_param(
                "points",
                points.len(),
                "count differs from the body",
            ));
        }
        self.points.copy_from_slice(points);
        Ok(())
    }

    /// The four corner positions of tetrahedron `t`.
    pub fn tetra_positions(&self, t: usize) -> [Point3<f64>; 4] {
        self.tetras[t].map(|v| self.points[v])
    }

    /// Volume of tetrahedron `t` in the current configuration.
    pub fn volume(&self, t: usize) -> f64 {
        let [a, b, c, d] = self.tetra_positions(t);
        tetra_volume(&a, &b, &c, &d)
    }

    /// Sum of all tetrahedron volumes.
    pub fn total_volume(&self) -> f64 {
        (0..self.num_tetras()).map(|t| self.volume(t)).sum()
    }

    /// Inverse of the edge matrix of tetrahedron `t`.
    ///
    /// # Errors
    ///
    /// [`Error::DegenerateTetra`] if the edge matrix is singular or the volume is below
    /// `min_volume`.
    pub fn rest_inverse(&self, t: usize, min_volume: f64) -> Result<Matrix3<f64>> {
        if self.volume(t) <= min_volume {
            return Err(Error::DegenerateTetra { tetra: t });
        }
        edge_matrix(&self.tetra_positions(t))
            .try_inverse()
            .ok_or(Error::DegenerateTetra { tetra: t })
    }

    /// Lengths of the six edges of tetrahedron `t`, in [`TETRA_EDGES`] order.
    pub fn edge_lengths(&self, t: usize) -> [f64; 6] {
        let p = self.tetra_positions(t);
        TETRA_EDGES.map(|[a, b]| (p[b] - p[a]).norm())
    }

    /// Check that boundary vertex `i` coincides with surface vertex `i` for every `i`.
    pub fn check_boundary_matches(&self, mesh: &HalfEdgeMesh, tolerance: f64) -> Result<()> {
        if mesh.num_vertices() != self.n_vertices_boundary {
            return Err(Error::BoundaryMismatch {
                details: format!(
                    "surface has {} vertices, body has {} boundary vertices",
                    mesh.num_vertices(),
                    self.n_vertices_boundary
                ),
            });
        }
        for i in 0..self.n_vertices_boundary {
            let distance = (mesh.position(VertexId::new(i)) - self.points[i]).norm();
            if distance > tolerance {
                return Err(Error::BoundaryMismatch {
                    details: format!("vertex {i} is {distance:.3e} away from the surface"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;
    use approx::assert_relative_eq;

    fn unit_tetra() -> TetrahedralBody {
        TetrahedralBody::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 1, 2, 3]],
            4,
        )
        .unwrap()
    }

    #[test]
    fn test_volume_is_orientation_free() {
        let body = unit_tetra();
        assert_relative_eq!(body.volume(0), 1.0 / 6.0);
        let [a, b, c, d] = body.tetra_positions(0);
        assert_relative_eq!(tetra_volume(&b, &a, &c, &d), 1.0 / 6.0);
    }

    #[test]
    fn test_rest_inverse() {
        let body = unit_tetra();
        let inv = body.rest_inverse(0, 1e-12).unwrap();
        assert_relative_eq!(inv, Matrix3::identity(), epsilon = 1e-12);
        let lengths = body.edge_lengths(0);
        assert_relative_eq!(lengths[0], 1.0);
        assert_relative_eq!(lengths[5], 2.0_f64.sqrt());
    }

    #[test]
    fn test_flat_tetra_is_degenerate() {
        let body = TetrahedralBody::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2, 3]],
            4,
        )
        .unwrap();
        assert!(matches!(
            body.rest_inverse(0, 1e-12),
            Err(Error::DegenerateTetra { tetra: 0 })
        ));
    }

    #[test]
    fn test_validation() {
        let points = vec![Point3::origin(); 4];
        assert!(matches!(
            TetrahedralBody::new(points.clone(), vec![[0, 1, 2, 4]], 4),
            Err(Error::InvalidTetraIndex { tetra: 0, vertex: 4 })
        ));
        assert!(matches!(
            TetrahedralBody::new(points, vec![], 5),
            Err(Error::BoundaryMismatch { .. })
        ));
        assert!(matches!(
            TetrahedralBody::new(vec![], vec![], 0),
            Err(Error::EmptyMesh)
        ));
    }

    #[test]
    fn test_boundary_matches_surface() {
        let mesh = primitives::tetrahedron();
        let mut points = mesh.positions();
        points.push(Point3::new(0.5, 0.4, 0.25));
        let tetras = vec![[0, 1, 2, 4], [0, 1, 3, 4], [1, 2, 3, 4], [2, 0, 3, 4]];
        let body = TetrahedralBody::new(points, tetras, 4).unwrap();
        assert!(body.check_boundary_matches(&mesh, 1e-9).is_ok());

        let mut moved = body.clone();
        let mut shifted = moved.points().to_vec();
        shifted[2].x += 0.1;
        moved.set_points(&shifted).unwrap();
        assert!(matches!(
            moved.check_boundary_matches(&mesh, 1e-9),
            Err(Error::BoundaryMismatch { .. })
        ));
        assert!(body.check_boundary_matches(&primitives::octahedron(), 1e-9).is_err());
    }
}
