//! Mesh construction from face-vertex lists.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, VertexId};
use crate::error::{Error, Result};

/// Build a half-edge mesh from vertices and triangle faces.
///
/// Vertex `i` of the input becomes `VertexId::new(i)`; this index assignment is what the rest
/// of the crate (and the tetrahedral body's boundary ordering) relies on.
///
/// # Example
/// ```
/// use geomsim::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<HalfEdgeMesh> {
    if faces.is_empty() || vertices.is_empty() {
        return Err(Error::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        if let Some(&vi) = face.iter().find(|&&vi| vi >= vertices.len()) {
            return Err(Error::InvalidVertexIndex { face: fi, vertex: vi });
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(Error::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());
    for &p in vertices {
        mesh.add_vertex(p);
    }

    // Directed edge (from, to) -> half-edge
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId> = HashMap::with_capacity(faces.len() * 3);

    for (fi, face) in faces.iter().enumerate() {
        let base = mesh.num_halfedges();
        let face_id = FaceId::new(fi);
        mesh.faces.push(Face {
            halfedge: HalfEdgeId::new(base),
        });

        for k in 0..3 {
            let he = HalfEdgeId::new(base + k);
            mesh.halfedges.push(HalfEdge {
                origin: VertexId::new(face[k]),
                twin: HalfEdgeId::invalid(),
                next: HalfEdgeId::new(base + (k + 1) % 3),
                prev: HalfEdgeId::new(base + (k + 2) % 3),
                face: face_id,
            });
            mesh.vertex_mut(VertexId::new(face[k])).halfedge = he;

            let key = (face[k], face[(k + 1) % 3]);
            if edge_map.insert(key, he).is_some() {
                return Err(Error::NonManifoldEdge { v0: key.0, v1: key.1 });
            }
        }
    }

    // Link twins; unmatched edges get a boundary half-edge.
    let mut keys: Vec<(usize, usize)> = edge_map.keys().copied().collect();
    keys.sort_unstable();
    for (v0, v1) in keys {
        let he = edge_map[&(v0, v1)];
        if let Some(&twin) = edge_map.get(&(v1, v0)) {
            mesh.halfedge_mut(he).twin = twin;
        } else {
            let boundary = HalfEdgeId::new(mesh.num_halfedges());
            mesh.halfedges.push(HalfEdge {
                origin: VertexId::new(v1),
                twin: he,
                ..HalfEdge::default()
            });
            mesh.halfedge_mut(he).twin = boundary;
        }
    }

    link_boundary_loops(&mut mesh);
    fix_boundary_vertex_halfedges(&mut mesh);

    Ok(mesh)
}

/// Link boundary half-edges into loops.
fn link_boundary_loops(mesh: &mut HalfEdgeMesh) {
    let boundary: Vec<HalfEdgeId> = (0..mesh.num_halfedges())
        .map(HalfEdgeId::new)
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    let outgoing: HashMap<usize, HalfEdgeId> = boundary
        .iter()
        .map(|&he| (mesh.origin(he).index(), he))
        .collect();

    for &he in &boundary {
        let dest = mesh.dest(he).index();
        if let Some(&next) = outgoing.get(&dest) {
            mesh.halfedge_mut(he).next = next;
            mesh.halfedge_mut(next).prev = he;
        }
    }
}

/// Make boundary vertices point to their outgoing boundary half-edge.
fn fix_boundary_vertex_halfedges(mesh: &mut HalfEdgeMesh) {
    for he in (0..mesh.num_halfedges()).map(HalfEdgeId::new) {
        if mesh.is_boundary_halfedge(he) {
            let v = mesh.origin(he);
            mesh.vertex_mut(v).halfedge = he;
        }
    }
}

/// Convert a half-edge mesh back to `(vertices, faces)`.
pub fn to_face_vertex(mesh: &HalfEdgeMesh) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let faces = mesh
        .face_ids()
        .map(|f| {
            let [v0, v1, v2] = mesh.face_triangle(f);
            [v0.index(), v1.index(), v2.index()]
        })
        .collect();
    (mesh.positions(), faces)
}
