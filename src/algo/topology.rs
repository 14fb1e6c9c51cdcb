//! Vertex adjacency extracted from a half-edge mesh.
//!
//! [`MeshTopology`] is a flat, index-based snapshot of a mesh: positions, the rotational
//! one-ring of every vertex, degrees and a dense adjacency matrix. It is built once per
//! request and never updated; any edit to the mesh requires a fresh snapshot.
//!
//! # Example
//!
//! ```
//! use geomsim::algo::topology::MeshTopology;
//! use geomsim::mesh::primitives;
//!
//! let topo = MeshTopology::from_mesh(&primitives::octahedron()).unwrap();
//! assert_eq!(topo.num_vertices(), 6);
//! assert!(topo.is_adjacent(0, 2));
//! assert!(!topo.is_adjacent(0, 1));
//! ```

use log::debug;
use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::mesh::{HalfEdgeId, HalfEdgeMesh, VertexId};

/// Positions, ordered one-rings and adjacency of every vertex.
#[derive(Debug, Clone)]
pub struct MeshTopology {
    positions: Vec<Point3<f64>>,
    neighbors: Vec<Vec<usize>>,
    degrees: Vec<usize>,
    adjacency: Vec<Vec<bool>>,
    closed: Vec<bool>,
    euler: i64,
}

impl MeshTopology {
    /// Snapshot the adjacency of `mesh`.
    ///
    /// Vertex `i` of the snapshot is `VertexId::new(i)` of the mesh. Neighbors are listed in
    /// the order visited by rotating `next(twin(he))` from the vertex's outgoing half-edge.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyMesh`] for a mesh without vertices, [`Error::IsolatedVertex`] for a vertex
    /// with no incident edge, [`Error::NonManifoldVertex`] for a vertex whose rotation does not
    /// reach all of its outgoing half-edges (a pinch point). Boundary vertices are accepted and
    /// reported by [`is_closed`](Self::is_closed).
    pub fn from_mesh(mesh: &HalfEdgeMesh) -> Result<Self> {
        let n = mesh.num_vertices();
        if n == 0 {
            return Err(Error::EmptyMesh);
        }

        let mut outgoing = vec![0usize; n];
        for h in 0..mesh.num_halfedges() {
            outgoing[mesh.origin(HalfEdgeId::new(h)).index()] += 1;
        }

        let mut neighbors = Vec::with_capacity(n);
        let mut closed = Vec::with_capacity(n);
        for v in mesh.vertex_ids() {
            if !mesh.vertex(v).halfedge.is_valid() {
                return Err(Error::IsolatedVertex { vertex: v.index() });
            }
            let ring: Vec<usize> = mesh
                .vertex_neighbors(v)
                .take(outgoing[v.index()] + 1)
                .map(VertexId::index)
                .collect();
            if ring.len() != outgoing[v.index()] {
                return Err(Error::NonManifoldVertex { vertex: v.index() });
            }
            closed.push(!mesh.is_boundary_vertex(v));
            neighbors.push(ring);
        }

        let degrees: Vec<usize> = neighbors.iter().map(Vec::len).collect();

        let mut adjacency = vec![vec![false; n]; n];
        for (i, ring) in neighbors.iter().enumerate() {
            for &j in ring {
                adjacency[i][j] = true;
            }
        }

        debug!(
            "topology: {} vertices, degree {}..{}, {} open one-rings",
            n,
            degrees.iter().min().copied().unwrap_or(0),
            degrees.iter().max().copied().unwrap_or(0),
            closed.iter().filter(|&&c| !c).count()
        );

        Ok(Self {
            positions: mesh.positions(),
            neighbors,
            degrees,
            adjacency,
            closed,
            euler: mesh.euler_characteristic(),
        })
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Position of vertex `i`.
    #[inline]
    pub fn position(&self, i: usize) -> &Point3<f64> {
        &self.positions[i]
    }

    /// All positions in vertex order.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// One-ring of vertex `i` in rotational order.
    #[inline]
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.neighbors[i]
    }

    /// Number of neighbors of vertex `i`.
    #[inline]
    pub fn degree(&self, i: usize) -> usize {
        self.degrees[i]
    }

    /// Whether `i` and `j` share an edge.
    #[inline]
    pub fn is_adjacent(&self, i: usize, j: usize) -> bool {
        self.adjacency[i][j]
    }

    /// Whether the one-ring of vertex `i` is a closed fan.
    #[inline]
    pub fn is_closed(&self, i: usize) -> bool {
        self.closed[i]
    }

    /// Whether every one-ring is a closed fan.
    pub fn all_closed(&self) -> bool {
        self.closed.iter().all(|&c| c)
    }

    /// First vertex whose one-ring is open, if any.
    pub fn first_open(&self) -> Option<usize> {
        self.closed.iter().position(|&c| !c)
    }

    /// Euler characteristic `V - E + F` of the source mesh.
    #[inline]
    pub fn euler_characteristic(&self) -> i64 {
        self.euler
    }

    /// Smallest and largest vertex degree.
    pub fn degree_range(&self) -> (usize, usize) {
        let min = self.degrees.iter().min().copied().unwrap_or(0);
        let max = self.degrees.iter().max().copied().unwrap_or(0);
        (min, max)
    }
}
