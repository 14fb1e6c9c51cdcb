//! # geomsim
//!
//! Discrete geometry processing on closed triangle meshes and explicit soft-body simulation of
//! tetrahedralized solids.
//!
//! ## Features
//!
//! - **Half-edge meshes**: O(1) adjacency queries with type-safe indices
//! - **Laplacians**: cotangent (signed or clamped) and graph Laplacians in coordinate form
//! - **Spectral compression**: truncated eigen-basis reconstruction behind a pluggable solver
//! - **Skeletons and offsets**: Laplacian contraction and offset problem preparation
//! - **Soft bodies**: strain-based and mass-spring models with Euler or midpoint integration
//! - **File formats**: STL, PLY and TetGen node/ele/face files
//!
//! ## Quick Start
//!
//! ```
//! use geomsim::prelude::*;
//! use geomsim::mesh::primitives;
//!
//! let mesh = primitives::icosahedron();
//! let topology = MeshTopology::from_mesh(&mesh).unwrap();
//!
//! let options = LaplacianOptions::default();
//! let laplacian = LaplacianBuilder::new(&topology, &options).build().unwrap();
//! assert!(laplacian.row_sums().iter().all(|s| s.abs() < 1e-9));
//! ```
//!
//! ## Spectral Compression
//!
//! ```
//! use geomsim::prelude::*;
//! use geomsim::algo::spectral::{DenseEigenSolver, SpectralOperatorClient};
//! use geomsim::mesh::primitives;
//!
//! let mesh = primitives::octahedron();
//! let topology = MeshTopology::from_mesh(&mesh).unwrap();
//! let options = LaplacianOptions::default().with_kind(LaplacianKind::Combinatorial);
//! let laplacian = LaplacianBuilder::new(&topology, &options).build().unwrap();
//!
//! let client = SpectralOperatorClient::new(&topology);
//! let full = client
//!     .compress(&laplacian, 6, &DenseEigenSolver::default())
//!     .unwrap();
//! assert!(full.max_difference < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod error;
pub mod io;
pub mod mesh;
pub mod scene;
pub mod sim;

/// Prelude module for convenient imports.
///
/// ```
/// use geomsim::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{LaplacianBuilder, LaplacianKind, LaplacianOptions, MeshTopology};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::mesh::{
        build_from_triangles, to_face_vertex, FaceId, HalfEdgeId, HalfEdgeMesh, VertexId,
    };
    pub use crate::scene::{Model, Scene};
    pub use crate::sim::{PhysicsModel, SimulationParams, Simulator, TetrahedralBody};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
