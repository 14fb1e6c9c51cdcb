//! Discrete geometry processing.
//!
//! - **Topology**: ordered one-rings, degrees and adjacency ([`topology`])
//! - **Laplacians**: cotangent and graph Laplacians in coordinate form ([`laplacian`])
//! - **Sparse linear algebra**: CSR assembly and conjugate gradient ([`sparse`])
//! - **Spectral compression**: eigen-basis truncation behind a solver trait ([`spectral`])
//! - **Skeletonization**: Laplacian contraction ([`skeleton`])
//! - **Offset surfaces**: problem preparation behind a solver trait ([`offset`])

pub mod laplacian;
pub mod offset;
pub mod skeleton;
pub mod sparse;
pub mod spectral;
pub mod topology;

pub use laplacian::{Laplacian, LaplacianBuilder, LaplacianKind, LaplacianOptions, Triple};
pub use topology::MeshTopology;
