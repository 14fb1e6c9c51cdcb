//! Mesh skeletonization by Laplacian contraction.
//!
//! Each contraction pass solves the least-squares system
//!
//! ```text
//! [ W_L L ]       [   0   ]
//! [ W_P I ] X  =  [ W_P P ]
//! ```
//!
//! where `L` is the (by default clamped) cotangent Laplacian of the current geometry and `P`
//! the current positions. The first block pulls every vertex toward the weighted average of
//! its one-ring, the second keeps it near where it was. The system is solved through its
//! normal equations `(W_L² LᵀL + W_P² I) X = W_P² P`, which are symmetric positive definite,
//! with conjugate gradient, one solve per coordinate.
//!
//! # Example
//!
//! ```
//! use geomsim::algo::skeleton::{skeletonize, SkeletonOptions};
//! use geomsim::mesh::primitives;
//!
//! let mesh = primitives::icosahedron();
//! let skeleton = skeletonize(&mesh, &SkeletonOptions::default()).unwrap();
//! assert!(skeleton.positions.iter().all(|p| p.coords.norm() < 1.0));
//! ```

use log::{debug, info};
use nalgebra::{DVector, Point3};
use serde::{Deserialize, Serialize};

use super::laplacian::{LaplacianBuilder, LaplacianKind, LaplacianOptions};
use super::sparse::conjugate_gradient;
use super::topology::MeshTopology;
use crate::error::{Error, Result};
use crate::mesh::{HalfEdgeMesh, VertexId};

/// Options for [`skeletonize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonOptions {
    /// Weight of the position-preserving block.
    pub weight_preserve: f64,

    /// Weight of the contraction block in the first pass.
    pub weight_laplacian: f64,

    /// Number of contraction passes.
    pub iterations: usize,

    /// Factor applied to the contraction weight after every pass.
    pub contraction_growth: f64,

    /// Conjugate gradient iteration limit per coordinate.
    pub max_solver_iterations: usize,

    /// Conjugate gradient relative residual tolerance.
    pub tolerance: f64,

    /// Laplacian used for the contraction block.
    pub laplacian: LaplacianOptions,
}

impl Default for SkeletonOptions {
    fn default() -> Self {
        Self {
            weight_preserve: 20.0,
            weight_laplacian: 1.0,
            iterations: 1,
            contraction_growth: 3.0,
            max_solver_iterations: 2000,
            tolerance: 1e-10,
            laplacian: LaplacianOptions::default().with_kind(LaplacianKind::CotangentClamped),
        }
    }
}

impl SkeletonOptions {
    /// Set the number of contraction passes.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the position-preserving weight.
    pub fn with_weight_preserve(mut self, weight: f64) -> Self {
        self.weight_preserve = weight;
        self
    }

    /// Set the initial contraction weight.
    pub fn with_weight_laplacian(mut self, weight: f64) -> Self {
        self.weight_laplacian = weight;
        self
    }

    /// Set the Laplacian variant used for contraction.
    pub fn with_laplacian_kind(mut self, kind: LaplacianKind) -> Self {
        self.laplacian.kind = kind;
        self
    }

    /// Check weights, counts and tolerances.
    pub fn validate(&self) -> Result<()> {
        if !(self.weight_preserve > 0.0 && self.weight_preserve.is_finite()) {
            return Err(Error::invalid_param(
                "weight_preserve",
                self.weight_preserve,
                "must be positive",
            ));
        }
        if !(self.weight_laplacian >= 0.0 && self.weight_laplacian.is_finite()) {
            return Err(Error::invalid_param(
                "weight_laplacian",
                self.weight_laplacian,
                "must be non-negative",
            ));
        }
        if !(self.contraction_growth > 0.0 && self.contraction_growth.is_finite()) {
            return Err(Error::invalid_param(
                "contraction_growth",
                self.contraction_growth,
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Contracted vertex positions, one per mesh vertex.
#[derive(Debug, Clone)]
pub struct SkeletonResult {
    /// Contracted positions in vertex order.
    pub positions: Vec<Point3<f64>>,
    /// Number of contraction passes performed.
    pub passes: usize,
}

impl SkeletonResult {
    /// A copy of `mesh` with the contracted positions.
    pub fn to_mesh(&self, mesh: &HalfEdgeMesh) -> Result<HalfEdgeMesh> {
        let mut skeleton = mesh.clone();
        self.apply_to(&mut skeleton)?;
        Ok(skeleton)
    }

    /// Write the contracted positions into `mesh`.
    pub fn apply_to(&self, mesh: &mut HalfEdgeMesh) -> Result<()> {
        if mesh.num_vertices() != self.positions.len() {
            return Err(Error::invalid_param(
                "mesh",
                mesh.num_vertices(),
                "vertex count differs from the skeleton",
            ));
        }
        for (i, &p) in self.positions.iter().enumerate() {
            mesh.set_position(VertexId::new(i), p);
        }
        Ok(())
    }
}

/// Contract a closed genus-0 mesh toward its skeleton.
///
/// # Errors
///
/// [`Error::EmptyMesh`] for an empty mesh, [`Error::NotGenusZero`] unless `V - E + F == 2`,
/// Laplacian assembly errors for degenerate geometry and [`Error::ConvergenceFailed`] if a
/// coordinate solve does not converge.
pub fn skeletonize(mesh: &HalfEdgeMesh, options: &SkeletonOptions) -> Result<SkeletonResult> {
    options.validate()?;
    if mesh.num_vertices() == 0 {
        return Err(Error::EmptyMesh);
    }
    let euler = mesh.euler_characteristic();
    if euler != 2 || !mesh.is_closed() {
        return Err(Error::NotGenusZero { euler });
    }

    let n = mesh.num_vertices();
    let wp2 = options.weight_preserve * options.weight_preserve;
    let mut current = mesh.clone();
    let mut weight_laplacian = options.weight_laplacian;

    info!(
        "skeletonizing {} vertices, {} pass(es)",
        n, options.iterations
    );

    for pass in 0..options.iterations {
        let topology = MeshTopology::from_mesh(&current)?;
        let laplacian = LaplacianBuilder::new(&topology, &options.laplacian).build()?;
        let system = laplacian
            .to_csr()?
            .normal_matrix(weight_laplacian * weight_laplacian, wp2)?;

        let positions = topology.positions();
        let mut solved = [DVector::zeros(0), DVector::zeros(0), DVector::zeros(0)];
        for (dim, column) in solved.iter_mut().enumerate() {
            let rhs = DVector::from_iterator(n, positions.iter().map(|p| wp2 * p[dim]));
            let guess = DVector::from_iterator(n, positions.iter().map(|p| p[dim]));
            *column = conjugate_gradient(
                &system,
                &rhs,
                Some(&guess),
                options.max_solver_iterations,
                options.tolerance,
            )?;
        }

        for i in 0..n {
            let p = Point3::new(solved[0][i], solved[1][i], solved[2][i]);
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                return Err(Error::NonFinite {
                    what: "skeleton position",
                    index: i,
                });
            }
            current.set_position(VertexId::new(i), p);
        }

        debug!("contraction pass {pass}: W_L = {weight_laplacian}");
        weight_laplacian *= options.contraction_growth;
    }

    Ok(SkeletonResult {
        positions: current.positions(),
        passes: options.iterations,
    })
}
