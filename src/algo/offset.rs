//! Offset-surface problem preparation.
//!
//! An offset solve moves every surface vertex along the direction pointing at its contracted
//! skeleton counterpart while a Laplacian term preserves the surface detail. This module
//! builds the inputs for that solve, an [`OffsetProblem`], and hands it to an [`OffsetSolver`].
//! The solve itself is an external collaborator.

use log::info;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::laplacian::{LaplacianBuilder, LaplacianKind, LaplacianOptions, Triple};
use super::topology::MeshTopology;
use crate::error::{Error, Result};
use crate::mesh::{HalfEdgeMesh, VertexId};

/// Options for [`OffsetClient::prepare`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetOptions {
    /// Weight of the detail-preserving Laplacian term.
    pub weight_preserve: f64,
    /// Iteration limit passed to the solver.
    pub iteration_limit: usize,
    /// Directions shorter than this are rejected.
    pub min_direction_length: f64,
    /// Laplacian used for detail preservation (signed cotangent by default).
    pub laplacian: LaplacianOptions,
}

impl Default for OffsetOptions {
    fn default() -> Self {
        Self {
            weight_preserve: 1.0,
            iteration_limit: 100,
            min_direction_length: 1e-12,
            laplacian: LaplacianOptions::default().with_kind(LaplacianKind::Cotangent),
        }
    }
}

/// Everything an offset solver needs.
#[derive(Debug, Clone)]
pub struct OffsetProblem {
    /// Laplacian of the surface.
    pub triples: Vec<Triple>,
    /// Surface vertex positions.
    pub positions: Vec<Point3<f64>>,
    /// Unit direction from every surface vertex toward its skeleton vertex.
    pub directions: Vec<Vector3<f64>>,
    /// Weight of the detail-preserving term.
    pub weight_preserve: f64,
    /// Solver iteration limit.
    pub iteration_limit: usize,
}

/// An offset-surface backend.
pub trait OffsetSolver {
    /// Solve for the offset positions, one per vertex.
    fn solve(&self, problem: &OffsetProblem) -> Result<Vec<Point3<f64>>>;
}

/// Prepares offset problems and validates solver output.
pub struct OffsetClient;

impl OffsetClient {
    /// Build the offset problem for `mesh` and its contracted `skeleton`.
    ///
    /// `skeleton` must have the same vertices as `mesh`, in the same order.
    pub fn prepare(
        mesh: &HalfEdgeMesh,
        skeleton: &HalfEdgeMesh,
        options: &OffsetOptions,
    ) -> Result<OffsetProblem> {
        if mesh.num_vertices() != skeleton.num_vertices() {
            return Err(Error::invalid_param(
                "skeleton",
                skeleton.num_vertices(),
                "vertex count differs from the surface mesh",
            ));
        }

        let topology = MeshTopology::from_mesh(mesh)?;
        let laplacian = LaplacianBuilder::new(&topology, &options.laplacian).build()?;

        let directions = mesh
            .vertex_ids()
            .map(|v| {
                let delta = skeleton.position(v) - mesh.position(v);
                let length = delta.norm();
                if !(length >= options.min_direction_length && length.is_finite()) {
                    return Err(Error::NonFinite {
                        what: "offset direction",
                        index: v.index(),
                    });
                }
                Ok(delta / length)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "offset problem: {} vertices, {} triples",
            topology.num_vertices(),
            laplacian.triples().len()
        );

        Ok(OffsetProblem {
            triples: laplacian.into_triples(),
            positions: topology.positions().to_vec(),
            directions,
            weight_preserve: options.weight_preserve,
            iteration_limit: options.iteration_limit,
        })
    }

    /// Run `solver` on `problem` and check that every vertex got a finite position.
    pub fn solve<S: OffsetSolver + ?Sized>(
        problem: &OffsetProblem,
        solver: &S,
    ) -> Result<Vec<Point3<f64>>> {
        let positions = solver.solve(problem)?;
        if positions.len() != problem.positions.len() {
            return Err(Error::EngineResult(format!(
                "offset solver returned {} positions, expected {}",
                positions.len(),
                problem.positions.len()
            )));
        }
        if let Some(index) = positions
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(Error::NonFinite {
                what: "offset position",
                index,
            });
        }
        Ok(positions)
    }

    /// Solve and write the result into `mesh`. `mesh` is untouched on error.
    pub fn apply<S: OffsetSolver + ?Sized>(
        mesh: &mut HalfEdgeMesh,
        problem: &OffsetProblem,
        solver: &S,
    ) -> Result<()> {
        let positions = Self::solve(problem, solver)?;
        if positions.len() != mesh.num_vertices() {
            return Err(Error::invalid_param(
                "mesh",
                mesh.num_vertices(),
                "vertex count differs from the offset problem",
            ));
        }
        for (i, p) in positions.into_iter().enumerate() {
            mesh.set_position(VertexId::new(i), p);
        }
        Ok(())
    }
}
