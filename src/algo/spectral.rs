//! Spectral mesh compression through a pluggable eigensolver.
//!
//! [`SpectralOperatorClient`] is the only place where the strongly typed geometry of the
//! crate is flattened into the column form an eigensolver works with. The solver itself sits
//! behind the [`SparseEigenSolver`] trait: it receives the Laplacian as 1-based triplet columns
//! plus the `x`, `y`, `z` coordinate columns and a rank, and returns reconstructed coordinate
//! columns and a per-vertex error column.
//!
//! [`DenseEigenSolver`] is a reference implementation built on `nalgebra`'s symmetric
//! eigendecomposition. It is exact but cubic in the vertex count, so it suits small meshes.
//!
//! # Example
//!
//! ```
//! use geomsim::algo::laplacian::{LaplacianBuilder, LaplacianOptions};
//! use geomsim::algo::spectral::{DenseEigenSolver, SpectralOperatorClient};
//! use geomsim::algo::topology::MeshTopology;
//! use geomsim::mesh::primitives;
//!
//! let topo = MeshTopology::from_mesh(&primitives::octahedron()).unwrap();
//! let laplacian = LaplacianBuilder::new(&topo, &LaplacianOptions::default())
//!     .build()
//!     .unwrap();
//!
//! let client = SpectralOperatorClient::new(&topo);
//! let result = client.compress(&laplacian, 6, &DenseEigenSolver::default()).unwrap();
//! assert!(result.max_difference < 1e-9);
//! ```

use log::{debug, info, warn};
use nalgebra::{DMatrix, Point3, SymmetricEigen};

use super::laplacian::Laplacian;
use super::topology::MeshTopology;
use crate::error::{Error, Result};
use crate::mesh::{HalfEdgeMesh, VertexId};

/// A compression request in the column form an eigensolver consumes.
///
/// Matrix indices are 1-based and stored as `f64`, matching numerical environments that
/// keep every array in double precision.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineProblem {
    /// 1-based row index of every Laplacian entry.
    pub rows: Vec<f64>,
    /// 1-based column index of every Laplacian entry.
    pub cols: Vec<f64>,
    /// Value of every Laplacian entry.
    pub values: Vec<f64>,
    /// Vertex x coordinates.
    pub x: Vec<f64>,
    /// Vertex y coordinates.
    pub y: Vec<f64>,
    /// Vertex z coordinates.
    pub z: Vec<f64>,
    /// Number of eigenvectors to keep.
    pub rank: usize,
}

impl EngineProblem {
    /// Number of vertices (length of the coordinate columns).
    pub fn num_vertices(&self) -> usize {
        self.x.len()
    }
}

/// Result columns returned by an eigensolver. A `None` column is a failed solve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSolution {
    /// Reconstructed x coordinates.
    pub x: Option<Vec<f64>>,
    /// Reconstructed y coordinates.
    pub y: Option<Vec<f64>>,
    /// Reconstructed z coordinates.
    pub z: Option<Vec<f64>>,
    /// Per-vertex distance between input and reconstruction.
    pub diff: Option<Vec<f64>>,
}

/// An eigendecomposition backend.
///
/// Implementations build the operator from the triplet columns, decompose it, project the
/// geometry onto the `rank` lowest-frequency eigenvectors and reconstruct it.
pub trait SparseEigenSolver {
    /// Run one compression request.
    ///
    /// Failing to run at all is reported as [`Error::Engine`].
    fn solve(&self, problem: &EngineProblem) -> Result<EngineSolution>;
}

/// Compressed geometry and its per-vertex error.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    /// Reconstructed vertex positions.
    pub positions: Vec<Point3<f64>>,
    /// Distance between each original and reconstructed vertex.
    pub differences: Vec<f64>,
    /// Largest entry of `differences`.
    pub max_difference: f64,
    /// Smallest entry of `differences`.
    pub min_difference: f64,
}

impl CompressionResult {
    /// Write the compressed positions into `mesh`.
    pub fn apply_to(&self, mesh: &mut HalfEdgeMesh) -> Result<()> {
        if mesh.num_vertices() != self.positions.len() {
            return Err(Error::invalid_param(
                "mesh",
                mesh.num_vertices(),
                "vertex count differs from the compressed geometry",
            ));
        }
        for (i, &p) in self.positions.iter().enumerate() {
            mesh.set_position(VertexId::new(i), p);
        }
        Ok(())
    }
}

/// Packages compression requests for a [`SparseEigenSolver`] and unpacks the answers.
pub struct SpectralOperatorClient<'a> {
    topology: &'a MeshTopology,
}

impl<'a> SpectralOperatorClient<'a> {
    /// Create a client for the geometry in `topology`.
    pub fn new(topology: &'a MeshTopology) -> Self {
        Self { topology }
    }

    /// Serialize `laplacian` and the geometry into an [`EngineProblem`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPrecision`] unless `1 <= precision <= n_vertices`.
    pub fn problem(&self, laplacian: &Laplacian, precision: usize) -> Result<EngineProblem> {
        let n = self.topology.num_vertices();
        if precision == 0 || precision > n {
            return Err(Error::InvalidPrecision {
                precision,
                num_vertices: n,
            });
        }
        if laplacian.num_vertices() != n {
            return Err(Error::invalid_param(
                "laplacian",
                laplacian.num_vertices(),
                "dimension differs from the vertex count",
            ));
        }

        let triples = laplacian.triples();
        let positions = self.topology.positions();
        Ok(EngineProblem {
            rows: triples.iter().map(|t| (t.row + 1) as f64).collect(),
            cols: triples.iter().map(|t| (t.col + 1) as f64).collect(),
            values: triples.iter().map(|t| t.value).collect(),
            x: positions.iter().map(|p| p.x).collect(),
            y: positions.iter().map(|p| p.y).collect(),
            z: positions.iter().map(|p| p.z).collect(),
            rank: precision,
        })
    }

    /// Compress the geometry to `precision` spectral coefficients per coordinate.
    ///
    /// Nothing is sent to `solver` when the request is invalid.
    pub fn compress<S: SparseEigenSolver + ?Sized>(
        &self,
        laplacian: &Laplacian,
        precision: usize,
        solver: &S,
    ) -> Result<CompressionResult> {
        let problem = self.problem(laplacian, precision)?;
        let n = problem.num_vertices();
        info!("compressing {n} vertices to rank {precision}");

        let solution = solver.solve(&problem)?;

        let x = take_column(solution.x, "x", n)?;
        let y = take_column(solution.y, "y", n)?;
        let z = take_column(solution.z, "z", n)?;
        let differences = take_column(solution.diff, "diff", n)?;

        let positions = (0..n).map(|i| Point3::new(x[i], y[i], z[i])).collect();

        let mut max_difference = f64::NEG_INFINITY;
        let mut min_difference = f64::INFINITY;
        for &d in &differences {
            if d > max_difference {
                max_difference = d;
            }
            if d < min_difference {
                min_difference = d;
            }
        }
        debug!("compression error: max {max_difference:.6e}, min {min_difference:.6e}");

        Ok(CompressionResult {
            positions,
            differences,
            max_difference,
            min_difference,
        })
    }
}

fn take_column(column: Option<Vec<f64>>, what: &'static str, n: usize) -> Result<Vec<f64>> {
    let column =
        column.ok_or_else(|| Error::EngineResult(format!("missing `{what}` column")))?;
    if column.len() != n {
        return Err(Error::EngineResult(format!(
            "`{what}` column has {} entries, expected {n}",
            column.len()
        )));
    }
    if let Some(index) = column.iter().position(|v| !v.is_finite()) {
        return Err(Error::NonFinite { what, index });
    }
    Ok(column)
}

/// Reference [`SparseEigenSolver`] using a dense symmetric eigendecomposition.
///
/// The operator is symmetrized as `(A + Aᵀ) / 2` before decomposition; eigenvectors are
/// ordered by ascending eigenvalue magnitude.
#[derive(Debug, Clone)]
pub struct DenseEigenSolver {
    /// Relative asymmetry above which a warning is logged.
    pub symmetry_tolerance: f64,
}

impl Default for DenseEigenSolver {
    fn default() -> Self {
        Self {
            symmetry_tolerance: 1e-9,
        }
    }
}

impl DenseEigenSolver {
    fn assemble(&self, problem: &EngineProblem) -> Result<DMatrix<f64>> {
        let n = problem.num_vertices();
        let nnz = problem.values.len();
        if problem.rows.len() != nnz || problem.cols.len() != nnz {
            return Err(Error::Engine("triplet columns differ in length".into()));
        }

        let to_index = |v: f64| -> Result<usize> {
            if v.fract() != 0.0 || v < 1.0 || v > n as f64 {
                return Err(Error::Engine(format!("matrix index {v} outside 1..={n}")));
            }
            Ok(v as usize - 1)
        };

        let mut a = DMatrix::zeros(n, n);
        for k in 0..nnz {
            let r = to_index(problem.rows[k])?;
            let c = to_index(problem.cols[k])?;
            a[(r, c)] += problem.values[k];
        }
        Ok(a)
    }
}

impl SparseEigenSolver for DenseEigenSolver {
    fn solve(&self, problem: &EngineProblem) -> Result<EngineSolution> {
        let n = problem.num_vertices();
        if n == 0 || problem.y.len() != n || problem.z.len() != n {
            return Err(Error::Engine("coordinate columns are empty or ragged".into()));
        }
        if problem.rank == 0 || problem.rank > n {
            return Err(Error::Engine(format!("rank {} outside 1..={n}", problem.rank)));
        }

        let a = self.assemble(problem)?;
        let asymmetry = (&a - a.transpose()).amax();
        if asymmetry > self.symmetry_tolerance * a.amax().max(1.0) {
            warn!("operator is not symmetric (max |A - Aᵀ| = {asymmetry:.3e}), symmetrizing");
        }
        let sym = (&a + a.transpose()) * 0.5;

        let eigen = SymmetricEigen::try_new(sym, f64::EPSILON, 0)
            .ok_or_else(|| Error::Engine("eigendecomposition did not converge".into()))?;

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| {
            eigen.eigenvalues[i]
                .abs()
                .total_cmp(&eigen.eigenvalues[j].abs())
        });

        let rank = problem.rank;
        let basis = DMatrix::from_fn(n, rank, |r, k| eigen.eigenvectors[(r, order[k])]);
        let geometry = DMatrix::from_fn(n, 3, |r, c| match c {
            0 => problem.x[r],
            1 => problem.y[r],
            _ => problem.z[r],
        });

        let coefficients = basis.transpose() * &geometry;
        let reconstructed = &basis * coefficients;
        let diff = (0..n)
            .map(|r| (reconstructed.row(r) - geometry.row(r)).norm())
            .collect();

        debug!(
            "dense eigensolver: n = {n}, rank = {rank}, smallest |λ| = {:.3e}",
            eigen.eigenvalues[order[0]].abs()
        );

        Ok(EngineSolution {
            x: Some(reconstructed.column(0).iter().copied().collect()),
            y: Some(reconstructed.column(1).iter().copied().collect()),
            z: Some(reconstructed.column(2).iter().copied().collect()),
            diff: Some(diff),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::laplacian::{LaplacianBuilder, LaplacianKind, LaplacianOptions};
    use crate::error::ErrorKind;
    use crate::mesh::primitives;
    use approx::assert_relative_eq;
    use std::cell::Cell;

    fn setup(kind: LaplacianKind) -> (MeshTopology, Laplacian) {
        let topo = MeshTopology::from_mesh(&primitives::icosahedron()).unwrap();
        let options = LaplacianOptions::default().with_kind(kind);
        let laplacian = LaplacianBuilder::new(&topo, &options).build().unwrap();
        (topo, laplacian)
    }

    /// Returns a canned solution and counts calls.
    struct CannedSolver {
        solution: EngineSolution,
        calls: Cell<usize>,
    }

    impl CannedSolver {
        fn new(solution: EngineSolution) -> Self {
            Self {
                solution,
                calls: Cell::new(0),
            }
        }
    }

    impl SparseEigenSolver for CannedSolver {
        fn solve(&self, _problem: &EngineProblem) -> Result<EngineSolution> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.solution.clone())
        }
    }

    fn canned(n: usize, diff: Vec<f64>) -> EngineSolution {
        EngineSolution {
            x: Some(vec![0.0; n]),
            y: Some(vec![0.0; n]),
            z: Some(vec![0.0; n]),
            diff: Some(diff),
        }
    }

    #[test]
    fn test_problem_is_one_based() {
        let (topo, laplacian) = setup(LaplacianKind::Cotangent);
        let problem = SpectralOperatorClient::new(&topo).problem(&laplacian, 3).unwrap();

        assert_eq!(problem.rank, 3);
        assert_eq!(problem.num_vertices(), 12);
        assert_eq!(problem.rows.len(), laplacian.triples().len());
        assert_eq!(problem.rows.iter().copied().fold(f64::INFINITY, f64::min), 1.0);
        assert_eq!(problem.cols.iter().copied().fold(0.0, f64::max), 12.0);
        assert_eq!(problem.x[3], topo.position(3).x);
    }

    #[test]
    fn test_invalid_precision_skips_solver() {
        let (topo, laplacian) = setup(LaplacianKind::Cotangent);
        let client = SpectralOperatorClient::new(&topo);
        let solver = CannedSolver::new(canned(12, vec![0.0; 12]));

        for precision in [0, 13] {
            let err = client.compress(&laplacian, precision, &solver).unwrap_err();
            assert!(matches!(err, Error::InvalidPrecision { .. }));
            assert_eq!(err.kind(), ErrorKind::Configuration);
        }
        assert_eq!(solver.calls.get(), 0);
    }

    #[test]
    fn test_missing_column_is_engine_error() {
        let (topo, laplacian) = setup(LaplacianKind::Cotangent);
        let mut solution = canned(12, vec![0.0; 12]);
        solution.diff = None;
        let solver = CannedSolver::new(solution);

        let err = SpectralOperatorClient::new(&topo)
            .compress(&laplacian, 4, &solver)
            .unwrap_err();
        assert!(matches!(err, Error::EngineResult(_)));
        assert_eq!(err.kind(), ErrorKind::ExternalEngine);
    }

    #[test]
    fn test_short_column_is_engine_error() {
        let (topo, laplacian) = setup(LaplacianKind::Cotangent);
        let solver = CannedSolver::new(canned(12, vec![0.0; 11]));
        let result = SpectralOperatorClient::new(&topo).compress(&laplacian, 4, &solver);
        assert!(matches!(result, Err(Error::EngineResult(_))));
    }

    #[test]
    fn test_non_finite_result_rejected() {
        let (topo, laplacian) = setup(LaplacianKind::Cotangent);
        let mut diff = vec![0.0; 12];
        diff[7] = f64::NAN;
        let solver = CannedSolver::new(canned(12, diff));
        let result = SpectralOperatorClient::new(&topo).compress(&laplacian, 4, &solver);
        assert!(matches!(result, Err(Error::NonFinite { what: "diff", index: 7 })));
    }

    #[test]
    fn test_min_and_max_are_independent() {
        let (topo, laplacian) = setup(LaplacianKind::Cotangent);
        let client = SpectralOperatorClient::new(&topo);

        let ascending: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let descending: Vec<f64> = ascending.iter().rev().copied().collect();
        for diff in [ascending, descending] {
            let solver = CannedSolver::new(canned(12, diff));
            let result = client.compress(&laplacian, 4, &solver).unwrap();
            assert_eq!(result.max_difference, 11.0);
            assert_eq!(result.min_difference, 0.0);
        }
    }

    #[test]
    fn test_full_rank_reproduces_geometry() {
        for kind in [LaplacianKind::Cotangent, LaplacianKind::Normalized] {
            let (topo, laplacian) = setup(kind);
            let result = SpectralOperatorClient::new(&topo)
                .compress(&laplacian, 12, &DenseEigenSolver::default())
                .unwrap();
            for (p, q) in result.positions.iter().zip(topo.positions()) {
                assert_relative_eq!(p, q, epsilon = 1e-9);
            }
            assert!(result.max_difference < 1e-9);
        }
    }

    #[test]
    fn test_rank_one_collapses_to_centroid() {
        // The lowest-frequency mode of a Laplacian is the constant vector.
        let (topo, laplacian) = setup(LaplacianKind::Cotangent);
        let result = SpectralOperatorClient::new(&topo)
            .compress(&laplacian, 1, &DenseEigenSolver::default())
            .unwrap();
        for p in &result.positions {
            assert!(p.coords.norm() < 1e-9);
        }
        assert_relative_eq!(result.max_difference, 1.0, epsilon = 1e-9);
        assert_relative_eq!(result.min_difference, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_apply_to_mesh() {
        let mut mesh = primitives::icosahedron();
        let (topo, laplacian) = setup(LaplacianKind::Combinatorial);
        let result = SpectralOperatorClient::new(&topo)
            .compress(&laplacian, 1, &DenseEigenSolver::default())
            .unwrap();
        result.apply_to(&mut mesh).unwrap();
        assert!(mesh.position(VertexId::new(0)).coords.norm() < 1e-9);

        let mut other = primitives::octahedron();
        assert!(result.apply_to(&mut other).is_err());
    }

    #[test]
    fn test_dense_solver_rejects_bad_indices() {
        let problem = EngineProblem {
            rows: vec![0.0],
            cols: vec![1.0],
            values: vec![1.0],
            x: vec![0.0],
            y: vec![0.0],
            z: vec![0.0],
            rank: 1,
        };
        let result = DenseEigenSolver::default().solve(&problem);
        assert!(matches!(result, Err(Error::Engine(_))));
    }
}
