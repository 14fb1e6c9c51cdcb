//! Discrete Laplace-Beltrami operators in coordinate form.
//!
//! The operator is produced as a list of [`Triple`]s, one per non-zero entry. Duplicate
//! `(row, col)` entries are allowed and add up when the matrix is assembled.
//!
//! # Variants
//!
//! | [`LaplacianKind`]  | off-diagonal `(i, j)`          | diagonal `(i, i)` |
//! |--------------------|--------------------------------|-------------------|
//! | `Cotangent`        | `w_ij`                         | `-Σ w_ij`         |
//! | `CotangentClamped` | `max(w_ij, 0)`                 | `-Σ max(w_ij, 0)` |
//! | `Combinatorial`    | `-1`                           | `deg(i)`          |
//! | `Normalized`       | `-1 / deg(i)`                  | `1`               |
//!
//! with the cotangent weight `w_ij = cot α + cot β`, `α` and `β` being the angles opposite
//! the edge `(i, j)` in its two incident triangles. Every variant has zero row sums.
//!
//! # Example
//!
//! ```
//! use geomsim::algo::laplacian::{LaplacianBuilder, LaplacianKind, LaplacianOptions};
//! use geomsim::algo::topology::MeshTopology;
//! use geomsim::mesh::primitives;
//!
//! let topo = MeshTopology::from_mesh(&primitives::icosahedron()).unwrap();
//! let options = LaplacianOptions::default().with_kind(LaplacianKind::CotangentClamped);
//! let laplacian = LaplacianBuilder::new(&topo, &options).build().unwrap();
//!
//! assert!(laplacian.row_sums().iter().all(|s| s.abs() < 1e-9));
//! ```

use std::fmt;
use std::str::FromStr;

use log::debug;
use nalgebra::Point3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::sparse::CsrMatrix;
use super::topology::MeshTopology;
use crate::error::{Error, Result};

/// One non-zero entry `(row, col, value)` of a sparse operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triple {
    /// Row index (0-based vertex index).
    pub row: usize,
    /// Column index (0-based vertex index).
    pub col: usize,
    /// Entry value.
    pub value: f64,
}

impl Triple {
    /// Create a new entry.
    #[inline]
    pub fn new(row: usize, col: usize, value: f64) -> Self {
        Self { row, col, value }
    }
}

/// Which discrete Laplacian to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaplacianKind {
    /// Signed cotangent weights.
    #[default]
    Cotangent,
    /// Cotangent weights with negative values clamped to zero.
    CotangentClamped,
    /// Graph Laplacian `D - A`.
    Combinatorial,
    /// Random-walk normalized graph Laplacian `I - D^-1 A`.
    Normalized,
}

impl LaplacianKind {
    /// Whether this kind needs closed one-rings and non-degenerate triangles.
    pub fn is_cotangent(self) -> bool {
        matches!(self, Self::Cotangent | Self::CotangentClamped)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Cotangent => "cotangent",
            Self::CotangentClamped => "cotangent-clamped",
            Self::Combinatorial => "combinatorial",
            Self::Normalized => "normalized",
        }
    }
}

impl fmt::Display for LaplacianKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LaplacianKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cotangent" => Ok(Self::Cotangent),
            "cotangent-clamped" => Ok(Self::CotangentClamped),
            "combinatorial" => Ok(Self::Combinatorial),
            "normalized" => Ok(Self::Normalized),
            other => Err(Error::invalid_param(
                "laplacian kind",
                other,
                "expected cotangent, cotangent-clamped, combinatorial or normalized",
            )),
        }
    }
}

/// Options for Laplacian assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaplacianOptions {
    /// Operator variant.
    pub kind: LaplacianKind,

    /// Triangles whose doubled area (cross product norm) falls below this value are reported
    /// as degenerate instead of producing huge or NaN cotangents.
    pub degenerate_epsilon: f64,

    /// Whether to assemble rows in parallel (default: true).
    pub parallel: bool,
}

impl Default for LaplacianOptions {
    fn default() -> Self {
        Self {
            kind: LaplacianKind::default(),
            degenerate_epsilon: 1e-12,
            parallel: true,
        }
    }
}

impl LaplacianOptions {
    /// Set the operator variant.
    pub fn with_kind(mut self, kind: LaplacianKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the degeneracy threshold.
    pub fn with_degenerate_epsilon(mut self, epsilon: f64) -> Self {
        self.degenerate_epsilon = epsilon.max(0.0);
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// An assembled Laplacian in coordinate form.
#[derive(Debug, Clone)]
pub struct Laplacian {
    n: usize,
    kind: LaplacianKind,
    triples: Vec<Triple>,
}

impl Laplacian {
    /// Dimension of the (square) operator.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.n
    }

    /// Variant this operator was built as.
    #[inline]
    pub fn kind(&self) -> LaplacianKind {
        self.kind
    }

    /// The entries, grouped by row in ascending row order.
    #[inline]
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Take ownership of the entries.
    pub fn into_triples(self) -> Vec<Triple> {
        self.triples
    }

    /// Sum of every row.
    pub fn row_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n];
        for t in &self.triples {
            sums[t.row] += t.value;
        }
        sums
    }

    /// Accumulated value of entry `(i, j)`.
    pub fn entry(&self, i: usize, j: usize) -> f64 {
        self.triples
            .iter()
            .filter(|t| t.row == i && t.col == j)
            .map(|t| t.value)
            .sum()
    }

    /// Assemble into CSR form.
    pub fn to_csr(&self) -> Result<CsrMatrix> {
        CsrMatrix::from_triples(self.n, &self.triples)
    }
}

/// Builds a [`Laplacian`] from a [`MeshTopology`] snapshot.
pub struct LaplacianBuilder<'a> {
    topology: &'a MeshTopology,
    options: &'a LaplacianOptions,
}

impl<'a> LaplacianBuilder<'a> {
    /// Create a builder over `topology`.
    pub fn new(topology: &'a MeshTopology, options: &'a LaplacianOptions) -> Self {
        Self { topology, options }
    }

    /// Assemble the operator.
    ///
    /// Each row lists its off-diagonal entries in one-ring order followed by the diagonal.
    /// The output is identical with and without parallel assembly.
    ///
    /// # Errors
    ///
    /// For the cotangent kinds, [`Error::OpenOneRing`] if a vertex is on a boundary and
    /// [`Error::DegenerateTriangle`] if a flanking triangle is (nearly) collinear.
    pub fn build(&self) -> Result<Laplacian> {
        let n = self.topology.num_vertices();
        let kind = self.options.kind;

        if kind.is_cotangent() {
            if let Some(vertex) = self.topology.first_open() {
                return Err(Error::OpenOneRing { vertex });
            }
        }

        let rows: Vec<Vec<Triple>> = if self.options.parallel {
            (0..n)
                .into_par_iter()
                .map(|i| self.row(i))
                .collect::<Result<_>>()?
        } else {
            (0..n).map(|i| self.row(i)).collect::<Result<_>>()?
        };

        let triples: Vec<Triple> = rows.into_iter().flatten().collect();
        debug!("laplacian ({kind}): {n} rows, {} triples", triples.len());

        Ok(Laplacian { n, kind, triples })
    }

    /// Entries of row `i`.
    fn row(&self, i: usize) -> Result<Vec<Triple>> {
        let ring = self.topology.neighbors(i);
        let mut row = Vec::with_capacity(ring.len() + 1);

        match self.options.kind {
            LaplacianKind::Cotangent | LaplacianKind::CotangentClamped => {
                let clamp = self.options.kind == LaplacianKind::CotangentClamped;
                let mut weight_sum = 0.0;
                for (pos, &j) in ring.iter().enumerate() {
                    let mut w = self.cotangent_weight(i, pos)?;
                    if clamp {
                        w = w.max(0.0);
                    }
                    weight_sum += w;
                    row.push(Triple::new(i, j, w));
                }
                row.push(Triple::new(i, i, -weight_sum));
            }
            LaplacianKind::Combinatorial => {
                row.extend(ring.iter().map(|&j| Triple::new(i, j, -1.0)));
                row.push(Triple::new(i, i, ring.len() as f64));
            }
            LaplacianKind::Normalized => {
                let inv = 1.0 / ring.len() as f64;
                row.extend(ring.iter().map(|&j| Triple::new(i, j, -inv)));
                row.push(Triple::new(i, i, 1.0));
            }
        }

        Ok(row)
    }

    /// Cotangent weight of the edge from `i` to the neighbor at ring position `pos`.
    ///
    /// The two flanking triangles have their third vertices at ring positions `pos + 1` and
    /// `pos - 1` (cyclically).
    pub fn cotangent_weight(&self, i: usize, pos: usize) -> Result<f64> {
        let ring = self.topology.neighbors(i);
        let d = ring.len();
        let j = ring[pos];
        let left = ring[(pos + 1) % d];
        let right = ring[(pos + d - 1) % d];

        let pi = self.topology.position(i);
        let pj = self.topology.position(j);
        let eps = self.options.degenerate_epsilon;

        let mut weight = 0.0;
        for apex in [left, right] {
            let pa = self.topology.position(apex);
            weight += cotangent(pi, pa, pj, eps)
                .ok_or(Error::DegenerateTriangle { vertex: i, apex })?;
        }

        if !weight.is_finite() {
            return Err(Error::DegenerateTriangle { vertex: i, apex: left });
        }
        Ok(weight)
    }
}

/// Cotangent of the angle `AOB` at apex `o`: `dot(OA, OB) / |cross(OA, OB)|`.
///
/// Returns `None` when the cross product norm is below `epsilon`.
pub fn cotangent(a: &Point3<f64>, o: &Point3<f64>, b: &Point3<f64>, epsilon: f64) -> Option<f64> {
    let oa = a - o;
    let ob = b - o;
    let cross = oa.cross(&ob).norm();
    if cross < epsilon || !cross.is_finite() {
        return None;
    }
    Some(oa.dot(&ob) / cross)
}
