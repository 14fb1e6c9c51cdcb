//! Error types for geomsim.
//!
//! Every fallible operation in the crate returns [`Result`]. Errors are local to a single
//! request: when one is returned, the mesh, scene or simulator that was passed in is left as it
//! was before the call.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid parameters or missing named scene bodies.
    Configuration,
    /// An external solver failed or returned an unusable result.
    ExternalEngine,
    /// The mesh violates a topological precondition (empty, open, non-manifold).
    Topology,
    /// Near-zero or non-finite geometry was detected.
    NumericalDegeneracy,
    /// File access or parsing failed.
    Io,
}

/// Errors that can occur in geometry processing and simulation.
#[derive(Error, Debug)]
pub enum Error {
    /// The mesh has no vertices or faces.
    #[error("mesh is empty")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices.
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A directed edge is used by more than one face.
    #[error("edge ({v0}, {v1}) has more than two incident faces")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// The faces around a vertex form more than one fan.
    #[error("vertex {vertex} is non-manifold (its faces form more than one fan)")]
    NonManifoldVertex {
        /// The vertex index.
        vertex: usize,
    },

    /// A vertex is not referenced by any face.
    #[error("vertex {vertex} has no incident edges")]
    IsolatedVertex {
        /// The vertex index.
        vertex: usize,
    },

    /// The one-ring of a vertex is not a closed fan.
    #[error("one-ring of vertex {vertex} is not closed")]
    OpenOneRing {
        /// The vertex index.
        vertex: usize,
    },

    /// The mesh is not a closed genus-0 surface.
    #[error("mesh is not genus zero (V - E + F = {euler})")]
    NotGenusZero {
        /// The Euler characteristic found.
        euler: i64,
    },

    /// A tetrahedral body does not line up with its surface mesh.
    #[error("tetrahedral body does not match surface mesh: {details}")]
    BoundaryMismatch {
        /// Description of the mismatch.
        details: String,
    },

    /// A tetrahedron references an invalid vertex index.
    #[error("tetrahedron {tetra} references invalid vertex index {vertex}")]
    InvalidTetraIndex {
        /// The tetrahedron index.
        tetra: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// Requested reduced rank is outside `1..=n_vertices`.
    #[error("precision {precision} is invalid for a mesh with {num_vertices} vertices")]
    InvalidPrecision {
        /// Requested precision.
        precision: usize,
        /// Number of mesh vertices.
        num_vertices: usize,
    },

    /// A named scene body required by the simulator is missing.
    #[error("scene has no usable model named {name:?}")]
    MissingBody {
        /// The model name.
        name: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The external solver could not be started or failed.
    #[error("external engine failed: {0}")]
    Engine(String),

    /// The external solver returned missing or malformed results.
    #[error("external engine returned an invalid result: {0}")]
    EngineResult(String),

    /// Iterative solver did not converge.
    #[error("algorithm failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// A triangle in a one-ring is (nearly) degenerate.
    #[error("degenerate triangle at vertex {vertex} (angle apex {apex})")]
    DegenerateTriangle {
        /// The row vertex.
        vertex: usize,
        /// The apex vertex of the angle.
        apex: usize,
    },

    /// A tetrahedron has (nearly) zero volume.
    #[error("tetrahedron {tetra} is degenerate")]
    DegenerateTetra {
        /// The tetrahedron index.
        tetra: usize,
    },

    /// A vertex has no mass and cannot be integrated.
    #[error("vertex {vertex} has zero mass")]
    ZeroMass {
        /// The vertex index.
        vertex: usize,
    },

    /// Non-finite values appeared in an input or a result.
    #[error("non-finite value in {what} at index {index}")]
    NonFinite {
        /// Which quantity.
        what: &'static str,
        /// Element index.
        index: usize,
    },

    /// A simulation step produced non-finite positions or velocities.
    #[error("simulation became unstable at t = {time} (vertex {vertex})")]
    NumericalInstability {
        /// Simulation time of the failing step.
        time: f64,
        /// First offending vertex.
        vertex: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A text record could not be parsed.
    #[error("{path}:{line}: {message}")]
    Parse {
        /// The file path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Error message.
        message: String,
    },

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidPrecision { .. }
            | Error::MissingBody { .. }
            | Error::InvalidParameter { .. }
            | Error::Config(_) => ErrorKind::Configuration,

            Error::Engine(_) | Error::EngineResult(_) | Error::ConvergenceFailed { .. } => {
                ErrorKind::ExternalEngine
            }

            Error::EmptyMesh
            | Error::InvalidVertexIndex { .. }
            | Error::DegenerateFace { .. }
            | Error::NonManifoldEdge { .. }
            | Error::NonManifoldVertex { .. }
            | Error::IsolatedVertex { .. }
            | Error::OpenOneRing { .. }
            | Error::NotGenusZero { .. }
            | Error::BoundaryMismatch { .. }
            | Error::InvalidTetraIndex { .. } => ErrorKind::Topology,

            Error::DegenerateTriangle { .. }
            | Error::DegenerateTetra { .. }
            | Error::ZeroMass { .. }
            | Error::NonFinite { .. }
            | Error::NumericalInstability { .. } => ErrorKind::NumericalDegeneracy,

            Error::Io(_)
            | Error::Parse { .. }
            | Error::LoadError { .. }
            | Error::SaveError { .. }
            | Error::UnsupportedFormat { .. } => ErrorKind::Io,
        }
    }
}
