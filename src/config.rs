//! TOML configuration.
//!
//! Every section and field is optional; anything left out keeps its default.
//!
//! ```toml
//! [laplacian]
//! kind = "cotangent-clamped"
//!
//! [compression]
//! precision = 40
//!
//! [simulation]
//! model = "midpoint-spring"
//! spring_stiffness = 150000.0
//! mass = { uniform = 0.01 }
//!
//! [simulation.ground]
//! height = -0.5
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::algo::laplacian::{LaplacianKind, LaplacianOptions};
use crate::algo::offset::OffsetOptions;
use crate::algo::skeleton::SkeletonOptions;
use crate::error::{Error, Result};
use crate::sim::SimulationParams;

/// Settings for spectral compression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Number of eigenvectors kept, `None` to require it on the command line.
    pub precision: Option<usize>,
    /// Operator handed to the eigen solver.
    pub laplacian: LaplacianOptions,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            precision: None,
            laplacian: LaplacianOptions::default().with_kind(LaplacianKind::Combinatorial),
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Standalone Laplacian assembly.
    pub laplacian: LaplacianOptions,
    /// Spectral compression.
    pub compression: CompressionConfig,
    /// Skeleton extraction.
    pub skeleton: SkeletonOptions,
    /// Offset surface preparation.
    pub offset: OffsetOptions,
    /// Soft-body simulation.
    pub simulation: SimulationParams,
}

impl Config {
    /// Read a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.simulation.validate()?;
        config.skeleton.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
