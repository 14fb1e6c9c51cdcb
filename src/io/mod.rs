//! Mesh file I/O.
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | STL | `.stl` | ✓ | ✓ | Binary and ASCII |
//! | PLY | `.ply` | ✓ | ✓ | Stanford polygon format |
//! | TetGen | `.node` `.ele` `.face` / `.poly` | ✓ | input only | Tetrahedral bodies, see [`tetgen`] |
//!
//! Surface meshes go through [`load`] and [`save`], which pick the format from the file
//! extension:
//!
//! ```no_run
//! use geomsim::io::{load, save};
//!
//! let mesh = load("ball.ply").unwrap();
//! save(&mesh, "ball.stl").unwrap();
//! ```

pub mod ply;
pub mod stl;
pub mod tetgen;

use std::path::Path;

use crate::error::{Error, Result};
use crate::mesh::HalfEdgeMesh;

/// Supported surface mesh formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// STL (stereolithography) format.
    Stl,
    /// PLY (Stanford polygon) format.
    Ply,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "stl" => Some(Format::Stl),
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    fn require(path: &Path) -> Result<Format> {
        Format::from_path(path).ok_or_else(|| Error::UnsupportedFormat {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)")
                .to_string(),
        })
    }
}

/// Load a surface mesh, choosing the format from the extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<HalfEdgeMesh> {
    let path = path.as_ref();
    match Format::require(path)? {
        Format::Stl => stl::load(path),
        Format::Ply => ply::load(path),
    }
}

/// Save a surface mesh, choosing the format from the extension.
pub fn save<P: AsRef<Path>>(mesh: &HalfEdgeMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match Format::require(path)? {
        Format::Stl => stl::save(mesh, path),
        Format::Ply => ply::save(mesh, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/ball.STL"), Some(Format::Stl));
        assert_eq!(Format::from_path("ball.ply"), Some(Format::Ply));
        assert_eq!(Format::from_path("ball.obj"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = load("ball.obj");
        assert!(matches!(
            result,
            Err(Error::UnsupportedFormat { extension }) if extension == "obj"
        ));
        assert!(matches!(
            save(&HalfEdgeMesh::new(), "ball"),
            Err(Error::UnsupportedFormat { .. })
        ));
    }
}
