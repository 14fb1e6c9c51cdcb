//! STL (stereolithography) format support.
//!
//! Binary and ASCII files are read through `stl_io`, which already merges bit-identical
//! corners into shared vertices. Vertex order follows first appearance in the file.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh};

/// Load a mesh from an STL file.
///
/// Triangles that collapse to an edge or a point after vertex merging are dropped.
///
/// ```no_run
/// let mesh = geomsim::io::stl::load("ball.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<HalfEdgeMesh> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| Error::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let faces: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|tri| tri.vertices)
        .filter(|&[a, b, c]| a != b && b != c && a != c)
        .collect();

    let dropped = stl.faces.len() - faces.len();
    if dropped > 0 {
        log::warn!("{}: dropped {dropped} degenerate triangle(s)", path.display());
    }

    if faces.is_empty() {
        return Err(Error::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    build_from_triangles(&vertices, &faces)
}

/// Save a mesh as binary STL.
///
/// STL has no shared vertices, so reloading the file yields the same vertex order only if
/// no two vertices coincide.
pub fn save<P: AsRef<Path>>(mesh: &HalfEdgeMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);

    let (vertices, faces) = to_face_vertex(mesh);
    let to_f32 = |p: &Point3<f64>| [p.x as f32, p.y as f32, p.z as f32];

    let triangles: Vec<stl_io::Triangle> = faces
        .iter()
        .map(|&[a, b, c]| {
            let (p0, p1, p2) = (&vertices[a], &vertices[b], &vertices[c]);
            let n = (p1 - p0)
                .cross(&(p2 - p0))
                .try_normalize(f64::EPSILON)
                .unwrap_or_else(nalgebra::Vector3::zeros);
            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new(to_f32(p0)),
                    stl_io::Vertex::new(to_f32(p1)),
                    stl_io::Vertex::new(to_f32(p2)),
                ],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| Error::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
