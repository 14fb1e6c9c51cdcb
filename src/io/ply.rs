//! PLY (Stanford polygon) format support.
//!
//! Polygons with more than three corners are fan-triangulated on load. Saving writes ASCII
//! with double-precision coordinates so that processed geometry survives a round trip.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{Error, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh};

/// Load a mesh from a PLY file (ASCII or binary).
pub fn load<P: AsRef<Path>>(path: P) -> Result<HalfEdgeMesh> {
    let path = path.as_ref();
    let fail = |message: &str| Error::LoadError {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let mut reader = BufReader::new(File::open(path)?);
    let ply = Parser::<DefaultElement>::new()
        .read_ply(&mut reader)
        .map_err(|e| fail(&e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| fail("PLY file has no vertex element"))?;

    let vertices = vertex_element
        .iter()
        .map(|v| {
            match (scalar(v, "x"), scalar(v, "y"), scalar(v, "z")) {
                (Some(x), Some(y), Some(z)) => Ok(Point3::new(x, y, z)),
                _ => Err(fail("vertex is missing a coordinate")),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| fail("PLY file has no face element"))?;

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = index_list(face, "vertex_indices")
            .or_else(|| index_list(face, "vertex_index"))
            .ok_or_else(|| fail("face is missing vertex_indices"))?;
        for k in 1..indices.len().saturating_sub(1) {
            faces.push([indices[0], indices[k], indices[k + 1]]);
        }
    }

    if faces.is_empty() {
        return Err(fail("PLY file contains no faces"));
    }

    build_from_triangles(&vertices, &faces)
}

fn scalar(element: &DefaultElement, name: &str) -> Option<f64> {
    Some(match element.get(name)? {
        Property::Float(v) => *v as f64,
        Property::Double(v) => *v,
        Property::Int(v) => *v as f64,
        Property::UInt(v) => *v as f64,
        Property::Short(v) => *v as f64,
        Property::UShort(v) => *v as f64,
        Property::Char(v) => *v as f64,
        Property::UChar(v) => *v as f64,
        _ => return None,
    })
}

fn index_list(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    Some(match element.get(name)? {
        Property::ListInt(v) => v.iter().map(|&x| x as usize).collect(),
        Property::ListUInt(v) => v.iter().map(|&x| x as usize).collect(),
        Property::ListShort(v) => v.iter().map(|&x| x as usize).collect(),
        Property::ListUShort(v) => v.iter().map(|&x| x as usize).collect(),
        Property::ListChar(v) => v.iter().map(|&x| x as usize).collect(),
        Property::ListUChar(v) => v.iter().map(|&x| x as usize).collect(),
        _ => return None,
    })
}

/// Save a mesh as ASCII PLY.
pub fn save<P: AsRef<Path>>(mesh: &HalfEdgeMesh, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment geomsim")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    for axis in ["x", "y", "z"] {
        writeln!(writer, "property double {axis}")?;
    }
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }
    for [a, b, c] in &faces {
        writeln!(writer, "3 {a} {b} {c}")?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_round_trip_keeps_vertex_order() {
        let path = std::env::temp_dir().join(format!("geomsim-ply-{}.ply", std::process::id()));
        let mesh = primitives::icosahedron();
        save(&mesh, &path).unwrap();

        let loaded = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.num_faces(), 20);
        assert_eq!(loaded.positions(), mesh.positions());
    }

    #[test]
    fn test_quad_is_triangulated() {
        let path = std::env::temp_dir().join(format!("geomsim-quad-{}.ply", std::process::id()));
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nproperty float y\n\
             property float z\nelement face 1\nproperty list uchar int vertex_indices\n\
             end_header\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n",
        )
        .unwrap();

        let loaded = load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.num_faces(), 2);
    }
}
