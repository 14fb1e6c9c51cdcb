//! TetGen text formats.
//!
//! A tetrahedralization is read from three files sharing a prefix:
//!
//! - `<prefix>.node`: `<count> <dim> <attrs> <markers>`, then `<index> <x> <y> <z> ...`
//! - `<prefix>.ele`: `<count> <nodes per tetra> <attrs>`, then `<index> <n0> <n1> <n2> <n3> ...`
//! - `<prefix>.face` (optional): `<count> <markers>`, then `<index> <n0> <n1> <n2> ...`
//!
//! Everything after `#` on a line is a comment. Numbering starts at 0 or 1; the start is
//! taken from the first node record and applies to all three files.
//!
//! [`save_input`] writes the piecewise linear complex (`.node` + `.poly`) for a surface mesh,
//! with vertices in surface order. TetGen keeps input vertices first, so the boundary vertices
//! of the resulting tetrahedralization line up with the surface mesh.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;
use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::mesh::{to_face_vertex, HalfEdgeMesh};
use crate::sim::TetrahedralBody;

/// `<prefix><suffix>`, e.g. `ball.1` + `.node`.
pub fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = prefix.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// Load `<prefix>.node`, `<prefix>.ele` and, if present, `<prefix>.face`.
///
/// The first `n_vertices_boundary` nodes are the surface vertices.
pub fn load<P: AsRef<Path>>(prefix: P, n_vertices_boundary: usize) -> Result<TetrahedralBody> {
    let prefix = prefix.as_ref();

    let (points, base) = load_nodes(&with_suffix(prefix, ".node"))?;
    let tetras: Vec<[usize; 4]> = load_cells(&with_suffix(prefix, ".ele"), base)?;

    let face_path = with_suffix(prefix, ".face");
    let faces: Vec<[usize; 3]> = if face_path.exists() {
        load_cells(&face_path, base)?
    } else {
        Vec::new()
    };

    debug!(
        "{}: {} nodes, {} tetrahedra, {} boundary faces ({}-based)",
        prefix.display(),
        points.len(),
        tetras.len(),
        faces.len(),
        base
    );

    TetrahedralBody::new(points, tetras, n_vertices_boundary)?.with_boundary_faces(faces)
}

/// Write `<prefix>.node` and `<prefix>.poly` describing the closed surface `mesh`.
pub fn save_input<P: AsRef<Path>>(mesh: &HalfEdgeMesh, prefix: P) -> Result<()> {
    let prefix = prefix.as_ref();
    let (vertices, faces) = to_face_vertex(mesh);

    let mut node = BufWriter::new(File::create(with_suffix(prefix, ".node"))?);
    writeln!(node, "# geomsim surface vertices")?;
    writeln!(node, "{} 3 0 0", vertices.len())?;
    for (i, p) in vertices.iter().enumerate() {
        writeln!(node, "{} {} {} {}", i + 1, p.x, p.y, p.z)?;
    }
    node.flush()?;

    let mut poly = BufWriter::new(File::create(with_suffix(prefix, ".poly"))?);
    writeln!(poly, "# nodes are listed in the .node file")?;
    writeln!(poly, "0 3 0 0")?;
    writeln!(poly, "{} 0", faces.len())?;
    for [a, b, c] in &faces {
        writeln!(poly, "1")?;
        writeln!(poly, "3 {} {} {}", a + 1, b + 1, c + 1)?;
    }
    writeln!(poly, "0")?;
    writeln!(poly, "0")?;
    poly.flush()?;

    Ok(())
}

/// Non-empty, comment-stripped lines with their 1-based line numbers.
struct Records<'a> {
    path: &'a Path,
    lines: Vec<(usize, Vec<&'a str>)>,
}

impl<'a> Records<'a> {
    fn new(path: &'a Path, text: &'a str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let content = line.split('#').next().unwrap_or("");
                let tokens: Vec<&str> = content.split_whitespace().collect();
                (!tokens.is_empty()).then_some((i + 1, tokens))
            })
            .collect();
        Self { path, lines }
    }

    fn error(&self, line: usize, message: impl Into<String>) -> Error {
        Error::Parse {
            path: self.path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    fn field<T: FromStr>(&self, line: usize, tokens: &[&str], k: usize, what: &str) -> Result<T> {
        let token = tokens
            .get(k)
            .ok_or_else(|| self.error(line, format!("missing {what}")))?;
        token
            .parse()
            .map_err(|_| self.error(line, format!("invalid {what} `{token}`")))
    }

    /// The header line and exactly `count` records after it.
    fn split(&self, header_fields: usize) -> Result<(&[&'a str], usize, &[(usize, Vec<&'a str>)])> {
        let (line, header) = self
            .lines
            .first()
            .ok_or_else(|| self.error(0, "file is empty"))?;
        if header.len() < header_fields {
            return Err(self.error(*line, "incomplete header"));
        }
        let count: usize = self.field(*line, header, 0, "record count")?;
        let records = &self.lines[1..];
        if records.len() < count {
            let last = records.last().map_or(*line, |r| r.0);
            return Err(self.error(
                last,
                format!("expected {count} records, found {}", records.len()),
            ));
        }
        Ok((header, *line, &records[..count]))
    }
}

fn load_nodes(path: &Path) -> Result<(Vec<Point3<f64>>, usize)> {
    let text = fs::read_to_string(path)?;
    let records = Records::new(path, &text);
    let (header, header_line, body) = records.split(1)?;

    if header.len() > 1 {
        let dim: usize = records.field(header_line, header, 1, "dimension")?;
        if dim != 3 {
            return Err(records.error(header_line, format!("dimension {dim} is not 3")));
        }
    }

    let mut base = 0;
    let mut points = Vec::with_capacity(body.len());
    for (k, (line, tokens)) in body.iter().enumerate() {
        let index: usize = records.field(*line, tokens, 0, "node number")?;
        if k == 0 {
            if index > 1 {
                return Err(records.error(*line, "numbering must start at 0 or 1"));
            }
            base = index;
        }
        if index != base + k {
            return Err(records.error(*line, format!("expected node {}", base + k)));
        }
        let x: f64 = records.field(*line, tokens, 1, "x coordinate")?;
        let y: f64 = records.field(*line, tokens, 2, "y coordinate")?;
        let z: f64 = records.field(*line, tokens, 3, "z coordinate")?;
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(records.error(*line, "non-finite coordinate"));
        }
        points.push(Point3::new(x, y, z));
    }

    Ok((points, base))
}

/// Tetrahedra (`N = 4`) or triangles (`N = 3`): the first `N` node numbers after the index.
fn load_cells<const N: usize>(path: &Path, base: usize) -> Result<Vec<[usize; N]>> {
    let text = fs::read_to_string(path)?;
    let records = Records::new(path, &text);
    let (_, _, body) = records.split(1)?;

    body.iter()
        .map(|(line, tokens)| {
            let mut cell = [0usize; N];
            for (k, slot) in cell.iter_mut().enumerate() {
                let node: usize = records.field(*line, tokens, k + 1, "node number")?;
                *slot = node
                    .checked_sub(base)
                    .ok_or_else(|| records.error(*line, format!("node {node} below {base}")))?;
            }
            Ok(cell)
        })
        .collect()
}
