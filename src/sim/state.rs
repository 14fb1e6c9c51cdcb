//! Per-vertex and per-tetrahedron simulation state.

use log::debug;
use nalgebra::{Matrix3, Point3, Vector3};

use super::body::{TetrahedralBody, TETRA_EDGES};
use super::model::PhysicsModel;
use super::params::{MassModel, SimulationParams};
use crate::error::{Error, Result};

/// Mutable kinematic state plus the rest-shape quantities computed once at start-up.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub(crate) params: SimulationParams,
    pub(crate) positions: Vec<Point3<f64>>,
    pub(crate) velocities: Vec<Vector3<f64>>,
    pub(crate) tetras: Vec<[usize; 4]>,
    pub(crate) tetra_volumes: Vec<f64>,
    pub(crate) vertex_volumes: Vec<f64>,
    pub(crate) masses: Vec<f64>,
    /// Inverse rest edge matrices; only filled for the strain-based model.
    pub(crate) rest_inverses: Vec<Matrix3<f64>>,
    pub(crate) rest_lengths: Vec<[f64; 6]>,
}

impl SimulationState {
    /// Capture the rest shape of `body` and start from rest.
    ///
    /// # Errors
    ///
    /// Invalid parameters, [`Error::DegenerateTetra`] for a flat tetrahedron when the
    /// strain-based model is used, [`Error::ZeroMass`] for a vertex that ends up without mass
    /// (for instance one not used by any tetrahedron under a density mass model).
    pub fn new(body: &TetrahedralBody, params: &SimulationParams) -> Result<Self> {
        params.validate()?;
        let n = body.num_vertices();

        let tetra_volumes: Vec<f64> = (0..body.num_tetras()).map(|t| body.volume(t)).collect();

        let mut vertex_volumes = vec![0.0; n];
        for (tetra, &volume) in body.tetras().iter().zip(&tetra_volumes) {
            for &v in tetra {
                vertex_volumes[v] += 0.25 * volume;
            }
        }

        let masses: Vec<f64> = match params.mass {
            MassModel::Density(rho) => vertex_volumes.iter().map(|&v| rho * v).collect(),
            MassModel::Uniform(m) => vec![m; n],
        };
        if let Some(vertex) = masses.iter().position(|&m| !(m > 0.0 && m.is_finite())) {
            return Err(Error::ZeroMass { vertex });
        }

        let rest_inverses = if params.model == PhysicsModel::Fed {
            (0..body.num_tetras())
                .map(|t| body.rest_inverse(t, params.min_tetra_volume))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };
        let rest_lengths = (0..body.num_tetras()).map(|t| body.edge_lengths(t)).collect();

        debug!(
            "simulation state: {} vertices, {} tetrahedra, volume {:.6}, mass {:.6}",
            n,
            body.num_tetras(),
            tetra_volumes.iter().sum::<f64>(),
            masses.iter().sum::<f64>()
        );

        Ok(Self {
            params: params.clone(),
            positions: body.points().to_vec(),
            velocities: vec![Vector3::zeros(); n],
            tetras: body.tetras().to_vec(),
            tetra_volumes,
            vertex_volumes,
            masses,
            rest_inverses,
            rest_lengths,
        })
    }

    /// Parameters this state was built with.
    #[inline]
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Current positions.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Current velocities.
    #[inline]
    pub fn velocities(&self) -> &[Vector3<f64>] {
        &self.velocities
    }

    /// Per-vertex masses.
    #[inline]
    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Rest volume of every tetrahedron.
    #[inline]
    pub fn tetra_volumes(&self) -> &[f64] {
        &self.tetra_volumes
    }

    /// Quarter-share volume accumulated at every vertex.
    #[inline]
    pub fn vertex_volumes(&self) -> &[f64] {
        &self.vertex_volumes
    }

    /// Replace the current positions, e.g. to start from a deformed configuration.
    pub fn set_positions(&mut self, positions: &[Point3<f64>]) -> Result<()> {
        self.check_len(positions.len())?;
        self.positions.copy_from_slice(positions);
        Ok(())
    }

    /// Replace the current velocities.
    pub fn set_velocities(&mut self, velocities: &[Vector3<f64>]) -> Result<()> {
        self.check_len(velocities.len())?;
        self.velocities.copy_from_slice(velocities);
        Ok(())
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.num_vertices() {
            return Err(Error::invalid_param("len", len, "must match the vertex count"));
        }
        Ok(())
    }

    /// `Σ ½ m |v|²`.
    pub fn kinetic_energy(&self) -> f64 {
        self.masses
            .iter()
            .zip(&self.velocities)
            .map(|(m, v)| 0.5 * m * v.norm_squared())
            .sum()
    }

    /// `Σ ½ k (l - l0)²` over all tetrahedron edges at `positions`.
    pub fn spring_energy(&self, positions: &[Point3<f64>]) -> f64 {
        let k = self.params.spring_stiffness;
        self.tetras
            .iter()
            .zip(&self.rest_lengths)
            .flat_map(|(tetra, rest)| {
                TETRA_EDGES.iter().zip(rest).map(move |(&[a, b], &l0)| {
                    let l = (positions[tetra[a]] - positions[tetra[b]]).norm();
                    0.5 * k * (l - l0) * (l - l0)
                })
            })
            .sum()
    }

    /// Largest deviation of any tetrahedron edge from its rest length.
    pub fn max_edge_strain(&self) -> f64 {
        self.tetras
            .iter()
            .zip(&self.rest_lengths)
            .flat_map(|(tetra, rest)| {
                TETRA_EDGES.iter().zip(rest).map(move |(&[a, b], &l0)| {
                    ((self.positions[tetra[a]] - self.positions[tetra[b]]).norm() - l0).abs()
                })
            })
            .fold(0.0, f64::max)
    }

    /// Center of mass.
    pub fn center_of_mass(&self) -> Point3<f64> {
        let total: f64 = self.masses.iter().sum();
        let weighted = self
            .positions
            .iter()
            .zip(&self.masses)
            .fold(Vector3::zeros(), |acc, (p, &m)| acc + p.coords * m);
        Point3::from(weighted / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn split_tetra() -> TetrahedralBody {
        TetrahedralBody::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(0.2, 0.3, 0.25),
            ],
            vec![[0, 1, 2, 4], [0, 1, 3, 4], [0, 2, 3, 4], [1, 2, 3, 4]],
            4,
        )
        .unwrap()
    }

    #[test]
    fn test_quarter_volumes_sum_to_total() {
        let body = split_tetra();
        let state = SimulationState::new(&body, &SimulationParams::default()).unwrap();

        let total: f64 = state.tetra_volumes().iter().sum();
        let shares: f64 = state.vertex_volumes().iter().sum();
        assert!(total > 0.0);
        assert_relative_eq!(total, 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(shares, total, epsilon = 1e-12);
    }

    #[test]
    fn test_density_masses() {
        let body = split_tetra();
        let params = SimulationParams::default().with_mass(MassModel::Density(1200.0));
        let state = SimulationState::new(&body, &params).unwrap();
        for (m, v) in state.masses().iter().zip(state.vertex_volumes()) {
            assert_relative_eq!(*m, 1200.0 * v, epsilon = 1e-12);
        }
        assert_relative_eq!(state.masses().iter().sum::<f64>(), 200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unused_vertex_has_no_mass() {
        let mut points = split_tetra().points().to_vec();
        points.push(Point3::new(3.0, 3.0, 3.0));
        let body = TetrahedralBody::new(points, vec![[0, 1, 2, 3]], 4).unwrap();
        let result = SimulationState::new(&body, &SimulationParams::default());
        assert!(matches!(result, Err(Error::ZeroMass { vertex: 4 })));

        let params = SimulationParams::default().with_mass(MassModel::Uniform(1.0));
        assert!(SimulationState::new(&body, &params).is_ok());
    }

    #[test]
    fn test_rest_inverses_only_for_fed() {
        let body = split_tetra();
        let fed = SimulationState::new(&body, &SimulationParams::for_model(PhysicsModel::Fed))
            .unwrap();
        assert_eq!(fed.rest_inverses.len(), 4);

        let spring =
            SimulationState::new(&body, &SimulationParams::for_model(PhysicsModel::Spring))
                .unwrap();
        assert!(spring.rest_inverses.is_empty());
        assert_eq!(spring.rest_lengths.len(), 4);
        assert_eq!(spring.spring_energy(spring.positions()), 0.0);
        assert_eq!(spring.max_edge_strain(), 0.0);
    }

    #[test]
    fn test_set_positions_checks_length() {
        let mut state =
            SimulationState::new(&split_tetra(), &SimulationParams::default()).unwrap();
        assert!(state.set_positions(&[Point3::origin()]).is_err());
        assert!(state.set_velocities(&[Vector3::zeros(); 5]).is_ok());
    }
}
