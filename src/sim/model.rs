//! Physics model selection.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::forces;
use super::state::SimulationState;
use crate::error::{Error, Result};

/// Internal force model and the integration scheme that goes with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhysicsModel {
    /// Strain-based elasticity per tetrahedron, explicit Euler.
    #[default]
    Fed,
    /// Linear springs on tetrahedron edges, explicit Euler.
    Spring,
    /// Linear springs on tetrahedron edges, explicit midpoint.
    MidpointSpring,
}

impl PhysicsModel {
    /// All models.
    pub const ALL: [PhysicsModel; 3] = [
        PhysicsModel::Fed,
        PhysicsModel::Spring,
        PhysicsModel::MidpointSpring,
    ];

    /// Whether this model integrates with the two-stage midpoint scheme.
    pub fn uses_midpoint(self) -> bool {
        self == PhysicsModel::MidpointSpring
    }

    /// Total per-vertex force (gravity, internal, ground) at the given configuration.
    pub fn compute_forces(
        self,
        state: &SimulationState,
        positions: &[Point3<f64>],
        velocities: &[Vector3<f64>],
    ) -> Vec<Vector3<f64>> {
        let mut f = vec![Vector3::zeros(); positions.len()];
        forces::add_gravity(state, &mut f);
        match self {
            PhysicsModel::Fed => forces::add_fed_forces(state, positions, &mut f),
            PhysicsModel::Spring | PhysicsModel::MidpointSpring => {
                forces::add_spring_forces(state, positions, velocities, &mut f)
            }
        }
        forces::add_ground_forces(state, positions, velocities, &mut f);
        f
    }
}

impl fmt::Display for PhysicsModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PhysicsModel::Fed => "fed",
            PhysicsModel::Spring => "spring",
            PhysicsModel::MidpointSpring => "midpoint-spring",
        })
    }
}

impl FromStr for PhysicsModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PhysicsModel::ALL
            .into_iter()
            .find(|m| m.to_string() == s.to_ascii_lowercase())
            .ok_or_else(|| Error::invalid_param("model", s, "expected fed, spring or midpoint-spring"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{MassModel, SimulationParams, TetrahedralBody};
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_and_display() {
        for model in PhysicsModel::ALL {
            assert_eq!(model.to_string().parse::<PhysicsModel>().unwrap(), model);
        }
        assert_eq!("FED".parse::<PhysicsModel>().unwrap(), PhysicsModel::Fed);
        assert!("verlet".parse::<PhysicsModel>().is_err());
    }

    #[test]
    fn test_free_fall_forces() {
        let body = TetrahedralBody::new(
            vec![
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(0.0, 1.0, 1.0),
                Point3::new(0.0, 0.0, 2.0),
            ],
            vec![[0, 1, 2, 3]],
            4,
        )
        .unwrap();
        for model in PhysicsModel::ALL {
            let params = SimulationParams::for_model(model).with_mass(MassModel::Uniform(0.5));
            let state = SimulationState::new(&body, &params).unwrap();
            let f = model.compute_forces(&state, state.positions(), state.velocities());
            for v in f {
                assert_relative_eq!(v, Vector3::new(0.0, 0.0, -4.9), epsilon = 1e-6);
            }
        }
    }
}
