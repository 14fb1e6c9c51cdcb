//! Explicit time integration.
//!
//! Both schemes write into fresh buffers and only commit them to the state once every value is
//! finite. A failed step leaves the state untouched.

use nalgebra::{Point3, Vector3};

use super::model::PhysicsModel;
use super::state::SimulationState;
use crate::error::{Error, Result};

/// Advance `state` by `dt`.
///
/// `time` is only used to label a [`Error::NumericalInstability`].
pub fn step(state: &mut SimulationState, dt: f64, time: f64) -> Result<()> {
    if !(dt >= 0.0 && dt.is_finite()) {
        return Err(Error::invalid_param("dt", dt, "must be finite and non-negative"));
    }
    let model = state.params.model;
    let (positions, velocities) = if model.uses_midpoint() {
        midpoint(state, model, dt)
    } else {
        euler(state, model, dt)
    };

    if let Some(vertex) = first_non_finite(&positions, &velocities) {
        return Err(Error::NumericalInstability { time, vertex });
    }
    state.positions = positions;
    state.velocities = velocities;
    Ok(())
}

/// `v += dt f/m; x += dt v` using the updated velocity.
fn euler(
    state: &SimulationState,
    model: PhysicsModel,
    dt: f64,
) -> (Vec<Point3<f64>>, Vec<Vector3<f64>>) {
    let forces = model.compute_forces(state, &state.positions, &state.velocities);
    advance(state, &forces, dt)
}

/// Predict with half a step of the velocity update, then take the full step with the forces at
/// the predicted configuration.
fn midpoint(
    state: &SimulationState,
    model: PhysicsModel,
    dt: f64,
) -> (Vec<Point3<f64>>, Vec<Vector3<f64>>) {
    let forces = model.compute_forces(state, &state.positions, &state.velocities);
    let predicted: Vec<Vector3<f64>> = state
        .velocities
        .iter()
        .zip(&forces)
        .zip(&state.masses)
        .map(|((v, f), m)| v + f * (dt / m))
        .collect();
    let mid: Vec<Point3<f64>> = state
        .positions
        .iter()
        .zip(&predicted)
        .map(|(x, v)| x + v * (0.5 * dt))
        .collect();

    let forces = model.compute_forces(state, &mid, &predicted);
    advance(state, &forces, dt)
}

fn advance(
    state: &SimulationState,
    forces: &[Vector3<f64>],
    dt: f64,
) -> (Vec<Point3<f64>>, Vec<Vector3<f64>>) {
    let velocities: Vec<Vector3<f64>> = state
        .velocities
        .iter()
        .zip(forces)
        .zip(&state.masses)
        .map(|((v, f), m)| v + f * (dt / m))
        .collect();
    let positions = state
        .positions
        .iter()
        .zip(&velocities)
        .map(|(x, v)| x + v * dt)
        .collect();
    (positions, velocities)
}

fn first_non_finite(positions: &[Point3<f64>], velocities: &[Vector3<f64>]) -> Option<usize> {
    positions
        .iter()
        .zip(velocities)
        .position(|(p, v)| !p.coords.iter().chain(v.iter()).all(|c| c.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{MassModel, SimulationParams, TetrahedralBody};
    use approx::assert_relative_eq;

    fn point_mass(z: f64, params: SimulationParams) -> SimulationState {
        let body = TetrahedralBody::new(vec![Point3::new(0.0, 0.0, z)], vec![], 1).unwrap();
        SimulationState::new(&body, &params.with_mass(MassModel::Uniform(1.0))).unwrap()
    }

    #[test]
    fn test_euler_free_fall() {
        let mut state = point_mass(10.0, SimulationParams::default().without_ground());
        step(&mut state, 0.1, 0.1).unwrap();
        assert_relative_eq!(state.velocities()[0].z, -0.98, epsilon = 1e-12);
        assert_relative_eq!(state.positions()[0].z, 10.0 - 0.098, epsilon = 1e-12);
    }

    #[test]
    fn test_midpoint_matches_euler_for_constant_force() {
        let params = SimulationParams::for_model(PhysicsModel::MidpointSpring).without_ground();
        let mut mid = point_mass(10.0, params);
        let mut euler = point_mass(10.0, SimulationParams::default().without_ground());
        for i in 0..10 {
            let t = (i + 1) as f64 * 0.01;
            step(&mut mid, 0.01, t).unwrap();
            step(&mut euler, 0.01, t).unwrap();
        }
        assert_relative_eq!(mid.positions()[0], euler.positions()[0], epsilon = 1e-12);
    }

    #[test]
    fn test_zero_dt_is_identity() {
        let mut state = point_mass(1.0, SimulationParams::default());
        let before = state.positions().to_vec();
        step(&mut state, 0.0, 0.0).unwrap();
        assert_eq!(state.positions(), before.as_slice());
    }

    #[test]
    fn test_rejects_bad_dt() {
        let mut state = point_mass(1.0, SimulationParams::default());
        assert!(step(&mut state, -0.1, 0.0).is_err());
        assert!(step(&mut state, f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_instability_is_not_committed() {
        let mut state = point_mass(1.0, SimulationParams::default());
        state.velocities[0] = Vector3::new(f64::INFINITY, 0.0, 0.0);
        let before = state.positions().to_vec();
        let result = step(&mut state, 0.01, 2.5);
        assert!(matches!(
            result,
            Err(Error::NumericalInstability { vertex: 0, .. })
        ));
        assert_eq!(state.positions(), before.as_slice());
    }
}
