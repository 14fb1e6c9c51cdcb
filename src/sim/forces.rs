//! Force terms.
//!
//! Every function adds into a per-vertex force buffer so that a model can combine any subset of
//! them. Positions and velocities are passed explicitly rather than read from the state, which
//! lets the midpoint scheme evaluate forces at a predicted configuration.

use nalgebra::{Matrix3, Point3, Vector3};

use super::body::{edge_matrix, TETRA_EDGES};
use super::state::SimulationState;

/// `(a, b, c, opposite)` local indices for the four faces of a tetrahedron.
const TETRA_FACES: [[usize; 4]; 4] = [[0, 1, 2, 3], [0, 2, 3, 1], [0, 3, 1, 2], [1, 2, 3, 0]];

/// Gravity `m * g` on every vertex.
pub fn add_gravity(state: &SimulationState, forces: &mut [Vector3<f64>]) {
    let g = state.params.gravity();
    for (f, &m) in forces.iter_mut().zip(&state.masses) {
        *f += g * m;
    }
}

/// Green strain `0.5 (∇u + ∇uᵀ + ∇uᵀ∇u)` of a tetrahedron with deformation gradient `p`.
pub fn green_strain(p: &Matrix3<f64>) -> Matrix3<f64> {
    let grad_u = p - Matrix3::identity();
    (grad_u + grad_u.transpose() + grad_u.transpose() * grad_u) * 0.5
}

/// Area-weighted normal of the face `(a, b, c)`, oriented away from `opposite`.
fn outward_area_normal(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    opposite: &Point3<f64>,
) -> Vector3<f64> {
    let n = (b - a).cross(&(c - a)) * 0.5;
    if n.dot(&(opposite - a)) > 0.0 {
        -n
    } else {
        n
    }
}

/// Elastic forces of the strain-based model.
///
/// Stress is `sigma = E * epsilon`. Each face receives `-sigma * n` with `n` its outward area
/// normal, split evenly between its three corners. The four face normals of a tetrahedron sum to
/// zero, so every tetrahedron exerts zero net force.
pub fn add_fed_forces(
    state: &SimulationState,
    positions: &[Point3<f64>],
    forces: &mut [Vector3<f64>],
) {
    let e = state.params.youngs_modulus;
    for (tetra, x_inv) in state.tetras.iter().zip(&state.rest_inverses) {
        let p = tetra.map(|v| positions[v]);
        let sigma = green_strain(&(edge_matrix(&p) * x_inv)) * e;

        for [a, b, c, opposite] in TETRA_FACES {
            let n = outward_area_normal(&p[a], &p[b], &p[c], &p[opposite]);
            let share = -(sigma * n) / 3.0;
            for corner in [a, b, c] {
                forces[tetra[corner]] += share;
            }
        }
    }
}

/// Linear springs along the six edges of every tetrahedron.
///
/// The force magnitude is `k (l - l0)` plus `c` times the relative speed along the edge, pulling
/// the endpoints together when stretched and apart when compressed.
pub fn add_spring_forces(
    state: &SimulationState,
    positions: &[Point3<f64>],
    velocities: &[Vector3<f64>],
    forces: &mut [Vector3<f64>],
) {
    let k = state.params.spring_stiffness;
    let c = state.params.spring_damping;
    for (tetra, rest) in state.tetras.iter().zip(&state.rest_lengths) {
        for (&[a, b], &l0) in TETRA_EDGES.iter().zip(rest) {
            let (i1, i2) = (tetra[a], tetra[b]);
            let l = positions[i1] - positions[i2];
            let length = l.norm();
            if length <= f64::EPSILON {
                continue;
            }
            let dir = l / length;
            let mut magnitude = k * (length - l0);
            if c > 0.0 {
                magnitude += c * (velocities[i1] - velocities[i2]).dot(&dir);
            }
            forces[i1] -= dir * magnitude;
            forces[i2] += dir * magnitude;
        }
    }
}

/// Penalty contact with the plane `z = height` for every vertex at or below it.
pub fn add_ground_forces(
    state: &SimulationState,
    positions: &[Point3<f64>],
    velocities: &[Vector3<f64>],
    forces: &mut [Vector3<f64>],
) {
    let ground = &state.params.ground;
    if !ground.enabled {
        return;
    }
    for (i, (p, v)) in positions.iter().zip(velocities).enumerate() {
        let depth = p.z - ground.height;
        if depth > 0.0 {
            continue;
        }
        let m = state.masses[i];
        let damping = ground.damping_ratio * 2.0 * (ground.stiffness * m).sqrt();
        forces[i] += Vector3::new(
            -ground.friction * v.x,
            -ground.friction * v.y,
            -ground.stiffness * depth - damping * v.z,
        );
    }
}
