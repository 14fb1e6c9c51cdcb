//! Explicit soft-body simulation over a tetrahedral body.
//!
//! | Model | Internal force | Integrator |
//! |-------|----------------|------------|
//! | [`PhysicsModel::Fed`] | Green strain times Young's modulus, applied through face normals | Euler |
//! | [`PhysicsModel::Spring`] | Linear springs on tetrahedron edges | Euler |
//! | [`PhysicsModel::MidpointSpring`] | Linear springs on tetrahedron edges | Midpoint |
//!
//! All models add gravity and a penalty ground contact. A [`Simulator`] owns the
//! [`SimulationState`] and writes positions back to a named [`Model`](crate::scene::Model) in a
//! [`Scene`](crate::scene::Scene) after every tick.

mod body;
pub mod forces;
mod integrator;
mod model;
mod params;
mod simulator;
mod state;
mod timing;

pub use body::{edge_matrix, tetra_volume, TetrahedralBody, TETRA_EDGES};
pub use integrator::step;
pub use model::PhysicsModel;
pub use params::{GroundParams, MassModel, SimulationParams};
pub use simulator::{Simulator, SimulatorStatus};
pub use state::SimulationState;
pub use timing::{FrameRate, DEFAULT_FRAME_WINDOW};
