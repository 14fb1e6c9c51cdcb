//! Tick-driven simulation of a scene body.

use log::{debug, info, warn};

use super::integrator;
use super::params::SimulationParams;
use super::state::SimulationState;
use crate::error::{Error, Result};
use crate::mesh::VertexId;
use crate::scene::{Model, Scene};

/// Lifecycle of a [`Simulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorStatus {
    /// `init` has not succeeded yet.
    Uninitialized,
    /// Initialized, no tick taken.
    Ready,
    /// At least one tick taken.
    Stepping,
    /// A tick failed; the simulator must be re-initialized.
    Faulted,
}

/// Explicit soft-body simulator driving a named scene model.
///
/// ```
/// use geomsim::mesh::primitives;
/// use geomsim::scene::{Model, Scene};
/// use geomsim::sim::{PhysicsModel, SimulationParams, Simulator, TetrahedralBody};
/// use nalgebra::Point3;
///
/// let surface = primitives::tetrahedron();
/// let mut points = surface.positions();
/// points.push(Point3::new(0.5, 0.4, 0.25));
/// let tetras = vec![[0, 1, 2, 4], [0, 1, 3, 4], [1, 2, 3, 4], [2, 0, 3, 4]];
/// let body = TetrahedralBody::new(points, tetras, 4).unwrap();
///
/// let mut scene = Scene::new();
/// scene.insert(Model::new("Ball", surface).with_tetra(body));
///
/// let params = SimulationParams::for_model(PhysicsModel::Spring).without_ground();
/// let mut sim = Simulator::new(params);
/// sim.init(&scene, 0.0).unwrap();
/// assert!(sim.simulate(&mut scene, 0.001).unwrap());
/// ```
#[derive(Debug)]
pub struct Simulator {
    params: SimulationParams,
    state: Option<SimulationState>,
    status: SimulatorStatus,
    init_time: f64,
    last_time: f64,
    ticks: u64,
}

impl Simulator {
    /// Create an uninitialized simulator.
    pub fn new(params: SimulationParams) -> Self {
        Self {
            params,
            state: None,
            status: SimulatorStatus::Uninitialized,
            init_time: 0.0,
            last_time: 0.0,
            ticks: 0,
        }
    }

    /// Current status.
    pub fn status(&self) -> SimulatorStatus {
        self.status
    }

    /// Whether `simulate` will take a step.
    pub fn is_ready(&self) -> bool {
        matches!(self.status, SimulatorStatus::Ready | SimulatorStatus::Stepping)
    }

    /// Simulation parameters.
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Simulation state, once initialized.
    pub fn state(&self) -> Option<&SimulationState> {
        self.state.as_ref()
    }

    /// Mutable simulation state, e.g. to set initial velocities.
    pub fn state_mut(&mut self) -> Option<&mut SimulationState> {
        self.state.as_mut()
    }

    /// Time since `init`.
    pub fn elapsed(&self) -> f64 {
        self.last_time - self.init_time
    }

    /// Ticks taken since `init`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Resolve the scene bodies and capture the rest shape.
    ///
    /// On failure the simulator is left uninitialized and the previous state is dropped.
    ///
    /// # Errors
    ///
    /// [`Error::MissingBody`] if the body (or the configured ground) is not in the scene or the
    /// body has no tetrahedral mesh, [`Error::BoundaryMismatch`] if the body's boundary does not
    /// line up with the surface mesh, plus anything [`SimulationState::new`] reports.
    pub fn init(&mut self, scene: &Scene, time: f64) -> Result<()> {
        self.status = SimulatorStatus::Uninitialized;
        self.state = None;
        self.ticks = 0;

        if !time.is_finite() {
            return Err(Error::invalid_param("time", time, "must be finite"));
        }
        let model = resolve(scene, &self.params.body)?;
        let body = model.tetra().ok_or_else(|| Error::MissingBody {
            name: self.params.body.clone(),
        })?;
        if let Some(ground) = &self.params.ground_model {
            if !scene.contains(ground) {
                return Err(Error::MissingBody {
                    name: ground.clone(),
                });
            }
        }
        if model.mesh().num_vertices() != body.num_vertices_boundary() {
            return Err(Error::BoundaryMismatch {
                details: format!(
                    "surface has {} vertices, body has {} boundary vertices",
                    model.mesh().num_vertices(),
                    body.num_vertices_boundary()
                ),
            });
        }

        let state = SimulationState::new(body, &self.params)?;
        info!(
            "simulating {:?} with {} ({} vertices, {} tetrahedra)",
            self.params.body,
            self.params.model,
            body.num_vertices(),
            body.num_tetras()
        );

        self.state = Some(state);
        self.init_time = time;
        self.last_time = time;
        self.status = SimulatorStatus::Ready;
        Ok(())
    }

    /// Advance to `time` and write the result back to the scene.
    ///
    /// Returns `Ok(false)` without doing anything when the simulator is not ready.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `time` lies before the previous tick (the simulator stays
    /// ready). [`Error::MissingBody`] if the body has disappeared from the scene,
    /// [`Error::BoundaryMismatch`] if its surface or tetrahedral mesh was replaced by one of a
    /// different size and [`Error::NumericalInstability`] if the step blew up. These leave the
    /// simulator [`SimulatorStatus::Faulted`] with its state and the scene untouched.
    pub fn simulate(&mut self, scene: &mut Scene, time: f64) -> Result<bool> {
        if !self.is_ready() {
            return Ok(false);
        }
        let Some(state) = self.state.as_mut() else {
            return Ok(false);
        };
        let dt = time - self.last_time;
        if !(dt >= 0.0 && dt.is_finite()) {
            return Err(Error::invalid_param("time", time, "must not precede the last tick"));
        }

        let Some(model) = scene.get_mut(&self.params.body).filter(|m| m.tetra().is_some()) else {
            warn!("model {:?} vanished from the scene", self.params.body);
            self.status = SimulatorStatus::Faulted;
            return Err(Error::MissingBody {
                name: self.params.body.clone(),
            });
        };

        if let Err(e) = check_model(state, model) {
            warn!("model {:?} no longer matches the simulation: {e}", self.params.body);
            self.status = SimulatorStatus::Faulted;
            return Err(e);
        }
        if let Err(e) = simulate_util(state, dt, time - self.init_time) {
            warn!("simulation faulted after {} ticks: {e}", self.ticks);
            self.status = SimulatorStatus::Faulted;
            return Err(e);
        }
        if let Err(e) = simulate_rebuild(state, model) {
            self.status = SimulatorStatus::Faulted;
            return Err(e);
        }

        self.last_time = time;
        self.ticks += 1;
        self.status = SimulatorStatus::Stepping;
        Ok(true)
    }

    /// Take `ticks` steps of `dt` from the last tick.
    ///
    /// Returns the number of steps taken, which is zero if the simulator is not ready.
    pub fn run(&mut self, scene: &mut Scene, ticks: usize, dt: f64) -> Result<usize> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(Error::invalid_param("dt", dt, "must be positive"));
        }
        let start = self.last_time;
        let mut taken = 0;
        for i in 1..=ticks {
            if !self.simulate(scene, start + i as f64 * dt)? {
                break;
            }
            taken += 1;
        }
        debug!("{taken} ticks, t = {:.6}", self.elapsed());
        Ok(taken)
    }
}

fn resolve<'a>(scene: &'a Scene, name: &str) -> Result<&'a Model> {
    scene.get(name).ok_or_else(|| Error::MissingBody {
        name: name.to_string(),
    })
}

/// The scene model must still have the shape captured by `init`.
fn check_model(state: &SimulationState, model: &Model) -> Result<()> {
    let Some(body) = model.tetra() else {
        return Err(Error::MissingBody {
            name: model.name().to_string(),
        });
    };
    if body.num_vertices() != state.positions().len() {
        return Err(Error::BoundaryMismatch {
            details: format!(
                "body has {} vertices, simulation has {}",
                body.num_vertices(),
                state.positions().len()
            ),
        });
    }
    if model.mesh().num_vertices() != body.num_vertices_boundary() {
        return Err(Error::BoundaryMismatch {
            details: format!(
                "surface has {} vertices, body has {} boundary vertices",
                model.mesh().num_vertices(),
                body.num_vertices_boundary()
            ),
        });
    }
    Ok(())
}

/// Forces and integration.
fn simulate_util(state: &mut SimulationState, dt: f64, t: f64) -> Result<()> {
    integrator::step(state, dt, t)
}

/// Copy the new positions into the body and its surface, then flag a redraw.
///
/// Expects a model accepted by `check_model`.
fn simulate_rebuild(state: &SimulationState, model: &mut Model) -> Result<()> {
    let (mesh, body) = model.parts_mut();
    if let Some(body) = body {
        body.set_points(state.positions())?;
        let boundary = body.num_vertices_boundary();
        for (i, p) in state.positions().iter().take(boundary).enumerate() {
            mesh.set_position(VertexId::new(i), *p);
        }
    }
    model.mark_dirty();
    Ok(())
}
