//! Simulation parameters.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::model::PhysicsModel;
use crate::error::{Error, Result};

/// How per-vertex masses are derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MassModel {
    /// `density * vertex_volume`, the vertex volume being a quarter of every incident tetra.
    Density(f64),
    /// The same mass for every vertex.
    Uniform(f64),
}

impl Default for MassModel {
    fn default() -> Self {
        MassModel::Density(1000.0)
    }
}

/// Penalty contact with the horizontal plane `z = height`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundParams {
    /// Whether contact forces are applied at all.
    pub enabled: bool,
    /// Height of the ground plane.
    pub height: f64,
    /// Penalty spring stiffness per unit penetration.
    pub stiffness: f64,
    /// Normal damping as a fraction of critical damping (`2 sqrt(k m)`).
    pub damping_ratio: f64,
    /// Viscous friction coefficient on horizontal velocity.
    pub friction: f64,
}

impl Default for GroundParams {
    fn default() -> Self {
        Self {
            enabled: true,
            height: 0.0,
            stiffness: 2.0e6,
            damping_ratio: 1.0,
            friction: 0.03,
        }
    }
}

/// Everything that controls a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Force model and integration scheme.
    pub model: PhysicsModel,
    /// Gravitational acceleration.
    pub gravity: [f64; 3],
    /// Mass assignment.
    pub mass: MassModel,
    /// Stiffness of the strain-based elastic model.
    pub youngs_modulus: f64,
    /// Stiffness of the edge springs.
    pub spring_stiffness: f64,
    /// Damping of the edge springs along the edge direction.
    pub spring_damping: f64,
    /// Ground contact.
    pub ground: GroundParams,
    /// Tetrahedra with a smaller rest volume are rejected.
    pub min_tetra_volume: f64,
    /// Name of the simulated scene model.
    pub body: String,
    /// Name of the ground scene model, if one must be present.
    pub ground_model: Option<String>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            model: PhysicsModel::Fed,
            gravity: [0.0, 0.0, -9.8],
            mass: MassModel::default(),
            youngs_modulus: 0.033e9,
            spring_stiffness: 200_000.0,
            spring_damping: 0.0,
            ground: GroundParams::default(),
            min_tetra_volume: 1e-15,
            body: "Ball".to_string(),
            ground_model: Some("Ground".to_string()),
        }
    }
}

impl SimulationParams {
    /// Parameters for `model` with everything else at its default.
    pub fn for_model(model: PhysicsModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Set the gravitational acceleration.
    pub fn with_gravity(mut self, g: Vector3<f64>) -> Self {
        self.gravity = [g.x, g.y, g.z];
        self
    }

    /// Set the mass model.
    pub fn with_mass(mut self, mass: MassModel) -> Self {
        self.mass = mass;
        self
    }

    /// Set the spring stiffness.
    pub fn with_spring_stiffness(mut self, k: f64) -> Self {
        self.spring_stiffness = k;
        self
    }

    /// Set the elastic modulus.
    pub fn with_youngs_modulus(mut self, e: f64) -> Self {
        self.youngs_modulus = e;
        self
    }

    /// Set the ground contact parameters.
    pub fn with_ground(mut self, ground: GroundParams) -> Self {
        self.ground = ground;
        self
    }

    /// Disable ground contact.
    pub fn without_ground(mut self) -> Self {
        self.ground.enabled = false;
        self.ground_model = None;
        self
    }

    /// Gravity as a vector.
    pub fn gravity(&self) -> Vector3<f64> {
        Vector3::from(self.gravity)
    }

    /// Check that every coefficient is usable.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("youngs_modulus", self.youngs_modulus),
            ("spring_stiffness", self.spring_stiffness),
            ("spring_damping", self.spring_damping),
            ("ground.stiffness", self.ground.stiffness),
            ("ground.damping_ratio", self.ground.damping_ratio),
            ("ground.friction", self.ground.friction),
            ("min_tetra_volume", self.min_tetra_volume),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(Error::invalid_param(name, value, "must be finite and non-negative"));
            }
        }
        if !self.gravity.iter().all(|g| g.is_finite()) || !self.ground.height.is_finite() {
            return Err(Error::invalid_param(
                "gravity",
                format!("{:?}", self.gravity),
                "must be finite",
            ));
        }
        match self.mass {
            MassModel::Density(v) | MassModel::Uniform(v) if v > 0.0 && v.is_finite() => Ok(()),
            MassModel::Density(v) | MassModel::Uniform(v) => {
                Err(Error::invalid_param("mass", v, "must be positive"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = SimulationParams::default();
        assert_eq!(params.gravity(), Vector3::new(0.0, 0.0, -9.8));
        assert_eq!(params.mass, MassModel::Density(1000.0));
        assert_eq!(params.body, "Ball");
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let params = SimulationParams::default().with_spring_stiffness(-1.0);
        assert!(matches!(
            params.validate(),
            Err(Error::InvalidParameter { name: "spring_stiffness", .. })
        ));
        let params = SimulationParams::default().with_mass(MassModel::Uniform(0.0));
        assert!(params.validate().is_err());
    }
}
