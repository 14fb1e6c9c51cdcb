//! Named scene models.
//!
//! A [`Scene`] maps names such as `"Ball"` or `"Ground"` to [`Model`]s. The simulator looks its
//! bodies up by name on every tick, so removing a model while a simulation runs is detected
//! instead of leaving a stale reference.

use std::collections::BTreeMap;

use crate::mesh::HalfEdgeMesh;
use crate::sim::TetrahedralBody;

/// A renderable surface mesh, optionally backed by a tetrahedral body.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    mesh: HalfEdgeMesh,
    tetra: Option<TetrahedralBody>,
    dirty: bool,
}

impl Model {
    /// Wrap a surface mesh.
    pub fn new(name: impl Into<String>, mesh: HalfEdgeMesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            tetra: None,
            dirty: true,
        }
    }

    /// Attach a tetrahedral body whose boundary vertices are the mesh vertices.
    pub fn with_tetra(mut self, tetra: TetrahedralBody) -> Self {
        self.tetra = Some(tetra);
        self
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Surface mesh.
    pub fn mesh(&self) -> &HalfEdgeMesh {
        &self.mesh
    }

    /// Mutable surface mesh.
    pub fn mesh_mut(&mut self) -> &mut HalfEdgeMesh {
        &mut self.mesh
    }

    /// Tetrahedral body, if any.
    pub fn tetra(&self) -> Option<&TetrahedralBody> {
        self.tetra.as_ref()
    }

    /// Mutable tetrahedral body, if any.
    pub fn tetra_mut(&mut self) -> Option<&mut TetrahedralBody> {
        self.tetra.as_mut()
    }

    /// Mesh and body borrowed together.
    pub fn parts_mut(&mut self) -> (&mut HalfEdgeMesh, Option<&mut TetrahedralBody>) {
        (&mut self.mesh, self.tetra.as_mut())
    }

    /// Flag the model for redraw.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether a redraw is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the redraw flag, returning its previous value.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

/// Models by name.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    models: BTreeMap<String, Model>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a model under its own name, returning any model it replaced.
    pub fn insert(&mut self, model: Model) -> Option<Model> {
        self.models.insert(model.name.clone(), model)
    }

    /// Look a model up by name.
    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Look a model up by name for modification.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Model> {
        self.models.get_mut(name)
    }

    /// Remove a model.
    pub fn remove(&mut self, name: &str) -> Option<Model> {
        self.models.remove(name)
    }

    /// Whether a model with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Model names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.models.keys().map(String::as_str)
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the scene has no models.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
