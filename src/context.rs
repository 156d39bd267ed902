//! The application context.
//!
//! [`Context`] owns everything the gallery components share: the scene graph, the
//! registry of placed models, the camera and the layout settings. It is built once
//! by the host and handed by reference to assembly, interaction, the render loop and
//! the export actions, so no component reaches for global state.

use cgmath::{Deg, Euler, Quaternion, Rad, Vector3};

use crate::{
    camera::{Camera, OrbitCamera, Projection},
    data_structures::{
        instance::Instance,
        scene_graph::{NodeHandle, Scene},
    },
    layout::{GridSlot, LayoutSettings},
};

/// Index of a model in the [`Registry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(usize);

impl ModelId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A loaded model that has been placed into the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedModel {
    pub record_id: String,
    pub name: String,
    pub node: NodeHandle,
    pub slot: GridSlot,
    /// Ground point under the model.
    pub position: Vector3<f32>,
    pub scale: f32,
    /// Height of the model centre above `position` at scale 1; spin and gizmo rotation pivot there.
    pub pivot_height: f32,
    /// Orientation set by the user through the gizmo; the spin animation is applied on top.
    pub rotation: Quaternion<f32>,
}

/// Flat, append-only list of the models in the scene.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    models: Vec<PlacedModel>,
}

impl Registry {
    pub fn push(&mut self, model: PlacedModel) -> ModelId {
        self.models.push(model);
        ModelId(self.models.len() - 1)
    }

    pub fn get(&self, id: ModelId) -> Option<&PlacedModel> {
        self.models.get(id.0)
    }

    pub fn get_mut(&mut self, id: ModelId) -> Option<&mut PlacedModel> {
        self.models.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelId, &PlacedModel)> {
        self.models.iter().enumerate().map(|(i, m)| (ModelId(i), m))
    }

    pub fn find_by_node(&self, node: NodeHandle) -> Option<ModelId> {
        self.models.iter().position(|m| m.node == node).map(ModelId)
    }

    pub fn find_by_record(&self, record_id: &str) -> Vec<ModelId> {
        self.iter()
            .filter(|(_, m)| m.record_id == record_id)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Context {
    pub scene: Scene,
    pub registry: Registry,
    pub camera: Camera,
    pub layout: LayoutSettings,
    /// Current spin angle of the rotation animation.
    spin: Rad<f32>,
}

impl Context {
    pub fn new(width: u32, height: u32, background: [f32; 3], layout: LayoutSettings) -> Self {
        let projection = Projection::new(width, height, Deg(45.0), 0.1, 500.0);
        Self {
            scene: Scene::new(background),
            registry: Registry::default(),
            camera: Camera::new(OrbitCamera::default(), projection),
            layout,
            spin: Rad(0.0),
        }
    }

    /// Frames a square grid of `count` models so that all of them are visible.
    pub fn frame_grid(&mut self, count: usize) {
        let size = crate::layout::grid_size(count).max(1) as f32;
        let span = size * self.layout.spacing.max(self.layout.target_size);
        self.camera.orbit.distance = (span * 1.5).max(2.0);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.projection.resize(width, height);
    }

    pub fn spin(&self) -> Rad<f32> {
        self.spin
    }

    /// Sets the spin angle and re-derives every model's node transform.
    pub fn set_spin(&mut self, angle: Rad<f32>) {
        self.spin = angle;
        let ids: Vec<ModelId> = self.registry.iter().map(|(id, _)| id).collect();
        for id in ids {
            self.sync_model(id);
        }
    }

    /// Writes the registry entry of `id` into its scene node.
    pub fn sync_model(&mut self, id: ModelId) {
        let Some(model) = self.registry.get(id) else {
            return;
        };
        let spin = Quaternion::from(Euler::new(self.spin, self.spin, Rad(0.0)));
        let pivot = model.position + Vector3::new(0.0, model.pivot_height * model.scale, 0.0);
        let instance = Instance::uniform(pivot, model.rotation * spin, model.scale);
        if let Some(node) = self.scene.node_mut(model.node) {
            node.set_local_transform(instance);
        }
    }
}
