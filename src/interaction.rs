//! Pointer and keyboard interaction: orbit camera and the transform gizmo.
//!
//! A click casts a ray from the cursor into the scene and attaches the gizmo to the
//! registered model that owns the nearest hit. Pressing on the attached model starts a
//! gizmo drag; pressing anywhere else starts an orbit drag. The two never run at the
//! same time: while the gizmo is dragged the camera ignores pointer motion.

use cgmath::{Quaternion, Rad, Rotation3, Vector3};
use winit::keyboard::{Key, NamedKey};

use crate::context::{Context, ModelId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GizmoMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

/// User-level commands the host maps keys (or buttons) to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    ToggleAnimation,
    Deselect,
    SetMode(GizmoMode),
    SaveScreenshot,
    CopyToClipboard,
    Share,
}

impl Command {
    /// Keyboard bindings: Space, Escape, W/E/R for the gizmo modes, P/C/K for the actions.
    pub fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::Named(NamedKey::Space) => Some(Self::ToggleAnimation),
            Key::Named(NamedKey::Escape) => Some(Self::Deselect),
            Key::Character(c) => match c.to_lowercase().as_str() {
                "w" => Some(Self::SetMode(GizmoMode::Translate)),
                "e" => Some(Self::SetMode(GizmoMode::Rotate)),
                "r" => Some(Self::SetMode(GizmoMode::Scale)),
                "p" => Some(Self::SaveScreenshot),
                "c" => Some(Self::CopyToClipboard),
                "k" => Some(Self::Share),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    None,
    Orbit,
    Gizmo,
}

#[derive(Clone, Debug)]
pub struct InteractionController {
    attached: Option<ModelId>,
    mode: GizmoMode,
    drag: Drag,
    /// World units per pixel when translating.
    pub translate_speed: f32,
    /// Radians per pixel when rotating.
    pub rotate_speed: f32,
    /// Relative scale change per pixel.
    pub scale_speed: f32,
    pub min_scale: f32,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self {
            attached: None,
            mode: GizmoMode::Translate,
            drag: Drag::None,
            translate_speed: 0.01,
            rotate_speed: 0.01,
            scale_speed: 0.005,
            min_scale: 0.01,
        }
    }
}

impl InteractionController {
    pub fn attached(&self) -> Option<ModelId> {
        self.attached
    }

    pub fn mode(&self) -> GizmoMode {
        self.mode
    }

    pub fn is_dragging_gizmo(&self) -> bool {
        self.drag == Drag::Gizmo
    }

    /// Orbit input is accepted unless the gizmo is being dragged.
    pub fn orbit_enabled(&self) -> bool {
        self.drag != Drag::Gizmo
    }

    /// Nearest registered model under the cursor.
    pub fn pick(&self, ctx: &Context, x: f64, y: f64, viewport: (u32, u32)) -> Option<ModelId> {
        let ray = ctx
            .camera
            .cast_ray_from_mouse(x, y, viewport.0, viewport.1)?;
        let identity = <cgmath::Matrix4<f32> as cgmath::SquareMatrix>::identity();
        ctx.registry
            .iter()
            .filter_map(|(id, model)| {
                let node = ctx.scene.node(model.node)?;
                node.intersect_ray(&identity, &ray).map(|t| (id, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Attaches the gizmo to the model under the cursor. Misses leave the attachment as is.
    pub fn click(&mut self, ctx: &Context, x: f64, y: f64, viewport: (u32, u32)) -> Option<ModelId> {
        let hit = self.pick(ctx, x, y, viewport)?;
        if self.attached != Some(hit) {
            log::info!(
                "Selected {}",
                ctx.registry.get(hit).map_or("?", |m| m.name.as_str())
            );
        }
        self.attached = Some(hit);
        Some(hit)
    }

    pub fn detach(&mut self) {
        if self.attached.take().is_some() {
            log::info!("Selection cleared");
        }
        if self.drag == Drag::Gizmo {
            self.drag = Drag::None;
        }
    }

    /// Switches the gizmo mode. No-op (returns `false`) when nothing is attached.
    pub fn set_mode(&mut self, mode: GizmoMode) -> bool {
        if self.attached.is_none() {
            return false;
        }
        self.mode = mode;
        true
    }

    pub fn pointer_down(&mut self, ctx: &Context, x: f64, y: f64, viewport: (u32, u32)) {
        let on_attached = self
            .attached
            .is_some_and(|attached| self.pick(ctx, x, y, viewport) == Some(attached));
        self.drag = if on_attached { Drag::Gizmo } else { Drag::Orbit };
    }

    /// Feeds pointer motion in pixels to whichever interaction owns the drag.
    /// Returns whether the camera or a model changed.
    pub fn pointer_moved(&mut self, ctx: &mut Context, dx: f64, dy: f64) -> bool {
        match (self.drag, self.attached) {
            (Drag::None, _) | (Drag::Gizmo, None) => false,
            (Drag::Orbit, _) => {
                ctx.camera.orbit.rotate(dx, dy);
                true
            }
            (Drag::Gizmo, Some(id)) => {
                self.transform(ctx, id, dx as f32, dy as f32);
                true
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = Drag::None;
    }

    pub fn wheel(&mut self, ctx: &mut Context, amount: f32) -> bool {
        if !self.orbit_enabled() {
            return false;
        }
        ctx.camera.orbit.zoom(amount);
        true
    }

    fn transform(&self, ctx: &mut Context, id: ModelId, dx: f32, dy: f32) {
        let yaw = ctx.camera.orbit.yaw;
        let Some(model) = ctx.registry.get_mut(id) else {
            return;
        };
        match self.mode {
            GizmoMode::Translate => {
                // screen axes projected onto the ground plane as seen by the camera
                let (sin, cos) = yaw.0.sin_cos();
                let right = Vector3::new(cos, 0.0, -sin);
                let forward = Vector3::new(-sin, 0.0, -cos);
                model.position += (right * dx - forward * dy) * self.translate_speed;
            }
            GizmoMode::Rotate => {
                let delta = Quaternion::from_angle_y(Rad(dx * self.rotate_speed));
                model.rotation = delta * model.rotation;
            }
            GizmoMode::Scale => {
                let factor = 1.0 - dy * self.scale_speed;
                model.scale = (model.scale * factor).max(self.min_scale);
            }
        }
        ctx.sync_model(id);
    }
}
