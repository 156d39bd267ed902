//! The renderer seam.
//!
//! Components that need a frame drawn or captured (render loop, export actions) only
//! talk to [`Renderer`]. [`crate::gpu::GpuRenderer`] is the wgpu implementation; tests
//! use a recording double.

use crate::{camera::Camera, data_structures::scene_graph::Scene};

/// Captured frame in RGBA8.
pub type Frame = image::RgbaImage;

pub trait Renderer {
    /// Draws `scene` as seen by `camera` to the presentation target.
    fn render(&mut self, scene: &Scene, camera: &Camera) -> anyhow::Result<()>;

    /// Draws `scene` once more into an offscreen target and reads it back.
    fn capture(&mut self, scene: &Scene, camera: &Camera) -> anyhow::Result<Frame>;

    fn resize(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);
}
