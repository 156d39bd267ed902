//! model-gallery
//!
//! A small 3D model gallery. Model records are read from a hosted table, their glTF
//! assets are loaded concurrently and laid out on a square grid, and the scene can be
//! orbited, edited with a transform gizmo, screenshotted, copied to the clipboard and
//! shared.
//!
//! High-level modules
//! - `records`: record model and the remote/static record sources
//! - `resources`: glTF and built-in asset loading into scene nodes
//! - `layout`: grid planning and size normalisation
//! - `assembly`: turns records into placed models
//! - `context`: the shared scene, model registry and camera
//! - `camera`: orbit camera, projection and picking rays
//! - `interaction`: selection, gizmo and keyboard commands
//! - `animation`: the cancellable render loop
//! - `export` / `share`: screenshot, clipboard and share actions
//! - `render` / `gpu` / `pipelines`: the renderer seam and its wgpu implementation
//! - `app`: the winit application shell
//! - `config` / `error`: configuration and the error taxonomy
//!

pub mod animation;
pub mod app;
pub mod assembly;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod export;
pub mod gpu;
pub mod interaction;
pub mod layout;
pub mod pipelines;
pub mod records;
pub mod render;
pub mod resources;
pub mod share;

// Re-exports commonly used types for convenience in downstream code.
pub use context::{Context, ModelId, PlacedModel};
pub use records::AssetRecord;
pub use render::{Frame, Renderer};
