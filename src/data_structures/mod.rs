//! Engine data structures: meshes, transforms, bounds and the scene graph.
//!
//! - `bounds` axis-aligned boxes and rays used for layout and picking
//! - `instance` holds per-node transformation data and its GPU packing
//! - `model` contains CPU-side meshes and flat materials
//! - `scene_graph` enables hierarchical scene organization
//! - `texture` wraps depth and capture render targets

pub mod bounds;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
