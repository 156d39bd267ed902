//! CPU-side meshes and materials.
//!
//! Meshes keep their vertex and index data on the CPU so that the same data serves
//! bounding-box computation, ray picking, and (lazily) GPU upload. Each mesh gets a
//! process-unique [`MeshId`] which the renderer uses as its buffer cache key.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::data_structures::bounds::Aabb;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

impl MeshId {
    fn next() -> Self {
        Self(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Triangle mesh. Geometry is shared behind an `Arc` so cloning a node does not copy it.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    id: MeshId,
    vertices: Arc<Vec<ModelVertex>>,
    indices: Arc<Vec<u32>>,
    bounds: Aabb,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_points(vertices.iter().map(|v| v.position.into()));
        Self {
            name: name.into(),
            id: MeshId::next(),
            vertices: Arc::new(vertices),
            indices: Arc::new(indices),
            bounds,
        }
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Bounds in the mesh's own space.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }
}

/// Flat PBR-ish material: only the base colour is used by the basic pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
}

impl Material {
    pub fn new(name: impl Into<String>, base_color: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            base_color,
        }
    }

    /// Builds an opaque material from a `0xRRGGBB` literal.
    pub fn from_hex(name: impl Into<String>, rgb: u32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        Self::new(name, [channel(16), channel(8), channel(0), 1.0])
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", [0.8, 0.8, 0.8, 1.0])
    }
}
