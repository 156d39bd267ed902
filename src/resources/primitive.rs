//! Built-in geometry that does not need an asset file.

use crate::data_structures::{
    model::{Material, Mesh, ModelVertex},
    scene_graph::SceneNode,
};

/// Asset path prefix for built-in primitives, e.g. `builtin:cube`.
pub const BUILTIN_PREFIX: &str = "builtin:";

/// Colour of the default cube.
pub const CUBE_COLOR: u32 = 0x044a88;

/// Axis-aligned box centred on the origin, with per-face normals.
pub fn box_mesh(width: f32, height: f32, depth: f32) -> Mesh {
    let (hx, hy, hz) = (width / 2.0, height / 2.0, depth / 2.0);
    // (normal, four corners counter-clockwise seen from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([1.0, 0.0, 0.0], [[hx, -hy, hz], [hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz]]),
        ([-1.0, 0.0, 0.0], [[-hx, -hy, -hz], [-hx, -hy, hz], [-hx, hy, hz], [-hx, hy, -hz]]),
        ([0.0, 1.0, 0.0], [[-hx, hy, hz], [hx, hy, hz], [hx, hy, -hz], [-hx, hy, -hz]]),
        ([0.0, -1.0, 0.0], [[-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz], [-hx, -hy, hz]]),
        ([0.0, 0.0, 1.0], [[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]]),
        ([0.0, 0.0, -1.0], [[hx, -hy, -hz], [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]]),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = vertices.len() as u32;
        vertices.extend(corners.iter().map(|&position| ModelVertex { position, normal }));
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Mesh::new("box", vertices, indices)
}

/// Resolves a `builtin:<name>` path. `None` for unknown names.
pub fn builtin(name: &str) -> Option<SceneNode> {
    match name {
        "cube" => Some(SceneNode::with_mesh(
            "cube",
            box_mesh(1.0, 1.0, 1.0),
            Material::from_hex("cube", CUBE_COLOR),
        )),
        _ => None,
    }
}
