//! Scene graph and hierarchical scene organization.
//!
//! A [`Scene`] holds a flat list of top-level [`SceneNode`] trees plus the global
//! lighting and background settings. Nodes carry a local [`Instance`]; world
//! transforms are composed on the fly while walking the tree (renderer, bounds,
//! picking), so there is no cached world state to keep in sync.

use cgmath::SquareMatrix;

use crate::data_structures::{
    bounds::{Aabb, Ray},
    instance::Instance,
    model::{Material, Mesh},
};

/// Handle to a top-level node of the [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

impl NodeHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A mesh together with the material used to draw it.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub mesh: Mesh,
    pub material: Material,
}

#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    pub name: String,
    pub local: Instance,
    pub primitives: Vec<Primitive>,
    pub children: Vec<SceneNode>,
}

/// One primitive with its composed world matrix, ready to be drawn.
#[derive(Clone, Debug)]
pub struct DrawItem<'a> {
    pub mesh: &'a Mesh,
    pub color: [f32; 4],
    pub world: cgmath::Matrix4<f32>,
}

impl SceneNode {
    pub fn container(name: impl Into<String>, children: Vec<SceneNode>) -> Self {
        Self {
            name: name.into(),
            children,
            ..Default::default()
        }
    }

    pub fn with_mesh(name: impl Into<String>, mesh: Mesh, material: Material) -> Self {
        Self {
            name: name.into(),
            primitives: vec![Primitive { mesh, material }],
            ..Default::default()
        }
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    pub fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    /// Applies `mutation` to the material of every primitive in this subtree.
    pub fn for_each_material_mut(&mut self, mutation: &mut dyn FnMut(&mut Material)) {
        self.primitives
            .iter_mut()
            .for_each(|primitive| mutation(&mut primitive.material));
        self.children
            .iter_mut()
            .for_each(|child| child.for_each_material_mut(mutation));
    }

    /// Bounds of the subtree, expressed in the space of `parent`.
    pub fn bounds(&self, parent: &cgmath::Matrix4<f32>) -> Aabb {
        let world = parent * self.local.to_matrix();
        let own = self
            .primitives
            .iter()
            .fold(Aabb::empty(), |acc, p| acc.union(&p.mesh.bounds().transformed(&world)));
        self.children
            .iter()
            .fold(own, |acc, child| acc.union(&child.bounds(&world)))
    }

    /// Bounds of the subtree including this node's own transform.
    pub fn local_bounds(&self) -> Aabb {
        self.bounds(&cgmath::Matrix4::identity())
    }

    /// Nearest distance at which `ray` enters the box of any primitive in the subtree.
    pub fn intersect_ray(&self, parent: &cgmath::Matrix4<f32>, ray: &Ray) -> Option<f32> {
        let world = parent * self.local.to_matrix();
        let own = self
            .primitives
            .iter()
            .filter_map(|p| p.mesh.bounds().transformed(&world).intersect_ray(ray));
        let nested = self
            .children
            .iter()
            .filter_map(|child| child.intersect_ray(&world, ray));
        own.chain(nested).min_by(f32::total_cmp)
    }

    pub fn collect_draws<'a>(&'a self, parent: &cgmath::Matrix4<f32>, out: &mut Vec<DrawItem<'a>>) {
        let world = parent * self.local.to_matrix();
        out.extend(self.primitives.iter().map(|p| DrawItem {
            mesh: &p.mesh,
            color: p.material.base_color,
            world,
        }));
        for child in &self.children {
            child.collect_draws(&world, out);
        }
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
            + self
                .children
                .iter()
                .map(SceneNode::primitive_count)
                .sum::<usize>()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            position: [-1.0, 2.0, 4.0],
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

/// The shared scene: top-level nodes are only ever appended.
#[derive(Clone, Debug)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    pub background: [f32; 3],
    pub light: DirectionalLight,
}

impl Scene {
    pub fn new(background: [f32; 3]) -> Self {
        Self {
            nodes: Vec::new(),
            background,
            light: DirectionalLight::default(),
        }
    }

    pub fn insert(&mut self, node: SceneNode) -> NodeHandle {
        self.nodes.push(node);
        NodeHandle(self.nodes.len() - 1)
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.nodes.get(handle.0)
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(handle.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        let mut out = Vec::new();
        let identity = cgmath::Matrix4::identity();
        for node in &self.nodes {
            node.collect_draws(&identity, &mut out);
        }
        out
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new([1.0, 1.0, 1.0])
    }
}
