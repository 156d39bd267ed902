//! Loading of 3D assets into scene nodes.
//!
//! [`GltfLoader`] resolves asset paths against a local directory or an HTTP base URL,
//! parses glTF 2.0 (`.gltf` with external or embedded `data:` buffers, or binary
//! `.glb`) and turns the default scene into a [`SceneNode`] tree. Paths starting with
//! `builtin:` are served from [`primitive`] without any IO.

use std::path::PathBuf;

use anyhow::{Context as _, anyhow, bail};
use base64::Engine as _;

use crate::data_structures::{
    instance::Instance,
    model::{Material, Mesh, ModelVertex},
    scene_graph::SceneNode,
};

pub mod primitive;

/// Something that turns an asset path into a renderable node.
pub trait AssetLoader {
    fn load(&self, path: &str) -> impl Future<Output = anyhow::Result<SceneNode>> + Send;
}

/// Where relative asset paths are looked up.
#[derive(Clone, Debug, PartialEq)]
pub enum AssetBase {
    Directory(PathBuf),
    Url(reqwest::Url),
}

impl AssetBase {
    /// `http://` and `https://` bases become URLs, everything else a directory.
    pub fn parse(base: &str) -> anyhow::Result<Self> {
        if base.starts_with("http://") || base.starts_with("https://") {
            let with_slash = if base.ends_with('/') {
                base.to_string()
            } else {
                format!("{base}/")
            };
            let url = reqwest::Url::parse(&with_slash)
                .with_context(|| format!("invalid asset base URL {base}"))?;
            Ok(Self::Url(url))
        } else {
            Ok(Self::Directory(PathBuf::from(base)))
        }
    }
}

#[derive(Clone, Debug)]
pub struct GltfLoader {
    base: AssetBase,
    client: reqwest::Client,
}

impl GltfLoader {
    pub fn new(base: AssetBase) -> Self {
        Self {
            base,
            client: reqwest::Client::new(),
        }
    }

    pub fn base(&self) -> &AssetBase {
        &self.base
    }

    pub async fn load_binary(&self, file_name: &str) -> anyhow::Result<Vec<u8>> {
        if file_name.starts_with("http://") || file_name.starts_with("https://") {
            return self.fetch(reqwest::Url::parse(file_name)?).await;
        }
        match &self.base {
            AssetBase::Url(base) => {
                let url = base
                    .join(file_name)
                    .with_context(|| format!("cannot join {file_name} onto {base}"))?;
                self.fetch(url).await
            }
            AssetBase::Directory(dir) => {
                let path = dir.join(file_name);
                tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("cannot read {}", path.display()))
            }
        }
    }

    async fn fetch(&self, url: reqwest::Url) -> anyhow::Result<Vec<u8>> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("GET {url} answered with status {status}");
        }
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn load_model_gltf(&self, file_name: &str) -> anyhow::Result<SceneNode> {
        let bytes = self.load_binary(file_name).await?;
        let gltf = gltf::Gltf::from_slice(&bytes)
            .with_context(|| format!("{file_name} is not a valid glTF asset"))?;

        // Load buffers
        let mut buffer_data = Vec::new();
        for buffer in gltf.buffers() {
            match buffer.source() {
                gltf::buffer::Source::Bin => {
                    let blob = gltf
                        .blob
                        .as_deref()
                        .ok_or_else(|| anyhow!("{file_name} references a missing binary chunk"))?;
                    buffer_data.push(blob.to_vec());
                }
                gltf::buffer::Source::Uri(uri) => {
                    let data = match decode_data_uri(uri) {
                        Some(decoded) => decoded?,
                        None => self.load_binary(&sibling_path(file_name, uri)).await?,
                    };
                    buffer_data.push(data);
                }
            }
        }

        let materials: Vec<Material> = gltf
            .materials()
            .map(|material| {
                let name = material.name().unwrap_or("material").to_string();
                Material::new(name, material.pbr_metallic_roughness().base_color_factor())
            })
            .collect();

        let scene = gltf
            .default_scene()
            .or_else(|| gltf.scenes().next())
            .ok_or_else(|| anyhow!("{file_name} contains no scene"))?;
        let mut models = Vec::new();
        for node in scene.nodes() {
            models.push(to_scene_node(node, &buffer_data, &materials)?);
        }

        let root_node = if models.len() == 1 {
            models.remove(0)
        } else {
            SceneNode::container(file_name, models)
        };
        Ok(root_node)
    }
}

impl AssetLoader for GltfLoader {
    async fn load(&self, path: &str) -> anyhow::Result<SceneNode> {
        if let Some(name) = path.strip_prefix(primitive::BUILTIN_PREFIX) {
            return primitive::builtin(name).ok_or_else(|| anyhow!("unknown built-in asset {name}"));
        }
        self.load_model_gltf(path).await
    }
}

/// Decodes `data:...;base64,...` URIs. `None` if `uri` is not a data URI.
fn decode_data_uri(uri: &str) -> Option<anyhow::Result<Vec<u8>>> {
    let rest = uri.strip_prefix("data:")?;
    let decoded = match rest.split_once(";base64,") {
        Some((_, payload)) => base64::engine::general_purpose::STANDARD
            .decode(payload)
            .context("invalid base64 payload in data URI"),
        None => Err(anyhow!("only base64 data URIs are supported")),
    };
    Some(decoded)
}

/// `uri` relative to the directory of `file_name`.
fn sibling_path(file_name: &str, uri: &str) -> String {
    match file_name.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{uri}"),
        None => uri.to_string(),
    }
}

fn to_scene_node(
    node: gltf::scene::Node,
    buf: &[Vec<u8>],
    mats: &[Material],
) -> anyhow::Result<SceneNode> {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let mut scene_node = SceneNode::container(name, Vec::new());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of mesh {:?}: only triangle lists are supported",
                    primitive.index(),
                    mesh.name()
                );
                continue;
            }
            let reader = primitive.reader(|buffer| buf.get(buffer.index()).map(Vec::as_slice));

            let positions: Vec<[f32; 3]> = match reader.read_positions() {
                Some(positions) => positions.collect(),
                None => continue,
            };
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            if let Some(bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
                bail!(
                    "mesh {:?} indexes vertex {bad} but only has {}",
                    mesh.name(),
                    positions.len()
                );
            }
            let normals: Vec<[f32; 3]> = match reader.read_normals() {
                Some(normals) => normals.collect(),
                None => compute_normals(&positions, &indices),
            };
            let vertices = positions
                .iter()
                .zip(normals.iter().chain(std::iter::repeat(&[0.0, 1.0, 0.0])))
                .map(|(&position, &normal)| ModelVertex { position, normal })
                .collect();

            let material = primitive
                .material()
                .index()
                .and_then(|idx| mats.get(idx))
                .cloned()
                .unwrap_or_default();
            let mesh_name = mesh.name().unwrap_or("unknown_mesh").to_string();
            scene_node.primitives.push(crate::data_structures::scene_graph::Primitive {
                mesh: Mesh::new(mesh_name, vertices, indices),
                material,
            });
        }
    }

    let (translation, rotation, scale) = node.transform().decomposed();
    scene_node.set_local_transform(Instance {
        position: translation.into(),
        // glTF stores quaternions as [x, y, z, w]
        rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: scale.into(),
    });
    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buf, mats)?);
    }

    Ok(scene_node)
}

/// Smooth vertex normals from triangle faces, for meshes exported without normals.
fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    use cgmath::InnerSpace;

    let mut acc = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa: cgmath::Vector3<f32> = positions[a].into();
        let pb: cgmath::Vector3<f32> = positions[b].into();
        let pc: cgmath::Vector3<f32> = positions[c].into();
        let face = (pb - pa).cross(pc - pa);
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| {
            if n.magnitude2() > f32::EPSILON {
                n.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}
