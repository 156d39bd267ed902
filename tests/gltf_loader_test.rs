use std::path::PathBuf;

use approx::assert_relative_eq;
use base64::Engine as _;
use model_gallery::resources::{AssetBase, AssetLoader, GltfLoader};

fn assets_loader() -> GltfLoader {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets");
    GltfLoader::new(AssetBase::Directory(dir))
}

/// A single triangle in the XY plane without normals, buffer embedded as a data URI.
fn triangle_without_normals() -> String {
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let bytes: Vec<u8> = positions
        .iter()
        .flatten()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
    format!(
        r#"{{
        "asset": {{"version": "2.0"}},
        "scene": 0,
        "scenes": [{{"nodes": [0]}}],
        "nodes": [{{"name": "tri", "mesh": 0, "translation": [0.0, 2.0, 0.0]}}],
        "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}}}]}}],
        "buffers": [{{"byteLength": {len}, "uri": "data:application/octet-stream;base64,{data}"}}],
        "bufferViews": [{{"buffer": 0, "byteLength": {len}}}],
        "accessors": [{{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                        "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}}]
    }}"#,
        len = bytes.len()
    )
}

#[tokio::test]
async fn should_load_bundled_cube() {
    let node = assets_loader().load("cube.gltf").await.unwrap();

    assert_eq!(node.primitive_count(), 1);
    let size = node.local_bounds().size();
    assert_relative_eq!(size.x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(size.y, 1.0, epsilon = 1e-5);
    assert_relative_eq!(size.z, 1.0, epsilon = 1e-5);
}

#[tokio::test]
async fn should_load_bundled_tall_box_with_material() {
    let node = assets_loader().load("tall_box.gltf").await.unwrap();

    let size = node.local_bounds().size();
    assert_relative_eq!(size.y, 2.0, epsilon = 1e-5);
    assert_relative_eq!(size.x, 0.5, epsilon = 1e-5);
    let mut draws = Vec::new();
    node.collect_draws(&cgmath::SquareMatrix::identity(), &mut draws);
    assert_relative_eq!(draws[0].color[0], 0.8, epsilon = 1e-5);
}

#[tokio::test]
async fn should_compute_normals_and_apply_node_transform() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tri.gltf"), triangle_without_normals()).unwrap();
    let loader = GltfLoader::new(AssetBase::Directory(dir.path().to_path_buf()));

    let node = loader.load("tri.gltf").await.unwrap();

    let mesh = &node.primitives[0].mesh;
    assert_eq!(mesh.indices(), &[0, 1, 2]);
    for vertex in mesh.vertices() {
        assert_relative_eq!(vertex.normal[2], 1.0, epsilon = 1e-5);
    }
    let bounds = node.local_bounds();
    assert_relative_eq!(bounds.min.y, 2.0, epsilon = 1e-5);
}

#[tokio::test]
async fn should_serve_builtin_cube_without_io() {
    let loader = GltfLoader::new(AssetBase::Directory(PathBuf::from("/nonexistent")));
    let node = loader.load("builtin:cube").await.unwrap();
    assert_eq!(node.primitive_count(), 1);
}

#[tokio::test]
async fn should_fail_for_unknown_builtin() {
    let err = assets_loader().load("builtin:teapot").await.unwrap_err();
    assert!(format!("{err:#}").contains("teapot"));
}

#[tokio::test]
async fn should_fail_for_missing_file() {
    let err = assets_loader().load("does_not_exist.gltf").await.unwrap_err();
    assert!(format!("{err:#}").contains("does_not_exist.gltf"));
}

#[tokio::test]
async fn should_fail_for_invalid_gltf() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.gltf"), "{ not gltf").unwrap();
    let loader = GltfLoader::new(AssetBase::Directory(dir.path().to_path_buf()));

    assert!(loader.load("broken.gltf").await.is_err());
}

#[test]
fn should_parse_asset_base() {
    assert_eq!(
        AssetBase::parse("assets").unwrap(),
        AssetBase::Directory(PathBuf::from("assets"))
    );
    match AssetBase::parse("https://cdn.example.com/models").unwrap() {
        AssetBase::Url(url) => assert_eq!(url.as_str(), "https://cdn.example.com/models/"),
        other => panic!("expected a URL base, got {other:?}"),
    }
}
