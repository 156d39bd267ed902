//! Scene assembly: from records to placed models.
//!
//! Every record gets a grid slot up front (in input order), so where a model ends up
//! never depends on which asset finished loading first. Loading and placing are
//! separate steps: [`load_asset`] needs no access to the [`Context`] and can run on
//! any task, [`place`] is the synchronous insertion into scene and registry.

use cgmath::{One, Quaternion, Vector3};
use futures::{StreamExt, stream::FuturesUnordered};

use crate::{
    context::{Context, ModelId, PlacedModel},
    data_structures::{instance::Instance, scene_graph::SceneNode},
    error::AssetLoadError,
    layout::{self, GridSlot},
    records::{AssetRecord, StyleVariant},
    resources::AssetLoader,
};

/// A record whose asset finished loading, waiting to be placed.
#[derive(Clone, Debug)]
pub struct LoadedAsset {
    pub record: AssetRecord,
    pub slot: GridSlot,
    pub grid_size: usize,
    pub node: SceneNode,
}

/// Loads the asset of `record`. Failures are logged and returned, never retried.
pub async fn load_asset<L: AssetLoader>(
    loader: &L,
    record: AssetRecord,
    slot: GridSlot,
    grid_size: usize,
) -> Result<LoadedAsset, AssetLoadError> {
    match loader.load(&record.asset_path).await {
        Ok(node) => {
            log::debug!("Loaded {} for record {}", record.asset_path, record.id);
            Ok(LoadedAsset {
                record,
                slot,
                grid_size,
                node,
            })
        }
        Err(err) => {
            let err = AssetLoadError::new(&record.id, &record.asset_path, &err);
            log::error!("{err}");
            Err(err)
        }
    }
}

/// Applies the record's style to every material of the loaded node.
pub fn apply_style(node: &mut SceneNode, style: &StyleVariant) {
    match style {
        StyleVariant::Original => (),
        StyleVariant::Recolor { color: [r, g, b] } => {
            node.for_each_material_mut(&mut |material| {
                material.base_color = [*r, *g, *b, material.base_color[3]];
            });
        }
    }
}

/// Inserts a loaded asset into the scene and appends it to the registry.
///
/// The asset is wrapped in a container node carrying the slot position and the
/// normalising scale. The asset itself is centred on its bounding box and the container
/// is lifted by half its height, so the model rests on the ground plane and spins about
/// its centre.
pub fn place(ctx: &mut Context, loaded: LoadedAsset) -> (ModelId, PlacedModel) {
    let LoadedAsset {
        record,
        slot,
        grid_size,
        mut node,
    } = loaded;
    apply_style(&mut node, &record.style);

    let bounds = node.local_bounds();
    let scale = match ctx.layout.scale_for(&bounds) {
        Some(scale) => scale,
        None => {
            log::warn!(
                "Model {} ({}) has a degenerate bounding box, keeping its native size",
                record.id,
                record.asset_path
            );
            1.0
        }
    };
    let pivot_height = if bounds.is_empty() {
        0.0
    } else {
        let local = Instance {
            position: node.local.position - bounds.center(),
            ..node.local
        };
        node.set_local_transform(local);
        bounds.size().y / 2.0
    };

    let position = ctx.layout.position(slot, grid_size);
    let handle = ctx
        .scene
        .insert(SceneNode::container(record.display_name.clone(), vec![node]));

    let placed = PlacedModel {
        record_id: record.id.clone(),
        name: record.display_name.clone(),
        node: handle,
        slot,
        position,
        scale,
        pivot_height,
        rotation: Quaternion::one(),
    };
    let id = ctx.registry.push(placed.clone());
    ctx.sync_model(id);
    log::info!(
        "Placed {} at row {} col {} (scale {scale:.3})",
        record.display_name,
        slot.row,
        slot.col
    );
    (id, placed)
}

/// Inserts `node` as-is at the origin, bypassing the grid and the size normalisation.
pub fn place_at_origin(ctx: &mut Context, record: &AssetRecord, mut node: SceneNode) -> ModelId {
    apply_style(&mut node, &record.style);
    let handle = ctx.scene.insert(SceneNode::container(record.display_name.clone(), vec![node]));
    let id = ctx.registry.push(PlacedModel {
        record_id: record.id.clone(),
        name: record.display_name.clone(),
        node: handle,
        slot: GridSlot { row: 0, col: 0 },
        position: Vector3::new(0.0, 0.0, 0.0),
        scale: 1.0,
        pivot_height: 0.0,
        rotation: Quaternion::one(),
    });
    ctx.sync_model(id);
    id
}

/// Loads and places a single record. Re-assembling the same record adds a duplicate.
pub async fn assemble<L: AssetLoader>(
    ctx: &mut Context,
    loader: &L,
    record: AssetRecord,
    slot: GridSlot,
    grid_size: usize,
) -> Result<PlacedModel, AssetLoadError> {
    let loaded = load_asset(loader, record, slot, grid_size).await?;
    Ok(place(ctx, loaded).1)
}

/// Loads all records concurrently and places each as soon as it resolves.
///
/// The returned vector is in input order, one entry per record.
pub async fn assemble_all<L: AssetLoader>(
    ctx: &mut Context,
    loader: &L,
    records: Vec<AssetRecord>,
) -> Vec<Result<PlacedModel, AssetLoadError>> {
    let grid_size = layout::grid_size(records.len());
    let slots = layout::plan(records.len());
    let count = records.len();

    let mut pending: FuturesUnordered<_> = records
        .into_iter()
        .zip(slots)
        .enumerate()
        .map(|(index, (record, slot))| async move {
            (index, load_asset(loader, record, slot, grid_size).await)
        })
        .collect();

    let mut results: Vec<Option<Result<PlacedModel, AssetLoadError>>> = vec![None; count];
    while let Some((index, outcome)) = pending.next().await {
        results[index] = Some(outcome.map(|loaded| place(ctx, loaded).1));
    }
    // every pending load yields exactly once, so no slot stays empty
    results.into_iter().flatten().collect()
}
