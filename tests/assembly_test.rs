use std::time::Duration;

use approx::assert_relative_eq;
use cgmath::Rad;
use model_gallery::{
    assembly,
    layout::{self, GridSlot},
    records::{AssetRecord, StyleVariant},
};

use crate::common::test_utils::{MapLoader, box_node, point_node, test_context};

mod common;

#[tokio::test]
async fn should_isolate_failed_loads() {
    let mut ctx = test_context();
    let loader = MapLoader::default()
        .with("a.gltf", box_node(1.0, 1.0, 1.0))
        .with("c.gltf", box_node(1.0, 2.0, 1.0));
    let records = vec![
        AssetRecord::new("1", "A", "a.gltf"),
        AssetRecord::new("2", "Missing", "missing.gltf"),
        AssetRecord::new("3", "C", "c.gltf"),
    ];

    let results = assembly::assemble_all(&mut ctx, &loader, records).await;

    assert_eq!(results.len(), 3);
    let err = results[1].as_ref().unwrap_err();
    assert_eq!(err.record_id, "2");
    assert_eq!(err.path, "missing.gltf");
    assert!(err.reason.contains("missing.gltf"));
    assert_eq!(ctx.registry.len(), 2);
    assert_eq!(ctx.scene.len(), 2);

    // the neighbours keep the slots of a full batch
    let first = results[0].as_ref().unwrap();
    let third = results[2].as_ref().unwrap();
    assert_eq!(first.slot, GridSlot { row: 0, col: 0 });
    assert_eq!(third.slot, GridSlot { row: 1, col: 0 });
    assert_eq!(first.position, ctx.layout.position(first.slot, 2));
    assert_eq!(third.position, ctx.layout.position(third.slot, 2));
}

#[tokio::test]
async fn should_assign_slots_by_input_order_not_completion_order() {
    let mut ctx = test_context();
    // the first record finishes last
    let loader = MapLoader::default()
        .with("slow.gltf", box_node(1.0, 1.0, 1.0))
        .with("fast.gltf", box_node(1.0, 1.0, 1.0))
        .delayed("slow.gltf", Duration::from_millis(50));
    let records = vec![
        AssetRecord::new("slow", "Slow", "slow.gltf"),
        AssetRecord::new("fast", "Fast", "fast.gltf"),
        AssetRecord::new("fast-2", "Fast again", "fast.gltf"),
    ];

    let results = assembly::assemble_all(&mut ctx, &loader, records).await;
    let placed: Vec<_> = results.into_iter().map(Result::unwrap).collect();

    assert_eq!(placed[0].record_id, "slow");
    assert_eq!(placed[0].slot, GridSlot { row: 0, col: 0 });
    assert_eq!(placed[1].slot, GridSlot { row: 0, col: 1 });
    assert_eq!(placed[2].slot, GridSlot { row: 1, col: 0 });
    // registry order follows completion
    assert_eq!(ctx.registry.find_by_record("slow").len(), 1);
    let (last_id, last) = ctx.registry.iter().last().unwrap();
    assert_eq!(last_id.index(), 2);
    assert_eq!(last.record_id, "slow");
}

#[tokio::test]
async fn should_place_model_on_its_slot_resting_on_ground() {
    let mut ctx = test_context();
    let loader = MapLoader::default().with("tall.gltf", box_node(0.5, 4.0, 0.5));
    let record = AssetRecord::new("t", "Tall", "tall.gltf");
    let slot = GridSlot { row: 1, col: 1 };

    let placed = assembly::assemble(&mut ctx, &loader, record, slot, 2)
        .await
        .unwrap();

    let expected = ctx.layout.position(slot, 2);
    assert_relative_eq!(placed.scale, 0.25);
    let bounds = ctx.scene.node(placed.node).unwrap().local_bounds();
    assert_relative_eq!(bounds.min.y, 0.0, epsilon = 1e-5);
    assert_relative_eq!(bounds.max.y, 1.0, epsilon = 1e-5);
    assert_relative_eq!(bounds.center().x, expected.x, epsilon = 1e-5);
    assert_relative_eq!(bounds.center().z, expected.z, epsilon = 1e-5);
}

#[tokio::test]
async fn should_spin_models_about_their_centre() {
    let mut ctx = test_context();
    let loader = MapLoader::default().with("tall.gltf", box_node(0.5, 4.0, 0.5));
    let record = AssetRecord::new("t", "Tall", "tall.gltf");
    let slot = GridSlot { row: 0, col: 1 };

    let placed = assembly::assemble(&mut ctx, &loader, record, slot, 2)
        .await
        .unwrap();

    let expected = ctx.layout.position(slot, 2);
    assert_relative_eq!(placed.pivot_height, 2.0, epsilon = 1e-5);
    for angle in [0.0, 0.7, 1.9, 3.1] {
        ctx.set_spin(Rad(angle));
        let centre = ctx.scene.node(placed.node).unwrap().local_bounds().center();
        assert_relative_eq!(centre.x, expected.x, epsilon = 1e-4);
        assert_relative_eq!(centre.y, 0.5, epsilon = 1e-4);
        assert_relative_eq!(centre.z, expected.z, epsilon = 1e-4);
    }
}

#[tokio::test]
async fn should_keep_native_size_for_degenerate_model() {
    let mut ctx = test_context();
    let loader = MapLoader::default().with("point.gltf", point_node());
    let record = AssetRecord::new("p", "Point", "point.gltf");

    let placed = assembly::assemble(&mut ctx, &loader, record, GridSlot { row: 0, col: 0 }, 1)
        .await
        .unwrap();

    assert_relative_eq!(placed.scale, 1.0);
    assert_eq!(ctx.registry.len(), 1);
}

#[tokio::test]
async fn should_recolor_styled_records() {
    let mut ctx = test_context();
    let loader = MapLoader::default().with("box.gltf", box_node(1.0, 1.0, 1.0));
    let records = vec![
        AssetRecord::new("1", "Plain", "box.gltf"),
        AssetRecord::new("2", "Pink", "box.gltf").with_style(StyleVariant::Recolor {
            color: [0.96, 0.55, 0.71],
        }),
    ];

    let results = assembly::assemble_all(&mut ctx, &loader, records).await;
    let colors: Vec<[f32; 4]> = results
        .iter()
        .map(|placed| {
            let node = ctx.scene.node(placed.as_ref().unwrap().node).unwrap();
            let mut draws = Vec::new();
            node.collect_draws(&cgmath::SquareMatrix::identity(), &mut draws);
            draws[0].color
        })
        .collect();

    assert_eq!(colors[0], [0.5, 0.5, 0.5, 1.0]);
    assert_eq!(colors[1], [0.96, 0.55, 0.71, 1.0]);
}

#[tokio::test]
async fn should_add_duplicate_when_record_is_assembled_twice() {
    let mut ctx = test_context();
    let loader = MapLoader::default().with("box.gltf", box_node(1.0, 1.0, 1.0));
    let record = AssetRecord::new("1", "Box", "box.gltf");

    for slot in layout::plan(2) {
        assembly::assemble(&mut ctx, &loader, record.clone(), slot, 2)
            .await
            .unwrap();
    }

    assert_eq!(ctx.registry.find_by_record("1").len(), 2);
    assert_eq!(ctx.scene.len(), 2);
}

#[tokio::test]
async fn should_return_empty_result_for_no_records() {
    let mut ctx = test_context();
    let results = assembly::assemble_all(&mut ctx, &MapLoader::default(), Vec::new()).await;
    assert!(results.is_empty());
    assert!(ctx.registry.is_empty());
}

#[tokio::test]
async fn should_load_without_touching_context() {
    let loader = MapLoader::default().with("box.gltf", box_node(1.0, 1.0, 1.0));
    let record = AssetRecord::new("1", "Box", "box.gltf");
    let loaded = assembly::load_asset(&loader, record, GridSlot { row: 0, col: 0 }, 1)
        .await
        .unwrap();
    assert_eq!(loaded.node.primitive_count(), 1);

    let mut ctx = test_context();
    let (id, placed) = assembly::place(&mut ctx, loaded);
    assert_eq!(ctx.registry.get(id), Some(&placed));
    assert_eq!(ctx.registry.find_by_node(placed.node), Some(id));
}
