use approx::assert_relative_eq;
use cgmath::{Deg, Rad};
use model_gallery::{app::setup_cube_scene, resources::primitive::CUBE_COLOR};

use crate::common::test_utils::test_context;

mod common;

#[test]
fn should_frame_cube_with_wide_lens() {
    let mut ctx = test_context();

    let id = setup_cube_scene(&mut ctx).unwrap();

    let projection = &ctx.camera.projection;
    assert_relative_eq!(projection.fovy.0, Rad::from(Deg(75.0f32)).0);
    assert_relative_eq!(projection.znear, 0.1);
    assert_relative_eq!(projection.zfar, 100.0);
    assert_relative_eq!(ctx.camera.orbit.distance, 2.0);

    let model = ctx.registry.get(id).unwrap();
    assert_eq!(model.record_id, "cube");
    let bounds = ctx.scene.node(model.node).unwrap().local_bounds();
    assert_relative_eq!(bounds.center().x, 0.0, epsilon = 1e-5);
    assert_relative_eq!(bounds.center().y, 0.0, epsilon = 1e-5);
    assert_relative_eq!(bounds.center().z, 0.0, epsilon = 1e-5);

    let mut draws = Vec::new();
    ctx.scene
        .node(model.node)
        .unwrap()
        .collect_draws(&cgmath::SquareMatrix::identity(), &mut draws);
    let blue = (CUBE_COLOR & 0xff) as f32 / 255.0;
    assert_relative_eq!(draws[0].color[2], blue, epsilon = 1e-5);
}
