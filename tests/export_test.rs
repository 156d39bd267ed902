use cgmath::Vector3;
use chrono::{TimeZone, Utc};
use model_gallery::{
    assembly,
    error::{ClipboardError, ExportError, ShareError},
    export::screenshot_filename,
    records::AssetRecord,
};

use crate::common::test_utils::{RecordingRenderer, box_node, test_context, test_exporter};

mod common;

#[test]
fn should_format_screenshot_filename_from_utc_millis() {
    let instant = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap()
        + chrono::Duration::milliseconds(123);
    assert_eq!(
        screenshot_filename(instant),
        "screenshot-2024-05-01T12-30-45-123Z.png"
    );
}

#[test]
fn should_write_distinct_screenshots_for_consecutive_saves() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context();
    let mut renderer = RecordingRenderer::new();
    let mut exporter = test_exporter(dir.path());

    let first = exporter.save_screenshot(&ctx, &mut renderer).unwrap();
    let second = exporter.save_screenshot(&ctx, &mut renderer).unwrap();

    assert_ne!(first, second);
    assert!(first.exists() && second.exists());
    let name = second.file_name().unwrap().to_string_lossy();
    assert!(name.starts_with("screenshot-") && name.ends_with(".png"));
    let decoded = image::open(&first).unwrap();
    assert_eq!((decoded.width(), decoded.height()), renderer.size);
}

#[test]
fn should_force_one_render_before_capture() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context();
    let mut renderer = RecordingRenderer::new();
    let mut exporter = test_exporter(dir.path());

    exporter.save_screenshot(&ctx, &mut renderer).unwrap();

    assert_eq!(renderer.renders, 1);
    assert_eq!(renderer.captures, 1);
    assert_eq!(
        exporter.notifier.messages.borrow().len(),
        1,
        "success is alerted once"
    );
}

#[test]
fn should_not_mutate_scene_when_exporting() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = test_context();
    let record = AssetRecord::new("1", "Box", "box.gltf");
    let id = assembly::place_at_origin(&mut ctx, &record, box_node(1.0, 1.0, 1.0));
    ctx.registry.get_mut(id).unwrap().position = Vector3::new(1.0, 0.0, -1.0);
    ctx.sync_model(id);
    let registry_before: Vec<_> = ctx.registry.iter().map(|(_, m)| m.clone()).collect();
    let node = ctx.registry.get(id).unwrap().node;
    let local_before = ctx.scene.node(node).unwrap().local;
    let camera_before = ctx.camera.clone();
    let mut renderer = RecordingRenderer::new();
    let mut exporter = test_exporter(dir.path());

    exporter.save_screenshot(&ctx, &mut renderer).unwrap();
    exporter.copy_to_clipboard(&ctx, &mut renderer).unwrap();
    exporter.share().unwrap();

    let registry_after: Vec<_> = ctx.registry.iter().map(|(_, m)| m.clone()).collect();
    assert_eq!(registry_after, registry_before);
    assert_eq!(ctx.scene.node(node).unwrap().local, local_before);
    assert_eq!(ctx.scene.len(), 1);
    assert_eq!(ctx.camera, camera_before);
}

#[test]
fn should_report_capture_failure() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context();
    let mut renderer = RecordingRenderer::new();
    renderer.fail_capture = true;
    let mut exporter = test_exporter(dir.path());

    let result = exporter.save_screenshot(&ctx, &mut renderer);

    assert!(matches!(result, Err(ExportError::Capture(_))));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(exporter.notifier.messages.borrow().len(), 1);
}

#[test]
fn should_copy_frame_to_clipboard() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context();
    let mut renderer = RecordingRenderer::new();
    let mut exporter = test_exporter(dir.path());

    exporter.copy_to_clipboard(&ctx, &mut renderer).unwrap();

    assert_eq!(exporter.clipboard.written, vec![renderer.size]);
    assert_eq!(renderer.renders, 1);
}

#[test]
fn should_surface_unavailable_clipboard_without_download_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context();
    let mut renderer = RecordingRenderer::new();
    let mut exporter = test_exporter(dir.path());
    exporter.clipboard.fail_with = Some(ClipboardError::Unavailable("headless".to_string()));

    let result = exporter.copy_to_clipboard(&ctx, &mut renderer);

    assert!(matches!(
        result,
        Err(ExportError::Clipboard(ClipboardError::Unavailable(_)))
    ));
    assert_eq!(exporter.notifier.messages.borrow().len(), 1);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn should_surface_failed_clipboard_write() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context();
    let mut renderer = RecordingRenderer::new();
    let mut exporter = test_exporter(dir.path());
    exporter.clipboard.fail_with = Some(ClipboardError::WriteFailed("denied".to_string()));

    let result = exporter.copy_to_clipboard(&ctx, &mut renderer);

    assert!(matches!(
        result,
        Err(ExportError::Clipboard(ClipboardError::WriteFailed(_)))
    ));
}

#[test]
fn should_hand_configured_payload_to_share_sdk() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = test_exporter(dir.path());

    exporter.share().unwrap();

    assert_eq!(exporter.share.sent, vec![exporter.payload.clone()]);
    assert!(exporter.notifier.messages.borrow().is_empty());
}

#[test]
fn should_alert_when_share_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = test_exporter(dir.path());
    exporter.share.fail = true;

    let result = exporter.share();

    assert!(matches!(result, Err(ShareError::MissingAppKey(_))));
    assert_eq!(exporter.notifier.messages.borrow().len(), 1);
}
