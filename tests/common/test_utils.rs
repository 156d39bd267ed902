use std::{cell::RefCell, collections::HashMap, time::Duration};

use anyhow::anyhow;
use model_gallery::{
    animation::{FrameHandle, FrameScheduler},
    camera::Camera,
    context::Context,
    data_structures::{
        model::{Material, Mesh, ModelVertex},
        scene_graph::{Scene, SceneNode},
    },
    error::{ClipboardError, ShareError},
    export::{ClipboardSink, Exporter, Notifier},
    layout::LayoutSettings,
    render::{Frame, Renderer},
    resources::{AssetLoader, primitive::box_mesh},
    share::{FeedPayload, ShareSdk},
};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

pub fn test_context() -> Context {
    Context::new(WIDTH, HEIGHT, [1.0, 1.0, 1.0], LayoutSettings::default())
}

pub fn box_node(width: f32, height: f32, depth: f32) -> SceneNode {
    SceneNode::with_mesh(
        "box",
        box_mesh(width, height, depth),
        Material::new("box", [0.5, 0.5, 0.5, 1.0]),
    )
}

/// A node whose every vertex sits on the same point.
pub fn point_node() -> SceneNode {
    let vertex = ModelVertex {
        position: [0.3, 0.3, 0.3],
        normal: [0.0, 1.0, 0.0],
    };
    SceneNode::with_mesh(
        "point",
        Mesh::new("point", vec![vertex; 3], vec![0, 1, 2]),
        Material::default(),
    )
}

/// Counts draws and captures; captures are filled with one colour.
pub struct RecordingRenderer {
    pub renders: usize,
    pub captures: usize,
    pub size: (u32, u32),
    pub fail_render: bool,
    pub fail_capture: bool,
    /// Number of top-level nodes seen by the last render.
    pub last_scene_len: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            renders: 0,
            captures: 0,
            size: (4, 3),
            fail_render: false,
            fail_capture: false,
            last_scene_len: 0,
        }
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, scene: &Scene, _camera: &Camera) -> anyhow::Result<()> {
        self.renders += 1;
        self.last_scene_len = scene.len();
        if self.fail_render {
            return Err(anyhow!("surface lost"));
        }
        Ok(())
    }

    fn capture(&mut self, _scene: &Scene, _camera: &Camera) -> anyhow::Result<Frame> {
        self.captures += 1;
        if self.fail_capture {
            return Err(anyhow!("readback failed"));
        }
        Ok(Frame::from_pixel(
            self.size.0,
            self.size.1,
            image::Rgba([10, 20, 30, 255]),
        ))
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }
}

/// Frame scheduler driven by the test: nothing is delivered unless the test does it.
#[derive(Default)]
pub struct ManualScheduler {
    next: u64,
    pub requested: Vec<FrameHandle>,
    pub cancelled: Vec<FrameHandle>,
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.requested.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.cancelled.push(handle);
    }
}

impl ManualScheduler {
    pub fn last_requested(&self) -> Option<FrameHandle> {
        self.requested.last().copied()
    }
}

/// Serves nodes from memory; unknown paths fail. Optional per-path delays.
#[derive(Default)]
pub struct MapLoader {
    assets: HashMap<String, SceneNode>,
    delays: HashMap<String, Duration>,
}

impl MapLoader {
    pub fn with(mut self, path: &str, node: SceneNode) -> Self {
        self.assets.insert(path.to_string(), node);
        self
    }

    pub fn delayed(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }
}

impl AssetLoader for MapLoader {
    async fn load(&self, path: &str) -> anyhow::Result<SceneNode> {
        if let Some(delay) = self.delays.get(path) {
            tokio::time::sleep(*delay).await;
        }
        self.assets
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no asset at {path}"))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingClipboard {
    pub written: Vec<(u32, u32)>,
    pub fail_with: Option<ClipboardError>,
}

impl ClipboardSink for RecordingClipboard {
    fn write_image(&mut self, frame: &Frame) -> Result<(), ClipboardError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.written.push((frame.width(), frame.height()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingShare {
    pub sent: Vec<FeedPayload>,
    pub fail: bool,
}

impl ShareSdk for RecordingShare {
    fn send_default(&mut self, payload: &FeedPayload) -> Result<(), ShareError> {
        if self.fail {
            return Err(ShareError::MissingAppKey("TEST_SHARE_KEY".to_string()));
        }
        self.sent.push(payload.clone());
        Ok(())
    }
}

pub type TestExporter = Exporter<RecordingNotifier, RecordingClipboard, RecordingShare>;

pub fn test_exporter(dir: &std::path::Path) -> TestExporter {
    Exporter::new(
        dir.to_path_buf(),
        FeedPayload::from_config(&Default::default()),
        RecordingNotifier::default(),
        RecordingClipboard::default(),
        RecordingShare::default(),
    )
}
