//! Application shell and event loop.
//!
//! [`GalleryApp`] is the winit [`ApplicationHandler`]. It owns the [`Context`] and every
//! component, and it is the only place that mutates them. Network and file IO run on a
//! tokio runtime and come back as [`GalleryEvent`]s through the event-loop proxy, so
//! the window keeps rendering while records and assets are still loading.
//!
//! Frames are driven by `request_redraw`: the [`WindowScheduler`] hands out a fresh
//! [`FrameHandle`] per request and remembers the latest one. A redraw that arrives
//! after the loop was stopped carries no handle, so it neither animates nor draws
//! unless the scene was edited since.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use cgmath::Deg;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    animation::{FrameHandle, FrameScheduler, RenderLoop},
    assembly::{self, LoadedAsset},
    camera::OrbitCamera,
    config::GalleryConfig,
    context::{Context, ModelId},
    error::{AssetLoadError, FetchError},
    export::{DialogNotifier, Exporter, LogNotifier, Notifier, SystemClipboard},
    gpu::GpuRenderer,
    interaction::{Command, InteractionController},
    layout,
    records::{self, AssetRecord},
    render::Renderer,
    resources::{AssetBase, GltfLoader, primitive},
    share::{BrowserShare, FeedPayload},
};

/// What the window shows on start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartMode {
    /// Query the records and lay their models out on the grid.
    Gallery,
    /// One rotating cube in front of the camera.
    Cube,
}

#[derive(Debug)]
pub enum GalleryEvent {
    RecordsFetched(Result<Vec<AssetRecord>, FetchError>),
    AssetLoaded(Result<LoadedAsset, AssetLoadError>),
}

/// [`FrameScheduler`] on top of `Window::request_redraw`.
#[derive(Debug, Default)]
pub struct WindowScheduler {
    window: Option<Arc<Window>>,
    generation: u64,
    pending: Option<FrameHandle>,
}

impl WindowScheduler {
    pub fn new(window: Option<Arc<Window>>) -> Self {
        Self {
            window,
            generation: 0,
            pending: None,
        }
    }

    /// Hands the pending handle to the redraw that is being processed.
    pub fn take_pending(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl FrameScheduler for WindowScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.generation += 1;
        let handle = FrameHandle(self.generation);
        self.pending = Some(handle);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

/// The `--cube` scene: one cube at the origin seen from two units away through a wide lens.
pub fn setup_cube_scene(ctx: &mut Context) -> Option<ModelId> {
    let node = primitive::builtin("cube")?;
    let record = AssetRecord::new("cube", "Cube", format!("{}cube", primitive::BUILTIN_PREFIX));
    ctx.camera.orbit = OrbitCamera::looking_at_origin(2.0);
    ctx.camera.projection.fovy = Deg(75.0).into();
    ctx.camera.projection.zfar = 100.0;
    Some(assembly::place_at_origin(ctx, &record, node))
}

type WindowExporter = Exporter<DialogNotifier, SystemClipboard, BrowserShare>;

fn exporter_for<N: Notifier>(config: &GalleryConfig, notifier: N) -> Exporter<N, SystemClipboard, BrowserShare> {
    Exporter::new(
        config.export.screenshot_dir(),
        FeedPayload::from_config(&config.share),
        notifier,
        SystemClipboard::default(),
        BrowserShare::new(&config.share),
    )
}

struct AppState {
    ctx: Context,
    renderer: GpuRenderer,
    render_loop: RenderLoop,
    scheduler: WindowScheduler,
    interaction: InteractionController,
    exporter: WindowExporter,
    cursor: PhysicalPosition<f64>,
}

impl AppState {
    fn window(&self) -> Option<&Arc<Window>> {
        self.renderer.window()
    }

    /// Marks the scene changed; while stopped, also asks the window for one redraw.
    fn invalidate(&mut self) {
        self.render_loop.invalidate();
        if !self.render_loop.is_running()
            && let Some(window) = self.window()
        {
            window.request_redraw();
        }
    }

    fn viewport(&self) -> (u32, u32) {
        self.renderer.size()
    }

    fn run_command(&mut self, command: Command) {
        match command {
            Command::ToggleAnimation => self.render_loop.toggle(&mut self.scheduler),
            Command::Deselect => self.interaction.detach(),
            Command::SetMode(mode) => {
                if !self.interaction.set_mode(mode) {
                    log::debug!("No model selected, ignoring switch to {mode:?}");
                }
            }
            // failures are logged and alerted by the exporter
            Command::SaveScreenshot => {
                let _ = self.exporter.save_screenshot(&self.ctx, &mut self.renderer);
            }
            Command::CopyToClipboard => {
                let _ = self
                    .exporter
                    .copy_to_clipboard(&self.ctx, &mut self.renderer);
            }
            Command::Share => {
                let _ = self.exporter.share();
            }
        }
    }
}

pub struct GalleryApp {
    config: GalleryConfig,
    mode: StartMode,
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<GalleryEvent>,
    loader: GltfLoader,
    state: Option<AppState>,
    started: Instant,
}

impl GalleryApp {
    pub fn new(
        event_loop: &EventLoop<GalleryEvent>,
        config: GalleryConfig,
        mode: StartMode,
    ) -> anyhow::Result<Self> {
        let async_runtime =
            tokio::runtime::Runtime::new().context("cannot start the async runtime")?;
        let loader = GltfLoader::new(AssetBase::parse(&config.assets.base)?);
        Ok(Self {
            config,
            mode,
            async_runtime,
            proxy: event_loop.create_proxy(),
            loader,
            state: None,
            started: Instant::now(),
        })
    }

    fn init_state(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState> {
        let window_config = &self.config.window;
        let window_attributes = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(LogicalSize::new(window_config.width, window_config.height));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("cannot create the window")?,
        );
        let renderer = self
            .async_runtime
            .block_on(GpuRenderer::for_window(window.clone()))?;
        let (width, height) = renderer.size();
        let ctx = Context::new(
            width,
            height,
            window_config.background,
            self.config.layout,
        );
        let mut scheduler = WindowScheduler::new(Some(window));
        let render_loop = RenderLoop::new(self.config.animation, &mut scheduler);
        Ok(AppState {
            ctx,
            renderer,
            render_loop,
            scheduler,
            interaction: InteractionController::default(),
            exporter: exporter_for(&self.config, DialogNotifier),
            cursor: PhysicalPosition::new(0.0, 0.0),
        })
    }

    fn spawn_record_fetch(&self) {
        let proxy = self.proxy.clone();
        let config = self.config.records.clone();
        self.async_runtime.spawn(async move {
            let result = records::fetch_configured(&config).await;
            if proxy.send_event(GalleryEvent::RecordsFetched(result)).is_err() {
                log::warn!("Event loop closed before the records arrived");
            }
        });
    }

    fn spawn_asset_loads(&self, records: Vec<AssetRecord>) {
        let grid_size = layout::grid_size(records.len());
        let slots = layout::plan(records.len());
        for (record, slot) in records.into_iter().zip(slots) {
            let loader = self.loader.clone();
            let proxy = self.proxy.clone();
            self.async_runtime.spawn(async move {
                let result = assembly::load_asset(&loader, record, slot, grid_size).await;
                if proxy.send_event(GalleryEvent::AssetLoaded(result)).is_err() {
                    log::warn!("Event loop closed before an asset finished loading");
                }
            });
        }
    }

    fn on_redraw(&mut self) {
        let elapsed = self.started.elapsed();
        let Some(state) = &mut self.state else {
            return;
        };
        let pending = state.scheduler.take_pending();
        let result = state.render_loop.on_redraw(
            pending,
            elapsed,
            &mut state.ctx,
            &mut state.renderer,
            &mut state.scheduler,
        );
        if let Err(e) = result {
            log::error!("Unable to render {e:#}");
        }
    }

    fn on_pointer_button(&mut self, button: MouseButton, pressed: bool) {
        let Some(state) = &mut self.state else {
            return;
        };
        let viewport = state.viewport();
        let PhysicalPosition { x, y } = state.cursor;
        match (button, pressed) {
            (MouseButton::Left, true) => {
                state.interaction.pointer_down(&state.ctx, x, y, viewport);
                if !state.interaction.is_dragging_gizmo() {
                    state.interaction.click(&state.ctx, x, y, viewport);
                }
            }
            (MouseButton::Right, true) => {
                state.interaction.pointer_down(&state.ctx, x, y, viewport);
            }
            (_, false) => state.interaction.pointer_up(),
            _ => (),
        }
    }
}

impl ApplicationHandler<GalleryEvent> for GalleryApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let mut state = match self.init_state(event_loop) {
            Ok(state) => state,
            Err(e) => {
                log::error!("App initialization failed: {e:#}");
                event_loop.exit();
                return;
            }
        };
        match self.mode {
            StartMode::Cube => {
                setup_cube_scene(&mut state.ctx);
            }
            StartMode::Gallery => self.spawn_record_fetch(),
        }
        self.started = Instant::now();
        self.state = Some(state);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: GalleryEvent) {
        match event {
            GalleryEvent::RecordsFetched(Ok(records)) => {
                if records.is_empty() {
                    log::warn!("{}", records::NO_MODELS);
                    if let Some(state) = &self.state {
                        state.exporter.notifier.alert(records::NO_MODELS);
                    }
                    return;
                }
                for line in records::listing(&records) {
                    log::info!("{line}");
                }
                if let Some(state) = &mut self.state {
                    state.ctx.frame_grid(records.len());
                    state.invalidate();
                }
                self.spawn_asset_loads(records);
            }
            GalleryEvent::RecordsFetched(Err(e)) => {
                log::error!("Fetching the model records failed: {e}");
                if let Some(state) = &self.state {
                    state
                        .exporter
                        .notifier
                        .alert("The model list could not be loaded.");
                }
            }
            GalleryEvent::AssetLoaded(Ok(loaded)) => {
                if let Some(state) = &mut self.state {
                    assembly::place(&mut state.ctx, loaded);
                    state.invalidate();
                }
            }
            // already logged where the load failed; the rest of the gallery is unaffected
            GalleryEvent::AssetLoaded(Err(_)) => (),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if self.state.is_none() {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => self.on_redraw(),
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => self.on_pointer_button(button, button_state == ElementState::Pressed),
            event => {
                let Some(state) = &mut self.state else {
                    return;
                };
                match event {
                    WindowEvent::Resized(size) => {
                        state.renderer.resize(size.width, size.height);
                        state.ctx.resize(size.width, size.height);
                        state.invalidate();
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let dx = position.x - state.cursor.x;
                        let dy = position.y - state.cursor.y;
                        state.cursor = position;
                        if state.interaction.pointer_moved(&mut state.ctx, dx, dy) {
                            state.invalidate();
                        }
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let amount = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(position) => (position.y / 50.0) as f32,
                        };
                        if state.interaction.wheel(&mut state.ctx, amount) {
                            state.invalidate();
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. }
                        if event.state.is_pressed() && !event.repeat =>
                    {
                        if let Some(command) = Command::from_key(&event.logical_key) {
                            state.run_command(command);
                        }
                    }
                    _ => (),
                }
            }
        }
    }
}

/// Opens the window and runs the gallery until it is closed.
pub fn run(config: GalleryConfig, mode: StartMode) -> anyhow::Result<()> {
    let event_loop: EventLoop<GalleryEvent> = EventLoop::with_user_event().build()?;
    let mut app = GalleryApp::new(&event_loop, config, mode)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}

/// Renders the scene once without a window and writes a screenshot into `dir`.
pub fn run_once(config: GalleryConfig, mode: StartMode, dir: PathBuf) -> anyhow::Result<PathBuf> {
    let async_runtime = tokio::runtime::Runtime::new().context("cannot start the async runtime")?;
    let loader = GltfLoader::new(AssetBase::parse(&config.assets.base)?);
    let window = &config.window;
    let mut renderer = async_runtime.block_on(GpuRenderer::headless(window.width, window.height))?;
    let mut ctx = Context::new(window.width, window.height, window.background, config.layout);

    match mode {
        StartMode::Cube => {
            setup_cube_scene(&mut ctx);
        }
        StartMode::Gallery => {
            let records = async_runtime.block_on(records::fetch_configured(&config.records))?;
            if records.is_empty() {
                log::warn!("{}", records::NO_MODELS);
            }
            ctx.frame_grid(records.len());
            let results = async_runtime.block_on(assembly::assemble_all(&mut ctx, &loader, records));
            let failed = results.iter().filter(|r| r.is_err()).count();
            if failed > 0 {
                log::warn!("{failed} of {} models failed to load", results.len());
            }
        }
    }

    let mut exporter = exporter_for(&config, LogNotifier);
    exporter.screenshot_dir = dir;
    Ok(exporter.save_screenshot(&ctx, &mut renderer)?)
}
