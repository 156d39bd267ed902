//! The render loop.
//!
//! The loop is a two-state machine (`Running`, `Stopped`) on top of a host that
//! presents frames: the host hands out a [`FrameHandle`] for every requested frame and
//! later calls back with it. A callback is only honoured if its handle is the one the
//! loop is currently waiting for, so a frame that was requested before `stop()` can
//! never render after it, even if the host still delivers it.
//!
//! Redraws the host issues on its own (expose, resize, edits while stopped) carry no
//! handle. They only draw after [`RenderLoop::invalidate`], and never advance the spin.
//!
//! Invariant: `pending.is_some()` exactly when the loop is `Running`.

use std::time::Duration;

use cgmath::Rad;
use serde::{Deserialize, Serialize};

use crate::{context::Context, render::Renderer};

/// Identifies one requested frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// The host's frame-presentation callback mechanism.
pub trait FrameScheduler {
    /// Requests one callback; the host later calls [`RenderLoop::on_frame`] with the handle.
    fn request_frame(&mut self) -> FrameHandle;

    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// Stale or cancelled callback; nothing was drawn.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Radians per second of the spin applied to every model.
    pub rotation_speed: f32,
    /// Whether models spin at all while the loop runs.
    pub rotating: bool,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            rotation_speed: 1.0,
            rotating: true,
        }
    }
}

#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    pending: Option<FrameHandle>,
    pub rotation_speed: f32,
    pub rotating: bool,
    frames_rendered: u64,
    /// Scene changed outside of an animation frame.
    dirty: bool,
}

impl RenderLoop {
    /// Creates a running loop and requests its first frame.
    pub fn new<S: FrameScheduler>(settings: AnimationSettings, scheduler: &mut S) -> Self {
        let pending = Some(scheduler.request_frame());
        Self {
            state: LoopState::Running,
            pending,
            rotation_speed: settings.rotation_speed,
            rotating: settings.rotating,
            frames_rendered: 0,
            dirty: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Marks the scene as changed so the next handle-less redraw draws it.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn needs_redraw(&self) -> bool {
        self.dirty
    }

    pub fn stop<S: FrameScheduler>(&mut self, scheduler: &mut S) {
        if self.state != LoopState::Running {
            return;
        }
        self.state = LoopState::Stopped;
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
        }
        log::info!("Animation stopped");
    }

    pub fn start<S: FrameScheduler>(&mut self, scheduler: &mut S) {
        if self.state != LoopState::Stopped {
            return;
        }
        self.state = LoopState::Running;
        self.pending = Some(scheduler.request_frame());
        log::info!("Animation started");
    }

    pub fn toggle<S: FrameScheduler>(&mut self, scheduler: &mut S) {
        match self.state {
            LoopState::Running => self.stop(scheduler),
            LoopState::Stopped => self.start(scheduler),
        }
    }

    /// Host callback for the frame `handle`. `elapsed` is the time since the host started.
    ///
    /// Renders, advances the spin of every registered model, then requests the next
    /// frame if the loop is still running.
    pub fn on_frame<R: Renderer, S: FrameScheduler>(
        &mut self,
        handle: FrameHandle,
        elapsed: Duration,
        ctx: &mut Context,
        renderer: &mut R,
        scheduler: &mut S,
    ) -> anyhow::Result<FrameOutcome> {
        if self.state != LoopState::Running || self.pending != Some(handle) {
            log::trace!("Ignoring stale frame {handle:?}");
            return Ok(FrameOutcome::Ignored);
        }
        self.pending = None;
        self.dirty = false;

        let rendered = renderer.render(&ctx.scene, &ctx.camera);
        self.frames_rendered += 1;
        if self.rotating {
            ctx.set_spin(Rad(elapsed.as_secs_f32() * self.rotation_speed));
        }
        if self.state == LoopState::Running {
            self.pending = Some(scheduler.request_frame());
        }
        rendered.map(|_| FrameOutcome::Rendered)
    }

    /// Host redraw callback. `pending` is the frame handle the redraw was requested
    /// for, if any; without one, the scene is drawn only when it was invalidated.
    pub fn on_redraw<R: Renderer, S: FrameScheduler>(
        &mut self,
        pending: Option<FrameHandle>,
        elapsed: Duration,
        ctx: &mut Context,
        renderer: &mut R,
        scheduler: &mut S,
    ) -> anyhow::Result<FrameOutcome> {
        if let Some(handle) = pending {
            return self.on_frame(handle, elapsed, ctx, renderer, scheduler);
        }
        if !self.dirty {
            return Ok(FrameOutcome::Ignored);
        }
        self.dirty = false;
        renderer
            .render(&ctx.scene, &ctx.camera)
            .map(|_| FrameOutcome::Rendered)
    }
}
