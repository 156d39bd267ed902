//! Screenshot, clipboard and share actions.
//!
//! Every action forces one fresh render through the [`Renderer`] before it captures,
//! so the output never depends on whether the render loop is running. None of them
//! mutate the scene. Outcomes are reported twice: to the log and to the user through
//! a [`Notifier`].

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    context::Context,
    error::{ClipboardError, ExportError, ShareError},
    render::{Frame, Renderer},
    share::{FeedPayload, ShareSdk},
};

/// Shows short messages to the user.
pub trait Notifier {
    fn alert(&self, message: &str);
}

/// Native message box.
#[derive(Clone, Copy, Debug, Default)]
pub struct DialogNotifier;

impl Notifier for DialogNotifier {
    fn alert(&self, message: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title("model-gallery")
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

/// Only logs; used when running headless.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        log::info!("{message}");
    }
}

pub trait ClipboardSink {
    fn write_image(&mut self, frame: &Frame) -> Result<(), ClipboardError>;
}

/// The system clipboard. The handle is opened lazily on first use.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl ClipboardSink for SystemClipboard {
    fn write_image(&mut self, frame: &Frame) -> Result<(), ClipboardError> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(clipboard);
        }
        let Some(clipboard) = self.inner.as_mut() else {
            return Err(ClipboardError::Unavailable("no clipboard handle".to_string()));
        };
        let image = arboard::ImageData {
            width: frame.width() as usize,
            height: frame.height() as usize,
            bytes: Cow::Borrowed(frame.as_raw()),
        };
        clipboard
            .set_image(image)
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
    }
}

/// `screenshot-2024-05-01T12-30-45-123Z.png` for the given instant.
pub fn screenshot_filename(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("screenshot-{stamp}.png")
}

/// First path in `dir` for `file_name` that does not exist yet.
fn unused_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let stem = file_name.trim_end_matches(".png");
    (1..)
        .map(|n| dir.join(format!("{stem}-{n}.png")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

pub struct Exporter<N, C, S> {
    pub screenshot_dir: PathBuf,
    pub payload: FeedPayload,
    pub notifier: N,
    pub clipboard: C,
    pub share: S,
}

impl<N: Notifier, C: ClipboardSink, S: ShareSdk> Exporter<N, C, S> {
    pub fn new(
        screenshot_dir: PathBuf,
        payload: FeedPayload,
        notifier: N,
        clipboard: C,
        share: S,
    ) -> Self {
        Self {
            screenshot_dir,
            payload,
            notifier,
            clipboard,
            share,
        }
    }

    fn capture<R: Renderer>(ctx: &Context, renderer: &mut R) -> Result<Frame, ExportError> {
        renderer
            .render(&ctx.scene, &ctx.camera)
            .and_then(|_| renderer.capture(&ctx.scene, &ctx.camera))
            .map_err(|e| ExportError::Capture(format!("{e:#}")))
    }

    /// Renders, captures and writes a PNG into the screenshot directory.
    pub fn save_screenshot<R: Renderer>(
        &mut self,
        ctx: &Context,
        renderer: &mut R,
    ) -> Result<PathBuf, ExportError> {
        let result = Self::capture(ctx, renderer).and_then(|frame| {
            std::fs::create_dir_all(&self.screenshot_dir)?;
            let path = unused_path(&self.screenshot_dir, &screenshot_filename(Utc::now()));
            frame.save_with_format(&path, image::ImageFormat::Png)?;
            Ok(path)
        });
        match &result {
            Ok(path) => {
                log::info!("Screenshot saved to {}", path.display());
                self.notifier
                    .alert(&format!("Screenshot saved to {}", path.display()));
            }
            Err(err) => {
                log::error!("Screenshot failed: {err}");
                self.notifier.alert("Could not create the image.");
            }
        }
        result
    }

    /// Renders, captures and puts the frame on the clipboard as image data.
    pub fn copy_to_clipboard<R: Renderer>(
        &mut self,
        ctx: &Context,
        renderer: &mut R,
    ) -> Result<(), ExportError> {
        let frame = match Self::capture(ctx, renderer) {
            Ok(frame) => frame,
            Err(err) => {
                log::error!("Clipboard capture failed: {err}");
                self.notifier.alert("Could not create the image.");
                return Err(err);
            }
        };
        match self.clipboard.write_image(&frame) {
            Ok(()) => {
                log::info!("Copied {}x{} frame to the clipboard", frame.width(), frame.height());
                self.notifier.alert("Copied to the clipboard.");
                Ok(())
            }
            Err(err) => {
                log::error!("{err}");
                self.notifier.alert("Copying to the clipboard failed.");
                Err(err.into())
            }
        }
    }

    /// Hands the configured feed payload to the share SDK.
    pub fn share(&mut self) -> Result<(), ShareError> {
        let result = self.share.send_default(&self.payload);
        match &result {
            Ok(()) => log::info!("Share hand-off sent"),
            Err(err) => {
                log::error!("Sharing failed: {err}");
                self.notifier.alert("Sharing failed.");
            }
        }
        result
    }
}
