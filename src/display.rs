use chrono::{DateTime, Utc};

use crate::cache::Frame;
use crate::error::Result;
use crate::traits::FrameRenderer;
use crate::types::Uniforms;

/// Decides when the compositor has something new to show
///
/// A redraw is due when the displayed frame or the uniforms differ from the
/// last drawn pair, so visual refresh follows state changes rather than the
/// playback interval.
#[derive(Debug, Default)]
pub struct RedrawTracker {
    last: Option<(Option<DateTime<Utc>>, Uniforms)>,
}

impl RedrawTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn needs_redraw(&self, frame: Option<DateTime<Utc>>, uniforms: &Uniforms) -> bool {
        self.last != Some((frame, *uniforms))
    }

    pub fn mark_drawn(&mut self, frame: Option<DateTime<Utc>>, uniforms: &Uniforms) {
        self.last = Some((frame, *uniforms));
    }

    /// Force the next check to redraw (resize, surface loss)
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

/// Renderer plus the redraw bookkeeping in front of it
pub struct Display<R: FrameRenderer> {
    renderer: R,
    redraw: RedrawTracker,
}

impl<R: FrameRenderer> Display<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            redraw: RedrawTracker::new(),
        }
    }

    /// Render if the frame or uniforms changed. Returns whether it drew.
    pub fn draw(&mut self, frame: Option<&Frame>, uniforms: &Uniforms) -> Result<bool> {
        let key = frame.map(Frame::timestamp);
        if !self.redraw.needs_redraw(key, uniforms) {
            return Ok(false);
        }

        self.renderer.render(frame, uniforms)?;
        self.redraw.mark_drawn(key, uniforms);
        Ok(true)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
        self.redraw.invalidate();
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}
