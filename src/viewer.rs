use crate::core::Clock;
use crate::display::Display;
use crate::error::Result;
use crate::fetch::{FrameFetcher, FrameRequest, FrameSource};
use crate::session::ViewerSession;
use crate::status::LoadSummary;
use crate::traits::FrameRenderer;
use crate::types::Uniforms;

/// Top-level application object: fetcher, session and display wired
/// together
pub struct Viewer<S, R, C>
where
    S: FrameSource + 'static,
    R: FrameRenderer,
    C: Clock,
{
    fetcher: FrameFetcher<S>,
    session: ViewerSession<C>,
    display: Display<R>,
}

impl<S, R, C> Viewer<S, R, C>
where
    S: FrameSource + 'static,
    R: FrameRenderer,
    C: Clock,
{
    /// Build the viewer, acquiring the renderer first
    ///
    /// A renderer failure (typically `DeviceUnavailable`) is returned before
    /// any frame is requested.
    pub fn new(
        fetcher: FrameFetcher<S>,
        session: ViewerSession<C>,
        init_renderer: impl FnOnce() -> Result<R>,
    ) -> Result<Self> {
        let renderer = init_renderer()?;
        Ok(Self {
            fetcher,
            session,
            display: Display::new(renderer),
        })
    }

    pub fn fetcher(&self) -> &FrameFetcher<S> {
        &self.fetcher
    }

    pub fn session(&self) -> &ViewerSession<C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ViewerSession<C> {
        &mut self.session
    }

    pub fn display(&self) -> &Display<R> {
        &self.display
    }

    pub async fn load(&mut self, hours_back: u32) -> Result<LoadSummary> {
        self.session.load(&self.fetcher, hours_back).await
    }

    pub async fn load_requests(&mut self, requests: Vec<FrameRequest>) -> Result<LoadSummary> {
        self.session.load_requests(&self.fetcher, requests).await
    }

    /// Stop playback, reload, and resume if it was playing
    pub async fn reload(&mut self, hours_back: u32) -> Result<LoadSummary> {
        let was_playing = self.session.is_playing();
        self.session.pause();

        let result = self.load(hours_back).await;
        self.resume(was_playing);
        result
    }

    /// `reload` over an explicit request list
    pub async fn reload_requests(&mut self, requests: Vec<FrameRequest>) -> Result<LoadSummary> {
        let was_playing = self.session.is_playing();
        self.session.pause();

        let result = self.load_requests(requests).await;
        self.resume(was_playing);
        result
    }

    fn resume(&mut self, was_playing: bool) {
        if was_playing {
            self.session.play();
        }
    }

    pub fn tick(&mut self) -> u32 {
        self.session.tick()
    }

    /// Render the frame under the cursor if anything changed
    pub fn draw(&mut self, uniforms: &Uniforms) -> Result<bool> {
        let frame = self.session.current_frame();
        self.display.draw(frame, uniforms)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.display.resize(width, height);
    }
}
