use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use sat_viewer::camera::OrbitCamera;
use sat_viewer::cli::Cli;
use sat_viewer::core::{SurfaceRenderer, SystemClock};
use sat_viewer::{FrameFetcher, HttpFrameSource, LoadSummary, Viewer, ViewerConfig, ViewerSession};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

// === Constants ===

/// Upper bound between wakeups; redraws still only happen on change
const FRAME_BUDGET: Duration = Duration::from_millis(16);

type AppViewer = Viewer<HttpFrameSource, SurfaceRenderer, SystemClock>;

// === Application ===

struct App {
    config: ViewerConfig,
    runtime: tokio::runtime::Runtime,
    window: Option<Arc<Window>>,
    viewer: Option<AppViewer>,
    camera: OrbitCamera,
    last_frame_time: Instant,
    title: String,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: ViewerConfig, runtime: tokio::runtime::Runtime) -> Self {
        let mut camera = OrbitCamera::new(config.window_width as f32 / config.window_height as f32);
        camera.spin_rate = config.globe_spin;

        Self {
            config,
            runtime,
            window: None,
            viewer: None,
            camera,
            last_frame_time: Instant::now(),
            title: String::new(),
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn build_viewer(&self, window: &Arc<Window>) -> anyhow::Result<AppViewer> {
        let options = self.config.fetch_options();
        let source =
            HttpFrameSource::new(&self.config.proxy_base)?.with_catalog_timeout(options.timeout);
        let fetcher = FrameFetcher::new(source, options);
        let session = ViewerSession::new(SystemClock::new(), self.config.playback_interval());

        let style = self.config.globe;
        let window = Arc::clone(window);
        let viewer = Viewer::new(fetcher, session, move || SurfaceRenderer::new(window, style))?;
        Ok(viewer)
    }

    /// Blocking reload on the runtime; per-frame failures only show in the
    /// status log
    fn reload(&mut self) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        let hours_back = self.config.hours_back;
        let use_catalog = self.config.use_catalog;

        let result: sat_viewer::Result<LoadSummary> = self.runtime.block_on(async {
            if use_catalog {
                let requests = viewer.fetcher().source().fetch_catalog(hours_back).await?;
                viewer.reload_requests(requests).await
            } else {
                viewer.reload(hours_back).await
            }
        });

        match result {
            Ok(summary) => log::info!(
                "Reload finished: {}/{} frames loaded",
                summary.loaded,
                summary.requested
            ),
            Err(e) => log::warn!("Reload failed: {e}"),
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        self.camera.process_keyboard(event);
        if !event.state.is_pressed() {
            return;
        }

        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyR if !event.repeat => self.reload(),
            _ => {
                let Some(viewer) = self.viewer.as_mut() else {
                    return;
                };
                let session = viewer.session_mut();
                match code {
                    KeyCode::Space if !event.repeat => {
                        session.toggle();
                    }
                    KeyCode::ArrowRight => session.step_by(1),
                    KeyCode::ArrowLeft => session.step_by(-1),
                    KeyCode::Home => session.step_to(0),
                    KeyCode::End => session.step_to(usize::MAX),
                    _ => {}
                }
            }
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        self.camera.update(delta);

        let (Some(viewer), Some(window)) = (self.viewer.as_mut(), &self.window) else {
            return;
        };
        viewer.tick();
        if let Err(e) = viewer.draw(&self.camera.to_uniform()) {
            log::error!("Render error: {e}");
        }

        let title = format!("Satellite Viewer · {}", viewer.session().status_line());
        if title != self.title {
            window.set_title(&title);
            self.title = title;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Satellite Viewer")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    self.config.window_width,
                    self.config.window_height,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("failed to create window"));
                return;
            }
        };

        let viewer = match self.build_viewer(&window) {
            Ok(viewer) => viewer,
            Err(e) => {
                self.fail(event_loop, e.context("failed to initialize viewer"));
                return;
            }
        };

        let size = window.inner_size();
        self.camera.set_viewport(size.width, size.height);
        self.window = Some(window);
        self.viewer = Some(viewer);

        self.reload();
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.session_mut().play();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::Resized(size) => {
                self.camera.set_viewport(size.width, size.height);
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + FRAME_BUDGET));
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = ViewerConfig::from_cli(&cli)?;
    log::info!(
        "Proxy {} · {}h back · every {} min",
        config.proxy_base,
        config.hours_back,
        config.cadence_minutes
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, runtime);

    println!("Satellite Viewer - Controls: Space play/pause, Left/Right step, R reload, WASD/QE camera, Escape to quit");
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
