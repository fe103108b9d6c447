use std::sync::Arc;
use wgpu::{Surface, SurfaceConfiguration};
use winit::window::Window;

use super::gpu_context::GpuContext;
use crate::cache::Frame;
use crate::error::{Result, ViewerError};
use crate::renderer::Compositor;
use crate::traits::FrameRenderer;
use crate::types::{GlobeStyle, Uniforms};

/// Presents the compositor's output on a window surface
pub struct SurfaceRenderer {
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    compositor: Compositor,
}

impl SurfaceRenderer {
    /// Acquire a GPU device for `window` and build the compositor on it.
    ///
    /// Fails with `DeviceUnavailable` when no adapter or device can be had.
    pub fn new(window: Arc<Window>, style: GlobeStyle) -> Result<Self> {
        let size = window.inner_size();

        let instance = GpuContext::instance();
        let surface = instance
            .create_surface(window)
            .map_err(|e| ViewerError::device(format!("surface creation failed: {e}")))?;
        let gpu = pollster::block_on(GpuContext::for_surface(&instance, &surface))?;

        let surface_caps = surface.get_capabilities(gpu.adapter());
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| ViewerError::device("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(gpu.device(), &surface_config);
        log::info!(
            "Surface configured: {}x{} {:?}",
            surface_config.width,
            surface_config.height,
            surface_format
        );

        let compositor = Compositor::new(gpu, surface_format, style);

        Ok(Self {
            surface,
            surface_config,
            compositor,
        })
    }

    fn reconfigure(&self) {
        self.surface
            .configure(self.compositor.gpu().device(), &self.surface_config);
    }
}

impl FrameRenderer for SurfaceRenderer {
    fn render(&mut self, frame: Option<&Frame>, uniforms: &Uniforms) -> Result<()> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.reconfigure();
                self.surface.get_current_texture()?
            }
            Err(e) => return Err(e.into()),
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .compositor
            .gpu()
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Surface Render Encoder"),
            });

        self.compositor
            .encode(&mut encoder, &surface_view, frame, uniforms);

        self.compositor.gpu().queue().submit(Some(encoder.finish()));
        surface_texture.present();

        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.surface_config.width = width;
        self.surface_config.height = height;
        self.reconfigure();
    }
}
