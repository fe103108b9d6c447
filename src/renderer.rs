use chrono::{DateTime, Utc};
use wgpu::util::DeviceExt;
use wgpu::{BindGroup, BindGroupLayout, Buffer, Device, RenderPipeline, Sampler, Texture, TextureFormat};

use crate::cache::Frame;
use crate::core::{GpuContext, SphereMesh};
use crate::types::{GlobeStyle, GlobeVertex, Uniforms};

const SPHERE_STACKS: u32 = 48;
const SPHERE_SLICES: u32 = 96;
const FRAME_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

/// Raster texture currently bound to both passes
struct FrameTexture {
    texture: Texture,
    bind_group: BindGroup,
    /// Timestamp of the uploaded frame; `None` for the placeholder.
    /// Archive frames never change under a timestamp, so a reload that
    /// returns the same instants keeps this texture without re-uploading.
    shown: Option<DateTime<Utc>>,
}

/// Two-pass compositor: the current frame as a fullscreen raster, then the
/// globe mesh alpha-blended over it
///
/// Both passes sample the same texture, so the globe can wrap the frame it
/// sits on. Encoding is separate from presentation; see `SurfaceRenderer`.
pub struct Compositor {
    gpu: GpuContext,
    raster_pipeline: RenderPipeline,
    globe_pipeline: RenderPipeline,
    texture_layout: BindGroupLayout,
    sampler: Sampler,
    frame_texture: FrameTexture,
    uniform_buffer: Buffer,
    globe_bind_group: BindGroup,
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
}

impl Compositor {
    pub fn new(gpu: GpuContext, target_format: TextureFormat, style: GlobeStyle) -> Self {
        let device = gpu.device();

        let texture_layout = Self::create_texture_layout(device);
        let globe_layout = Self::create_globe_layout(device);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Frame Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globe Uniforms"),
            contents: bytemuck::cast_slice(&[Uniforms::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let style_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globe Style"),
            contents: bytemuck::cast_slice(&[style.to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globe_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globe Bind Group"),
            layout: &globe_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: style_buffer.as_entire_binding(),
                },
            ],
        });

        let mesh = SphereMesh::new(1.0, SPHERE_STACKS, SPHERE_SLICES);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globe Vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globe Indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let raster_pipeline = Self::create_raster_pipeline(device, &texture_layout, target_format);
        let globe_pipeline =
            Self::create_globe_pipeline(device, &texture_layout, &globe_layout, target_format);

        let frame_texture = Self::placeholder(&gpu, &texture_layout, &sampler);

        Self {
            raster_pipeline,
            globe_pipeline,
            texture_layout,
            sampler,
            frame_texture,
            uniform_buffer,
            globe_bind_group,
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
            gpu,
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Record the raster pass then the globe pass into `encoder`
    ///
    /// With no frame the raster shows the 1x1 placeholder and the globe is
    /// drawn over a black background.
    pub fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        frame: Option<&Frame>,
        uniforms: &Uniforms,
    ) {
        self.upload_frame(frame);
        self.gpu
            .queue()
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));

        {
            let mut raster_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Raster Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if frame.is_some() {
                raster_pass.set_pipeline(&self.raster_pipeline);
                raster_pass.set_bind_group(0, &self.frame_texture.bind_group, &[]);
                raster_pass.draw(0..3, 0..1);
            }
        }

        {
            let mut globe_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Globe Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            globe_pass.set_pipeline(&self.globe_pipeline);
            globe_pass.set_bind_group(0, &self.frame_texture.bind_group, &[]);
            globe_pass.set_bind_group(1, &self.globe_bind_group, &[]);
            globe_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            globe_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            globe_pass.draw_indexed(0..self.index_count, 0, 0..1);
        }
    }

    /// Upload `frame` unless it is already on the GPU
    fn upload_frame(&mut self, frame: Option<&Frame>) {
        let Some(frame) = frame else {
            if self.frame_texture.shown.is_some() {
                self.frame_texture = Self::placeholder(&self.gpu, &self.texture_layout, &self.sampler);
            }
            return;
        };

        if self.frame_texture.shown == Some(frame.timestamp()) {
            return;
        }

        let max_side = self.gpu.device().limits().max_texture_dimension_2d;
        let pixels = frame.fit_within(max_side);
        if frame.dimensions() != pixels.dimensions() {
            log::debug!(
                "Scaling frame {}x{} down to fit {max_side}px textures",
                frame.width(),
                frame.height()
            );
        }

        let (width, height) = pixels.dimensions();
        let size = self.frame_texture.texture.size();
        if size.width != width || size.height != height {
            log::debug!("Recreating frame texture at {width}x{height}");
            let texture = Self::create_frame_texture(self.gpu.device(), width, height);
            let bind_group =
                Self::create_texture_bind_group(self.gpu.device(), &self.texture_layout, &texture, &self.sampler);
            self.frame_texture = FrameTexture {
                texture,
                bind_group,
                shown: None,
            };
        }

        Self::write_pixels(&self.gpu, &self.frame_texture.texture, pixels.as_raw(), width, height);
        self.frame_texture.shown = Some(frame.timestamp());
    }

    fn placeholder(gpu: &GpuContext, layout: &BindGroupLayout, sampler: &Sampler) -> FrameTexture {
        let texture = Self::create_frame_texture(gpu.device(), 1, 1);
        Self::write_pixels(gpu, &texture, &[0, 0, 0, 255], 1, 1);
        let bind_group = Self::create_texture_bind_group(gpu.device(), layout, &texture, sampler);
        FrameTexture {
            texture,
            bind_group,
            shown: None,
        }
    }

    fn write_pixels(gpu: &GpuContext, texture: &Texture, pixels: &[u8], width: u32, height: u32) {
        gpu.queue().write_texture(
            texture.as_image_copy(),
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_frame_texture(device: &Device, width: u32, height: u32) -> Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn create_texture_bind_group(
        device: &Device,
        layout: &BindGroupLayout,
        texture: &Texture,
        sampler: &Sampler,
    ) -> BindGroup {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Texture Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn create_texture_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    fn create_globe_layout(device: &Device) -> BindGroupLayout {
        let uniform_entry = |binding, visibility| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globe Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
        })
    }

    fn create_raster_pipeline(
        device: &Device,
        texture_layout: &BindGroupLayout,
        target_format: TextureFormat,
    ) -> RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Raster Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("raster.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Raster Pipeline Layout"),
            bind_group_layouts: &[texture_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Raster Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_globe_pipeline(
        device: &Device,
        texture_layout: &BindGroupLayout,
        globe_layout: &BindGroupLayout,
        target_format: TextureFormat,
    ) -> RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Globe Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("globe.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Globe Pipeline Layout"),
            bind_group_layouts: &[texture_layout, globe_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Globe Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[GlobeVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Only the near hemisphere is drawn; there is no depth buffer.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }
}
