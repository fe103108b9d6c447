use serde::{Deserialize, Serialize};

/// Per-tick transform for the globe pass
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    /// Column-major model-view-projection matrix
    pub mvp: [[f32; 4]; 4],
}

impl Uniforms {
    pub fn new(mvp: glam::Mat4) -> Self {
        Self {
            mvp: mvp.to_cols_array_2d(),
        }
    }

    pub fn mvp(&self) -> glam::Mat4 {
        glam::Mat4::from_cols_array_2d(&self.mvp)
    }
}

impl Default for Uniforms {
    fn default() -> Self {
        Self::new(glam::Mat4::IDENTITY)
    }
}

/// Globe vertex: model-space position and equirectangular texture coordinate
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobeVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl GlobeVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GlobeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// How the globe overlay is shaded
///
/// The fragment colour is `mix(tint.rgb, raster.rgb, texture_mix)` with
/// alpha `tint.a`. `texture_mix = 0` gives a flat decorative overlay;
/// `1` wraps the current satellite frame onto the sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeStyle {
    pub tint: [f32; 4],
    pub texture_mix: f32,
}

impl GlobeStyle {
    pub fn flat(tint: [f32; 4]) -> Self {
        Self {
            tint,
            texture_mix: 0.0,
        }
    }

    pub fn textured(opacity: f32) -> Self {
        Self {
            tint: [1.0, 1.0, 1.0, opacity.clamp(0.0, 1.0)],
            texture_mix: 1.0,
        }
    }

    pub fn to_uniform(&self) -> GlobeStyleUniform {
        GlobeStyleUniform {
            tint: self.tint,
            texture_mix: self.texture_mix.clamp(0.0, 1.0),
            _pad: [0.0; 3],
        }
    }
}

impl Default for GlobeStyle {
    fn default() -> Self {
        Self::textured(0.35)
    }
}

/// GPU layout of `GlobeStyle`
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobeStyleUniform {
    pub tint: [f32; 4],
    pub texture_mix: f32,
    pub _pad: [f32; 3],
}
