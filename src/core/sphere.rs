use std::f32::consts::PI;

use crate::types::GlobeVertex;

/// Indexed UV-sphere for the globe pass
///
/// Rows run from the north pole (v = 0) to the south pole (v = 1); columns
/// wrap eastward with u, so an equirectangular image maps on unmirrored.
/// Triangles wind counter-clockwise seen from outside; pole-degenerate
/// triangles are left out.
#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub vertices: Vec<GlobeVertex>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    pub fn new(radius: f32, stacks: u32, slices: u32) -> Self {
        let stacks = stacks.max(2);
        let slices = slices.max(3);

        let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
        for i in 0..=stacks {
            let v = i as f32 / stacks as f32;
            let phi = v * PI;
            for j in 0..=slices {
                let u = j as f32 / slices as f32;
                let theta = u * 2.0 * PI;
                vertices.push(GlobeVertex {
                    position: [
                        radius * phi.sin() * theta.cos(),
                        radius * phi.cos(),
                        -radius * phi.sin() * theta.sin(),
                    ],
                    uv: [u, v],
                });
            }
        }

        let mut indices = Vec::with_capacity((6 * slices * (stacks - 1)) as usize);
        for i in 0..stacks {
            for j in 0..slices {
                let first = i * (slices + 1) + j;
                let second = first + slices + 1;

                if i != 0 {
                    indices.extend_from_slice(&[first, second, first + 1]);
                }
                if i != stacks - 1 {
                    indices.extend_from_slice(&[second, second + 1, first + 1]);
                }
            }
        }

        Self { vertices, indices }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn triangles(&self) -> impl Iterator<Item = [glam::Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [tri[0], tri[1], tri[2]]
                .map(|i| glam::Vec3::from_array(self.vertices[i as usize].position))
        })
    }
}
