//! Directional shadow pass. The whole scene fits inside one fixed
//! orthographic volume around the origin, so the light matrix is a constant.

use crate::asset::Assets;
use crate::renderer::context::MeshDraw;
use crate::renderer::mesh::Vertex;
use crate::renderer::texture::SHADOW_FORMAT;
use crate::renderer::uniforms::MeshInstance;
use glam::{Mat4, Vec3};

pub const SHADOW_HALF_EXTENT: f32 = 20.0;
pub const SHADOW_NEAR: f32 = 0.1;
pub const SHADOW_FAR: f32 = 150.0;
/// Matches the sun entity spawned by the demo scene.
pub const SUN_POSITION: Vec3 = Vec3::new(-30.0, -60.0, -30.0);

/// Orthographic projection looking from the sun towards the origin, with the
/// world's y-down up vector. Reverse mapping into [0, 1] depth.
pub fn light_space_matrix() -> Mat4 {
    let projection = Mat4::orthographic_rh(
        -SHADOW_HALF_EXTENT,
        SHADOW_HALF_EXTENT,
        -SHADOW_HALF_EXTENT,
        SHADOW_HALF_EXTENT,
        SHADOW_NEAR,
        SHADOW_FAR,
    );
    let view = Mat4::look_at_rh(SUN_POSITION, Vec3::ZERO, Vec3::new(0.0, -1.0, 0.0));
    projection * view
}

pub struct ShadowPass {
    pipeline: wgpu::RenderPipeline,
}

impl ShadowPass {
    pub fn new(device: &wgpu::Device, frame_layout: &wgpu::BindGroupLayout) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader/shadow.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow pipeline layout"),
            bind_group_layouts: &[frame_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout(), MeshInstance::layout()],
                compilation_options: Default::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: SHADOW_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                // Constant plus slope-scaled bias keeps acne off the floor
                // without visible peter-panning at this map size.
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self { pipeline }
    }

    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        shadow_view: &wgpu::TextureView,
        frame_bind_group: &wgpu::BindGroup,
        instance_buffer: &wgpu::Buffer,
        assets: &Assets,
        draws: &[MeshDraw],
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shadow pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: shadow_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, frame_bind_group, &[]);
        pass.set_vertex_buffer(1, instance_buffer.slice(..));

        for draw in draws {
            let mesh = assets.mesh(draw.mesh);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, draw.instance..draw.instance + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn project(m: Mat4, p: Vec3) -> Vec3 {
        let clip = m * Vec4::new(p.x, p.y, p.z, 1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn origin_projects_to_center_of_the_map() {
        let ndc = project(light_space_matrix(), Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn sun_distance_sits_inside_the_depth_range() {
        // The sun is ~73.7 units from the origin, well inside [0.1, 150].
        let distance = SUN_POSITION.length();
        assert!(distance > SHADOW_NEAR && distance < SHADOW_FAR);
    }

    #[test]
    fn points_nearer_the_sun_get_smaller_depth() {
        let m = light_space_matrix();
        let towards_sun = SUN_POSITION.normalize() * 5.0;
        let near = project(m, towards_sun).z;
        let far = project(m, -towards_sun).z;
        assert!(near < far);
    }

    #[test]
    fn scene_extent_stays_inside_the_ortho_volume() {
        let m = light_space_matrix();
        for corner in [
            Vec3::new(-5.0, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 10.0),
            Vec3::new(0.0, -3.0, 5.0),
        ] {
            let ndc = project(m, corner);
            assert!(ndc.x.abs() <= 1.0, "{corner} left the shadow frustum");
            assert!(ndc.y.abs() <= 1.0, "{corner} left the shadow frustum");
            assert!(ndc.z >= 0.0 && ndc.z <= 1.0);
        }
    }
}
