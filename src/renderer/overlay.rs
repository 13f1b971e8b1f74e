//! Debug line overlay: selection boxes and axis gizmos, drawn over the
//! scene with depth testing off.

use crate::renderer::uniforms::OverlayVertex;
use crate::scene::components::{LocalBounds, MeshComponent, TransformComponent};
use crate::scene::picking::Aabb;
use glam::{Mat4, Vec3};
use hecs::World;

pub const SELECTION_COLOR: [f32; 4] = [0.1, 0.9, 0.9, 1.0];
pub const BOUNDS_COLOR: [f32; 4] = [1.0, 0.9, 0.1, 0.6];
const AXIS_X_COLOR: [f32; 4] = [0.9, 0.1, 0.1, 1.0];
const AXIS_UP_COLOR: [f32; 4] = [0.1, 0.9, 0.1, 1.0];
const AXIS_Z_COLOR: [f32; 4] = [0.15, 0.3, 1.0, 1.0];

/// Appends the 12 edges of a box, transformed by `model`.
pub fn push_aabb_lines(out: &mut Vec<OverlayVertex>, bounds: &Aabb, model: Mat4, color: [f32; 4]) {
    let (lo, hi) = (bounds.min, bounds.max);
    let corners = [
        Vec3::new(lo.x, lo.y, lo.z),
        Vec3::new(hi.x, lo.y, lo.z),
        Vec3::new(hi.x, hi.y, lo.z),
        Vec3::new(lo.x, hi.y, lo.z),
        Vec3::new(lo.x, lo.y, hi.z),
        Vec3::new(hi.x, lo.y, hi.z),
        Vec3::new(hi.x, hi.y, hi.z),
        Vec3::new(lo.x, hi.y, hi.z),
    ]
    .map(|c| model.transform_point3(c));

    const EDGES: [(usize, usize); 12] = [
        (0, 1), (1, 2), (2, 3), (3, 0), // near face
        (4, 5), (5, 6), (6, 7), (7, 4), // far face
        (0, 4), (1, 5), (2, 6), (3, 7), // connecting edges
    ];
    for (a, b) in EDGES {
        out.push(OverlayVertex::new(corners[a], color));
        out.push(OverlayVertex::new(corners[b], color));
    }
}

/// Appends three axis arrows rooted at `origin`. The green arrow points
/// along -Y, which is up in this engine's y-down world.
pub fn push_axis_lines(out: &mut Vec<OverlayVertex>, origin: Vec3, length: f32) {
    let axes = [
        (Vec3::X, AXIS_X_COLOR),
        (Vec3::NEG_Y, AXIS_UP_COLOR),
        (Vec3::Z, AXIS_Z_COLOR),
    ];
    for (direction, color) in axes {
        let tip = origin + direction * length;
        out.push(OverlayVertex::new(origin, color));
        out.push(OverlayVertex::new(tip, color));

        // Two short barbs so the direction reads as an arrow.
        let side = if direction.abs_diff_eq(Vec3::NEG_Y, 1e-6) {
            Vec3::X
        } else {
            Vec3::NEG_Y
        };
        let barb = length * 0.15;
        for s in [side, -side] {
            out.push(OverlayVertex::new(tip, color));
            out.push(OverlayVertex::new(tip - direction * barb + s * barb, color));
        }
    }
}

/// Builds the overlay geometry for a frame. Outside edit mode the overlay
/// is empty; inside it every mesh gets a bounds box and the selection gets
/// a highlight box plus an axis gizmo.
pub fn build_overlay(
    world: &World,
    selection: Option<hecs::Entity>,
    edit_mode: bool,
) -> Vec<OverlayVertex> {
    let mut vertices = Vec::new();
    if !edit_mode {
        return vertices;
    }

    for (entity, (_, bounds, transform)) in world
        .query::<(&MeshComponent, &LocalBounds, &TransformComponent)>()
        .iter()
    {
        let selected = selection == Some(entity);
        let color = if selected {
            SELECTION_COLOR
        } else {
            BOUNDS_COLOR
        };
        let model = transform.0.matrix();
        push_aabb_lines(&mut vertices, &bounds.0, model, color);
        if selected {
            push_axis_lines(&mut vertices, transform.0.translation, 1.0);
        }
    }

    vertices
}

pub struct OverlayPass {
    pipeline: wgpu::RenderPipeline,
}

impl OverlayPass {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        frame_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader/overlay.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("overlay pipeline layout"),
            bind_group_layouts: &[frame_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("overlay pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[OverlayVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
                ..Default::default()
            },
            // Gizmos stay visible through geometry. The pass still has a
            // depth attachment, so the state must match it; Always plus no
            // writes makes the test a no-op.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: crate::renderer::texture::DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self { pipeline }
    }

    pub fn record(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        frame_bind_group: &wgpu::BindGroup,
        vertex_buffer: &wgpu::Buffer,
        vertex_count: u32,
    ) {
        if vertex_count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, frame_bind_group, &[]);
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.draw(0..vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Handle;
    use crate::scene::Transform;

    fn spawn_box(world: &mut World, translation: Vec3) -> hecs::Entity {
        world.spawn((
            MeshComponent(Handle::new(0)),
            LocalBounds(Aabb {
                min: Vec3::splat(-0.5),
                max: Vec3::splat(0.5),
            }),
            TransformComponent(Transform::from_trs(translation, Vec3::ZERO, Vec3::ONE)),
        ))
    }

    #[test]
    fn overlay_is_empty_outside_edit_mode() {
        let mut world = World::new();
        let entity = spawn_box(&mut world, Vec3::ZERO);
        assert!(build_overlay(&world, Some(entity), false).is_empty());
    }

    #[test]
    fn every_mesh_gets_a_box_in_edit_mode() {
        let mut world = World::new();
        spawn_box(&mut world, Vec3::ZERO);
        spawn_box(&mut world, Vec3::new(3.0, 0.0, 0.0));

        let vertices = build_overlay(&world, None, true);
        // 12 edges, 2 vertices each, per entity.
        assert_eq!(vertices.len(), 2 * 24);
        assert!(vertices.iter().all(|v| v.color == BOUNDS_COLOR));
    }

    #[test]
    fn selection_adds_highlight_and_gizmo() {
        let mut world = World::new();
        let selected = spawn_box(&mut world, Vec3::new(0.0, 0.0, 5.0));
        spawn_box(&mut world, Vec3::ZERO);

        let vertices = build_overlay(&world, Some(selected), true);
        // Two boxes plus 3 axes of 3 lines each.
        assert_eq!(vertices.len(), 2 * 24 + 18);
        let highlighted = vertices
            .iter()
            .filter(|v| v.color == SELECTION_COLOR)
            .count();
        assert_eq!(highlighted, 24);
    }

    #[test]
    fn box_edges_follow_the_transform() {
        let mut out = Vec::new();
        let bounds = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let model = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        push_aabb_lines(&mut out, &bounds, model, SELECTION_COLOR);

        assert_eq!(out.len(), 24);
        for vertex in &out {
            assert!(vertex.position[0] >= 9.0 && vertex.position[0] <= 11.0);
        }
    }
}
