// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

/// Uniform slots reserved for lights. One is spoken for by the sun.
pub const MAX_LIGHTS: usize = 10;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct PackedLight {
    /// World position, w unused.
    pub position: [f32; 4],
    /// RGB color, intensity in w.
    pub color: [f32; 4],
}

impl PackedLight {
    pub fn new(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            position: [position.x, position.y, position.z, 1.0],
            color: [color.x, color.y, color.z, intensity],
        }
    }
}

/// Per-frame uniform shared by the forward, billboard and overlay passes.
/// Layout mirrors `FrameUniform` in the WGSL sources.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct FrameUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub inverse_view: [[f32; 4]; 4],
    pub light_projection_view: [[f32; 4]; 4],
    pub ambient_color: [f32; 4],
    pub lights: [PackedLight; MAX_LIGHTS],
    pub light_count: u32,
    pub _padding: [u32; 3],
}

impl FrameUniform {
    pub fn new() -> Self {
        Self {
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            inverse_view: Mat4::IDENTITY.to_cols_array_2d(),
            light_projection_view: Mat4::IDENTITY.to_cols_array_2d(),
            ambient_color: [1.0, 1.0, 1.0, 0.05],
            lights: [PackedLight::zeroed(); MAX_LIGHTS],
            light_count: 0,
            _padding: [0; 3],
        }
    }
}

impl Default for FrameUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-draw instance data for mesh passes.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshInstance {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    /// UV tiling in xy, zw unused.
    pub uv_scale: [f32; 4],
}

impl MeshInstance {
    pub const ATTRS: [wgpu::VertexAttribute; 9] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x4,
        10 => Float32x4,
        11 => Float32x4
    ];

    pub fn new(model: Mat4, normal: Mat4, uv_scale: Vec2) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
            uv_scale: [uv_scale.x, uv_scale.y, 0.0, 0.0],
        }
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// One camera-facing light quad, expanded in the vertex shader.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct BillboardInstance {
    /// World center, radius in w.
    pub center: [f32; 4],
    /// RGB color, intensity in w.
    pub color: [f32; 4],
}

impl BillboardInstance {
    pub const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x4,
        1 => Float32x4
    ];

    pub fn new(center: Vec3, radius: f32, color: Vec3, intensity: f32) -> Self {
        Self {
            center: [center.x, center.y, center.z, radius],
            color: [color.x, color.y, color.z, intensity],
        }
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BillboardInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Colored line-list vertex for the debug overlay.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct OverlayVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl OverlayVertex {
    pub const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x4
    ];

    pub fn new(position: Vec3, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            color,
        }
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OverlayVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}
