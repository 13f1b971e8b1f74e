use crate::scene::picking::Aabb;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::mem;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[inline]
pub fn v(pos: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex { pos, normal, uv }
}

/// CPU-side mesh, kept around long enough to compute bounds and upload.
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Picking bounds. Flat meshes get a thin slab instead of a zero-volume
    /// box so rays can still hit them.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|vert| Vec3::from(vert.pos))).inflated(0.01)
    }
}

/// Vertex and index buffers resident on the device.
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl Mesh {
    pub fn from_data(device: &wgpu::Device, data: &MeshData, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vertices")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} indices")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }
}

/// Unit cube centered on the origin.
pub fn cube_data() -> MeshData {
    let p = |x, y, z| [x, y, z];

    let vertices = vec![
        // Right face (+X)
        v(p(0.5, -0.5, -0.5), [1.0, 0.0, 0.0], [0.0, 1.0]),
        v(p(0.5, 0.5, -0.5), [1.0, 0.0, 0.0], [0.0, 0.0]),
        v(p(0.5, 0.5, 0.5), [1.0, 0.0, 0.0], [1.0, 0.0]),
        v(p(0.5, -0.5, 0.5), [1.0, 0.0, 0.0], [1.0, 1.0]),
        // Left face (-X)
        v(p(-0.5, -0.5, 0.5), [-1.0, 0.0, 0.0], [0.0, 1.0]),
        v(p(-0.5, 0.5, 0.5), [-1.0, 0.0, 0.0], [0.0, 0.0]),
        v(p(-0.5, 0.5, -0.5), [-1.0, 0.0, 0.0], [1.0, 0.0]),
        v(p(-0.5, -0.5, -0.5), [-1.0, 0.0, 0.0], [1.0, 1.0]),
        // Top face (+Y)
        v(p(-0.5, 0.5, -0.5), [0.0, 1.0, 0.0], [0.0, 1.0]),
        v(p(-0.5, 0.5, 0.5), [0.0, 1.0, 0.0], [0.0, 0.0]),
        v(p(0.5, 0.5, 0.5), [0.0, 1.0, 0.0], [1.0, 0.0]),
        v(p(0.5, 0.5, -0.5), [0.0, 1.0, 0.0], [1.0, 1.0]),
        // Bottom face (-Y)
        v(p(-0.5, -0.5, 0.5), [0.0, -1.0, 0.0], [0.0, 1.0]),
        v(p(-0.5, -0.5, -0.5), [0.0, -1.0, 0.0], [0.0, 0.0]),
        v(p(0.5, -0.5, -0.5), [0.0, -1.0, 0.0], [1.0, 0.0]),
        v(p(0.5, -0.5, 0.5), [0.0, -1.0, 0.0], [1.0, 1.0]),
        // Front face (+Z)
        v(p(0.5, -0.5, 0.5), [0.0, 0.0, 1.0], [0.0, 1.0]),
        v(p(0.5, 0.5, 0.5), [0.0, 0.0, 1.0], [0.0, 0.0]),
        v(p(-0.5, 0.5, 0.5), [0.0, 0.0, 1.0], [1.0, 0.0]),
        v(p(-0.5, -0.5, 0.5), [0.0, 0.0, 1.0], [1.0, 1.0]),
        // Back face (-Z)
        v(p(-0.5, -0.5, -0.5), [0.0, 0.0, -1.0], [0.0, 1.0]),
        v(p(-0.5, 0.5, -0.5), [0.0, 0.0, -1.0], [0.0, 0.0]),
        v(p(0.5, 0.5, -0.5), [0.0, 0.0, -1.0], [1.0, 0.0]),
        v(p(0.5, -0.5, -0.5), [0.0, 0.0, -1.0], [1.0, 1.0]),
    ];

    let mut indices = Vec::with_capacity(36);
    for face in 0..6u32 {
        let base = face * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData { vertices, indices }
}

/// Unit quad in the XZ plane with the normal facing up (-Y in this engine's
/// y-down world).
pub fn plane_data() -> MeshData {
    let n = [0.0, -1.0, 0.0];
    let vertices = vec![
        v([-0.5, 0.0, -0.5], n, [0.0, 1.0]),
        v([-0.5, 0.0, 0.5], n, [0.0, 0.0]),
        v([0.5, 0.0, 0.5], n, [1.0, 0.0]),
        v([0.5, 0.0, -0.5], n, [1.0, 1.0]),
    ];
    let indices = vec![0, 2, 1, 0, 3, 2];
    MeshData { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_stride_matches_struct_size() {
        assert_eq!(
            Vertex::layout().array_stride,
            std::mem::size_of::<Vertex>() as wgpu::BufferAddress
        );
    }

    #[test]
    fn cube_spans_unit_box() {
        let data = cube_data();
        assert_eq!(data.indices.len(), 36);
        let bounds = data.bounds();
        assert!(bounds.min.abs_diff_eq(Vec3::splat(-0.5), 1e-6));
        assert!(bounds.max.abs_diff_eq(Vec3::splat(0.5), 1e-6));
    }

    #[test]
    fn plane_bounds_are_inflated_on_the_flat_axis() {
        let bounds = plane_data().bounds();
        assert!(bounds.max.y > bounds.min.y);
        assert!(bounds.max.y - bounds.min.y <= 0.02 + 1e-6);
    }

    #[test]
    fn indices_stay_in_range() {
        for data in [cube_data(), plane_data()] {
            let count = data.vertices.len() as u32;
            assert!(data.indices.iter().all(|&i| i < count));
        }
    }
}
