use wgpu::util::DeviceExt;

use crate::mesh::MeshData;

/// Vertex and index buffers for one `MeshData`. The vertex buffer can be
/// rewritten in place as long as the vertex count is unchanged.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub vertex_count: usize,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Self {
        let vertices = mesh.vertices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            vertex_count: vertices.len(),
        }
    }

    pub fn update_vertices(&self, queue: &wgpu::Queue, mesh: &MeshData) -> Result<(), String> {
        if mesh.vertex_count() != self.vertex_count {
            return Err(format!(
                "Vertex count changed from {} to {}, mesh must be recreated",
                self.vertex_count,
                mesh.vertex_count()
            ));
        }
        let vertices = mesh.vertices();
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        Ok(())
    }
}
