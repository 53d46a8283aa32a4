//! GPU upload of a [`MeshData`]: one vertex buffer per enabled stream plus a
//! `u32` index buffer.

use anyhow::{Context, Result};
use asset::MeshData;
use wgpu::{
    Buffer, BufferUsages, Device, IndexFormat, RenderPass, VertexAttribute, VertexBufferLayout,
    VertexStepMode, util::DeviceExt,
};

use crate::attributes::{AttributeBindings, AttributeLayout, MeshStream};

struct VertexStream {
    stream: MeshStream,
    buffer: Buffer,
    attribute: [VertexAttribute; 1],
    stride: u64,
}

/// Vertex/index buffers of the uploaded mesh. Streams are bound to
/// consecutive vertex buffer slots in position, texcoord, normal order.
pub struct GpuMesh {
    streams: Vec<VertexStream>,
    index_buf: Buffer,
    index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &Device, mesh: &MeshData, bindings: &AttributeBindings) -> Result<Self> {
        mesh.validate().context("Refusing to upload inconsistent mesh")?;
        let index_count =
            u32::try_from(mesh.indices.len()).context("Too many indices for one draw call")?;

        let layout = AttributeLayout::for_mesh(mesh, bindings);
        let streams = layout
            .iter()
            .map(|enabled| {
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(enabled.stream.label()),
                    contents: bytemuck::cast_slice(enabled.data),
                    usage: BufferUsages::VERTEX,
                });
                log::debug!(
                    "Uploaded {} stream: {} floats at @location({})",
                    enabled.stream.label(),
                    enabled.data.len(),
                    enabled.attribute.shader_location
                );
                VertexStream {
                    stream: enabled.stream,
                    buffer,
                    attribute: [enabled.attribute],
                    stride: enabled.stride(),
                }
            })
            .collect();

        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("index"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: BufferUsages::INDEX,
        });

        Ok(Self {
            streams,
            index_buf,
            index_count,
        })
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn is_enabled(&self, stream: MeshStream) -> bool {
        self.streams.iter().any(|s| s.stream == stream)
    }

    /// Shader locations fed by this mesh.
    pub fn enabled_locations(&self) -> Vec<u32> {
        self.streams
            .iter()
            .map(|s| s.attribute[0].shader_location)
            .collect()
    }

    /// Pipeline vertex layouts, in the slot order used by [`draw`](Self::draw).
    pub fn vertex_buffer_layouts(&self) -> Vec<VertexBufferLayout<'_>> {
        self.streams
            .iter()
            .map(|s| VertexBufferLayout {
                array_stride: s.stride,
                step_mode: VertexStepMode::Vertex,
                attributes: &s.attribute,
            })
            .collect()
    }

    /// Bind buffers and issue the indexed draw.
    pub fn draw(&self, rpass: &mut RenderPass<'_>) {
        // Zero-sized buffers cannot be sliced.
        if self.index_count == 0 {
            return;
        }
        for (slot, s) in self.streams.iter().enumerate() {
            rpass.set_vertex_buffer(slot as u32, s.buffer.slice(..));
        }
        rpass.set_index_buffer(self.index_buf.slice(..), IndexFormat::Uint32);
        rpass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
