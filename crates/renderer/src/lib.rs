//! Renderer: wgpu context, mesh upload, shader program and per-frame draw.
//! wgpu = 26.x, winit = 0.30.x

pub mod attributes;
pub mod gpu;
pub mod mesh;
pub mod program;
pub mod shader;
pub mod uniforms;

use std::sync::Arc;

use anyhow::{Context, Result};
use asset::MeshData;
use glam::Mat4;
use wgpu::{Backends, SurfaceError};
use winit::window::Window;

pub use attributes::{AttributeBindings, MeshStream};
pub use gpu::GpuState;
pub use mesh::GpuMesh;
pub use program::GpuProgram;
pub use shader::{ShaderError, ShaderProgram, ShaderStage, build_program};

/// Everything one frame needs: GPU context, uploaded mesh, linked program.
pub struct Renderer {
    // Field order is drop order: GPU objects go before the device/surface.
    program: GpuProgram,
    mesh: GpuMesh,
    gpu: GpuState,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        backends: Backends,
        mesh: &MeshData,
        bindings: &AttributeBindings,
        program: &ShaderProgram,
    ) -> Result<Self> {
        let gpu = GpuState::new(window, backends).await?;
        let mesh = GpuMesh::upload(gpu.device(), mesh, bindings)?;
        log::info!(
            "Mesh uploaded: {} indices, texcoords={}, normals={}",
            mesh.index_count(),
            mesh.is_enabled(MeshStream::Texcoord),
            mesh.is_enabled(MeshStream::Normal)
        );

        let program = GpuProgram::new(
            gpu.device(),
            program,
            &mesh,
            gpu.surface_format(),
            gpu::DEPTH_FORMAT,
        )
        .inspect_err(|e| log::error!("{e}"))
        .context("Failed to create shader pipeline")?;

        Ok(Self { program, mesh, gpu })
    }

    /// Upload a 4x4 matrix to a named uniform; unknown names are a no-op.
    pub fn set_uniform_mat4(&self, name: &str, value: &Mat4) {
        self.program.set_uniform_mat4(self.gpu.queue(), name, value);
    }

    /// Render one frame: clear + one indexed draw.
    pub fn render(&mut self) -> Result<(), SurfaceError> {
        let (program, mesh) = (&self.program, &self.mesh);
        self.gpu.frame(|rpass| {
            program.bind(rpass);
            mesh.draw(rpass);
        })
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        GpuState::is_surface_lost(err)
    }

    pub fn recreate_surface(&mut self) {
        let (w, h) = self.gpu.size();
        log::warn!("Surface lost; reconfiguring at {w}x{h}");
        self.gpu.recreate_surface();
    }
}
