//! GPU side of a linked [`ShaderProgram`]: render pipeline, uniform buffers
//! and bind groups.

use std::{borrow::Cow, num::NonZeroU64};

use glam::Mat4;
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferDescriptor, BufferUsages, ColorTargetState,
    ColorWrites, CompareFunction, DepthBiasState, DepthStencilState, Device, ErrorFilter,
    FragmentState, PipelineLayoutDescriptor, Queue, RenderPass, RenderPipeline,
    RenderPipelineDescriptor, ShaderModuleDescriptor, ShaderSource, ShaderStages, StencilState,
    TextureFormat, VertexState,
};

use crate::{
    mesh::GpuMesh,
    shader::{ShaderError, ShaderProgram},
    uniforms::{Mat4Target, UniformBlock, UniformTable},
};

pub struct GpuProgram {
    pipeline: RenderPipeline,
    uniforms: UniformTable,
    buffers: Vec<(UniformBlock, Buffer)>,
    bind_groups: Vec<BindGroup>,
}

impl GpuProgram {
    /// Create the pipeline for `program` drawing `mesh`. GPU validation
    /// failures are reported as [`ShaderError::Link`].
    pub fn new(
        device: &Device,
        program: &ShaderProgram,
        mesh: &GpuMesh,
        color_format: TextureFormat,
        depth_format: TextureFormat,
    ) -> Result<Self, ShaderError> {
        let provided = mesh.enabled_locations();
        if let Some(missing) = program
            .vertex_input_locations()
            .into_iter()
            .find(|loc| !provided.contains(loc))
        {
            return Err(ShaderError::link(format!(
                "vertex input @location({missing}) has no mesh attribute bound to it"
            )));
        }

        device.push_error_scope(ErrorFilter::Validation);

        let vs_module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("vertex shader"),
            source: ShaderSource::Wgsl(Cow::Borrowed(program.vertex().source())),
        });
        let fs_module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("fragment shader"),
            source: ShaderSource::Wgsl(Cow::Borrowed(program.fragment().source())),
        });

        let uniforms = program.uniforms().clone();
        let buffers: Vec<(UniformBlock, Buffer)> = uniforms
            .blocks()
            .iter()
            .map(|block| {
                let buffer = device.create_buffer(&BufferDescriptor {
                    label: Some("uniform block"),
                    size: block.size,
                    usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (*block, buffer)
            })
            .collect();

        // Bind group indices must be dense; unused groups get empty layouts.
        let group_count = uniforms.max_group().map_or(0, |g| g + 1);
        let layouts: Vec<BindGroupLayout> = (0..group_count)
            .map(|group| {
                let entries: Vec<BindGroupLayoutEntry> = buffers
                    .iter()
                    .filter(|(b, _)| b.group == group)
                    .map(|(b, _)| BindGroupLayoutEntry {
                        binding: b.binding,
                        visibility: ShaderStages::VERTEX_FRAGMENT,
                        ty: BindingType::Buffer {
                            ty: BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: NonZeroU64::new(b.size),
                        },
                        count: None,
                    })
                    .collect();
                device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                    label: Some("uniform BGL"),
                    entries: &entries,
                })
            })
            .collect();

        let bind_groups: Vec<BindGroup> = layouts
            .iter()
            .enumerate()
            .map(|(group, layout)| {
                let entries: Vec<wgpu::BindGroupEntry<'_>> = buffers
                    .iter()
                    .filter(|(b, _)| b.group == group as u32)
                    .map(|(b, buf)| wgpu::BindGroupEntry {
                        binding: b.binding,
                        resource: buf.as_entire_binding(),
                    })
                    .collect();
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("uniform BG"),
                    layout,
                    entries: &entries,
                })
            })
            .collect();

        let layout_refs: Vec<&BindGroupLayout> = layouts.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("mesh PipelineLayout"),
            bind_group_layouts: &layout_refs,
            push_constant_ranges: &[],
        });

        let vertex_buffers = mesh.vertex_buffer_layouts();
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &vs_module,
                entry_point: Some(program.vertex_entry()),
                buffers: &vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &fs_module,
                entry_point: Some(program.fragment_entry()),
                targets: &[Some(ColorTargetState {
                    format: color_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: depth_format,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::link(err.to_string()));
        }
        log::info!(
            "Pipeline created: {} uniform block(s) in {} bind group(s)",
            buffers.len(),
            bind_groups.len()
        );

        Ok(Self {
            pipeline,
            uniforms,
            buffers,
            bind_groups,
        })
    }

    /// Upload a 4x4 matrix (column-major, untransposed) to the named uniform.
    /// Unknown names are ignored.
    pub fn set_uniform_mat4(&self, queue: &Queue, name: &str, value: &Mat4) {
        let (group, binding, offset) = match self.uniforms.resolve_mat4(name) {
            Mat4Target::Found {
                group,
                binding,
                offset,
            } => (group, binding, offset),
            Mat4Target::Missing => {
                log::debug!("Uniform '{name}' not found in program; ignoring");
                return;
            }
            Mat4Target::NotMat4 => {
                log::warn!("Uniform '{name}' is not a mat4x4<f32>; ignoring");
                return;
            }
        };
        let Some((_, buffer)) = self
            .buffers
            .iter()
            .find(|(b, _)| b.group == group && b.binding == binding)
        else {
            return;
        };
        queue.write_buffer(buffer, offset, bytemuck::bytes_of(&value.to_cols_array()));
        log::debug!("Uniform '{name}' set (@group({group}) @binding({binding}) +{offset})");
    }

    pub fn bind(&self, rpass: &mut RenderPass<'_>) {
        rpass.set_pipeline(&self.pipeline);
        for (group, bg) in self.bind_groups.iter().enumerate() {
            rpass.set_bind_group(group as u32, bg, &[]);
        }
    }
}
