//! wgpu renderer for the viewer scene
//!
//! Owns the pipelines, uniform buffers, the spot light shadow map and a cache
//! of uploaded meshes. `prepare` runs inside egui's prepare stage and encodes
//! the shadow pass; `paint` draws into egui's render pass.

use super::config::GraphicsConfig;
use super::frame::{FramePacket, FrameUniforms, LineVertex, ObjectUniforms, Vertex};
use crate::scene::MeshData;
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::mem;
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

/// Uploaded vertex and index buffers for one `MeshData`
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, mesh: &MeshData) -> Self {
        let vertices = Vertex::interleave(mesh);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices().len() as u32,
        }
    }
}

pub struct MeshRenderer {
    config: GraphicsConfig,

    frame_buffer: wgpu::Buffer,
    /// Frame uniforms plus the shadow map, for the lit pass
    frame_bind_group: wgpu::BindGroup,
    /// Frame uniforms alone, for the shadow and line passes
    frame_only_bind_group: wgpu::BindGroup,

    object_layout: wgpu::BindGroupLayout,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_capacity: usize,
    object_stride: u64,

    shadow_view: wgpu::TextureView,

    mesh_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,

    meshes: HashMap<u64, GpuMesh>,
    line_buffer: Option<wgpu::Buffer>,
    line_capacity: usize,
    line_count: u32,
}

impl std::fmt::Debug for MeshRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshRenderer")
            .field("config", &self.config)
            .field("cached_meshes", &self.meshes.len())
            .field("object_capacity", &self.object_capacity)
            .field("line_count", &self.line_count)
            .finish()
    }
}

const INITIAL_OBJECT_CAPACITY: usize = 16;

/// Round `size` up to the device's dynamic offset alignment
fn aligned_stride(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

impl MeshRenderer {
    pub fn new(device: &wgpu::Device, config: GraphicsConfig) -> Self {
        info!(
            "Creating mesh renderer: target {:?}, shadow map {}px",
            config.texture_format, config.shadow_map_size
        );

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_uniform_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[
                frame_uniform_entry,
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let frame_only_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Only Bind Group Layout"),
            entries: &[frame_uniform_entry],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(mem::size_of::<ObjectUniforms>() as u64),
                },
                count: None,
            }],
        });

        let shadow_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Spot Shadow Map"),
            size: wgpu::Extent3d {
                width: config.shadow_map_size,
                height: config.shadow_map_size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: config.shadow_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let shadow_view = shadow_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                },
            ],
        });
        let frame_only_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Only Bind Group"),
            layout: &frame_only_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let object_stride = aligned_stride(
            mem::size_of::<ObjectUniforms>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let (object_buffer, object_bind_group) =
            Self::create_object_storage(device, &object_layout, object_stride, INITIAL_OBJECT_CAPACITY);

        let (mesh_pipeline, shadow_pipeline, line_pipeline) = Self::create_pipelines_with_device(
            device,
            &config,
            &frame_layout,
            &frame_only_layout,
            &object_layout,
        );

        Self {
            config,
            frame_buffer,
            frame_bind_group,
            frame_only_bind_group,
            object_layout,
            object_buffer,
            object_bind_group,
            object_capacity: INITIAL_OBJECT_CAPACITY,
            object_stride,
            shadow_view,
            mesh_pipeline,
            shadow_pipeline,
            line_pipeline,
            meshes: HashMap::new(),
            line_buffer: None,
            line_capacity: 0,
            line_count: 0,
        }
    }

    fn create_object_storage(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object Uniform Buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(mem::size_of::<ObjectUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_pipelines_with_device(
        device: &wgpu::Device,
        config: &GraphicsConfig,
        frame_layout: &wgpu::BindGroupLayout,
        frame_only_layout: &wgpu::BindGroupLayout,
        object_layout: &wgpu::BindGroupLayout,
    ) -> (wgpu::RenderPipeline, wgpu::RenderPipeline, wgpu::RenderPipeline) {
        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });
        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shadow.wgsl").into()),
        });
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[frame_layout, object_layout],
            push_constant_ranges: &[],
        });
        let shadow_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[frame_only_layout, object_layout],
            push_constant_ranges: &[],
        });
        let line_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[frame_only_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&mesh_layout),
            cache: None,
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(config.color_target_state())],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Imported meshes do not guarantee consistent winding
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(config.depth_stencil_state()),
            multisample: config.multisample_state(),
            multiview: None,
        });

        let shadow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&shadow_layout),
            cache: None,
            vertex: wgpu::VertexState {
                module: &shadow_shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: config.shadow_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Helper Line Pipeline"),
            layout: Some(&line_layout),
            cache: None,
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_main"),
                buffers: &[LineVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(config.color_target_state())],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(config.depth_stencil_state()),
            multisample: config.multisample_state(),
            multiview: None,
        });

        (mesh_pipeline, shadow_pipeline, line_pipeline)
    }

    fn object_offset(&self, index: usize) -> u32 {
        (self.object_stride * index as u64) as u32
    }

    /// Upload everything the packet references and encode the shadow pass
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        packet: &FramePacket,
    ) {
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&packet.frame));

        if packet.draws.len() > self.object_capacity {
            let capacity = packet.draws.len().next_power_of_two();
            debug!("Growing object uniform storage to {} slots", capacity);
            let (buffer, bind_group) =
                Self::create_object_storage(device, &self.object_layout, self.object_stride, capacity);
            self.object_buffer = buffer;
            self.object_bind_group = bind_group;
            self.object_capacity = capacity;
        }
        for (index, draw) in packet.draws.iter().enumerate() {
            queue.write_buffer(
                &self.object_buffer,
                self.object_offset(index) as u64,
                bytemuck::bytes_of(&draw.uniforms),
            );
        }

        let live: HashSet<u64> = packet.draws.iter().map(|d| d.mesh.id()).collect();
        self.meshes.retain(|id, _| live.contains(id));
        for draw in &packet.draws {
            self.meshes
                .entry(draw.mesh.id())
                .or_insert_with(|| GpuMesh::upload(device, &draw.mesh));
        }

        self.upload_lines(device, queue, &packet.lines);

        if packet.shadows_enabled {
            self.encode_shadow_pass(encoder, packet);
        }
    }

    fn upload_lines(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, lines: &[LineVertex]) {
        self.line_count = lines.len() as u32;
        if lines.is_empty() {
            return;
        }
        if lines.len() > self.line_capacity || self.line_buffer.is_none() {
            self.line_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Helper Line Buffer"),
                contents: bytemuck::cast_slice(lines),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            }));
            self.line_capacity = lines.len();
        } else if let Some(buffer) = &self.line_buffer {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(lines));
        }
    }

    fn encode_shadow_pass(&self, encoder: &mut wgpu::CommandEncoder, packet: &FramePacket) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Spot Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.shadow_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.shadow_pipeline);
        pass.set_bind_group(0, &self.frame_only_bind_group, &[]);
        for (index, draw) in packet.shadow_casters() {
            let Some(mesh) = self.meshes.get(&draw.mesh.id()) else { continue };
            pass.set_bind_group(1, &self.object_bind_group, &[self.object_offset(index)]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    /// Draw the lit meshes and helper lines into egui's pass
    pub fn paint(&self, render_pass: &mut wgpu::RenderPass<'static>, packet: &FramePacket) {
        render_pass.set_pipeline(&self.mesh_pipeline);
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
        for (index, draw) in packet.draws.iter().enumerate() {
            let Some(mesh) = self.meshes.get(&draw.mesh.id()) else { continue };
            render_pass.set_bind_group(1, &self.object_bind_group, &[self.object_offset(index)]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        if self.line_count > 0 {
            if let Some(buffer) = &self.line_buffer {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_bind_group(0, &self.frame_only_bind_group, &[]);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..self.line_count, 0..1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_stride_respects_alignment() {
        let size = mem::size_of::<ObjectUniforms>() as u64;
        assert_eq!(aligned_stride(size, 256), 256);
        assert_eq!(aligned_stride(size, 32), 160);
        assert_eq!(aligned_stride(257, 256), 512);
    }
}
