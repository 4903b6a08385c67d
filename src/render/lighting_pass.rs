//! Lighting pass: a full-screen quad shading the G-buffer into the output.

use std::path::Path;

use glam::Vec3;

use super::attachments::{self, AttachmentSet};
use super::shader::{ShaderSource, build_program};
use crate::gpu::GpuContext;
use crate::scene::{GlobalData, Light};

pub const SHADER: ShaderSource =
    ShaderSource::builtin("lighting.wgsl", include_str!("../shaders/lighting.wgsl"));

/// Most lights the lighting shader evaluates. Further scene lights are ignored.
pub const MAX_LIGHTS: usize = 8;

/// Color of pixels no shape covers.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub color: [f32; 4],
    pub attenuation: [f32; 4],
    /// Cone angle and penumbra in `x` and `y`.
    pub cone: [f32; 4],
    pub kind: u32,
    pub _pad: [u32; 3],
}

impl From<&Light> for LightUniform {
    fn from(light: &Light) -> Self {
        Self {
            position: light.position.extend(1.0).to_array(),
            direction: light.direction.extend(0.0).to_array(),
            color: light.color.extend(1.0).to_array(),
            attenuation: light.attenuation.extend(0.0).to_array(),
            cone: [light.angle, light.penumbra, 0.0, 0.0],
            kind: light.kind.code(),
            _pad: [0; 3],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniforms {
    pub camera_position: [f32; 4],
    /// `ka`, `kd`, `ks`.
    pub coefficients: [f32; 4],
    pub light_count: u32,
    pub _pad: [u32; 3],
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl LightingUniforms {
    /// Packs the first [`MAX_LIGHTS`] lights of the scene.
    pub fn new(camera_position: Vec3, global: &GlobalData, lights: &[Light]) -> Self {
        let count = lights.len().min(MAX_LIGHTS);
        if lights.len() > MAX_LIGHTS {
            log::debug!("Scene has {} lights; shading with the first {MAX_LIGHTS}", lights.len());
        }

        let mut packed = [LightUniform::default(); MAX_LIGHTS];
        for (slot, light) in packed.iter_mut().zip(lights) {
            *slot = light.into();
        }

        Self {
            camera_position: camera_position.extend(1.0).to_array(),
            coefficients: [global.ka, global.kd, global.ks, 0.0],
            light_count: count as u32,
            _pad: [0; 3],
            lights: packed,
        }
    }
}

/// Shades an [`AttachmentSet`] onto a color target.
pub struct LightingPass {
    program: Option<wgpu::RenderPipeline>,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    read_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
}

impl LightingPass {
    /// Builds the pass for output targets of `format`.
    pub fn new(gpu: &GpuContext, format: wgpu::TextureFormat, shader_dir: Option<&Path>) -> Self {
        let device = &gpu.device;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lighting Uniforms"),
            size: std::mem::size_of::<LightingUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lighting Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lighting Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let read_layout = attachments::read_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lighting Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &read_layout],
            push_constant_ranges: &[],
        });

        let mut pass = Self {
            program: None,
            uniform_buffer,
            uniform_bind_group,
            read_layout,
            pipeline_layout,
            format,
        };
        pass.reload_program(gpu, shader_dir);
        pass
    }

    pub fn reload_program(&mut self, gpu: &GpuContext, shader_dir: Option<&Path>) {
        let source = SHADER.with_override_dir(shader_dir);
        let layout = &self.pipeline_layout;
        let format = self.format;

        self.program = build_program(&gpu.device, "Lighting Shader", &source, |module| {
            gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Lighting Pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        });
    }

    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    /// The layout an [`AttachmentSet`] must use to be readable by this pass.
    pub fn read_layout(&self) -> &wgpu::BindGroupLayout {
        &self.read_layout
    }

    pub fn prepare(&self, gpu: &GpuContext, uniforms: &LightingUniforms) {
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Records the pass: clears `target`, then draws the two-triangle quad.
    ///
    /// Returns `false` without recording anything when the program or the
    /// attachments are unavailable.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        attachments: &AttachmentSet,
        target: &wgpu::TextureView,
    ) -> bool {
        let Some(pipeline) = &self.program else {
            return false;
        };
        let Some(gbuffer) = attachments.bind_for_reading() else {
            return false;
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Lighting Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, gbuffer, &[]);
        render_pass.draw(0..6, 0..1);

        true
    }
}
