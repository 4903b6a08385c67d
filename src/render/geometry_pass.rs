//! Geometry pass: rasterizes every shape into the G-buffer.
//!
//! Bind groups:
//! - **Group 0**: camera uniforms, written once per frame
//! - **Group 1**: shape uniforms, one 256-byte-aligned slot per shape selected
//!   with a dynamic offset

use std::path::Path;

use glam::{Mat4, Vec4};

use super::attachments::{AttachmentSet, COLOR_FORMAT, COLOR_TARGETS, DEPTH_FORMAT};
use super::shader::{ShaderSource, build_program};
use super::shapes::ShapeCache;
use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::mesh::Vertex;
use crate::scene::{GlobalData, Material, RenderShape};

pub const SHADER: ShaderSource =
    ShaderSource::builtin("geometry.wgsl", include_str!("../shaders/geometry.wgsl"));

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
}

impl CameraUniforms {
    pub fn new(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            position: camera.position().extend(1.0).to_array(),
        }
    }
}

/// Per-shape transform and material, laid out as the G-buffer expects it.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShapeUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`, for normals.
    pub normal_matrix: [[f32; 4]; 4],
    /// Diffuse color with the specular strength in `a`.
    pub albedo: [f32; 4],
    /// Light-independent color: emissive plus `ka` times ambient. `a` is unused.
    pub unlit: [f32; 4],
    /// `x` holds the shininess exponent.
    pub params: [f32; 4],
}

impl ShapeUniforms {
    pub fn new(shape: &RenderShape, global: &GlobalData) -> Self {
        let Material {
            ambient,
            diffuse,
            specular,
            shininess,
            emissive,
        } = shape.material;

        Self {
            model: shape.ctm.to_cols_array_2d(),
            normal_matrix: normal_matrix(shape.ctm).to_cols_array_2d(),
            albedo: diffuse.extend(specular.max_element()).to_array(),
            unlit: (emissive + global.ka * ambient).extend(0.0).to_array(),
            params: Vec4::new(shininess, 0.0, 0.0, 0.0).to_array(),
        }
    }
}

/// Whether `model` mirrors geometry, which reverses triangle winding.
pub fn is_mirrored(model: Mat4) -> bool {
    model.determinant() < 0.0
}

/// Inverse transpose of `model`, or `model` itself when it is singular.
fn normal_matrix(model: Mat4) -> Mat4 {
    if model.determinant().abs() <= f32::EPSILON {
        model
    } else {
        model.inverse().transpose()
    }
}

/// A uniform buffer holding one [`ShapeUniforms`] slot per shape.
struct ShapeUniformBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

impl ShapeUniformBuffer {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, stride: u64, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shape Uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shape Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ShapeUniforms>() as u64),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }
}

/// Round `size` up to a multiple of `alignment`.
pub(crate) fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

struct Program {
    pipeline: wgpu::RenderPipeline,
    /// Same program with the front face flipped, for mirrored transforms.
    mirrored: wgpu::RenderPipeline,
}

impl Program {
    fn for_transform(&self, model: Mat4) -> &wgpu::RenderPipeline {
        if is_mirrored(model) { &self.mirrored } else { &self.pipeline }
    }
}

/// Draws shapes into an [`AttachmentSet`].
pub struct GeometryPass {
    program: Option<Program>,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    shape_layout: wgpu::BindGroupLayout,
    shapes: ShapeUniformBuffer,
    pipeline_layout: wgpu::PipelineLayout,
}

impl GeometryPass {
    pub fn new(gpu: &GpuContext, shader_dir: Option<&Path>) -> Self {
        let device = &gpu.device;

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Geometry Camera Uniforms"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Geometry Camera Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Geometry Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let shape_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shape Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<ShapeUniforms>() as u64),
                },
                count: None,
            }],
        });

        let stride = align_to(
            std::mem::size_of::<ShapeUniforms>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let shapes = ShapeUniformBuffer::new(device, &shape_layout, stride, 16);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Geometry Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &shape_layout],
            push_constant_ranges: &[],
        });

        let mut pass = Self {
            program: None,
            camera_buffer,
            camera_bind_group,
            shape_layout,
            shapes,
            pipeline_layout,
        };
        pass.reload_program(gpu, shader_dir);
        pass
    }

    /// Recompiles the geometry program. A failed build leaves the pass without
    /// a program, and frames are skipped until a later build succeeds.
    pub fn reload_program(&mut self, gpu: &GpuContext, shader_dir: Option<&Path>) {
        let source = SHADER.with_override_dir(shader_dir);
        let layout = &self.pipeline_layout;

        self.program = build_program(&gpu.device, "Geometry Shader", &source, |module| {
            let targets: [Option<wgpu::ColorTargetState>; COLOR_TARGETS] = std::array::from_fn(|_| {
                Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            });

            let create = |label: &str, front_face: wgpu::FrontFace| {
                gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(label),
                    layout: Some(layout),
                    vertex: wgpu::VertexState {
                        module,
                        entry_point: Some("vs"),
                        buffers: &[Vertex::LAYOUT],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module,
                        entry_point: Some("fs"),
                        targets: &targets,
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        cull_mode: Some(wgpu::Face::Back),
                        front_face,
                        ..Default::default()
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DEPTH_FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Less,
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                })
            };

            Program {
                pipeline: create("Geometry Pipeline", wgpu::FrontFace::Ccw),
                mirrored: create("Geometry Pipeline (mirrored)", wgpu::FrontFace::Cw),
            }
        });
    }

    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    /// Uploads the camera and every shape's uniforms for the next draw.
    pub fn prepare(&mut self, gpu: &GpuContext, camera: &Camera, global: &GlobalData, shapes: &[RenderShape]) {
        gpu.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&CameraUniforms::new(camera)));

        if shapes.len() > self.shapes.capacity {
            let capacity = shapes.len().next_power_of_two();
            log::debug!("Growing shape uniform buffer to {capacity} slots");
            self.shapes = ShapeUniformBuffer::new(&gpu.device, &self.shape_layout, self.shapes.stride, capacity);
        }

        if shapes.is_empty() {
            return;
        }

        let stride = self.shapes.stride as usize;
        let mut bytes = vec![0u8; stride * shapes.len()];
        for (slot, shape) in bytes.chunks_exact_mut(stride).zip(shapes) {
            let uniforms = ShapeUniforms::new(shape, global);
            slot[..std::mem::size_of::<ShapeUniforms>()].copy_from_slice(bytemuck::bytes_of(&uniforms));
        }
        gpu.queue.write_buffer(&self.shapes.buffer, 0, &bytes);
    }

    /// Records the pass into `encoder`: clears every target, then draws each
    /// shape whose primitive has a mesh.
    ///
    /// Returns `false` without recording anything when the program or the
    /// attachments are unavailable.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        attachments: &AttachmentSet,
        meshes: &ShapeCache,
        shapes: &[RenderShape],
    ) -> bool {
        let Some(program) = &self.program else {
            return false;
        };
        let Some((colors, depth)) = attachments.bind_for_writing() else {
            return false;
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Geometry Pass"),
            color_attachments: &colors,
            depth_stencil_attachment: Some(depth),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        for (i, shape) in shapes.iter().enumerate() {
            let Some(mesh) = meshes.get(shape.primitive) else {
                continue;
            };
            render_pass.set_pipeline(program.for_transform(shape.ctm));
            let offset = (i as u64 * self.shapes.stride) as u32;
            render_pass.set_bind_group(1, &self.shapes.bind_group, &[offset]);
            mesh.draw(&mut render_pass);
        }

        true
    }
}
