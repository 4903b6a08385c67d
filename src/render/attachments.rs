//! The G-buffer: four floating-point color targets plus depth.
//!
//! | Binding | Target   | rgb                      | a                 |
//! |---------|----------|--------------------------|-------------------|
//! | 0       | position | world position           | shininess         |
//! | 1       | normal   | world normal             | coverage (1 or 0) |
//! | 2       | albedo   | diffuse color            | specular strength |
//! | 3       | unlit    | emissive + ka × ambient  | unused            |

use crate::gpu::GpuContext;

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Number of color targets the geometry pass writes.
pub const COLOR_TARGETS: usize = 4;

const TARGET_NAMES: [&str; COLOR_TARGETS] = ["position", "normal", "albedo", "unlit"];

/// Bind group layout exposing the four color targets to the lighting pass.
///
/// Targets are read with `textureLoad`, so no sampler is bound.
pub fn read_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let entry = |binding: u32| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("G-Buffer Read Layout"),
        entries: &[entry(0), entry(1), entry(2), entry(3)],
    })
}

/// Whether a set of size `current` must be rebuilt to become `requested`.
///
/// Zero-sized requests (a minimized window) and unchanged sizes keep the
/// existing attachments.
pub fn needs_reallocation(current: (u32, u32), requested: (u32, u32)) -> bool {
    let (width, height) = requested;
    width != 0 && height != 0 && requested != current
}

struct Targets {
    color_views: [wgpu::TextureView; COLOR_TARGETS],
    depth_view: wgpu::TextureView,
    read_bind_group: wgpu::BindGroup,
    // Views keep their textures alive; held so dropping the set releases memory at once.
    _textures: Vec<wgpu::Texture>,
}

/// An owned G-buffer of a fixed size.
///
/// Creation can leave the set incomplete (zero size, a size beyond the device
/// limit, or an allocation error). An incomplete set draws nothing;
/// [`AttachmentSet::is_complete`] must be checked before use.
pub struct AttachmentSet {
    targets: Option<Targets>,
    read_layout: wgpu::BindGroupLayout,
    width: u32,
    height: u32,
    generation: u64,
}

impl AttachmentSet {
    /// Allocates all attachments at `width` × `height`.
    pub fn new(gpu: &GpuContext, width: u32, height: u32, read_layout: &wgpu::BindGroupLayout) -> Self {
        let mut set = Self {
            targets: None,
            read_layout: read_layout.clone(),
            width,
            height,
            generation: 0,
        };
        set.allocate(gpu);
        set
    }

    /// Reallocates every attachment at the new size.
    ///
    /// Does nothing, and returns `false`, when either dimension is zero or the
    /// size is unchanged.
    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) -> bool {
        if !needs_reallocation((self.width, self.height), (width, height)) {
            return false;
        }
        self.width = width;
        self.height = height;
        self.targets = None;
        self.allocate(gpu);
        true
    }

    fn allocate(&mut self, gpu: &GpuContext) {
        self.generation += 1;

        let max = gpu.device.limits().max_texture_dimension_2d;
        if self.width == 0 || self.height == 0 || self.width > max || self.height > max {
            log::error!(
                "G-buffer size {}x{} is outside 1..={max}; attachments left incomplete",
                self.width,
                self.height
            );
            return;
        }

        gpu.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let targets = self.create_targets(gpu);

        let validation = pollster::block_on(gpu.device.pop_error_scope());
        let oom = pollster::block_on(gpu.device.pop_error_scope());
        match validation.or(oom) {
            None => {
                log::debug!("Allocated G-buffer {}x{}", self.width, self.height);
                self.targets = Some(targets);
            }
            Some(err) => log::error!("G-buffer allocation failed: {err}"),
        }
    }

    fn create_targets(&self, gpu: &GpuContext) -> Targets {
        let size = wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        };
        let create = |label: &str, format: wgpu::TextureFormat, usage: wgpu::TextureUsages| {
            gpu.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
        };

        let color_textures = TARGET_NAMES.map(|name| {
            create(
                &format!("G-Buffer {name}"),
                COLOR_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            )
        });
        let depth_texture = create("G-Buffer depth", DEPTH_FORMAT, wgpu::TextureUsages::RENDER_ATTACHMENT);

        let color_views =
            std::array::from_fn(|i| color_textures[i].create_view(&wgpu::TextureViewDescriptor::default()));
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let read_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("G-Buffer Read Bind Group"),
            layout: &self.read_layout,
            entries: &std::array::from_fn::<_, COLOR_TARGETS, _>(|i| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: wgpu::BindingResource::TextureView(&color_views[i]),
            }),
        });

        let mut textures = color_textures.to_vec();
        textures.push(depth_texture);

        Targets {
            color_views,
            depth_view,
            read_bind_group,
            _textures: textures,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.targets.is_some()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Counts allocations, including the first. Unchanged by no-op resizes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Color and depth attachments for the geometry pass, cleared on load.
    ///
    /// Returns `None` when the set is incomplete.
    pub fn bind_for_writing(
        &self,
    ) -> Option<(
        [Option<wgpu::RenderPassColorAttachment<'_>>; COLOR_TARGETS],
        wgpu::RenderPassDepthStencilAttachment<'_>,
    )> {
        let targets = self.targets.as_ref()?;

        let colors = std::array::from_fn(|i| {
            Some(wgpu::RenderPassColorAttachment {
                view: &targets.color_views[i],
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })
        });
        let depth = wgpu::RenderPassDepthStencilAttachment {
            view: &targets.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        };

        Some((colors, depth))
    }

    /// The four color targets bound at 0..=3 for the lighting pass.
    pub fn bind_for_reading(&self) -> Option<&wgpu::BindGroup> {
        self.targets.as_ref().map(|t| &t.read_bind_group)
    }

    /// Drops every attachment. The set stays incomplete until resized.
    pub fn release(&mut self) {
        self.targets = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::test_gpu;

    #[test]
    fn reallocates_only_on_a_real_size_change() {
        assert!(!needs_reallocation((64, 48), (64, 48)));
        assert!(!needs_reallocation((64, 48), (0, 48)));
        assert!(!needs_reallocation((64, 48), (64, 0)));
        assert!(!needs_reallocation((0, 0), (0, 0)));
        assert!(needs_reallocation((64, 48), (32, 48)));
        assert!(needs_reallocation((0, 10), (10, 10)));
    }

    #[test]
    fn same_size_resize_is_a_no_op() {
        let gpu = test_gpu::noop(64, 64);
        let layout = read_layout(&gpu.device);
        let mut set = AttachmentSet::new(&gpu, 64, 48, &layout);
        assert!(set.is_complete());
        assert_eq!(set.generation(), 1);

        assert!(!set.resize(&gpu, 64, 48));
        assert!(!set.resize(&gpu, 64, 48));
        assert_eq!(set.generation(), 1);

        assert!(!set.resize(&gpu, 0, 48));
        assert_eq!((set.width(), set.height()), (64, 48));

        assert!(set.resize(&gpu, 32, 16));
        assert_eq!(set.generation(), 2);
        assert!(set.is_complete());
        assert!(set.bind_for_writing().is_some());
        assert!(set.bind_for_reading().is_some());
    }

    #[test]
    fn zero_size_set_is_incomplete() {
        let gpu = test_gpu::noop(8, 8);
        let layout = read_layout(&gpu.device);
        let mut set = AttachmentSet::new(&gpu, 0, 10, &layout);
        assert!(!set.is_complete());
        assert!(set.bind_for_writing().is_none());

        assert!(set.resize(&gpu, 10, 10));
        assert!(set.is_complete());

        set.release();
        assert!(!set.is_complete());
    }

    #[test]
    fn oversized_set_is_incomplete() {
        let gpu = test_gpu::noop(8, 8);
        let layout = read_layout(&gpu.device);
        let max = gpu.device.limits().max_texture_dimension_2d;

        let set = AttachmentSet::new(&gpu, max + 1, 4, &layout);
        assert!(!set.is_complete());
        assert_eq!(set.generation(), 1);
    }
}
