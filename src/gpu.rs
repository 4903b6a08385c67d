//! Device, queue, and presentation surface.
//!
//! [`GpuContext`] holds the device, queue, and (when presenting to a window) the
//! surface with its configuration. Every render pass borrows it to create
//! resources and submit work.
//!
//! A context is created either from a winit window with [`GpuContext::new`], or
//! without any window with [`GpuContext::headless`] for offscreen rendering and
//! tests. A headless context still carries a `config` so passes can read the
//! color format and size from one place.

use std::sync::Arc;

use winit::window::Window;

use crate::error::GpuError;

/// Color format used when there is no surface to ask.
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// The wgpu handles every pass renders with.
///
/// Fields are public so passes can call wgpu directly.
pub struct GpuContext {
    /// The surface for presenting rendered frames, absent when headless.
    pub surface: Option<wgpu::Surface<'static>>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Output format and size. Kept up to date even without a surface.
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Create a GPU context presenting to `window`.
    ///
    /// Picks an sRGB surface format when one is offered and configures the
    /// surface for Fifo presentation.
    pub fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let instance = Self::instance();

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = Self::request_device(&adapter)?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::SurfaceUnsupported)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface: Some(surface),
            device,
            queue,
            config,
        })
    }

    /// Create a context with no window, rendering only to offscreen targets.
    pub fn headless(width: u32, height: u32) -> Result<Self, GpuError> {
        let instance = Self::instance();

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = Self::request_device(&adapter)?;
        Ok(Self::offscreen(device, queue, width, height))
    }

    /// Wraps an existing device for offscreen rendering at `width` × `height`.
    pub(crate) fn offscreen(device: wgpu::Device, queue: wgpu::Queue, width: u32, height: u32) -> Self {
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: HEADLESS_FORMAT,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        Self {
            surface: None,
            device,
            queue,
            config,
        }
    }

    // Every native backend, GL included, so software drivers can serve headless runs.
    fn instance() -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        })
    }

    pub(crate) fn device_descriptor() -> wgpu::DeviceDescriptor<'static> {
        wgpu::DeviceDescriptor {
            label: Some("Lumen Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }
    }

    fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue), GpuError> {
        let device = pollster::block_on(adapter.request_device(&Self::device_descriptor()))?;
        Ok(device)
    }

    /// Records the new output size and reconfigures the surface.
    ///
    /// Ignores zero-sized dimensions (a minimized window reports 0x0).
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.configure_surface();
        }
    }

    /// Reapplies the current configuration, e.g. after the surface was lost.
    pub fn configure_surface(&self) {
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
    }

    /// The color format the lighting pass writes.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Output width over height.
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }
}

#[cfg(test)]
pub(crate) mod test_gpu {
    use super::GpuContext;

    /// A context on wgpu's noop backend. It always exists and validates every
    /// call like a real device, but never executes shaders, so readbacks are
    /// all zeros.
    pub fn noop(width: u32, height: u32) -> GpuContext {
        let (device, queue) = wgpu::Device::noop(&GpuContext::device_descriptor());
        GpuContext::offscreen(device, queue, width, height)
    }

    /// A context on a real adapter, for tests that inspect rendered pixels.
    ///
    /// Those tests are `#[ignore]`d and run with `cargo test -- --ignored` on
    /// machines with a GPU or a software driver, so a missing adapter fails.
    pub fn hardware(width: u32, height: u32) -> GpuContext {
        GpuContext::headless(width, height).expect("no graphics adapter for an adapter-only test")
    }

    #[test]
    fn noop_context_reports_its_size() {
        let gpu = noop(40, 30);
        assert!(gpu.surface.is_none());
        assert_eq!((gpu.width(), gpu.height()), (40, 30));
        assert_eq!(gpu.format(), super::HEADLESS_FORMAT);
    }
}
