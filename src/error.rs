//! Error types for each fallible concern of the renderer.
//!
//! Frame-time problems (a missing shader program, an incomplete attachment set)
//! are not errors here: they are logged and the frame is skipped. These types
//! cover the operations a caller can act on.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while bringing up the GPU.
#[derive(Error, Debug)]
pub enum GpuError {
    /// No adapter matched the request.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to create a device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// The window could not back a surface.
    #[error("Failed to create surface: {0}")]
    SurfaceCreateFailed(#[from] wgpu::CreateSurfaceError),

    /// The surface exposes no configuration for this adapter.
    #[error("Surface is not supported by the selected adapter")]
    SurfaceUnsupported,
}

/// Failures while loading a scene description.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The scene file could not be read.
    #[error("Failed to read scene {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scene file is not valid scene JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The scene parsed but describes something that cannot be rendered.
    #[error("Invalid scene: {0}")]
    Invalid(String),
}

/// Failures while exporting a snapshot image.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Width or height was zero.
    #[error("Snapshot size {width}x{height} is empty")]
    EmptySize { width: u32, height: u32 },

    /// The offscreen attachment set could not be allocated.
    #[error("Offscreen attachments are incomplete")]
    IncompleteAttachments,

    /// A required shader program failed to compile.
    #[error("Render programs are unavailable")]
    MissingProgram,

    /// The pipeline has already been torn down.
    #[error("Renderer has been released")]
    Released,

    /// Reading the rendered texture back from the GPU failed.
    #[error("GPU readback failed: {0}")]
    Readback(String),

    /// The color format cannot be written as an 8-bit RGBA image.
    #[error("Unsupported snapshot format {0:?}")]
    UnsupportedFormat(wgpu::TextureFormat),

    /// Encoding or writing the image file failed.
    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

/// Failures that stop the renderer from running at all.
#[derive(Error, Debug)]
pub enum AppError {
    /// The platform event loop could not start or exited abnormally.
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The window could not be created.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
