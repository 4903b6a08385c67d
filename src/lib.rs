//! # Lumen
//!
//! **A deferred Phong renderer for tessellated parametric solids.**
//!
//! Scenes are JSON files listing cubes, cones, cylinders, and spheres with a
//! transform and material each, plus up to eight point, directional, or spot
//! lights. Every frame draws the shapes into a G-buffer, then shades it in a
//! single full-screen lighting pass.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lumen::Settings;
//!
//! fn main() -> Result<(), lumen::AppError> {
//!     lumen::init_logging(lumen::LoggingConfig::default());
//!     lumen::run(
//!         Settings::new()
//!             .title("Lumen")
//!             .scene("scenes/demo.json")
//!             .params(10, 24),
//!     )
//! }
//! ```
//!
//! ## Controls
//!
//! | Input            | Action                                   |
//! |------------------|------------------------------------------|
//! | W / A / S / D    | Move along the level forward/right axes  |
//! | Space / Ctrl     | Move up / down                           |
//! | Left drag        | Look around                              |
//! | `[` / `]`        | Lower / raise the first shape parameter  |
//! | `-` / `=`        | Lower / raise the second shape parameter |
//! | P                | Save a snapshot                          |
//! | R                | Reload the scene and shaders             |
//! | Escape           | Quit                                     |
//!
//! Without a window, [`render_headless`] renders one snapshot, and
//! [`RenderPipeline::capture`] returns the image directly.

mod app;
mod camera;
mod error;
mod frame;
mod gpu;
mod input;
mod logging;
mod mesh;
pub mod render;
pub mod scene;
mod settings;
pub mod tessellate;

pub use app::{render_headless, run, scene_camera};
pub use camera::Camera;
pub use error::{AppError, GpuError, SceneError, SnapshotError};
pub use frame::{FrameController, TICK_HZ};
pub use gpu::GpuContext;
pub use input::{Input, MovementKeys};
pub use logging::{LoggingConfig, init_logging};
pub use mesh::{Mesh, MeshBuffer, Transform, Vertex};
pub use render::{AttachmentSet, FrameSkip, MAX_LIGHTS, RenderPipeline};
pub use scene::{
    CameraData, GlobalData, Light, LightKind, Material, RenderData, RenderShape, load_scene,
    parse_scene,
};
pub use settings::Settings;
pub use tessellate::{PrimitiveKind, ShapeParams};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec3};
