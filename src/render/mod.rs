//! Deferred Phong rendering.
//!
//! Each frame runs two passes in order:
//!
//! 1. [`GeometryPass`] draws every shape into the [`AttachmentSet`] (G-buffer),
//!    writing world position, normal, and material terms per pixel.
//! 2. [`LightingPass`] draws a full-screen quad that reads the G-buffer and
//!    shades each covered pixel with up to [`MAX_LIGHTS`] lights.
//!
//! [`RenderPipeline`] owns both passes, the G-buffer, and the tessellated
//! meshes, and is the only type most callers need.

pub mod attachments;
mod geometry_pass;
mod lighting_pass;
mod pipeline;
pub mod shader;
mod shapes;
pub mod snapshot;

pub use attachments::AttachmentSet;
pub use geometry_pass::{CameraUniforms, GeometryPass, ShapeUniforms};
pub use lighting_pass::{CLEAR_COLOR, LightUniform, LightingPass, LightingUniforms, MAX_LIGHTS};
pub use pipeline::{FrameSkip, RenderPipeline};
pub use shapes::ShapeCache;
