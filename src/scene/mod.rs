//! Scene description: camera, global coefficients, shapes, and lights.
//!
//! Scenes are produced by [`load_scene`] or [`parse_scene`] and consumed by the
//! render pipeline. [`reload`] wraps loading with the renderer's recovery
//! rules: an empty path or a failed load leaves the current scene untouched.

mod data;
mod loader;

use std::path::Path;

pub use data::{CameraData, GlobalData, Light, LightKind, Material, RenderData, RenderShape};
pub use loader::{load_scene, parse_scene};

/// Replaces `current` with the scene at `path`.
///
/// Returns `true` if the scene was replaced. An empty path is a no-op and a
/// read or parse failure is logged; in both cases `current` is kept.
pub fn reload(current: &mut RenderData, path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        log::info!("No scene path configured; keeping the current scene");
        return false;
    }

    match load_scene(path) {
        Ok(scene) => {
            log::info!(
                "Loaded scene {} ({} shapes, {} lights)",
                path.display(),
                scene.shapes.len(),
                scene.lights.len()
            );
            *current = scene;
            true
        }
        Err(err) => {
            log::error!("{err}");
            false
        }
    }
}
