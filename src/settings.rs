use std::path::PathBuf;

use crate::tessellate::ShapeParams;

/// Runtime configuration for a renderer window.
///
/// Built with chained setters and handed to [`crate::run`]. Out-of-range shape
/// parameters are accepted here and clamped by [`Settings::shape_params`].
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub title: String,
    /// Scene file to load at startup. Empty means no scene.
    pub scene_path: PathBuf,
    pub shape_param1: i32,
    pub shape_param2: i32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub width: u32,
    pub height: u32,
    /// Where the snapshot key writes its image.
    pub snapshot_path: PathBuf,
    pub snapshot_width: u32,
    pub snapshot_height: u32,
    /// Directory searched for shader overrides before the built-in sources.
    pub shader_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "Lumen".to_string(),
            scene_path: PathBuf::new(),
            shape_param1: 1,
            shape_param2: 3,
            near_plane: 0.1,
            far_plane: 100.0,
            width: 800,
            height: 600,
            snapshot_path: PathBuf::from("snapshot.png"),
            snapshot_width: 1024,
            snapshot_height: 768,
            shader_dir: None,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn scene(mut self, path: impl Into<PathBuf>) -> Self {
        self.scene_path = path.into();
        self
    }

    pub fn shape_params(&self) -> ShapeParams {
        ShapeParams::new(self.shape_param1, self.shape_param2)
    }

    pub fn params(mut self, param1: i32, param2: i32) -> Self {
        self.shape_param1 = param1;
        self.shape_param2 = param2;
        self
    }

    pub fn clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near_plane = near;
        self.far_plane = far;
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }

    pub fn snapshot_size(mut self, width: u32, height: u32) -> Self {
        self.snapshot_width = width;
        self.snapshot_height = height;
        self
    }

    pub fn shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }
}
