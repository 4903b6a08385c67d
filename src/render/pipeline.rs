use std::path::{Path, PathBuf};

use image::RgbaImage;

use super::attachments::AttachmentSet;
use super::geometry_pass::GeometryPass;
use super::lighting_pass::{LightingPass, LightingUniforms};
use super::shapes::ShapeCache;
use super::snapshot;
use crate::camera::Camera;
use crate::error::SnapshotError;
use crate::gpu::GpuContext;
use crate::scene::RenderData;
use crate::tessellate::ShapeParams;

/// Why a frame was not drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameSkip {
    /// A shader program failed to build.
    MissingProgram,
    /// The attachment set could not be allocated at the current size.
    IncompleteAttachments,
    /// [`RenderPipeline::finish`] has released the GPU resources.
    Released,
}

struct Resources {
    geometry: GeometryPass,
    lighting: LightingPass,
    attachments: AttachmentSet,
    shapes: ShapeCache,
}

/// The deferred renderer: a geometry pass into an [`AttachmentSet`], then a
/// lighting pass onto the output.
///
/// Owns every GPU allocation it uses. [`RenderPipeline::finish`] releases them
/// early and may be called any number of times.
pub struct RenderPipeline {
    resources: Option<Resources>,
    shader_dir: Option<PathBuf>,
}

impl RenderPipeline {
    /// Builds both passes, tessellates every primitive with `params`, and sizes
    /// the G-buffer to the GPU's current surface.
    pub fn new(gpu: &GpuContext, params: ShapeParams, shader_dir: Option<&Path>) -> Self {
        let geometry = GeometryPass::new(gpu, shader_dir);
        let lighting = LightingPass::new(gpu, gpu.format(), shader_dir);
        let attachments = AttachmentSet::new(gpu, gpu.width(), gpu.height(), lighting.read_layout());
        let shapes = ShapeCache::new(gpu, params);

        Self {
            resources: Some(Resources {
                geometry,
                lighting,
                attachments,
                shapes,
            }),
            shader_dir: shader_dir.map(Path::to_path_buf),
        }
    }

    /// Retessellates every primitive. Takes effect from the next frame.
    pub fn update_params(&mut self, gpu: &GpuContext, params: ShapeParams) {
        if let Some(res) = &mut self.resources {
            res.shapes.update_params(gpu, params);
        }
    }

    /// Resizes the G-buffer to match the output. Zero or unchanged sizes are ignored.
    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        if let Some(res) = &mut self.resources {
            if res.attachments.resize(gpu, width, height) {
                log::info!("Resized G-buffer to {width}x{height}");
            }
        }
    }

    /// Recompiles both shader programs from their current sources.
    pub fn reload_shaders(&mut self, gpu: &GpuContext) {
        let dir = self.shader_dir.as_deref();
        if let Some(res) = &mut self.resources {
            res.geometry.reload_program(gpu, dir);
            res.lighting.reload_program(gpu, dir);
        }
    }

    pub fn attachments(&self) -> Option<&AttachmentSet> {
        self.resources.as_ref().map(|res| &res.attachments)
    }

    /// Renders one frame of `scene` seen through `camera` into `target`.
    pub fn render_frame(
        &mut self,
        gpu: &GpuContext,
        camera: &Camera,
        scene: &RenderData,
        target: &wgpu::TextureView,
    ) -> Result<(), FrameSkip> {
        let res = self.resources.as_mut().ok_or(FrameSkip::Released)?;
        Self::draw(gpu, res, None, camera, scene, target)
    }

    /// Runs both passes. `attachments` overrides the live G-buffer.
    fn draw(
        gpu: &GpuContext,
        res: &mut Resources,
        attachments: Option<&AttachmentSet>,
        camera: &Camera,
        scene: &RenderData,
        target: &wgpu::TextureView,
    ) -> Result<(), FrameSkip> {
        if !res.geometry.has_program() || !res.lighting.has_program() {
            return Err(FrameSkip::MissingProgram);
        }
        let attachments = attachments.unwrap_or(&res.attachments);
        if !attachments.is_complete() {
            return Err(FrameSkip::IncompleteAttachments);
        }

        res.geometry.prepare(gpu, camera, &scene.global, &scene.shapes);
        res.lighting.prepare(
            gpu,
            &LightingUniforms::new(camera.position(), &scene.global, &scene.lights),
        );

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        res.geometry
            .encode(&mut encoder, attachments, &res.shapes, &scene.shapes);
        res.lighting.encode(&mut encoder, attachments, target);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Renders `scene` offscreen at exactly `width` × `height` and returns the
    /// image with row 0 at the top.
    ///
    /// Uses a temporary G-buffer; the live one is left untouched. The camera's
    /// aspect ratio is adjusted to the snapshot size.
    pub fn capture(
        &mut self,
        gpu: &GpuContext,
        camera: &Camera,
        scene: &RenderData,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, SnapshotError> {
        if width == 0 || height == 0 {
            return Err(SnapshotError::EmptySize { width, height });
        }
        let res = self.resources.as_mut().ok_or(SnapshotError::Released)?;

        let attachments = AttachmentSet::new(gpu, width, height, res.lighting.read_layout());
        if !attachments.is_complete() {
            return Err(SnapshotError::IncompleteAttachments);
        }

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Snapshot Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut camera = camera.clone();
        camera.set_aspect(width as f32 / height as f32);

        Self::draw(gpu, res, Some(&attachments), &camera, scene, &view).map_err(|skip| match skip {
            FrameSkip::MissingProgram => SnapshotError::MissingProgram,
            FrameSkip::IncompleteAttachments => SnapshotError::IncompleteAttachments,
            FrameSkip::Released => SnapshotError::Released,
        })?;

        snapshot::read_texture(gpu, &texture)
    }

    /// Renders with [`RenderPipeline::capture`] and writes the image to `path`.
    pub fn snapshot(
        &mut self,
        gpu: &GpuContext,
        camera: &Camera,
        scene: &RenderData,
        width: u32,
        height: u32,
        path: &Path,
    ) -> Result<(), SnapshotError> {
        let image = self.capture(gpu, camera, scene, width, height)?;
        image.save(path)?;
        log::info!("Saved {width}x{height} snapshot to {}", path.display());
        Ok(())
    }

    /// Releases every GPU allocation. Later calls do nothing, and later frames
    /// are skipped.
    pub fn finish(&mut self) {
        if let Some(mut res) = self.resources.take() {
            res.shapes.release();
            res.attachments.release();
            log::info!("Released renderer resources");
        }
    }

    pub fn is_released(&self) -> bool {
        self.resources.is_none()
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::test_gpu;
    use crate::scene::parse_scene;

    const SCENE: &str = r#"{
        "camera": { "position": [0, 0, 3], "look": [0, 0, -1], "up": [0, 1, 0], "height_angle": 0.8 },
        "global": { "ka": 1.0, "kd": 1.0, "ks": 0.0 },
        "shapes": [ { "primitive": "sphere",
                      "material": { "diffuse": [1, 1, 1], "ambient": [0.2, 0.2, 0.2] } } ],
        "lights": [ { "type": "directional", "direction": [0, 0, -1] } ]
    }"#;

    const CLEAR: [u8; 4] = [0, 0, 0, 255];

    fn scene_camera(scene: &RenderData, aspect: f32) -> Camera {
        crate::app::scene_camera(&scene.camera, &crate::Settings::default(), aspect)
    }

    fn target(gpu: &GpuContext, size: u32) -> wgpu::Texture {
        gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: None,
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    /// Renders `json` on a real adapter at `width` × `height`.
    fn render(json: &str, width: u32, height: u32) -> RgbaImage {
        let gpu = test_gpu::hardware(width, height);
        let scene = parse_scene(json).unwrap();
        let camera = scene_camera(&scene, width as f32 / height as f32);
        let mut pipeline = RenderPipeline::new(&gpu, ShapeParams::new(8, 16), None);
        pipeline.capture(&gpu, &camera, &scene, width, height).unwrap()
    }

    #[test]
    fn snapshot_has_the_requested_size_and_leaves_the_live_gbuffer() {
        let gpu = test_gpu::noop(64, 48);
        let scene = parse_scene(SCENE).unwrap();
        let camera = scene_camera(&scene, 64.0 / 48.0);
        let mut pipeline = RenderPipeline::new(&gpu, ShapeParams::new(8, 16), None);

        let generation = pipeline.attachments().map(AttachmentSet::generation);
        let image = pipeline.capture(&gpu, &camera, &scene, 40, 30).unwrap();

        assert_eq!(image.dimensions(), (40, 30));
        assert_eq!(pipeline.attachments().map(AttachmentSet::generation), generation);
        assert_eq!(pipeline.attachments().map(|a| (a.width(), a.height())), Some((64, 48)));
    }

    #[test]
    fn snapshot_writes_a_png() {
        let gpu = test_gpu::noop(32, 32);
        let scene = parse_scene(SCENE).unwrap();
        let camera = scene_camera(&scene, 1.0);
        let mut pipeline = RenderPipeline::new(&gpu, ShapeParams::default(), None);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        pipeline
            .snapshot(&gpu, &camera, &scene, 24, 16, &path)
            .unwrap();

        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (24, 16));

        assert!(matches!(
            pipeline.capture(&gpu, &camera, &scene, 0, 16),
            Err(SnapshotError::EmptySize { .. })
        ));
    }

    #[test]
    fn resize_keeps_the_gbuffer_for_unchanged_sizes() {
        let gpu = test_gpu::noop(32, 24);
        let mut pipeline = RenderPipeline::new(&gpu, ShapeParams::default(), None);
        let generation = |p: &RenderPipeline| p.attachments().map(AttachmentSet::generation);

        pipeline.resize(&gpu, 32, 24);
        pipeline.resize(&gpu, 0, 0);
        assert_eq!(generation(&pipeline), Some(1));

        pipeline.resize(&gpu, 48, 24);
        assert_eq!(generation(&pipeline), Some(2));
    }

    #[test]
    fn finish_is_idempotent() {
        let gpu = test_gpu::noop(16, 16);
        let scene = parse_scene(SCENE).unwrap();
        let camera = scene_camera(&scene, 1.0);
        let mut pipeline = RenderPipeline::new(&gpu, ShapeParams::default(), None);

        let texture = target(&gpu, 16);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        assert_eq!(pipeline.render_frame(&gpu, &camera, &scene, &view), Ok(()));

        pipeline.finish();
        pipeline.finish();
        assert!(pipeline.is_released());
        assert!(pipeline.attachments().is_none());
        assert_eq!(
            pipeline.render_frame(&gpu, &camera, &scene, &view),
            Err(FrameSkip::Released)
        );
    }

    #[test]
    fn broken_shader_override_skips_frames() {
        let gpu = test_gpu::noop(16, 16);
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("geometry.wgsl"), "this is not wgsl").unwrap();
        std::fs::write(
            dir.path().join("lighting.wgsl"),
            super::super::lighting_pass::SHADER.load().unwrap().as_ref(),
        )
        .unwrap();

        let scene = parse_scene(SCENE).unwrap();
        let camera = scene_camera(&scene, 1.0);
        let mut pipeline = RenderPipeline::new(&gpu, ShapeParams::default(), Some(dir.path()));

        assert!(matches!(
            pipeline.capture(&gpu, &camera, &scene, 8, 8),
            Err(SnapshotError::MissingProgram)
        ));

        // Fixing the file and reloading brings frames back.
        std::fs::write(
            dir.path().join("geometry.wgsl"),
            super::super::geometry_pass::SHADER.load().unwrap().as_ref(),
        )
        .unwrap();
        pipeline.reload_shaders(&gpu);
        assert!(pipeline.capture(&gpu, &camera, &scene, 8, 8).is_ok());
    }

    #[test]
    #[ignore = "needs a graphics adapter"]
    fn lit_sphere_fills_the_center_only() {
        let image = render(SCENE, 40, 30);

        // The sphere faces the light head-on at the center; the corners are empty.
        let center = image.get_pixel(20, 15).0;
        assert!(center[0] > 200, "center {center:?} is not lit");
        assert_eq!(image.get_pixel(0, 0).0, CLEAR);
    }

    #[test]
    #[ignore = "needs a graphics adapter"]
    fn captured_rows_run_top_to_bottom() {
        let scene = r#"{
            "camera": { "position": [0, 0, 3], "look": [0, 0, -1], "up": [0, 1, 0], "height_angle": 0.8 },
            "global": { "ka": 0.0, "kd": 1.0, "ks": 0.0 },
            "shapes": [ { "primitive": "cube", "transform": { "translate": [0, 0.8, 0] },
                          "material": { "diffuse": [1, 1, 1] } } ],
            "lights": [ { "type": "directional", "direction": [0, 0, -1] } ]
        }"#;
        let image = render(scene, 32, 32);

        // The cube sits above the view axis, so it lands in the upper rows.
        let upper = image.get_pixel(16, 4).0;
        assert!(upper[0] > 200, "upper pixel {upper:?} is not lit");
        for y in 16..32 {
            for x in 0..32 {
                assert_eq!(image.get_pixel(x, y).0, CLEAR, "pixel ({x}, {y}) is covered");
            }
        }
    }

    #[test]
    #[ignore = "needs a graphics adapter"]
    fn mirrored_shape_shows_its_outside() {
        let scene = r#"{
            "camera": { "position": [0, 0, 3], "look": [0, 0, -1], "up": [0, 1, 0], "height_angle": 0.8 },
            "global": { "ka": 0.0, "kd": 1.0, "ks": 0.0 },
            "shapes": [ { "primitive": "cube", "transform": { "scale": [-1, 1, 1] },
                          "material": { "diffuse": [1, 1, 1] } } ],
            "lights": [ { "type": "directional", "direction": [0, 0, -1] } ]
        }"#;
        let image = render(scene, 32, 32);

        // Culling the wrong winding would leave the unlit inner back face here.
        let center = image.get_pixel(16, 16).0;
        assert!(center[0] > 200, "center {center:?} shows the inside of the cube");
    }

    #[test]
    #[ignore = "needs a graphics adapter"]
    fn tinted_ambient_reaches_the_output() {
        let scene = r#"{
            "camera": { "position": [0, 0, 3], "look": [0, 0, -1], "up": [0, 1, 0], "height_angle": 0.8 },
            "global": { "ka": 1.0, "kd": 1.0, "ks": 0.0 },
            "shapes": [ { "primitive": "sphere",
                          "material": { "diffuse": [1, 0, 0], "ambient": [0, 0, 1] } } ]
        }"#;
        let image = render(scene, 32, 32);

        let [r, g, b, _] = image.get_pixel(16, 16).0;
        assert_eq!((r, g), (0, 0));
        assert!(b > 200, "ambient blue lost: {:?}", (r, g, b));
    }
}
