use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::Camera;
use crate::error::AppError;
use crate::frame::FrameController;
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::render::RenderPipeline;
use crate::scene::{self, CameraData, RenderData};
use crate::settings::Settings;

/// Builds the camera a scene asks for, projected for a target of `aspect`.
pub fn scene_camera(data: &CameraData, settings: &Settings, aspect: f32) -> Camera {
    let mut camera = Camera::new();
    camera.set_view_matrix(data.position, data.look, data.up);
    camera.set_projection_matrix(aspect, settings.near_plane, settings.far_plane, data.height_angle);
    camera
}

/// Change to `(param1, param2)` bound to `key`, if any.
fn param_step(key: KeyCode) -> Option<(i32, i32)> {
    match key {
        KeyCode::BracketLeft => Some((-1, 0)),
        KeyCode::BracketRight => Some((1, 0)),
        KeyCode::Minus => Some((0, -1)),
        KeyCode::Equal => Some((0, 1)),
        _ => None,
    }
}

const PARAM_KEYS: [KeyCode; 4] = [
    KeyCode::BracketLeft,
    KeyCode::BracketRight,
    KeyCode::Minus,
    KeyCode::Equal,
];

enum LumenApp {
    Pending {
        settings: Settings,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        pipeline: RenderPipeline,
        camera: Camera,
        scene: RenderData,
        input: Input,
        frames: FrameController,
        settings: Settings,
    },
    Failed(AppError),
}

impl LumenApp {
    fn start(settings: &Settings, event_loop: &ActiveEventLoop) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&settings.title)
            .with_inner_size(winit::dpi::LogicalSize::new(settings.width, settings.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;

        let mut scene = RenderData::default();
        scene::reload(&mut scene, &settings.scene_path);
        let camera = scene_camera(&scene.camera, settings, gpu.aspect());

        let pipeline = RenderPipeline::new(&gpu, settings.shape_params(), settings.shader_dir.as_deref());

        Ok(LumenApp::Running {
            window,
            gpu,
            pipeline,
            camera,
            scene,
            input: Input::new(),
            frames: FrameController::new(Instant::now()),
            settings: settings.clone(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        log::error!("{err}");
        if let LumenApp::Running { pipeline, .. } = self {
            pipeline.finish();
        }
        *self = LumenApp::Failed(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for LumenApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let LumenApp::Pending { settings } = self {
            match LumenApp::start(settings, event_loop) {
                Ok(running) => *self = running,
                Err(err) => self.fail(event_loop, err),
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let LumenApp::Running {
            window,
            gpu,
            pipeline,
            camera,
            scene,
            input,
            settings,
            ..
        } = self
        else {
            return;
        };

        if input.handle_event(&event) {
            window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => {
                pipeline.finish();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
                pipeline.resize(gpu, size.width, size.height);
                camera.set_aspect(gpu.aspect());
                window.request_redraw();
            }
            WindowEvent::KeyboardInput { .. } => {
                if input.key_pressed(KeyCode::Escape) {
                    pipeline.finish();
                    event_loop.exit();
                    return;
                }

                if input.key_pressed(KeyCode::KeyP) {
                    if let Err(err) = pipeline.snapshot(
                        gpu,
                        camera,
                        scene,
                        settings.snapshot_width,
                        settings.snapshot_height,
                        &settings.snapshot_path,
                    ) {
                        log::error!("Snapshot failed: {err}");
                    }
                }

                if input.key_pressed(KeyCode::KeyR) {
                    if scene::reload(scene, &settings.scene_path) {
                        *camera = scene_camera(&scene.camera, settings, gpu.aspect());
                    }
                    pipeline.reload_shaders(gpu);
                    window.request_redraw();
                }

                let (d1, d2) = PARAM_KEYS
                    .into_iter()
                    .filter(|&key| input.key_pressed(key))
                    .filter_map(param_step)
                    .fold((0, 0), |(a, b), (x, y)| (a + x, b + y));
                if (d1, d2) != (0, 0) {
                    let current = settings.shape_params();
                    settings.shape_param1 = current.param1() as i32 + d1;
                    settings.shape_param2 = current.param2() as i32 + d2;

                    let params = settings.shape_params();
                    pipeline.update_params(gpu, params);
                    log::info!("Shape parameters now {} x {}", params.param1(), params.param2());
                    window.request_redraw();
                }

                input.clear_pressed();
            }
            WindowEvent::RedrawRequested => {
                let Some(surface) = &gpu.surface else {
                    return;
                };

                let output = match surface.get_current_texture() {
                    Ok(output) => output,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        gpu.configure_surface();
                        window.request_redraw();
                        return;
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Surface out of memory; exiting");
                        pipeline.finish();
                        event_loop.exit();
                        return;
                    }
                    Err(err) => {
                        log::warn!("Skipping frame: {err}");
                        return;
                    }
                };

                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                if let Err(skip) = pipeline.render_frame(gpu, camera, scene, &view) {
                    log::warn!("Skipped frame: {skip:?}");
                }

                window.pre_present_notify();
                output.present();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let LumenApp::Running {
            window,
            camera,
            input,
            frames,
            ..
        } = self
        else {
            return;
        };

        if let Some(dt) = frames.poll(Instant::now()) {
            let drag = input.take_drag_delta();
            if frames.tick(dt, &input.movement(), drag, camera) {
                window.request_redraw();
            }
        }

        event_loop.set_control_flow(ControlFlow::WaitUntil(frames.next_deadline()));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let LumenApp::Running { pipeline, .. } = self {
            pipeline.finish();
        }
    }
}

/// Opens a window on `settings` and runs until it is closed.
///
/// # Example
/// ```no_run
/// lumen::run(
///     lumen::Settings::new()
///         .scene("scenes/demo.json")
///         .params(12, 24),
/// )
/// .unwrap();
/// ```
pub fn run(settings: Settings) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = LumenApp::Pending { settings };
    event_loop.run_app(&mut app)?;

    match app {
        LumenApp::Failed(err) => Err(err),
        _ => Ok(()),
    }
}

/// Renders the configured scene once into `settings.snapshot_path` without
/// opening a window.
pub fn render_headless(settings: &Settings) -> Result<(), AppError> {
    let gpu = GpuContext::headless(settings.snapshot_width, settings.snapshot_height)?;
    render_snapshot(&gpu, settings)
}

fn render_snapshot(gpu: &GpuContext, settings: &Settings) -> Result<(), AppError> {
    let (width, height) = (settings.snapshot_width, settings.snapshot_height);

    let mut scene = RenderData::default();
    scene::reload(&mut scene, &settings.scene_path);
    let camera = scene_camera(&scene.camera, settings, width as f32 / height.max(1) as f32);

    let mut pipeline = RenderPipeline::new(gpu, settings.shape_params(), settings.shader_dir.as_deref());
    let result = pipeline.snapshot(gpu, &camera, &scene, width, height, &settings.snapshot_path);
    pipeline.finish();

    Ok(result?)
}
