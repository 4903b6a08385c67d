use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use lumen::{LoggingConfig, Settings, init_logging};

/// Deferred Phong renderer for cubes, cones, cylinders and spheres.
#[derive(Parser, Debug)]
#[command(name = "lumen", version, about)]
struct Cli {
    /// Scene description (JSON). Without one the view starts empty.
    scene: Option<PathBuf>,

    /// First tessellation parameter.
    #[arg(long, default_value_t = 1)]
    param1: i32,

    /// Second tessellation parameter.
    #[arg(long, default_value_t = 3)]
    param2: i32,

    #[arg(long, default_value_t = 0.1)]
    near: f32,

    #[arg(long, default_value_t = 100.0)]
    far: f32,

    /// Window width in logical pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Window height in logical pixels.
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Where P (or --headless) writes the snapshot.
    #[arg(long, default_value = "snapshot.png")]
    snapshot: PathBuf,

    /// Snapshot resolution, e.g. 1920x1080.
    #[arg(long, value_parser = parse_size, default_value = "1024x768")]
    snapshot_size: (u32, u32),

    /// Directory whose geometry.wgsl / lighting.wgsl override the built-in shaders.
    #[arg(long)]
    shader_dir: Option<PathBuf>,

    /// Render one snapshot without opening a window, then exit.
    #[arg(long)]
    headless: bool,
}

fn parse_size(value: &str) -> Result<(u32, u32)> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .with_context(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let width: u32 = w.trim().parse().context("invalid width")?;
    let height: u32 = h.trim().parse().context("invalid height")?;
    if width == 0 || height == 0 {
        bail!("snapshot size must be non-zero, got {width}x{height}");
    }
    Ok((width, height))
}

impl Cli {
    fn settings(&self) -> Settings {
        let (snapshot_width, snapshot_height) = self.snapshot_size;
        let mut settings = Settings::new()
            .params(self.param1, self.param2)
            .clip_planes(self.near, self.far)
            .size(self.width, self.height)
            .snapshot(&self.snapshot)
            .snapshot_size(snapshot_width, snapshot_height);

        if let Some(scene) = &self.scene {
            settings = settings.scene(scene);
        }
        if let Some(dir) = &self.shader_dir {
            settings = settings.shader_dir(dir);
        }
        settings
    }
}

fn main() {
    init_logging(LoggingConfig::default());
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings();

    if cli.headless {
        lumen::render_headless(&settings).with_context(|| {
            format!("failed to render snapshot to {}", settings.snapshot_path.display())
        })
    } else {
        lumen::run(settings).context("renderer exited with an error")
    }
}
