use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Where a pass gets its WGSL from.
///
/// Every pass ships a built-in source. When an override directory is set, the
/// file `<dir>/<file_name>` is read instead, so shaders can be edited without
/// rebuilding.
#[derive(Clone, Debug)]
pub struct ShaderSource {
    file_name: &'static str,
    builtin: &'static str,
    override_dir: Option<PathBuf>,
}

impl ShaderSource {
    pub const fn builtin(file_name: &'static str, builtin: &'static str) -> Self {
        Self {
            file_name,
            builtin,
            override_dir: None,
        }
    }

    pub fn with_override_dir(mut self, dir: Option<&Path>) -> Self {
        self.override_dir = dir.map(Path::to_path_buf);
        self
    }

    /// The override file, if an override directory is set.
    pub fn path(&self) -> Option<PathBuf> {
        self.override_dir.as_ref().map(|dir| dir.join(self.file_name))
    }

    /// Returns the shader text. A missing or empty override file is logged and
    /// yields `None`.
    pub fn load(&self) -> Option<Cow<'static, str>> {
        let Some(path) = self.path() else {
            return Some(Cow::Borrowed(self.builtin));
        };

        match std::fs::read_to_string(&path) {
            Ok(source) if !source.trim().is_empty() => Some(Cow::Owned(source)),
            Ok(_) => {
                log::error!("Shader source {} is empty", path.display());
                None
            }
            Err(err) => {
                log::error!("Could not read shader {}: {err}", path.display());
                None
            }
        }
    }
}

/// Compiles `source` and hands the module to `build`, which creates the
/// pipeline(s) that use it.
///
/// Validation errors from both steps are captured instead of reaching the
/// device's uncaptured-error handler. On failure the compiler output is logged
/// and `None` is returned; callers keep running without the program.
pub fn compile_program<T>(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    build: impl FnOnce(&wgpu::ShaderModule) -> T,
) -> Option<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let program = build(&module);

    match pollster::block_on(device.pop_error_scope()) {
        None => {
            log::debug!("Compiled shader program {label}");
            Some(program)
        }
        Some(err) => {
            log::error!("Shader program {label} failed to build:\n{err}");
            None
        }
    }
}

/// Loads a [`ShaderSource`] and compiles it with [`compile_program`].
pub fn build_program<T>(
    device: &wgpu::Device,
    label: &str,
    source: &ShaderSource,
    build: impl FnOnce(&wgpu::ShaderModule) -> T,
) -> Option<T> {
    let text = source.load()?;
    compile_program(device, label, &text, build)
}
