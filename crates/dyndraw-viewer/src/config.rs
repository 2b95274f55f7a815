use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use cgmath::Deg;
use serde::Deserialize;

use dyndraw_engine::device::{parse_backends, GpuInit};
use dyndraw_engine::transform::{Camera, Spin};
use dyndraw_engine::window::{RuntimeConfig, WindowPosition};
use winit::dpi::PhysicalSize;

/// Viewer settings, loaded from TOML and then overridden from the command line.
///
/// Every key is optional; missing keys keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// `env_logger` filter; `RUST_LOG` applies when unset.
    pub log: Option<String>,
    /// Read the uploaded buffers back after startup and compare them.
    pub verify_upload: bool,
    pub window: WindowSection,
    pub graphics: GraphicsSection,
    pub scene: SceneSection,
    pub shaders: ShaderSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSection {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub borderless: bool,
    pub centered: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphicsSection {
    /// Comma separated backend list, e.g. `"gl"` or `"vulkan,metal"`.
    pub backend: String,
    pub vsync: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneSection {
    /// RGB, alpha is always 1.
    pub clear_color: [f64; 3],
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub camera_distance: f32,
    pub spin_axis: [f32; 3],
    /// Degrees per second.
    pub spin_rate: f32,
    pub tick_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShaderSection {
    pub vertex: Option<PathBuf>,
    pub fragment: Option<PathBuf>,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: "dyndraw".to_string(),
            width: 512,
            height: 512,
            borderless: true,
            centered: true,
        }
    }
}

impl Default for GraphicsSection {
    fn default() -> Self {
        Self {
            backend: "all".to_string(),
            vsync: true,
        }
    }
}

impl Default for SceneSection {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.05, 0.1],
            fov: 90.0,
            camera_distance: 4.0,
            spin_axis: [1.0, 0.0, 1.25],
            spin_rate: 30.0,
            tick_ms: 15,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parses a config file. Values are checked by `validate` once CLI
    /// overrides have been applied.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.window.width > 0 && self.window.height > 0,
            "window size must be non-zero, got {}x{}",
            self.window.width,
            self.window.height
        );
        anyhow::ensure!(
            self.scene.fov > 0.0 && self.scene.fov < 180.0,
            "fov must be between 0 and 180 degrees, got {}",
            self.scene.fov
        );
        anyhow::ensure!(self.scene.camera_distance > 0.0, "camera distance must be positive");
        anyhow::ensure!(self.scene.tick_ms > 0, "tick period must be at least 1 ms");
        parse_backends(&self.graphics.backend)?;
        Ok(())
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.window.title.clone(),
            position: if self.window.centered {
                WindowPosition::Centered
            } else {
                WindowPosition::Default
            },
            size: PhysicalSize::new(self.window.width, self.window.height),
            decorations: !self.window.borderless,
            resizable: !self.window.borderless,
        }
    }

    pub fn gpu_init(&self) -> Result<GpuInit> {
        Ok(GpuInit::default()
            .with_backends(parse_backends(&self.graphics.backend)?)
            .with_vsync(self.graphics.vsync))
    }

    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b] = self.scene.clear_color;
        wgpu::Color { r, g, b, a: 1.0 }
    }

    pub fn camera(&self) -> Camera {
        let mut camera = Camera {
            fov_y: Deg(self.scene.fov),
            distance: self.scene.camera_distance,
            ..Camera::default()
        };
        camera.set_viewport(self.window.width, self.window.height);
        camera
    }

    pub fn spin(&self) -> Spin {
        Spin::new(self.scene.spin_axis, self.scene.spin_rate)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.scene.tick_ms)
    }
}
