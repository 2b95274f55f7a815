use std::path::PathBuf;

use clap::Parser;

use crate::config::ViewerConfig;

/// Spinning point-cube viewer.
///
/// Settings come from the optional TOML file first; flags given here win.
#[derive(Debug, Parser)]
#[command(name = "dyndraw", version, about)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Window width in pixels
    #[arg(short, long)]
    pub width: Option<u32>,

    /// Window height in pixels
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Window title
    #[arg(long)]
    pub title: Option<String>,

    /// Graphics backends to pick from: gl, vulkan, metal, dx12, primary, all
    #[arg(long, value_name = "LIST")]
    pub backend: Option<String>,

    /// Present without waiting for vertical sync
    #[arg(long)]
    pub no_vsync: bool,

    /// GLSL vertex shader replacing the built-in one
    #[arg(long, value_name = "PATH")]
    pub vertex_shader: Option<PathBuf>,

    /// GLSL fragment shader replacing the built-in one
    #[arg(long, value_name = "PATH")]
    pub fragment_shader: Option<PathBuf>,

    /// Read uploaded buffers back after startup and compare them
    #[arg(long)]
    pub verify_upload: bool,

    /// Log filter, env_logger syntax (e.g. "debug" or "dyndraw_engine=trace")
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,
}

impl Cli {
    /// Overrides `config` with every flag that was given.
    pub fn apply(&self, config: &mut ViewerConfig) {
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        if let Some(title) = &self.title {
            config.window.title = title.clone();
        }
        if let Some(backend) = &self.backend {
            config.graphics.backend = backend.clone();
        }
        if self.no_vsync {
            config.graphics.vsync = false;
        }
        if let Some(path) = &self.vertex_shader {
            config.shaders.vertex = Some(path.clone());
        }
        if let Some(path) = &self.fragment_shader {
            config.shaders.fragment = Some(path.clone());
        }
        if self.verify_upload {
            config.verify_upload = true;
        }
        if let Some(filter) = &self.log {
            config.log = Some(filter.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_flags_leave_config_untouched() {
        let cli = Cli::try_parse_from(["dyndraw"]).unwrap();
        let mut config = ViewerConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "dyndraw",
            "-w",
            "640",
            "-H",
            "480",
            "--backend",
            "gl",
            "--no-vsync",
            "--fragment-shader",
            "red.frag",
            "--verify-upload",
        ])
        .unwrap();

        let mut config = ViewerConfig::default();
        config.window.title = "from file".to_string();
        cli.apply(&mut config);

        assert_eq!((config.window.width, config.window.height), (640, 480));
        assert_eq!(config.window.title, "from file");
        assert_eq!(config.graphics.backend, "gl");
        assert!(!config.graphics.vsync);
        assert_eq!(config.shaders.fragment, Some(PathBuf::from("red.frag")));
        assert_eq!(config.shaders.vertex, None);
        assert!(config.verify_upload);
    }

    #[test]
    fn flags_repair_invalid_file_values() {
        let mut config = ViewerConfig::from_toml("[window]\nwidth = 0").unwrap();
        assert!(config.validate().is_err());

        let cli = Cli::try_parse_from(["dyndraw", "-w", "640"]).unwrap();
        cli.apply(&mut config);

        assert_eq!(config.window.width, 640);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_non_numeric_size() {
        assert!(Cli::try_parse_from(["dyndraw", "--width", "wide"]).is_err());
    }
}
