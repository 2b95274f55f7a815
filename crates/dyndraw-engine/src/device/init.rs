use anyhow::Result;

use crate::error::ContextError;

/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends wgpu may pick an adapter from.
    ///
    /// `Backends::GL` reproduces a plain OpenGL/GLES context.
    pub backends: wgpu::Backends,

    /// Adapter selection hint.
    pub power_preference: wgpu::PowerPreference,

    /// Accept a software adapter. Only meaningful for headless devices.
    pub force_fallback_adapter: bool,

    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// `Fifo` waits for vsync; `AutoNoVsync` presents immediately where supported.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}

impl GpuInit {
    /// Picks `Fifo` for vsync and `AutoNoVsync` otherwise.
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.present_mode = if vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self
    }

    pub fn with_backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }

    pub(crate) fn instance(&self) -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: self.backends,
            ..Default::default()
        })
    }
}

/// Parses a comma separated backend list: `primary`, `all`, `vulkan`, `metal`, `dx12`, `gl`.
pub fn parse_backends(list: &str) -> Result<wgpu::Backends> {
    let mut backends = wgpu::Backends::empty();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        backends |= match name.to_ascii_lowercase().as_str() {
            "primary" => wgpu::Backends::PRIMARY,
            "all" => wgpu::Backends::all(),
            "vulkan" | "vk" => wgpu::Backends::VULKAN,
            "metal" | "mtl" => wgpu::Backends::METAL,
            "dx12" | "d3d12" => wgpu::Backends::DX12,
            "gl" | "gles" | "opengl" => wgpu::Backends::GL,
            other => anyhow::bail!("unknown graphics backend \"{other}\""),
        };
    }
    anyhow::ensure!(!backends.is_empty(), "no graphics backend given");
    Ok(backends)
}

/// Requests an adapter and a device/queue pair from `instance`.
pub(crate) async fn request_device(
    instance: &wgpu::Instance,
    init: &GpuInit,
    compatible_surface: Option<&wgpu::Surface<'_>>,
) -> std::result::Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue), ContextError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: init.power_preference,
            compatible_surface,
            force_fallback_adapter: init.force_fallback_adapter,
        })
        .await
        .map_err(|source| ContextError::Adapter {
            backends: init.backends,
            source,
        })?;

    let info = adapter.get_info();
    log::info!("GPU adapter: {} ({:?})", info.name, info.backend);
    log::info!("driver: {} {}", info.driver, info.driver_info);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("dyndraw device"),
            required_features: init.required_features,
            required_limits: init.required_limits.clone().using_resolution(adapter.limits()),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .map_err(ContextError::Device)?;

    Ok((adapter, device, queue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_and_combined_backends() {
        assert_eq!(parse_backends("gl").unwrap(), wgpu::Backends::GL);
        assert_eq!(
            parse_backends("Vulkan, gl").unwrap(),
            wgpu::Backends::VULKAN | wgpu::Backends::GL
        );
        assert_eq!(parse_backends("primary").unwrap(), wgpu::Backends::PRIMARY);
    }

    #[test]
    fn rejects_unknown_or_empty_backends() {
        assert!(parse_backends("glide").is_err());
        assert!(parse_backends(" , ").is_err());
    }

    #[test]
    fn vsync_selects_present_mode() {
        assert_eq!(GpuInit::default().with_vsync(true).present_mode, wgpu::PresentMode::Fifo);
        assert_eq!(
            GpuInit::default().with_vsync(false).present_mode,
            wgpu::PresentMode::AutoNoVsync
        );
    }
}
