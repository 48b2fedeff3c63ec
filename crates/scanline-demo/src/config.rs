use std::path::PathBuf;

use clap::Parser;
use scanline_engine::compositor::Opacity;
use scanline_engine::device::{GpuInit, SurfaceInit};

/// Startup configuration of the demo.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub title: String,

    /// Resolution of the composited layers.
    pub logical_width: u32,
    pub logical_height: u32,

    /// Initial window size as a multiple of the logical size.
    pub window_scale: u32,

    /// Uncompressed BMP of exactly the logical size. A gradient is used when
    /// it cannot be loaded.
    pub background: PathBuf,

    /// Stage sources from disk; both must be given to replace the built-ins.
    pub vertex_shader: Option<PathBuf>,
    pub fragment_shader: Option<PathBuf>,

    /// Start with the built-in CRT fragment stage instead of the plain one.
    pub crt: bool,

    pub opacity: Opacity,

    /// Noise is drawn where `x ∈ [mx, w - mx]` and `y ∈ [my, h - my]`.
    pub overlay_margin_x: u32,
    pub overlay_margin_y: u32,

    pub gpu: GpuInit,
    pub surface: SurfaceInit,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "Scanline - layer compositor demo".to_string(),
            logical_width: 480,
            logical_height: 270,
            window_scale: 2,
            background: PathBuf::from("cnv_background.bmp"),
            vertex_shader: None,
            fragment_shader: None,
            crt: false,
            opacity: Opacity::HALF,
            overlay_margin_x: 75,
            overlay_margin_y: 100,
            gpu: GpuInit::default(),
            surface: SurfaceInit::default(),
        }
    }
}

/// Command-line overrides for [`DemoConfig`].
#[derive(Parser, Debug)]
#[command(name = "scanline-demo", about = "Composites a noise overlay over a bitmap and stretches it to the window")]
pub struct Cli {
    /// Background bitmap (uncompressed BMP at the logical size).
    #[arg(short, long, value_name = "FILE.bmp")]
    pub background: Option<PathBuf>,

    /// Vertex stage WGSL source. Requires --fragment.
    #[arg(long, value_name = "FILE.wgsl", requires = "fragment")]
    pub vertex: Option<PathBuf>,

    /// Fragment stage WGSL source. Requires --vertex.
    #[arg(long, value_name = "FILE.wgsl", requires = "vertex")]
    pub fragment: Option<PathBuf>,

    /// Use the built-in CRT fragment stage.
    #[arg(long, conflicts_with = "fragment")]
    pub crt: bool,

    /// Overlay opacity in percent (clamped to 0-100).
    #[arg(short, long, value_name = "0-100")]
    pub opacity: Option<u32>,

    /// Initial window size as a multiple of 480x270.
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=8))]
    pub scale: Option<u32>,

    /// Request a software adapter.
    #[arg(long)]
    pub fallback_adapter: bool,
}

impl Cli {
    pub fn into_config(self) -> DemoConfig {
        let mut config = DemoConfig::default();
        if let Some(path) = self.background {
            config.background = path;
        }
        config.vertex_shader = self.vertex;
        config.fragment_shader = self.fragment;
        config.crt = self.crt;
        if let Some(percent) = self.opacity {
            config.opacity = Opacity::percent(percent);
        }
        if let Some(scale) = self.scale {
            config.window_scale = scale;
        }
        config.gpu.force_fallback_adapter = self.fallback_adapter;
        config
    }
}
