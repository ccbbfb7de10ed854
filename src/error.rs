use std::path::PathBuf;

/// Failures that abort start-up. Nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to create event loop")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create rendering surface")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter found")]
    NoAdapter,

    #[error("failed to acquire graphics device")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats for this adapter")]
    UnsupportedSurface,

    #[error("failed to load asset '{}'", .path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("cubemap face '{}' is {width}x{height}, expected {expected}x{expected}", .path.display())]
    CubemapFaceSize {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("unsupported model format: {0}")]
    UnsupportedModelFormat(String),

    #[error("frame plan rejected")]
    Plan(#[from] crate::render::PlanError),

    #[error("failed to present frame")]
    Present(#[source] wgpu::SurfaceError),
}

impl ViewerError {
    pub fn asset(path: impl Into<PathBuf>, source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self::Asset {
            path: path.into(),
            source: source.into(),
        }
    }
}
