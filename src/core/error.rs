//! Error types for the clock viewer.

use thiserror::Error;

/// Errors raised while loading, configuring or displaying the clock.
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Failed to load glTF file: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing position data for mesh: {0}")]
    MissingPositions(String),

    #[error("Unsupported glTF extension: {0}")]
    UnsupportedExtension(String),

    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    #[error("Invalid value {value:?} for option {name:?}")]
    InvalidOption { name: String, value: String },

    #[error("Unknown option: {0:?}")]
    UnknownOption(String),

    #[cfg(feature = "winit-backend")]
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[cfg(feature = "winit-backend")]
    #[error("Failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[cfg(feature = "winit-backend")]
    #[error("Failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[cfg(feature = "winit-backend")]
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[cfg(feature = "winit-backend")]
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[cfg(feature = "winit-backend")]
    #[error("Window creation failed: {0}")]
    Os(#[from] winit::error::OsError),

    #[error("Fetch failed: {0}")]
    Fetch(String),
}

/// Result alias used throughout the crate.
pub type DisplayResult<T> = Result<T, DisplayError>;
