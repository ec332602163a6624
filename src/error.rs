//! Error types for the portal scene.
//!
//! Configuration, asset loading and GPU initialization each have their own
//! error enum; [`AppError`] wraps them for the top-level runner.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; ensure your system supports Vulkan, Metal, DX12 or WebGPU")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    #[error("surface is not supported by the selected adapter")]
    UnsupportedSurface,
}

/// Errors that can occur while loading the model or the baked texture.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Failed to decode an image file.
    #[error("failed to load image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// Failed to import a glTF document.
    #[error("failed to import model '{path}': {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    /// A mesh primitive lacks vertex positions.
    #[error("mesh '{0}' has a primitive without positions")]
    MissingPositions(String),
}

/// Errors that can occur while reading the scene configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON for [`SceneConfig`](crate::config::SceneConfig).
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A color string is not of the form `#rrggbb`.
    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),
    /// A numeric setting is outside its usable range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors that can occur when running the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Rendering failed in a way the loop cannot recover from.
    #[error("render error: {0}")]
    Render(#[from] wgpu::SurfaceError),
}
