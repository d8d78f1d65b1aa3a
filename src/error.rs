//! Error types for the library layers.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while acquiring or running the microphone input
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("invalid analyser config: {0}")]
    InvalidConfig(String),

    #[error("no audio input device found")]
    NoInputDevice,

    #[error("failed to get input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported input sample format {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to spawn acquisition thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("acquisition ended without a result")]
    Disconnected,
}

/// Failures while reading the TOML configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failures while setting up or driving the GPU presenter
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to find suitable GPU adapter")]
    NoAdapter,

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("failed to load overlay image {path}: {source}")]
    OverlayImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("surface out of memory")]
    OutOfMemory,
}
