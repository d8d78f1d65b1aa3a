//! Spiralbars library - Microphone-reactive radial bar visualizer

pub mod audio;
pub mod bars;
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod overlay;
pub mod params;
pub mod rendering;
pub mod surface;
pub mod visualizer;
