//! Parameter definitions with units and documented semantics.
//!
//! Every tuned constant of the visualizer lives here with:
//! - Units (pixels, radians, degrees, dBFS)
//! - Documented ranges and meanings
//! - Defaults matching the reference look

mod audio;
mod bars;
mod render;

// Re-export all types
pub use audio::{AnalyserConfig, SampleMode, MAX_FFT_SIZE, MIN_FFT_SIZE};
pub use bars::BarParams;
pub use render::{OverlayParams, WindowConfig};
