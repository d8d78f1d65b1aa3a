//! Microphone capture and per-frame analysis.
//!
//! A capture backend pushes mono samples into a shared ring; the analyser
//! turns the latest frame into byte views and the sampler exposes them as
//! normalized samples and an RMS volume.

mod analyser;
mod input;
mod sampler;
mod tap;

// Re-export public types
pub use analyser::{blackman_window, decibel_byte, time_domain_byte, Analyser};
pub use input::{AudioInput, CpalInput, StreamGuard};
pub use sampler::{normalize_byte, rms, AudioSampler, SamplerHandle};
pub use tap::{SampleRing, SampleTap};
