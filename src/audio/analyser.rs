//! Frame analysis over the shared sample ring.
//!
//! Produces the same byte-valued views a browser `AnalyserNode` does:
//! time-domain bytes centred on 128 and frequency bytes mapped from a
//! decibel window onto `0..=255`.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::tap::SampleTap;
use crate::params::AnalyserConfig;

/// Blackman window coefficients (alpha = 0.16)
const BLACKMAN_A0: f32 = 0.42;
const BLACKMAN_A1: f32 = 0.5;
const BLACKMAN_A2: f32 = 0.08;

pub struct Analyser {
    tap: SampleTap,
    fft_size: usize,
    smoothing_time_constant: f32,
    min_decibels: f32,
    max_decibels: f32,
    frame: Vec<f32>,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Analyser {
    pub fn new(config: &AnalyserConfig, tap: SampleTap) -> Self {
        let fft_size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            tap,
            fft_size,
            smoothing_time_constant: config.smoothing_time_constant,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
            frame: vec![0.0; fft_size],
            window: (0..fft_size).map(|i| blackman_window(i, fft_size)).collect(),
            fft,
            spectrum: vec![Complex::new(0.0, 0.0); fft_size],
            scratch,
            smoothed: vec![0.0; fft_size / 2],
        }
    }

    /// Always half the frame size
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Fill `out` with the current waveform as bytes (128 = silence).
    pub fn byte_time_domain_data(&mut self, out: &mut [u8]) {
        self.tap.copy_window(&mut self.frame);
        for (dst, &x) in out.iter_mut().zip(self.frame.iter()) {
            *dst = time_domain_byte(x);
        }
    }

    /// Fill `out` with smoothed magnitudes mapped onto the decibel window.
    ///
    /// Each call advances the temporal smoothing by one step.
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.tap.copy_window(&mut self.frame);

        for ((dst, &x), &w) in self
            .spectrum
            .iter_mut()
            .zip(self.frame.iter())
            .zip(self.window.iter())
        {
            *dst = Complex::new(x * w, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let tau = self.smoothing_time_constant;
        let norm = 1.0 / self.fft_size as f32;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(self.spectrum.iter()) {
            let magnitude = bin.norm() * norm;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
        }

        for (dst, &magnitude) in out.iter_mut().zip(self.smoothed.iter()) {
            *dst = decibel_byte(magnitude, self.min_decibels, self.max_decibels);
        }
    }
}

/// Waveform sample (-1..1) to byte, clamped
pub fn time_domain_byte(x: f32) -> u8 {
    (128.0 * (x + 1.0)).floor().clamp(0.0, 255.0) as u8
}

/// Linear magnitude to byte via the `[min_db, max_db]` window
pub fn decibel_byte(magnitude: f32, min_db: f32, max_db: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = 255.0 / (max_db - min_db) * (db - min_db);
    scaled.floor().clamp(0.0, 255.0) as u8
}

/// Blackman window function for spectrum analysis
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let phase = 2.0 * PI * index as f32 / size as f32;
    BLACKMAN_A0 - BLACKMAN_A1 * phase.cos() + BLACKMAN_A2 * (2.0 * phase).cos()
}
