//! Audio analysis configuration.

use serde::Deserialize;

/// Smallest and largest frame sizes the analyser accepts.
pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32768;

/// Which analysis output feeds the bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMode {
    /// Time-domain waveform bytes (the classic oscilloscope view)
    #[default]
    Waveform,

    /// Smoothed frequency magnitudes in decibels
    Spectrum,
}

impl std::str::FromStr for SampleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "waveform" => Ok(Self::Waveform),
            "spectrum" => Ok(Self::Spectrum),
            other => Err(format!("unknown sample mode '{}'", other)),
        }
    }
}

/// Analyser configuration (frame size and spectrum shaping)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    /// Analysis frame size (power of two). Bin count is half of this.
    pub fft_size: usize,

    /// Source of per-bin samples
    pub mode: SampleMode,

    /// Temporal smoothing of spectrum magnitudes (0 = none, 1 = frozen)
    pub smoothing_time_constant: f32,

    /// Magnitude mapped to byte 0 (dBFS)
    pub min_decibels: f32,

    /// Magnitude mapped to byte 255 (dBFS)
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 512,
            mode: SampleMode::Waveform,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    /// Number of frequency bins produced per frame
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (frame size must be a power of two, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() {
            return Err(format!("fft_size must be a power of 2, got {}", self.fft_size));
        }
        if !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size) {
            return Err(format!(
                "fft_size must be within {}..={}, got {}",
                MIN_FFT_SIZE, MAX_FFT_SIZE, self.fft_size
            ));
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(format!(
                "smoothing_time_constant must be within 0..=1, got {}",
                self.smoothing_time_constant
            ));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AnalyserConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count(), 256);
    }

    #[test]
    fn rejects_non_power_of_two() {
        let config = AnalyserConfig {
            fft_size: 500,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_sizes() {
        for fft_size in [16, 65536] {
            let config = AnalyserConfig {
                fft_size,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{} accepted", fft_size);
        }
    }

    #[test]
    fn rejects_inverted_decibel_range() {
        let config = AnalyserConfig {
            min_decibels: -10.0,
            max_decibels: -30.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_sample_mode() {
        assert_eq!("Spectrum".parse::<SampleMode>(), Ok(SampleMode::Spectrum));
        assert_eq!("waveform".parse::<SampleMode>(), Ok(SampleMode::Waveform));
        assert!("bogus".parse::<SampleMode>().is_err());
    }
}
