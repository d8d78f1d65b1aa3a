//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::params::SampleMode;

/// Command line arguments. Anything given here overrides the config file.
#[derive(Parser, Debug, Default)]
#[command(name = "spiralbars")]
#[command(about = "Microphone-reactive radial bar visualizer", long_about = None)]
pub struct Args {
    /// Configuration file (defaults to ./spiralbars.toml or the user config dir)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Analysis frame size (power of two); bar count is half of this minus one
    #[arg(long, value_name = "SAMPLES")]
    pub fft_size: Option<usize>,

    /// Bar input: waveform or spectrum
    #[arg(long, value_name = "MODE")]
    pub mode: Option<SampleMode>,

    /// Image drawn at the centre and scaled with volume
    #[arg(long, value_name = "FILE")]
    pub overlay: Option<PathBuf>,

    /// Initial window width (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Initial window height (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Sample → bar height gain
    #[arg(long, value_name = "GAIN")]
    pub attack_gain: Option<f32>,

    /// Fraction of bar height lost per frame
    #[arg(long, value_name = "RATE")]
    pub decay_rate: Option<f32>,
}

impl Args {
    /// Apply the options that were given on top of `config`
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(fft_size) = self.fft_size {
            config.audio.fft_size = fft_size;
        }
        if let Some(mode) = self.mode {
            config.audio.mode = mode;
        }
        if let Some(ref overlay) = self.overlay {
            config.overlay.image = Some(overlay.clone());
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        if let Some(gain) = self.attack_gain {
            config.bars.attack_gain = gain;
        }
        if let Some(rate) = self.decay_rate {
            config.bars.decay_rate = rate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_leave_config_untouched() {
        let args = Args::try_parse_from(["spiralbars"]).unwrap();
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.audio.fft_size, 512);
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "spiralbars",
            "--fft-size",
            "1024",
            "--mode",
            "spectrum",
            "--decay-rate",
            "0.1",
            "--overlay",
            "snail.png",
        ])
        .unwrap();
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.audio.fft_size, 1024);
        assert_eq!(config.audio.mode, SampleMode::Spectrum);
        assert_eq!(config.bars.decay_rate, 0.1);
        assert_eq!(config.overlay.image, Some(PathBuf::from("snail.png")));
    }

    #[test]
    fn non_finite_override_fails_validation() {
        let args = Args::try_parse_from(["spiralbars", "--attack-gain", "NaN"]).unwrap();
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert!(config.bars.attack_gain.is_nan());
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Args::try_parse_from(["spiralbars", "--mode", "bogus"]).is_err());
    }
}
