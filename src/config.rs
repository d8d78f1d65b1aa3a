//! TOML configuration file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::params::{AnalyserConfig, BarParams, OverlayParams, WindowConfig};

/// File name looked up in the working directory
pub const LOCAL_CONFIG: &str = "spiralbars.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AnalyserConfig,
    pub bars: BarParams,
    pub overlay: OverlayParams,
    pub window: WindowConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.audio.validate().map_err(ConfigError::Invalid)?;
        self.bars.validate().map_err(ConfigError::Invalid)?;
        self.overlay.validate().map_err(ConfigError::Invalid)?;
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        Ok(())
    }
}

pub fn parse_config(content: &str, path: &Path) -> Result<Config, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, path)
}

/// `./spiralbars.toml`, then the per-user config directory
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return Some(local);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("spiralbars").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SampleMode;

    fn parse(content: &str) -> Result<Config, ConfigError> {
        parse_config(content, Path::new("test.toml"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.audio.fft_size, 512);
        assert_eq!(config.bars.attack_gain, 8000.0);
        assert_eq!(config.bars.decay_rate, 0.03);
        assert_eq!(config.overlay.retain, 0.9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse(
            r#"
            [audio]
            fft_size = 1024
            mode = "spectrum"

            [bars]
            decay_rate = 0.05
            field_offset = [0.0, 0.0]

            [overlay]
            image = "snail.png"
            "#,
        )
        .unwrap();
        assert_eq!(config.audio.fft_size, 1024);
        assert_eq!(config.audio.mode, SampleMode::Spectrum);
        assert_eq!(config.audio.smoothing_time_constant, 0.8);
        assert_eq!(config.bars.decay_rate, 0.05);
        assert_eq!(config.bars.attack_gain, 8000.0);
        assert_eq!(config.bars.field_offset, (0.0, 0.0));
        assert_eq!(config.overlay.image, Some(PathBuf::from("snail.png")));
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse("[audio\nfft_size = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let config = parse("[audio]\nfft_size = 500\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Path::new("/nonexistent/spiralbars.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
