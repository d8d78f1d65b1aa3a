//! Window and overlay configuration.

use serde::Deserialize;
use std::path::PathBuf;

/// Window configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Initial window width (pixels)
    pub width: u32,

    /// Initial window height (pixels)
    pub height: u32,

    pub title: String,

    /// Clear colour (linear RGB)
    pub background: [f64; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "spiralbars".to_string(),
            background: [0.0, 0.0, 0.0],
        }
    }
}

/// Overlay sprite and volume smoothing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverlayParams {
    /// PNG/JPEG shown at the centre of the window; a generated ring when unset
    pub image: Option<PathBuf>,

    /// Unscaled overlay edge length (pixels); the image's own size when unset
    pub size: Option<f32>,

    /// Weight of the previous smoothed volume
    /// Formula: soft = soft * retain + volume * (1 - retain)
    pub retain: f32,

    /// Smoothed volume → scale gain
    /// Formula: scale = 1 + soft * gain
    pub gain: f32,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            image: None,
            size: None,
            retain: 0.9,
            gain: 5.0,
        }
    }
}

impl OverlayParams {
    pub fn validate(&self) -> Result<(), String> {
        if !self.gain.is_finite() {
            return Err(format!("overlay gain must be finite, got {}", self.gain));
        }
        if !(0.0..=1.0).contains(&self.retain) {
            return Err(format!("retain must be within 0..=1, got {}", self.retain));
        }
        if let Some(size) = self.size {
            if !size.is_finite() || size <= 0.0 {
                return Err(format!("overlay size must be > 0, got {}", size));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_overlay_is_valid() {
        assert!(OverlayParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_finite_gain() {
        for gain in [f32::NAN, f32::INFINITY] {
            let params = OverlayParams {
                gain,
                ..Default::default()
            };
            assert!(params.validate().is_err(), "gain {} accepted", gain);
        }
    }

    #[test]
    fn rejects_non_finite_size() {
        let params = OverlayParams {
            size: Some(f32::INFINITY),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
