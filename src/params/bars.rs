//! Bar envelope and layout parameters.

use serde::Deserialize;

/// Per-bar envelope and geometry constants
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BarParams {
    /// Sample → height gain (pixels per unit sample)
    /// Formula: signal = sample * attack_gain
    pub attack_gain: f32,

    /// Fraction of height lost per frame when the signal is below it
    pub decay_rate: f32,

    /// Rotation per bar index (radians)
    pub rotation_step: f32,

    /// Distance of each bar's anchor from the field origin, per index (pixels)
    pub spacing: f32,

    /// Stroke width (pixels)
    pub stroke_width: f32,

    /// Height every bar starts with (pixels)
    pub initial_height: f32,

    /// Hue advance per bar index (degrees)
    pub hue_step: f32,

    /// Bars with an index above this get the circle-and-stem decoration
    pub decoration_threshold: usize,

    /// Field origin relative to the surface centre (pixels)
    pub field_offset: (f32, f32),
}

impl Default for BarParams {
    fn default() -> Self {
        Self {
            attack_gain: 8000.0,
            decay_rate: 0.03,
            rotation_step: 0.043,
            spacing: 0.9,
            stroke_width: 1.0,
            initial_height: 50.0,
            hue_step: 2.0,
            decoration_threshold: 150,
            field_offset: (-70.0, 50.0),
        }
    }
}

impl BarParams {
    pub fn validate(&self) -> Result<(), String> {
        let (offset_x, offset_y) = self.field_offset;
        for (name, value) in [
            ("attack_gain", self.attack_gain),
            ("decay_rate", self.decay_rate),
            ("rotation_step", self.rotation_step),
            ("spacing", self.spacing),
            ("stroke_width", self.stroke_width),
            ("initial_height", self.initial_height),
            ("hue_step", self.hue_step),
            ("field_offset.x", offset_x),
            ("field_offset.y", offset_y),
        ] {
            if !value.is_finite() {
                return Err(format!("{} must be finite, got {}", name, value));
            }
        }
        if !(0.0..=1.0).contains(&self.decay_rate) {
            return Err(format!("decay_rate must be within 0..=1, got {}", self.decay_rate));
        }
        if self.attack_gain < 0.0 {
            return Err(format!("attack_gain must be >= 0, got {}", self.attack_gain));
        }
        if self.stroke_width <= 0.0 {
            return Err(format!("stroke_width must be > 0, got {}", self.stroke_width));
        }
        if self.initial_height < 0.0 {
            return Err(format!(
                "initial_height must be >= 0, got {}",
                self.initial_height
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(BarParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_finite_values() {
        for params in [
            BarParams {
                attack_gain: f32::NAN,
                ..Default::default()
            },
            BarParams {
                rotation_step: f32::INFINITY,
                ..Default::default()
            },
            BarParams {
                spacing: f32::NAN,
                ..Default::default()
            },
            BarParams {
                hue_step: f32::NEG_INFINITY,
                ..Default::default()
            },
            BarParams {
                field_offset: (f32::NAN, 0.0),
                ..Default::default()
            },
        ] {
            let err = params.validate().unwrap_err();
            assert!(err.contains("finite"), "{}", err);
        }
    }

    #[test]
    fn rejects_decay_outside_unit_range() {
        let params = BarParams {
            decay_rate: 1.5,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
