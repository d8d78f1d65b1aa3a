//! Volume-driven overlay scaling.

use std::fmt;

/// Exponentially smoothed volume, starting at zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSmoother {
    value: f32,
    retain: f32,
}

impl VolumeSmoother {
    pub fn new(retain: f32) -> Self {
        Self { value: 0.0, retain }
    }

    /// `soft = soft * retain + volume * (1 - retain)`; returns the new value.
    pub fn update(&mut self, volume: f32) -> f32 {
        self.value = self.value * self.retain + volume * (1.0 - self.retain);
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

/// Centre-anchored uniform scale applied to the overlay each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayTransform {
    pub scale: f32,
}

impl OverlayTransform {
    pub const IDENTITY: OverlayTransform = OverlayTransform { scale: 1.0 };

    /// `1 + soft_volume * gain`
    pub fn from_volume(soft_volume: f32, gain: f32) -> Self {
        Self {
            scale: 1.0 + soft_volume * gain,
        }
    }
}

impl Default for OverlayTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// CSS transform notation, e.g. `translate(-50%, -50%) scale(1.5)`
impl fmt::Display for OverlayTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "translate(-50%, -50%) scale({})", self.scale)
    }
}

/// Anything that shows the overlay
pub trait OverlayTarget {
    fn set_transform(&mut self, transform: OverlayTransform);
}

impl OverlayTarget for OverlayTransform {
    fn set_transform(&mut self, transform: OverlayTransform) {
        *self = transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoother_starts_at_zero() {
        assert_eq!(VolumeSmoother::new(0.9).value(), 0.0);
    }

    #[test]
    fn smoother_converges_monotonically_without_overshoot() {
        for v in [0.0f32, 0.05, 0.5, 1.0] {
            let mut smoother = VolumeSmoother::new(0.9);
            let mut prev = smoother.value();
            for _ in 0..500 {
                let next = smoother.update(v);
                // Rounding allowance of one ulp near the fixed point
                assert!(next >= prev - f32::EPSILON, "decreased for v={}", v);
                assert!(next <= v + f32::EPSILON, "overshot v={}", v);
                prev = next;
            }
            assert!((prev - v).abs() < 1e-4);
        }
    }

    #[test]
    fn first_update_takes_a_tenth() {
        let mut smoother = VolumeSmoother::new(0.9);
        assert!((smoother.update(1.0) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn scale_from_volume() {
        assert_eq!(OverlayTransform::from_volume(0.0, 5.0).scale, 1.0);
        assert_eq!(OverlayTransform::from_volume(0.2, 5.0).scale, 2.0);
    }

    #[test]
    fn css_string_is_a_single_uniform_scale() {
        let t = OverlayTransform::from_volume(0.1, 5.0);
        assert_eq!(t.to_string(), "translate(-50%, -50%) scale(1.5)");
        assert_eq!(t.to_string().matches("scale(").count(), 1);
    }
}
