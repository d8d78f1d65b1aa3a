//! Stroke colours.

use std::fmt;

/// Straight-alpha sRGB colour, components in `0..=1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// CSS-style HSL: hue in degrees, saturation and lightness in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Hsl {
    pub fn new(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    pub fn to_rgba(self) -> Rgba {
        let h = self.hue.rem_euclid(360.0);
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = match (h / 60.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Rgba::new(r + m, g + m, b + m, 1.0)
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({},{}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgba, b: Rgba) -> bool {
        (a.r - b.r).abs() < 1e-5 && (a.g - b.g).abs() < 1e-5 && (a.b - b.b).abs() < 1e-5
    }

    #[test]
    fn primary_hues() {
        assert!(close(Hsl::new(0.0, 100.0, 50.0).to_rgba(), Rgba::new(1.0, 0.0, 0.0, 1.0)));
        assert!(close(Hsl::new(120.0, 100.0, 50.0).to_rgba(), Rgba::new(0.0, 1.0, 0.0, 1.0)));
        assert!(close(Hsl::new(240.0, 100.0, 50.0).to_rgba(), Rgba::new(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn hue_wraps() {
        assert!(close(
            Hsl::new(480.0, 100.0, 50.0).to_rgba(),
            Hsl::new(120.0, 100.0, 50.0).to_rgba()
        ));
    }

    #[test]
    fn lightness_extremes() {
        assert!(close(Hsl::new(77.0, 100.0, 0.0).to_rgba(), Rgba::BLACK));
        assert!(close(Hsl::new(77.0, 100.0, 100.0).to_rgba(), Rgba::WHITE));
    }

    #[test]
    fn css_notation() {
        assert_eq!(Hsl::new(2.0, 100.0, 50.0).to_string(), "hsl(2,100%, 50%)");
    }
}
