//! Radial bar field: one bar per analysis bin.
//!
//! Each bar follows its bin with an instant-attack / exponential-release
//! envelope and is drawn as a rotated Bezier curve. Bars above the
//! decoration threshold also get a circle and a stem.

use crate::color::{Hsl, Rgba};
use crate::params::BarParams;
use crate::surface::Surface;

/// Extra curve geometry: the second control point sits at
/// `(-height * 0.5 - CURVE_SWING, height + CURVE_LIFT)`
const CURVE_SWING: f32 = 150.0;
const CURVE_LIFT: f32 = 50.0;

/// Gap between the bar anchor and the decoration stem (pixels)
const STEM_GAP: f32 = 10.0;

/// Decoration circle radius as a fraction of height
const CIRCLE_RADIUS_RATIO: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: Rgba,
    pub index: usize,
}

impl Bar {
    pub fn new(x: f32, y: f32, width: f32, height: f32, color: Rgba, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            color,
            index,
        }
    }

    /// Feed one sample through the envelope.
    ///
    /// A signal above the current height replaces it; otherwise the height
    /// decays by `decay_rate` of itself.
    pub fn update(&mut self, sample: f32, params: &BarParams) {
        let signal = sample * params.attack_gain;
        if signal > self.height {
            self.height = signal;
        } else {
            self.height -= self.height * params.decay_rate;
        }
    }

    pub fn has_decoration(&self, params: &BarParams) -> bool {
        self.index > params.decoration_threshold
    }

    /// Stroke the bar. All state changes are confined to this call.
    pub fn draw<S: Surface>(&self, surface: &mut S, params: &BarParams) {
        let mut s = surface.scope();
        s.set_stroke_color(self.color);
        s.set_line_width(self.width);
        s.rotate(self.index as f32 * params.rotation_step);

        s.begin_path();
        s.bezier_curve_to(
            self.x * 0.5,
            self.y * 0.5,
            self.height * -0.5 - CURVE_SWING,
            self.height + CURVE_LIFT,
            self.x,
            self.y,
        );
        s.stroke();

        if self.has_decoration(params) {
            let stem_top = self.y + STEM_GAP;
            let stem_bottom = stem_top + self.height * 0.5;

            s.begin_path();
            s.arc(
                self.x,
                stem_bottom,
                self.height * CIRCLE_RADIUS_RATIO,
                0.0,
                std::f32::consts::TAU,
                false,
            );
            s.stroke();

            s.begin_path();
            s.move_to(self.x, stem_top);
            s.line_to(self.x, stem_bottom);
            s.stroke();
        }
    }
}

/// Fixed, index-ordered set of bars created once per analysis frame size
#[derive(Debug, Clone)]
pub struct BarField {
    bars: Vec<Bar>,
    params: BarParams,
}

impl BarField {
    /// One bar per bin except the first: indices `1..fft_size / 2`.
    pub fn new(fft_size: usize, params: BarParams) -> Self {
        let bars = (1..fft_size / 2)
            .map(|i| {
                let color = Hsl::new(i as f32 * params.hue_step, 100.0, 50.0).to_rgba();
                Bar::new(
                    0.0,
                    i as f32 * params.spacing,
                    params.stroke_width,
                    params.initial_height,
                    color,
                    i,
                )
            })
            .collect();

        Self { bars, params }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn params(&self) -> &BarParams {
        &self.params
    }

    /// Update bar `k` from `samples[k]` and draw it, in index order.
    /// Bars without a matching sample are left as they are.
    pub fn update_and_draw<S: Surface>(&mut self, samples: &[f32], surface: &mut S) {
        for (bar, &sample) in self.bars.iter_mut().zip(samples.iter()) {
            bar.update(sample, &self.params);
            bar.draw(surface, &self.params);
        }
    }
}
