//! Per-frame update/draw loop.
//!
//! Called once per display refresh. While the microphone is not ready the
//! frame is idle and touches nothing; once ready every frame clears the
//! surface, feeds the bars, redraws them and rescales the overlay.

use crate::audio::AudioSampler;
use crate::bars::BarField;
use crate::overlay::{OverlayTarget, OverlayTransform, VolumeSmoother};
use crate::params::{BarParams, OverlayParams};
use crate::surface::Surface;

/// What a single frame did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Sampler not initialized; nothing was drawn
    Idle,
    /// Full update/draw cycle
    Rendered { volume: f32, soft_volume: f32 },
}

pub struct Visualizer {
    sampler: AudioSampler,
    bars: BarField,
    samples: Vec<f32>,
    smoother: VolumeSmoother,
    overlay_gain: f32,
    active: bool,
}

impl Visualizer {
    pub fn new(sampler: AudioSampler, bar_params: BarParams, overlay: &OverlayParams) -> Self {
        let config = sampler.config();
        let bars = BarField::new(config.fft_size, bar_params);
        let samples = vec![0.0; config.bin_count()];

        Self {
            sampler,
            bars,
            samples,
            smoother: VolumeSmoother::new(overlay.retain),
            overlay_gain: overlay.gain,
            active: false,
        }
    }

    pub fn bars(&self) -> &BarField {
        &self.bars
    }

    pub fn soft_volume(&self) -> f32 {
        self.smoother.value()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Run one frame against `surface` and `overlay`.
    pub fn frame<S, O>(&mut self, surface: &mut S, overlay: &mut O) -> FrameOutcome
    where
        S: Surface,
        O: OverlayTarget + ?Sized,
    {
        if !self.sampler.poll() {
            return FrameOutcome::Idle;
        }
        let Some(handle) = self.sampler.handle_mut() else {
            return FrameOutcome::Idle;
        };

        if !self.active {
            self.active = true;
            log::info!("Rendering {} bars", self.bars.len());
        }

        surface.clear();

        for (dst, &src) in self.samples.iter_mut().zip(handle.get_samples()) {
            *dst = src;
        }
        let volume = handle.get_volume();

        let (width, height) = surface.size();
        let (offset_x, offset_y) = self.bars.params().field_offset;
        {
            let mut field = surface.scope();
            field.translate(width * 0.5 + offset_x, height * 0.5 + offset_y);
            self.bars.update_and_draw(&self.samples, &mut *field);
        }

        let soft_volume = self.smoother.update(volume);
        overlay.set_transform(OverlayTransform::from_volume(soft_volume, self.overlay_gain));

        FrameOutcome::Rendered {
            volume,
            soft_volume,
        }
    }

    /// Follow a viewport resize. Bar state is kept.
    pub fn resize<S: Surface>(&mut self, surface: &mut S, width: f32, height: f32) {
        log::debug!("Surface resized to {}x{}", width, height);
        surface.resize(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioInput, SampleTap, StreamGuard};
    use crate::error::AudioError;
    use crate::params::AnalyserConfig;
    use crate::surface::Canvas;
    use glam::{Affine2, Vec2};
    use std::sync::mpsc::{self, Receiver};
    use std::thread;
    use std::time::{Duration, Instant};

    struct ConstantInput(f32);

    impl AudioInput for ConstantInput {
        fn open(self: Box<Self>, tap: SampleTap) -> Result<StreamGuard, AudioError> {
            tap.push_mono(&vec![self.0; tap.capacity()]);
            Ok(Box::new(()))
        }
    }

    /// Holds the acquisition open until released
    struct HeldInput(Receiver<()>);

    impl AudioInput for HeldInput {
        fn open(self: Box<Self>, _tap: SampleTap) -> Result<StreamGuard, AudioError> {
            let _ = self.0.recv();
            Ok(Box::new(()))
        }
    }

    struct DeniedInput;

    impl AudioInput for DeniedInput {
        fn open(self: Box<Self>, _tap: SampleTap) -> Result<StreamGuard, AudioError> {
            Err(AudioError::NoInputDevice)
        }
    }

    fn visualizer(input: impl AudioInput) -> Visualizer {
        let sampler = AudioSampler::new(AnalyserConfig::default(), input);
        Visualizer::new(sampler, BarParams::default(), &OverlayParams::default())
    }

    fn run_until_rendered(
        vis: &mut Visualizer,
        canvas: &mut Canvas,
        overlay: &mut OverlayTransform,
    ) -> FrameOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let outcome = vis.frame(canvas, overlay);
            if outcome != FrameOutcome::Idle || Instant::now() > deadline {
                return outcome;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn idle_frame_touches_nothing() {
        let (_release, held) = mpsc::channel();
        let mut vis = visualizer(HeldInput(held));
        let mut canvas = Canvas::new(800.0, 600.0);
        let mut overlay = OverlayTransform { scale: 7.0 };

        for _ in 0..3 {
            assert_eq!(vis.frame(&mut canvas, &mut overlay), FrameOutcome::Idle);
        }
        assert_eq!(canvas.clear_count(), 0);
        assert!(canvas.draw_list().is_empty());
        assert_eq!(overlay.scale, 7.0);
        assert!(!vis.is_active());
    }

    #[test]
    fn becomes_active_once_acquisition_resolves() {
        let (release, held) = mpsc::channel();
        let mut vis = visualizer(HeldInput(held));
        let mut canvas = Canvas::new(800.0, 600.0);
        let mut overlay = OverlayTransform::IDENTITY;

        assert_eq!(vis.frame(&mut canvas, &mut overlay), FrameOutcome::Idle);
        release.send(()).unwrap();

        let outcome = run_until_rendered(&mut vis, &mut canvas, &mut overlay);
        assert!(matches!(outcome, FrameOutcome::Rendered { .. }));
        assert!(vis.is_active());
    }

    #[test]
    fn denied_microphone_stays_idle() {
        let mut vis = visualizer(DeniedInput);
        let mut canvas = Canvas::new(800.0, 600.0);
        let mut overlay = OverlayTransform::IDENTITY;
        for _ in 0..50 {
            assert_eq!(vis.frame(&mut canvas, &mut overlay), FrameOutcome::Idle);
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(canvas.clear_count(), 0);
    }

    #[test]
    fn rendered_frame_draws_every_bar() {
        let mut vis = visualizer(ConstantInput(0.0));
        let mut canvas = Canvas::new(800.0, 600.0);
        let mut overlay = OverlayTransform::IDENTITY;

        let outcome = run_until_rendered(&mut vis, &mut canvas, &mut overlay);
        assert_eq!(
            outcome,
            FrameOutcome::Rendered {
                volume: 0.0,
                soft_volume: 0.0
            }
        );
        // 255 curves plus circle and stem for indices 151..=255
        assert_eq!(canvas.draw_list().strokes, 255 + 105 * 2);
        assert_eq!(canvas.clear_count(), 1);
        assert_eq!(canvas.saved_states(), 0);
        assert_eq!(overlay.scale, 1.0);
    }

    #[test]
    fn field_is_centred_with_offset() {
        let mut vis = visualizer(ConstantInput(0.0));
        let mut canvas = Canvas::new(800.0, 600.0);
        let mut overlay = OverlayTransform::IDENTITY;
        run_until_rendered(&mut vis, &mut canvas, &mut overlay);

        // (w/2 - 70, h/2 + 50), then each bar's own rotation
        let origin = Affine2::from_translation(Vec2::new(330.0, 350.0));
        for index in [1usize, 128, 255] {
            let end = (origin * Affine2::from_angle(index as f32 * 0.043))
                .transform_point2(Vec2::new(0.0, index as f32 * 0.9));
            let reached = canvas
                .draw_list()
                .vertices
                .iter()
                .any(|v| Vec2::from(v.position).distance(end) <= 0.5 + 1e-3);
            assert!(reached, "bar {} does not end at {:?}", index, end);
        }
    }

    #[test]
    fn loud_input_scales_overlay() {
        let mut vis = visualizer(ConstantInput(0.5));
        let mut canvas = Canvas::new(800.0, 600.0);
        let mut overlay = OverlayTransform::IDENTITY;

        let outcome = run_until_rendered(&mut vis, &mut canvas, &mut overlay);
        let FrameOutcome::Rendered { volume, soft_volume } = outcome else {
            panic!("never rendered");
        };
        assert!((volume - 0.5).abs() < 1e-6);
        assert!((soft_volume - 0.05).abs() < 1e-6);
        assert!((overlay.scale - 1.25).abs() < 1e-5);
        assert!(vis.bars().bars().iter().all(|b| b.height == 4000.0));
    }

    #[test]
    fn resize_keeps_bar_state() {
        let mut vis = visualizer(ConstantInput(0.5));
        let mut canvas = Canvas::new(800.0, 600.0);
        let mut overlay = OverlayTransform::IDENTITY;
        run_until_rendered(&mut vis, &mut canvas, &mut overlay);

        let before = vis.bars().bars().to_vec();
        vis.resize(&mut canvas, 1024.0, 768.0);
        assert_eq!(canvas.size(), (1024.0, 768.0));
        assert_eq!(vis.bars().bars(), &before[..]);
    }
}
