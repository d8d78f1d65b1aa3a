//! Microphone sampler with one-shot asynchronous acquisition.
//!
//! The device is opened on a background thread. Its outcome is delivered
//! once through a channel and picked up by [`AudioSampler::poll`], which the
//! frame loop calls every frame. Success yields a [`SamplerHandle`];
//! failure is logged and leaves the sampler uninitialized for good.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use super::analyser::Analyser;
use super::input::AudioInput;
use super::tap::SampleTap;
use crate::error::AudioError;
use crate::params::{AnalyserConfig, SampleMode};

enum Acquisition {
    /// Device request in flight
    Pending(Receiver<Result<SampleTap, AudioError>>),
    /// Device open and streaming
    Ready(SamplerHandle),
    /// Request failed; never retried
    Failed,
}

pub struct AudioSampler {
    config: AnalyserConfig,
    state: Acquisition,
    /// Dropping this releases the acquisition thread (and the stream it owns)
    _shutdown: Option<Sender<()>>,
}

impl AudioSampler {
    /// Start acquiring `input`. Returns immediately; the sampler is
    /// uninitialized until a later [`poll`](Self::poll) sees the result.
    pub fn new(config: AnalyserConfig, input: impl AudioInput) -> Self {
        if let Err(e) = config.validate() {
            log::error!("{}", AudioError::InvalidConfig(e));
            return Self::failed(config);
        }

        let (result_tx, result_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let tap = SampleTap::new(config.fft_size);
        let input: Box<dyn AudioInput> = Box::new(input);

        let spawned = thread::Builder::new()
            .name("audio-acquire".to_string())
            .spawn(move || match input.open(tap.clone()) {
                Ok(guard) => {
                    if result_tx.send(Ok(tap)).is_ok() {
                        // Park until the sampler goes away, keeping the stream alive
                        let _ = shutdown_rx.recv();
                    }
                    drop(guard);
                }
                Err(e) => {
                    let _ = result_tx.send(Err(e));
                }
            });

        match spawned {
            Ok(_) => Self {
                config,
                state: Acquisition::Pending(result_rx),
                _shutdown: Some(shutdown_tx),
            },
            Err(e) => {
                log::error!("{}", AudioError::Spawn(e));
                Self::failed(config)
            }
        }
    }

    fn failed(config: AnalyserConfig) -> Self {
        Self {
            config,
            state: Acquisition::Failed,
            _shutdown: None,
        }
    }

    /// Resolve a pending acquisition if its result has arrived.
    /// Returns whether the sampler is initialized.
    pub fn poll(&mut self) -> bool {
        if let Acquisition::Pending(rx) = &self.state {
            match rx.try_recv() {
                Ok(Ok(tap)) => {
                    log::info!(
                        "Microphone ready ({} bins per frame)",
                        self.config.bin_count()
                    );
                    self.state = Acquisition::Ready(SamplerHandle::new(&self.config, tap));
                }
                Ok(Err(e)) => {
                    log::error!("Microphone unavailable: {}", e);
                    self.state = Acquisition::Failed;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    log::error!("Microphone unavailable: {}", AudioError::Disconnected);
                    self.state = Acquisition::Failed;
                }
            }
        }
        self.is_initialized()
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, Acquisition::Ready(_))
    }

    /// True once acquisition has failed; the sampler stays uninitialized.
    pub fn has_failed(&self) -> bool {
        matches!(self.state, Acquisition::Failed)
    }

    /// Access to samples, only once initialized
    pub fn handle_mut(&mut self) -> Option<&mut SamplerHandle> {
        match &mut self.state {
            Acquisition::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }
}

/// An initialized sampler: normalized samples and volume per frame
pub struct SamplerHandle {
    analyser: Analyser,
    mode: SampleMode,
    bytes: Vec<u8>,
    samples: Vec<f32>,
    levels: Vec<f32>,
}

impl SamplerHandle {
    pub fn new(config: &AnalyserConfig, tap: SampleTap) -> Self {
        let analyser = Analyser::new(config, tap);
        let bins = analyser.frequency_bin_count();
        Self {
            analyser,
            mode: config.mode,
            bytes: vec![128; bins],
            samples: vec![0.0; bins],
            levels: vec![0.0; bins],
        }
    }

    pub fn bin_count(&self) -> usize {
        self.samples.len()
    }

    /// Current frame as one value per bin in `[-1, 1]`.
    ///
    /// The buffer is overwritten on every call.
    pub fn get_samples(&mut self) -> &[f32] {
        match self.mode {
            SampleMode::Waveform => self.analyser.byte_time_domain_data(&mut self.bytes),
            SampleMode::Spectrum => self.analyser.byte_frequency_data(&mut self.bytes),
        }
        normalize_bytes(&self.bytes, &mut self.samples);
        &self.samples
    }

    /// Root-mean-square of the current waveform (non-negative).
    ///
    /// Always measured on time-domain data, whatever the sample mode.
    pub fn get_volume(&mut self) -> f32 {
        self.analyser.byte_time_domain_data(&mut self.bytes);
        normalize_bytes(&self.bytes, &mut self.levels);
        rms(&self.levels)
    }
}

/// Analyser byte (0..=255) to `[-1, 1)`
pub fn normalize_byte(value: u8) -> f32 {
    value as f32 / 128.0 - 1.0
}

fn normalize_bytes(bytes: &[u8], out: &mut [f32]) {
    for (dst, &b) in out.iter_mut().zip(bytes.iter()) {
        *dst = normalize_byte(b);
    }
}

/// `sqrt(mean(x^2))`; zero for an empty slice
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::input::StreamGuard;
    use std::time::{Duration, Instant};

    struct ConstantInput(f32);

    impl AudioInput for ConstantInput {
        fn open(self: Box<Self>, tap: SampleTap) -> Result<StreamGuard, AudioError> {
            tap.push_mono(&vec![self.0; tap.capacity()]);
            Ok(Box::new(()))
        }
    }

    struct DeniedInput;

    impl AudioInput for DeniedInput {
        fn open(self: Box<Self>, _tap: SampleTap) -> Result<StreamGuard, AudioError> {
            Err(AudioError::NoInputDevice)
        }
    }

    fn poll_until_settled(sampler: &mut AudioSampler) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !sampler.poll() && !sampler.has_failed() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn rms_of_ones_is_one() {
        assert_eq!(rms(&[1.0, 1.0, 1.0, 1.0]), 1.0);
    }

    #[test]
    fn rms_of_zeros_is_zero() {
        assert_eq!(rms(&[0.0; 8]), 0.0);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn rms_is_non_negative() {
        assert!((rms(&[-0.5, -0.5]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn normalizes_bytes() {
        assert_eq!(normalize_byte(128), 0.0);
        assert_eq!(normalize_byte(0), -1.0);
        assert_eq!(normalize_byte(192), 0.5);
    }

    #[test]
    fn successful_acquisition_initializes() {
        let mut sampler = AudioSampler::new(AnalyserConfig::default(), ConstantInput(0.5));
        poll_until_settled(&mut sampler);
        assert!(sampler.is_initialized());

        let handle = sampler.handle_mut().expect("ready");
        assert_eq!(handle.bin_count(), 256);
        let samples = handle.get_samples().to_vec();
        assert_eq!(samples.len(), 256);
        assert!(samples.iter().all(|&s| s == 0.5));
        assert!((handle.get_volume() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn failed_acquisition_stays_uninitialized() {
        let mut sampler = AudioSampler::new(AnalyserConfig::default(), DeniedInput);
        poll_until_settled(&mut sampler);
        assert!(sampler.has_failed());
        for _ in 0..3 {
            assert!(!sampler.poll());
        }
        assert!(sampler.handle_mut().is_none());
    }

    #[test]
    fn invalid_config_never_initializes() {
        let config = AnalyserConfig {
            fft_size: 300,
            ..Default::default()
        };
        let mut sampler = AudioSampler::new(config, ConstantInput(0.0));
        assert!(sampler.has_failed());
        assert!(!sampler.poll());
    }

    #[test]
    fn silent_input_has_zero_volume() {
        let tap = SampleTap::new(512);
        let mut handle = SamplerHandle::new(&AnalyserConfig::default(), tap);
        assert_eq!(handle.get_volume(), 0.0);
        assert!(handle.get_samples().iter().all(|&s| s == 0.0));
    }
}
