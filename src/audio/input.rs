//! Capture backends that feed a [`SampleTap`].

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};

use super::tap::SampleTap;
use crate::error::AudioError;

/// Keeps a running capture alive; dropping it stops the capture.
pub type StreamGuard = Box<dyn Any>;

/// A source of live input audio.
///
/// `open` runs once, off the frame loop, and either starts pushing mono
/// samples into `tap` or fails.
pub trait AudioInput: Send + 'static {
    fn open(self: Box<Self>, tap: SampleTap) -> Result<StreamGuard, AudioError>;
}

/// The host's default microphone via cpal
#[derive(Debug, Default)]
pub struct CpalInput;

impl AudioInput for CpalInput {
    fn open(self: Box<Self>, tap: SampleTap) -> Result<StreamGuard, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::NoInputDevice)?;

        let supported = device.default_input_config()?;
        let format = supported.sample_format();
        let config: StreamConfig = supported.config();

        log::info!(
            "Audio input: {} @ {}Hz, {} channel(s), {:?}",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate.0,
            config.channels,
            format
        );

        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, tap)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, tap)?,
            SampleFormat::I32 => build_stream::<i32>(&device, &config, tap)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, tap)?,
            other => return Err(AudioError::UnsupportedFormat(other)),
        };
        stream.play()?;

        Ok(Box::new(stream))
    }
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    tap: SampleTap,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let reported = AtomicBool::new(false);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            tap.push_interleaved(data, channels, f32::from_sample);
        },
        move |err| {
            if first_report(&reported) {
                log::error!("Audio stream error: {}", err);
            } else {
                log::debug!("Audio stream error: {}", err);
            }
        },
        None,
    )?;

    Ok(stream)
}

/// True for the first call on `flag`, false afterwards
fn first_report(flag: &AtomicBool) -> bool {
    !flag.swap(true, Ordering::Relaxed)
}
