//! Shared ring of the most recent mono input samples.

use std::sync::{Arc, Mutex, PoisonError};

/// Fixed-capacity ring buffer. Starts out full of silence.
pub struct SampleRing {
    data: Vec<f32>,
    write_idx: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            write_idx: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn push(&mut self, x: f32) {
        self.data[self.write_idx] = x;
        self.write_idx = (self.write_idx + 1) % self.data.len();
    }

    /// Copy the ring in chronological order (oldest first) into `out`.
    ///
    /// When `out` is shorter than the ring only the oldest samples fit;
    /// the rest are dropped.
    pub fn copy_window(&self, out: &mut [f32]) {
        let (newer, older) = self.data.split_at(self.write_idx);
        for (dst, src) in out.iter_mut().zip(older.iter().chain(newer.iter())) {
            *dst = *src;
        }
    }
}

/// Handle shared between the capture callback and the analyser
#[derive(Clone)]
pub struct SampleTap {
    ring: Arc<Mutex<SampleRing>>,
}

impl SampleTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Arc::new(Mutex::new(SampleRing::new(capacity))),
        }
    }

    /// Downmix interleaved frames to mono and append them.
    ///
    /// Runs on the audio callback: if the analyser holds the lock the block
    /// is skipped rather than waited for.
    pub fn push_interleaved<T: Copy>(&self, data: &[T], channels: usize, to_f32: impl Fn(T) -> f32) {
        let channels = channels.max(1);
        if let Ok(mut ring) = self.ring.try_lock() {
            for frame in data.chunks_exact(channels) {
                let acc: f32 = frame.iter().map(|&s| to_f32(s)).sum();
                ring.push(acc / channels as f32);
            }
        }
    }

    /// Blocking variant of [`push_interleaved`](Self::push_interleaved) for
    /// mono data produced off the audio thread.
    pub fn push_mono(&self, data: &[f32]) {
        let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        for &x in data {
            ring.push(x);
        }
    }

    pub fn copy_window(&self, out: &mut [f32]) {
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .copy_window(out);
    }

    pub fn capacity(&self) -> usize {
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_silent() {
        let ring = SampleRing::new(4);
        let mut out = [1.0; 4];
        ring.copy_window(&mut out);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn window_is_chronological_after_wrap() {
        let mut ring = SampleRing::new(4);
        for x in 1..=6 {
            ring.push(x as f32);
        }
        let mut out = [0.0; 4];
        ring.copy_window(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn short_destination_keeps_oldest() {
        let mut ring = SampleRing::new(4);
        for x in 1..=4 {
            ring.push(x as f32);
        }
        let mut out = [0.0; 2];
        ring.copy_window(&mut out);
        assert_eq!(out, [1.0, 2.0]);
    }

    #[test]
    fn downmixes_interleaved_stereo() {
        let tap = SampleTap::new(2);
        tap.push_interleaved(&[1.0f32, 0.0, 0.5, 0.5], 2, |s| s);
        let mut out = [0.0; 2];
        tap.copy_window(&mut out);
        assert_eq!(out, [0.5, 0.5]);
    }
}
