//! Coarse loudness profile of a clip, built once before playback.

use crate::constants::{MIN_WINDOW_FRAMES, NORMALIZE_EPSILON};
use crate::error::EnvelopeError;
use crate::rig::SampleBuffer;

/// Per-window RMS amplitudes of a clip plus their maximum.
///
/// Immutable once built. `window_sec` is the effective window length, which
/// is longer than the requested one when the minimum frame count kicks in.
#[derive(Clone, Debug, PartialEq)]
pub struct AmplitudeEnvelope {
    windows: Vec<f32>,
    max: f32,
    window_sec: f32,
}

impl AmplitudeEnvelope {
    /// Partition `buffer` into windows of `window_sec` and take the RMS of
    /// every interleaved sample in each. The last window may be partial and
    /// only covers the samples that exist.
    pub fn extract(buffer: &SampleBuffer, window_sec: f32) -> Result<Self, EnvelopeError> {
        if !window_sec.is_finite() || window_sec <= 0.0 {
            return Err(EnvelopeError::InvalidWindow(window_sec));
        }
        if buffer.sample_rate == 0 || buffer.channels == 0 {
            return Err(EnvelopeError::InvalidFormat {
                sample_rate: buffer.sample_rate,
                channels: buffer.channels,
            });
        }
        let channels = buffer.channels as usize;
        if buffer.samples.len() % channels != 0 {
            return Err(EnvelopeError::RaggedInterleave {
                len: buffer.samples.len(),
                channels: buffer.channels,
            });
        }
        let frames = buffer.frames();
        if frames == 0 {
            return Err(EnvelopeError::EmptyClip);
        }

        let window_frames =
            ((window_sec * buffer.sample_rate as f32).round() as usize).max(MIN_WINDOW_FRAMES);
        let window_len = window_frames
            .checked_mul(channels)
            .ok_or(EnvelopeError::InvalidWindow(window_sec))?;
        let total_windows = frames.div_ceil(window_frames);

        let mut windows = Vec::with_capacity(total_windows);
        let mut max = 0.0f32;
        for (w, chunk) in buffer.samples.chunks(window_len).enumerate() {
            let mut sum = 0.0f64;
            for (i, &s) in chunk.iter().enumerate() {
                if !s.is_finite() {
                    return Err(EnvelopeError::NonFiniteSample {
                        index: w * window_len + i,
                    });
                }
                sum += (s as f64) * (s as f64);
            }
            let rms = (sum / chunk.len() as f64).sqrt() as f32;
            max = max.max(rms);
            windows.push(rms);
        }
        debug_assert_eq!(windows.len(), total_windows);

        Ok(Self {
            windows,
            max,
            window_sec: window_frames as f32 / buffer.sample_rate as f32,
        })
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn window_sec(&self) -> f32 {
        self.window_sec
    }

    pub fn windows(&self) -> &[f32] {
        &self.windows
    }

    pub fn duration_sec(&self) -> f32 {
        self.windows.len() as f32 * self.window_sec
    }

    /// Window covering playback time `t`, clamped into the envelope.
    pub fn window_index(&self, t: f32) -> usize {
        let last = self.windows.len().saturating_sub(1);
        if t.is_nan() || t <= 0.0 {
            return 0;
        }
        // float -> usize casts saturate, so huge times land on `last`
        ((t / self.window_sec).floor() as usize).min(last)
    }

    /// Amplitude at `t` scaled so the loudest window is 1.
    pub fn normalized(&self, t: f32) -> f32 {
        if self.windows.is_empty() || self.max <= 0.0 {
            return 0.0;
        }
        let amp = self.windows[self.window_index(t)];
        (amp / self.max.max(NORMALIZE_EPSILON)).clamp(0.0, 1.0)
    }
}
