//! Cooperative task primitives.
//!
//! Tasks in this crate are plain state machines resumed once per tick. A
//! task keeps where it is as an enum and what it is waiting on as a
//! [`Suspend`]; cancelling a task is dropping that state.

use crate::rig::AudioSource;
use std::time::Duration;

/// The values every task observes for one tick.
///
/// Sampled once at the start of the tick so that all tasks resumed in the
/// same frame agree on elapsed time and audio state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameClock {
    pub dt: f32,
    pub audio_playing: bool,
    pub audio_time: f32,
}

impl FrameClock {
    pub fn sample(dt: Duration, audio: Option<&dyn AudioSource>) -> Self {
        let (audio_playing, audio_time) = match audio {
            Some(a) => (a.is_playing(), a.current_time()),
            None => (false, 0.0),
        };
        Self {
            dt: dt.as_secs_f32(),
            audio_playing,
            audio_time,
        }
    }
}

/// What a suspended task is waiting for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Suspend {
    /// Resume on the next tick.
    NextFrame,
    /// Resume once this many seconds of frame time have elapsed.
    Seconds(f32),
    /// Resume on the first tick that observes the audio stopped.
    WhileAudioPlaying,
}

impl Suspend {
    /// Advance the wait by one tick. Returns true when the task may resume.
    pub fn poll(&mut self, clock: &FrameClock) -> bool {
        match self {
            Suspend::NextFrame => true,
            Suspend::Seconds(remaining) => {
                *remaining -= clock.dt;
                *remaining <= 0.0
            }
            Suspend::WhileAudioPlaying => !clock.audio_playing,
        }
    }
}

/// Result of resuming a task for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Poll {
    Pending,
    Ready,
}

impl Poll {
    pub fn is_ready(self) -> bool {
        matches!(self, Poll::Ready)
    }
}
