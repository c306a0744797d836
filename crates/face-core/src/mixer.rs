//! Per-frame talking weights.
//!
//! While the driving audio plays, a random subset of the talking channels is
//! targeted each frame and every channel eases toward its target with
//! exponential smoothing. With an envelope the subset size and peak follow
//! the clip's loudness; without one the subset is re-rolled on a short
//! random cadence.

use crate::channels::ChannelMap;
use crate::config::LipSyncParams;
use crate::constants::{
    lerp, ACTIVE_SCALE_LOUD, ACTIVE_SCALE_QUIET, TALK_JITTER_MAX, TALK_JITTER_MIN,
};
use crate::envelope::AmplitudeEnvelope;
use crate::rig::ChannelTable;
use crate::task::{FrameClock, Poll, Suspend};
use rand::prelude::*;
use smallvec::SmallVec;

/// Peak talking weight for a normalized amplitude.
#[inline]
pub fn peak_weight(min: f32, max: f32, amp: f32) -> f32 {
    lerp(min, max, amp.clamp(0.0, 1.0))
}

/// Per-frame blend factor for `weight += (target - weight) * factor`.
#[inline]
pub fn smoothing_factor(speed: f32, dt: f32) -> f32 {
    (speed * dt).clamp(0.0, 1.0)
}

/// Number of channels to target at amplitude `amp`.
///
/// Clamped to `[1, total]` and then to the channels that resolved, which
/// may leave zero when nothing resolved.
pub fn active_count(simultaneous: usize, amp: f32, total: usize, resolved: usize) -> usize {
    let scale = lerp(ACTIVE_SCALE_QUIET, ACTIVE_SCALE_LOUD, amp.clamp(0.0, 1.0));
    let wanted = (simultaneous as f32 * scale).ceil() as usize;
    wanted.clamp(1, total.max(1)).min(resolved)
}

#[derive(Debug)]
enum MixMode {
    AudioDriven(AmplitudeEnvelope),
    Fallback { hold: Suspend },
}

#[derive(Debug)]
pub struct TalkMixer {
    mode: MixMode,
    weights: Vec<f32>,
    targets: Vec<f32>,
    rng: StdRng,
    talk_min: f32,
    talk_max: f32,
    simultaneous: usize,
    smoothing_speed: f32,
    fallback_interval: (f32, f32),
}

impl TalkMixer {
    /// `channel_count` is the number of configured talking channels,
    /// resolved or not. `params` must already be validated.
    pub(crate) fn new(
        envelope: Option<AmplitudeEnvelope>,
        channel_count: usize,
        params: &LipSyncParams,
        rng: StdRng,
    ) -> Self {
        let mode = match envelope {
            Some(env) if params.audio_driven && !env.is_empty() => MixMode::AudioDriven(env),
            _ => MixMode::Fallback {
                hold: Suspend::NextFrame,
            },
        };
        Self {
            mode,
            weights: vec![0.0; channel_count],
            targets: vec![0.0; channel_count],
            rng,
            talk_min: params.talk_min_weight,
            talk_max: params.talk_max_weight,
            simultaneous: params.talk_simultaneous,
            smoothing_speed: params.smoothing_speed,
            fallback_interval: params.fallback_interval_sec,
        }
    }

    pub fn is_audio_driven(&self) -> bool {
        matches!(self.mode, MixMode::AudioDriven(_))
    }

    pub fn envelope(&self) -> Option<&AmplitudeEnvelope> {
        match &self.mode {
            MixMode::AudioDriven(env) => Some(env),
            MixMode::Fallback { .. } => None,
        }
    }

    /// Current targets, one per configured talking channel.
    pub fn targets(&self) -> &[f32] {
        &self.targets
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Run one frame. Returns `Ready` once the audio is observed stopped,
    /// without writing anything that frame.
    pub fn tick(
        &mut self,
        clock: &FrameClock,
        channels: &ChannelMap,
        mesh: &mut dyn ChannelTable,
    ) -> Poll {
        if !clock.audio_playing {
            return Poll::Ready;
        }

        let resolved = channels.resolved_talking();
        let total = channels.talking().len();
        match &mut self.mode {
            MixMode::AudioDriven(env) => {
                let amp = env.normalized(clock.audio_time);
                let peak = peak_weight(self.talk_min, self.talk_max, amp);
                let count = active_count(self.simultaneous, amp, total, resolved.len());
                let chosen = choose_channels(&mut self.rng, resolved, count);
                for (i, target) in self.targets.iter_mut().enumerate() {
                    *target = if chosen.contains(&i) {
                        peak * self.rng.gen_range(TALK_JITTER_MIN..=TALK_JITTER_MAX)
                    } else {
                        0.0
                    };
                }
            }
            MixMode::Fallback { hold } => {
                if hold.poll(clock) {
                    let wanted = self.rng.gen_range(1..=self.simultaneous.max(1));
                    let count = wanted.clamp(1, total.max(1)).min(resolved.len());
                    let chosen = choose_channels(&mut self.rng, resolved, count);
                    for (i, target) in self.targets.iter_mut().enumerate() {
                        *target = if chosen.contains(&i) {
                            self.rng.gen_range(self.talk_min..=self.talk_max)
                        } else {
                            0.0
                        };
                    }
                    let (lo, hi) = self.fallback_interval;
                    *hold = Suspend::Seconds(self.rng.gen_range(lo..=hi));
                }
            }
        }

        let k = smoothing_factor(self.smoothing_speed, clock.dt);
        for (i, slot) in channels.talking().iter().enumerate() {
            let w = &mut self.weights[i];
            *w += (self.targets[i] - *w) * k;
            if let Some(index) = slot {
                mesh.set_weight(*index, *w);
            }
        }
        Poll::Pending
    }
}

/// Pick `count` distinct entries of `pool` with a partial Fisher-Yates
/// shuffle. `count` must not exceed the pool size.
fn choose_channels(
    rng: &mut StdRng,
    mut pool: SmallVec<[usize; 8]>,
    count: usize,
) -> SmallVec<[usize; 8]> {
    let count = count.min(pool.len());
    let (chosen, _) = pool.partial_shuffle(rng, count);
    SmallVec::from_slice(chosen)
}
