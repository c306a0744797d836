//! Lip-sync front: owns channel resolution, the talking mixer and the
//! expression transitions, and is the only writer of the channels they manage.

use crate::channels::{ChannelMap, ExpressionKind};
use crate::config::LipSyncParams;
use crate::envelope::AmplitudeEnvelope;
use crate::error::ConfigError;
use crate::expression::ExpressionManager;
use crate::mixer::TalkMixer;
use crate::rig::{AudioSource, ChannelTable};
use crate::task::FrameClock;
use rand::prelude::*;

/// Build the envelope for `source`, or `None` when envelope mixing is off or
/// the clip cannot be analysed. Failures are logged and swallowed here.
pub fn envelope_for(
    source: &dyn AudioSource,
    params: &LipSyncParams,
) -> Option<AmplitudeEnvelope> {
    if !params.audio_driven {
        return None;
    }
    let result = source
        .raw_samples()
        .and_then(|buf| AmplitudeEnvelope::extract(&buf, params.envelope_window_sec));
    match result {
        Ok(env) => {
            log::debug!(
                "[envelope] windows={} window={:.3}s max={:.4}",
                env.len(),
                env.window_sec(),
                env.max()
            );
            Some(env)
        }
        Err(e) => {
            log::warn!("[envelope] falling back to random mixing: {e}");
            None
        }
    }
}

pub struct LipSync {
    params: LipSyncParams,
    channels: ChannelMap,
    mixer: Option<TalkMixer>,
    expressions: ExpressionManager,
    rng: StdRng,
}

impl LipSync {
    /// Validates `params` and resolves channel names against `mesh`.
    pub fn new(
        params: LipSyncParams,
        mesh: &dyn ChannelTable,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        let channels = ChannelMap::resolve(&params, mesh);
        Ok(Self {
            params,
            channels,
            mixer: None,
            expressions: ExpressionManager::default(),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Re-resolve channel names, e.g. after the mesh was swapped.
    pub fn refresh_channels(&mut self, mesh: &dyn ChannelTable) {
        self.channels = ChannelMap::resolve(&self.params, mesh);
    }

    /// Start mixing against `source`. The envelope is built here, before the
    /// first mixed frame. A running mixer is replaced without a reset.
    pub fn start(&mut self, source: &dyn AudioSource) {
        let envelope = envelope_for(source, &self.params);
        let mixer_rng = StdRng::seed_from_u64(self.rng.gen());
        let mixer = TalkMixer::new(
            envelope,
            self.channels.talking().len(),
            &self.params,
            mixer_rng,
        );
        log::info!(
            "[lipsync] start mode={}",
            if mixer.is_audio_driven() { "envelope" } else { "random" }
        );
        self.mixer = Some(mixer);
    }

    /// Stop mixing, drop running expression transitions and zero every
    /// managed channel. Safe to call repeatedly.
    pub fn stop(&mut self, mesh: &mut dyn ChannelTable) {
        if self.mixer.take().is_some() {
            log::info!("[lipsync] stop");
        }
        self.expressions.cancel_all();
        for index in self.channels.managed() {
            mesh.set_weight(index, 0.0);
        }
    }

    pub fn is_running(&self) -> bool {
        self.mixer.is_some()
    }

    /// One mixer frame. When the mixer observes the audio stopped it exits and
    /// the reset runs.
    pub fn tick_mixer(&mut self, clock: &FrameClock, mesh: &mut dyn ChannelTable) {
        let Some(mixer) = self.mixer.as_mut() else {
            return;
        };
        if mixer.tick(clock, &self.channels, mesh).is_ready() {
            self.stop(mesh);
        }
    }

    pub fn tick_expressions(&mut self, dt: f32, mesh: &mut dyn ChannelTable) {
        self.expressions.tick(dt, mesh);
    }

    pub fn trigger_expression(
        &mut self,
        name: &str,
        weight: f32,
        duration: f32,
        mesh: &mut dyn ChannelTable,
    ) -> bool {
        self.expressions
            .set_expression(&self.channels, name, weight, duration, mesh)
    }

    pub fn clear_expression(
        &mut self,
        name: &str,
        duration: f32,
        mesh: &mut dyn ChannelTable,
    ) -> bool {
        self.expressions
            .clear_expression(&self.channels, name, duration, mesh)
    }

    /// Snap both expressions to zero, dropping their transitions.
    pub fn reset_expressions(&mut self, mesh: &mut dyn ChannelTable) {
        self.expressions.cancel_all();
        for kind in ExpressionKind::ALL {
            if let Some(index) = self.channels.expression(kind) {
                mesh.set_weight(index, 0.0);
            }
        }
    }

    pub fn is_expression_label(&self, name: &str) -> bool {
        self.channels.kind_for(name).is_some()
    }

    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    pub fn expressions(&self) -> &ExpressionManager {
        &self.expressions
    }

    pub fn mixer(&self) -> Option<&TalkMixer> {
        self.mixer.as_ref()
    }

    pub fn params(&self) -> &LipSyncParams {
        &self.params
    }
}
