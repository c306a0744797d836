//! One running dialogue or reaction, and the scene state it borrows.
//!
//! A [`Session`] is consumed by [`Session::finish`], which is the single
//! teardown path for natural completion, early audio stop and explicit
//! cancellation alike.

use crate::config::ReactionParams;
use crate::lipsync::LipSync;
use crate::rig::{Rig, SimulationMode};
use crate::sequence::ReactionSequence;
use crate::task::{FrameClock, Poll, Suspend};
use glam::{Quat, Vec3};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionKind {
    /// Audio and lip sync only.
    Dialogue,
    /// Audio, lip sync and the step sequence side by side.
    Combined,
    /// The step sequence alone, used when no audio source is configured.
    AnimationOnly,
}

impl SessionKind {
    fn uses_audio(self) -> bool {
        !matches!(self, SessionKind::AnimationOnly)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    Completed,
    AudioStopped,
    Cancelled,
}

/// Scene state captured before a reaction takes over the character.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneSnapshot {
    pub position: Vec3,
    pub rotation: Quat,
    pub behaviours_enabled: SmallVec<[bool; 4]>,
    pub body_mode: Option<SimulationMode>,
}

impl SceneSnapshot {
    /// Record the transform, behaviour toggles and physics mode, then switch
    /// behaviours off and make the body kinematic.
    pub fn suspend(rig: &mut Rig) -> Self {
        let snapshot = Self {
            position: rig.transform.position(),
            rotation: rig.transform.rotation(),
            behaviours_enabled: rig.behaviours.iter().map(|b| b.is_enabled()).collect(),
            body_mode: rig.body.as_ref().map(|b| b.simulation_mode()),
        };
        for behaviour in &mut rig.behaviours {
            behaviour.set_enabled(false);
        }
        if let Some(body) = rig.body.as_mut() {
            body.set_simulation_mode(SimulationMode::Kinematic);
        }
        snapshot
    }

    pub fn restore(self, rig: &mut Rig, restore_transform: bool) {
        for (behaviour, enabled) in rig.behaviours.iter_mut().zip(self.behaviours_enabled) {
            behaviour.set_enabled(enabled);
        }
        if let (Some(body), Some(mode)) = (rig.body.as_mut(), self.body_mode) {
            body.set_simulation_mode(mode);
        }
        if restore_transform {
            rig.transform.set_position(self.position);
            rig.transform.set_rotation(self.rotation);
        }
    }
}

#[derive(Debug)]
pub struct Session {
    kind: SessionKind,
    audio_wait: Option<Suspend>,
    sequence: Option<ReactionSequence>,
    snapshot: Option<SceneSnapshot>,
    idle_state: String,
    cross_fade_sec: f32,
    restore_transform: bool,
}

impl Session {
    /// Idle pose, audio and lip sync. `None` without an audio source.
    pub fn dialogue(params: &ReactionParams, rig: &mut Rig, lip: &mut LipSync) -> Option<Self> {
        if rig.audio.is_none() {
            return None;
        }
        let mut session = Self::bare(SessionKind::Dialogue, params);
        session.start_audio(rig, lip);
        Some(session)
    }

    /// The combined reaction, or the animation-only sequence when there is
    /// no audio source.
    pub fn reaction(params: &ReactionParams, rig: &mut Rig, lip: &mut LipSync) -> Self {
        let kind = if rig.audio.is_some() {
            SessionKind::Combined
        } else {
            SessionKind::AnimationOnly
        };
        let mut session = Self::bare(kind, params);
        session.snapshot = Some(SceneSnapshot::suspend(rig));
        if kind.uses_audio() {
            session.start_audio(rig, lip);
        }
        session.sequence = Some(ReactionSequence::start(params, rig, lip));
        session
    }

    fn bare(kind: SessionKind, params: &ReactionParams) -> Self {
        log::info!("[session] begin {kind:?}");
        Self {
            kind,
            audio_wait: None,
            sequence: None,
            snapshot: None,
            idle_state: params.idle_state.clone(),
            cross_fade_sec: params.cross_fade_sec,
            restore_transform: params.restore_transform,
        }
    }

    fn start_audio(&mut self, rig: &mut Rig, lip: &mut LipSync) {
        rig.request_state(&self.idle_state, self.cross_fade_sec);
        if let Some(audio) = rig.audio.as_mut() {
            audio.play();
            lip.start(&**audio);
            self.audio_wait = Some(Suspend::WhileAudioPlaying);
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn sequence(&self) -> Option<&ReactionSequence> {
        self.sequence.as_ref()
    }

    pub fn snapshot(&self) -> Option<&SceneSnapshot> {
        self.snapshot.as_ref()
    }

    /// Resume for one tick. The audio check comes first so a sequence never
    /// advances on the frame its audio ended.
    pub fn resume(
        &mut self,
        clock: &FrameClock,
        rig: &mut Rig,
        lip: &mut LipSync,
    ) -> Option<EndReason> {
        if let Some(wait) = self.audio_wait.as_mut() {
            if wait.poll(clock) {
                return Some(if self.sequence.is_some() {
                    EndReason::AudioStopped
                } else {
                    EndReason::Completed
                });
            }
        }
        if let Some(seq) = self.sequence.as_mut() {
            if seq.resume(clock, rig, lip) == Poll::Ready {
                self.sequence = None;
            }
        }
        match (self.audio_wait, &self.sequence) {
            (None, None) => Some(EndReason::Completed),
            _ => None,
        }
    }

    /// Tear the session down: cancel what is still running, stop lip sync,
    /// give back the borrowed scene state and return to the idle pose.
    pub fn finish(mut self, reason: EndReason, rig: &mut Rig, lip: &mut LipSync) {
        if let Some(seq) = self.sequence.take() {
            seq.cancel(rig, lip);
        }
        if self.kind.uses_audio() {
            lip.stop(&mut *rig.mesh);
        }
        if let Some(snapshot) = self.snapshot.take() {
            snapshot.restore(rig, self.restore_transform);
        }
        if self.kind.uses_audio() {
            rig.request_state(&self.idle_state, self.cross_fade_sec);
        }
        log::info!("[session] end {:?} ({reason:?})", self.kind);
    }
}
