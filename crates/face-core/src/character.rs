use crate::config::{FaceConfig, ReactionParams};
use crate::error::ConfigError;
use crate::lipsync::LipSync;
use crate::rig::Rig;
use crate::session::{EndReason, Session, SessionKind};
use crate::task::FrameClock;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharacterState {
    Idle,
    PlayingDialogue,
    /// Combined reaction: audio, lip sync and the step sequence.
    Reacting,
    /// Step sequence without audio.
    Animating,
}

/// A rigged character and everything that animates its face.
///
/// The host calls [`Character::tick`] once per frame. The remaining methods
/// are the entry points a UI layer needs; none of them fail; requests that
/// cannot be honoured are no-ops reported through the returned `bool`.
///
/// Per tick, in order: one [`FrameClock`] is sampled, the active session is
/// resumed (which may end it), then the talking mixer, then expression
/// transitions.
pub struct Character {
    rig: Rig,
    lip: LipSync,
    reaction: ReactionParams,
    session: Option<Session>,
}

impl Character {
    pub fn new(rig: Rig, config: FaceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let lip = LipSync::new(config.lip_sync, &*rig.mesh, config.seed)?;
        Ok(Self {
            rig,
            lip,
            reaction: config.reaction,
            session: None,
        })
    }

    pub fn tick(&mut self, dt: Duration) {
        let clock = FrameClock::sample(dt, self.rig.audio.as_deref());
        if let Some(session) = self.session.as_mut() {
            if let Some(reason) = session.resume(&clock, &mut self.rig, &mut self.lip) {
                self.end_session(reason);
            }
        }
        self.lip.tick_mixer(&clock, &mut *self.rig.mesh);
        self.lip.tick_expressions(clock.dt, &mut *self.rig.mesh);
    }

    /// Start the combined reaction (or the animation-only sequence without
    /// audio). Rejected while any session runs.
    pub fn play_reaction_on_click(&mut self) -> bool {
        if self.reject_if_busy("reaction") {
            return false;
        }
        self.session = Some(Session::reaction(&self.reaction, &mut self.rig, &mut self.lip));
        true
    }

    /// Play the dialogue clip with lip sync only. Rejected while any session
    /// runs or when there is no audio source.
    pub fn play_dialogue_on_click(&mut self) -> bool {
        if self.reject_if_busy("dialogue") {
            return false;
        }
        self.session = Session::dialogue(&self.reaction, &mut self.rig, &mut self.lip);
        self.session.is_some()
    }

    /// Interrupt the running session now: stop its audio, cancel its tasks
    /// and restore the scene. Returns false when idle.
    pub fn cancel_session(&mut self) -> bool {
        if self.session.is_none() {
            return false;
        }
        if let Some(audio) = self.rig.audio.as_mut() {
            audio.stop();
        }
        self.end_session(EndReason::Cancelled);
        true
    }

    /// Mix talking channels against the configured audio source. Does not
    /// start playback.
    pub fn start_lip_sync(&mut self) -> bool {
        match self.rig.audio.as_deref() {
            Some(audio) => {
                self.lip.start(audio);
                true
            }
            None => false,
        }
    }

    pub fn stop_lip_sync(&mut self) {
        self.lip.stop(&mut *self.rig.mesh);
    }

    pub fn trigger_expression(&mut self, name: &str, weight: f32, duration: f32) -> bool {
        self.lip
            .trigger_expression(name, weight, duration, &mut *self.rig.mesh)
    }

    pub fn clear_expression(&mut self, name: &str, duration: f32) -> bool {
        self.lip.clear_expression(name, duration, &mut *self.rig.mesh)
    }

    /// [`Self::trigger_expression`] with the configured default ease.
    pub fn show_expression(&mut self, name: &str, weight: f32) -> bool {
        let duration = self.lip.params().expression_duration_sec;
        self.trigger_expression(name, weight, duration)
    }

    /// [`Self::clear_expression`] with the configured default ease.
    pub fn hide_expression(&mut self, name: &str) -> bool {
        let duration = self.lip.params().expression_duration_sec;
        self.clear_expression(name, duration)
    }

    pub fn state(&self) -> CharacterState {
        match self.session.as_ref().map(Session::kind) {
            None => CharacterState::Idle,
            Some(SessionKind::Dialogue) => CharacterState::PlayingDialogue,
            Some(SessionKind::Combined) => CharacterState::Reacting,
            Some(SessionKind::AnimationOnly) => CharacterState::Animating,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn lip_sync(&self) -> &LipSync {
        &self.lip
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    fn reject_if_busy(&self, what: &str) -> bool {
        match self.state() {
            CharacterState::Idle => false,
            state => {
                log::debug!("[session] {what} rejected while {state:?}");
                true
            }
        }
    }

    fn end_session(&mut self, reason: EndReason) {
        if let Some(session) = self.session.take() {
            session.finish(reason, &mut self.rig, &mut self.lip);
        }
    }
}

impl Drop for Character {
    fn drop(&mut self) {
        // hand the scene back even if the host tears us down mid-session
        self.cancel_session();
    }
}
