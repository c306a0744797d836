//! Collaborator interfaces the character drives.
//!
//! The core never renders, simulates or decodes anything itself. It issues
//! weights and state requests through these traits, which a host implements
//! on top of its engine. [`crate::memory`] provides in-memory versions.

use crate::error::EnvelopeError;
use glam::{Quat, Vec3};

/// Raw interleaved PCM as handed over by an audio source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Samples per channel. Zero when the channel count is zero.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_sec(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f32 / self.sample_rate as f32
        }
    }
}

/// The mesh's blendshape table.
pub trait ChannelTable {
    /// Index of the channel named exactly `name`, if the mesh has one.
    fn resolve(&self, name: &str) -> Option<usize>;
    fn weight(&self, index: usize) -> f32;
    fn set_weight(&mut self, index: usize, value: f32);
}

pub trait AnimationPlayer {
    fn cross_fade_to_state(&mut self, name: &str, blend_sec: f32);
    fn has_state(&self, name: &str) -> bool;
    fn set_bool_parameter(&mut self, name: &str, value: bool);
}

/// Playback handle for the dialogue clip.
pub trait AudioSource {
    fn play(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    /// Playhead position in seconds.
    fn current_time(&self) -> f32;
    fn raw_samples(&self) -> Result<SampleBuffer, EnvelopeError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationMode {
    /// Driven by the physics solver.
    Dynamic,
    /// Driven by animation and script, ignored by the solver.
    Kinematic,
}

pub trait PhysicsBody {
    fn simulation_mode(&self) -> SimulationMode;
    fn set_simulation_mode(&mut self, mode: SimulationMode);
}

pub trait SceneTransform {
    fn position(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    fn set_position(&mut self, position: Vec3);
    fn set_rotation(&mut self, rotation: Quat);
}

/// An auxiliary component (movement script, character controller, ...) that
/// must be switched off while a reaction plays.
pub trait Behaviour {
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
}

/// Everything a [`crate::Character`] drives, owned as trait objects.
///
/// Only the mesh and transform are mandatory; a missing animator, audio
/// source or physics body degrades the corresponding behaviour silently.
pub struct Rig {
    pub mesh: Box<dyn ChannelTable>,
    pub transform: Box<dyn SceneTransform>,
    pub animator: Option<Box<dyn AnimationPlayer>>,
    pub audio: Option<Box<dyn AudioSource>>,
    pub body: Option<Box<dyn PhysicsBody>>,
    pub behaviours: Vec<Box<dyn Behaviour>>,
}

impl Rig {
    pub fn new(mesh: Box<dyn ChannelTable>, transform: Box<dyn SceneTransform>) -> Self {
        Self {
            mesh,
            transform,
            animator: None,
            audio: None,
            body: None,
            behaviours: Vec::new(),
        }
    }

    pub fn with_animator(mut self, animator: Box<dyn AnimationPlayer>) -> Self {
        self.animator = Some(animator);
        self
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioSource>) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_body(mut self, body: Box<dyn PhysicsBody>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_behaviour(mut self, behaviour: Box<dyn Behaviour>) -> Self {
        self.behaviours.push(behaviour);
        self
    }

    /// Cross-fade to `state` only when the animator knows it.
    pub(crate) fn request_state(&mut self, state: &str, blend_sec: f32) -> bool {
        match self.animator.as_mut() {
            Some(animator) if !state.is_empty() && animator.has_state(state) => {
                animator.cross_fade_to_state(state, blend_sec);
                true
            }
            _ => false,
        }
    }
}
