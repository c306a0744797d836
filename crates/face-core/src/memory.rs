//! In-memory collaborators.
//!
//! Each type is a cheap cloneable handle over shared state, so a host can box
//! one clone into the [`crate::Rig`] and keep another to step or inspect it.
//! The native front-end and the integration tests both run on these.

use crate::error::EnvelopeError;
use crate::rig::{
    AnimationPlayer, AudioSource, Behaviour, ChannelTable, PhysicsBody, SampleBuffer,
    SceneTransform, SimulationMode,
};
use fnv::FnvHashMap;
use glam::{Quat, Vec3};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct MeshState {
    names: Vec<String>,
    weights: Vec<f32>,
    lookup: FnvHashMap<String, usize>,
}

/// Blendshape table keyed by exact channel name.
#[derive(Clone, Debug, Default)]
pub struct MemoryMesh {
    inner: Rc<RefCell<MeshState>>,
}

impl MemoryMesh {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = MeshState::default();
        for name in names {
            let name = name.into();
            state.lookup.entry(name.clone()).or_insert(state.names.len());
            state.names.push(name);
            state.weights.push(0.0);
        }
        Self {
            inner: Rc::new(RefCell::new(state)),
        }
    }

    pub fn weight_of(&self, name: &str) -> Option<f32> {
        let state = self.inner.borrow();
        state.lookup.get(name).map(|&i| state.weights[i])
    }

    pub fn weights(&self) -> Vec<f32> {
        self.inner.borrow().weights.clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.inner.borrow().names.clone()
    }
}

impl ChannelTable for MemoryMesh {
    fn resolve(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.inner.borrow().lookup.get(name).copied()
    }

    fn weight(&self, index: usize) -> f32 {
        self.inner.borrow().weights.get(index).copied().unwrap_or(0.0)
    }

    fn set_weight(&mut self, index: usize, value: f32) {
        if let Some(w) = self.inner.borrow_mut().weights.get_mut(index) {
            *w = value;
        }
    }
}

/// A request the animator received, in call order.
#[derive(Clone, Debug, PartialEq)]
pub enum AnimatorCall {
    CrossFade { state: String, blend_sec: f32 },
    SetBool { name: String, value: bool },
}

#[derive(Debug, Default)]
struct AnimatorState {
    states: Vec<String>,
    bools: FnvHashMap<String, bool>,
    calls: Vec<AnimatorCall>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryAnimator {
    inner: Rc<RefCell<AnimatorState>>,
}

impl MemoryAnimator {
    pub fn new<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let state = AnimatorState {
            states: states.into_iter().map(Into::into).collect(),
            ..AnimatorState::default()
        };
        Self {
            inner: Rc::new(RefCell::new(state)),
        }
    }

    pub fn calls(&self) -> Vec<AnimatorCall> {
        self.inner.borrow().calls.clone()
    }

    pub fn bool_parameter(&self, name: &str) -> bool {
        self.inner.borrow().bools.get(name).copied().unwrap_or(false)
    }

    pub fn cross_fades(&self) -> Vec<String> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                AnimatorCall::CrossFade { state, .. } => Some(state.clone()),
                AnimatorCall::SetBool { .. } => None,
            })
            .collect()
    }
}

impl AnimationPlayer for MemoryAnimator {
    fn cross_fade_to_state(&mut self, name: &str, blend_sec: f32) {
        self.inner.borrow_mut().calls.push(AnimatorCall::CrossFade {
            state: name.to_string(),
            blend_sec,
        });
    }

    fn has_state(&self, name: &str) -> bool {
        self.inner.borrow().states.iter().any(|s| s == name)
    }

    fn set_bool_parameter(&mut self, name: &str, value: bool) {
        let mut state = self.inner.borrow_mut();
        state.bools.insert(name.to_string(), value);
        state.calls.push(AnimatorCall::SetBool {
            name: name.to_string(),
            value,
        });
    }
}

#[derive(Debug)]
struct ClipState {
    clip: Option<SampleBuffer>,
    duration_sec: f32,
    position_sec: f32,
    playing: bool,
    plays: u32,
}

/// Audio source whose playhead is advanced by the host frame loop.
#[derive(Clone, Debug)]
pub struct ClipPlayer {
    inner: Rc<RefCell<ClipState>>,
}

impl ClipPlayer {
    pub fn new(clip: SampleBuffer) -> Self {
        let duration_sec = clip.duration_sec();
        Self::with_state(Some(clip), duration_sec)
    }

    /// A clip that plays for `duration_sec` but whose samples cannot be read.
    pub fn unreadable(duration_sec: f32) -> Self {
        Self::with_state(None, duration_sec)
    }

    fn with_state(clip: Option<SampleBuffer>, duration_sec: f32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ClipState {
                clip,
                duration_sec,
                position_sec: 0.0,
                playing: false,
                plays: 0,
            })),
        }
    }

    /// Move the playhead; playback ends once it reaches the clip duration.
    pub fn advance(&self, dt_sec: f32) {
        let mut state = self.inner.borrow_mut();
        if !state.playing {
            return;
        }
        state.position_sec += dt_sec.max(0.0);
        if state.position_sec >= state.duration_sec {
            state.position_sec = 0.0;
            state.playing = false;
        }
    }

    pub fn duration_sec(&self) -> f32 {
        self.inner.borrow().duration_sec
    }

    pub fn play_count(&self) -> u32 {
        self.inner.borrow().plays
    }
}

impl AudioSource for ClipPlayer {
    fn play(&mut self) {
        let mut state = self.inner.borrow_mut();
        state.position_sec = 0.0;
        state.playing = state.duration_sec > 0.0;
        state.plays += 1;
    }

    fn stop(&mut self) {
        let mut state = self.inner.borrow_mut();
        state.playing = false;
        state.position_sec = 0.0;
    }

    fn is_playing(&self) -> bool {
        self.inner.borrow().playing
    }

    fn current_time(&self) -> f32 {
        self.inner.borrow().position_sec
    }

    fn raw_samples(&self) -> Result<SampleBuffer, EnvelopeError> {
        self.inner
            .borrow()
            .clip
            .clone()
            .ok_or_else(|| EnvelopeError::Unreadable("clip data not loaded".into()))
    }
}

#[derive(Clone, Debug)]
pub struct MemoryBody {
    inner: Rc<RefCell<SimulationMode>>,
}

impl MemoryBody {
    pub fn new(mode: SimulationMode) -> Self {
        Self {
            inner: Rc::new(RefCell::new(mode)),
        }
    }
}

impl PhysicsBody for MemoryBody {
    fn simulation_mode(&self) -> SimulationMode {
        *self.inner.borrow()
    }

    fn set_simulation_mode(&mut self, mode: SimulationMode) {
        *self.inner.borrow_mut() = mode;
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryTransform {
    inner: Rc<RefCell<(Vec3, Quat)>>,
}

impl MemoryTransform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            inner: Rc::new(RefCell::new((position, rotation))),
        }
    }
}

impl SceneTransform for MemoryTransform {
    fn position(&self) -> Vec3 {
        self.inner.borrow().0
    }

    fn rotation(&self) -> Quat {
        self.inner.borrow().1
    }

    fn set_position(&mut self, position: Vec3) {
        self.inner.borrow_mut().0 = position;
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.inner.borrow_mut().1 = rotation;
    }
}

#[derive(Clone, Debug, Default)]
pub struct ToggleBehaviour {
    inner: Rc<RefCell<bool>>,
}

impl ToggleBehaviour {
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(enabled)),
        }
    }
}

impl Behaviour for ToggleBehaviour {
    fn is_enabled(&self) -> bool {
        *self.inner.borrow()
    }

    fn set_enabled(&mut self, enabled: bool) {
        *self.inner.borrow_mut() = enabled;
    }
}
