//! The nested Smile/Sad step sequence run inside a reaction session.

use crate::config::ReactionParams;
use crate::lipsync::LipSync;
use crate::rig::Rig;
use crate::task::{FrameClock, Poll, Suspend};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Holding(Suspend),
    Done,
}

/// Steps through the configured animation states, holding each for the step
/// duration. A step cross-fades to the animator state of the same name, or
/// raises a bool parameter of that name when no such state exists, and
/// drives the matching expression channel if the name is an expression.
#[derive(Debug)]
pub struct ReactionSequence {
    steps: Vec<String>,
    index: usize,
    phase: Phase,
    raised_param: Option<String>,
    strength: f32,
    ease_sec: f32,
    step_sec: f32,
    cross_fade_sec: f32,
}

impl ReactionSequence {
    /// Create the sequence and enter its first step immediately.
    pub fn start(params: &ReactionParams, rig: &mut Rig, lip: &mut LipSync) -> Self {
        let mut seq = Self {
            steps: params.steps.clone(),
            index: 0,
            phase: Phase::Done,
            raised_param: None,
            strength: params.expression_strength,
            ease_sec: params.expression_ease_sec,
            step_sec: params.step_duration_sec,
            cross_fade_sec: params.cross_fade_sec,
        };
        seq.enter_step(rig, lip);
        seq
    }

    pub fn current_step(&self) -> Option<&str> {
        match self.phase {
            Phase::Holding(_) => self.steps.get(self.index).map(String::as_str),
            Phase::Done => None,
        }
    }

    pub fn step_index(&self) -> usize {
        self.index
    }

    pub fn resume(&mut self, clock: &FrameClock, rig: &mut Rig, lip: &mut LipSync) -> Poll {
        let Phase::Holding(wait) = &mut self.phase else {
            return Poll::Ready;
        };
        if !wait.poll(clock) {
            return Poll::Pending;
        }
        self.exit_step(rig, lip);
        self.index += 1;
        self.enter_step(rig, lip);
        match self.phase {
            Phase::Done => Poll::Ready,
            Phase::Holding(_) => Poll::Pending,
        }
    }

    /// Abort mid-step: lower any raised parameter and snap both expressions
    /// to zero rather than easing them out.
    pub fn cancel(mut self, rig: &mut Rig, lip: &mut LipSync) {
        if let Some(step) = self.current_step() {
            log::debug!("[session] sequence cancelled during '{step}'");
        }
        self.lower_param(rig);
        lip.reset_expressions(&mut *rig.mesh);
    }

    fn enter_step(&mut self, rig: &mut Rig, lip: &mut LipSync) {
        let Some(name) = self.steps.get(self.index) else {
            self.phase = Phase::Done;
            return;
        };
        log::debug!("[session] step {} '{name}'", self.index);
        if !rig.request_state(name, self.cross_fade_sec) {
            if let Some(animator) = rig.animator.as_mut() {
                animator.set_bool_parameter(name, true);
                self.raised_param = Some(name.clone());
            }
        }
        if lip.is_expression_label(name) {
            lip.trigger_expression(name, self.strength, self.ease_sec, &mut *rig.mesh);
        }
        self.phase = Phase::Holding(Suspend::Seconds(self.step_sec));
    }

    fn exit_step(&mut self, rig: &mut Rig, lip: &mut LipSync) {
        self.lower_param(rig);
        if let Some(name) = self.steps.get(self.index) {
            if lip.is_expression_label(name) {
                lip.clear_expression(name, self.ease_sec, &mut *rig.mesh);
            }
        }
    }

    fn lower_param(&mut self, rig: &mut Rig) {
        if let Some(param) = self.raised_param.take() {
            if let Some(animator) = rig.animator.as_mut() {
                animator.set_bool_parameter(&param, false);
            }
        }
    }
}
