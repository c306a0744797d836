// Shared fixtures for the face-core integration tests.

#![allow(dead_code)]
use face_core::memory::*;
use face_core::*;
use glam::{Quat, Vec3};
use std::time::Duration;

pub const FRAME: Duration = Duration::from_micros(16_667);
pub const RATE: u32 = 48_000;

pub fn face_mesh() -> MemoryMesh {
    MemoryMesh::new(["open_mouth", "open_mouth2", "o_mouth", "smile", "sad", "blink"])
}

/// Mono clip whose per-window level follows `levels`, one entry per 50 ms.
pub fn stepped_clip(levels: &[f32]) -> SampleBuffer {
    let per_window = (RATE as f32 * 0.05) as usize;
    let mut samples = Vec::with_capacity(per_window * levels.len());
    for &level in levels {
        // alternating sign keeps the RMS equal to `level`
        samples.extend((0..per_window).map(|i| if i % 2 == 0 { level } else { -level }));
    }
    SampleBuffer::new(samples, RATE, 1)
}

/// Clip of `duration_sec` with a slow loudness wobble.
pub fn speech_clip(duration_sec: f32) -> SampleBuffer {
    let frames = (duration_sec * RATE as f32) as usize;
    let samples = (0..frames)
        .map(|i| {
            let t = i as f32 / RATE as f32;
            let env = 0.5 + 0.5 * (t * 9.0).sin();
            0.6 * env * (t * 220.0 * std::f32::consts::TAU).sin()
        })
        .collect();
    SampleBuffer::new(samples, RATE, 1)
}

pub struct Handles {
    pub mesh: MemoryMesh,
    pub animator: MemoryAnimator,
    pub audio: Option<ClipPlayer>,
    pub body: Option<MemoryBody>,
    pub transform: MemoryTransform,
    pub behaviours: Vec<ToggleBehaviour>,
}

impl Handles {
    pub fn new(audio: Option<ClipPlayer>) -> Self {
        Self {
            mesh: face_mesh(),
            animator: MemoryAnimator::new(["idle", "Smile", "Sad"]),
            audio,
            body: None,
            transform: MemoryTransform::new(
                Vec3::new(1.5, 0.0, -2.25),
                Quat::from_rotation_y(0.7),
            ),
            behaviours: Vec::new(),
        }
    }

    pub fn with_body(mut self, mode: SimulationMode) -> Self {
        self.body = Some(MemoryBody::new(mode));
        self
    }

    pub fn with_behaviours(mut self, enabled: &[bool]) -> Self {
        self.behaviours = enabled.iter().map(|&e| ToggleBehaviour::new(e)).collect();
        self
    }

    pub fn with_animator(mut self, animator: MemoryAnimator) -> Self {
        self.animator = animator;
        self
    }

    pub fn rig(&self) -> Rig {
        let mut rig = Rig::new(Box::new(self.mesh.clone()), Box::new(self.transform.clone()))
            .with_animator(Box::new(self.animator.clone()));
        if let Some(audio) = &self.audio {
            rig = rig.with_audio(Box::new(audio.clone()));
        }
        if let Some(body) = &self.body {
            rig = rig.with_body(Box::new(body.clone()));
        }
        for b in &self.behaviours {
            rig = rig.with_behaviour(Box::new(b.clone()));
        }
        rig
    }

    pub fn character(&self) -> Character {
        Character::new(self.rig(), FaceConfig::default()).expect("default config is valid")
    }

    /// One host frame: the audio clock moves first, then the character ticks.
    pub fn step(&self, character: &mut Character) {
        if let Some(audio) = &self.audio {
            audio.advance(FRAME.as_secs_f32());
        }
        character.tick(FRAME);
    }

    pub fn run_for(&self, character: &mut Character, seconds: f32) {
        let frames = (seconds / FRAME.as_secs_f32()).ceil() as usize;
        for _ in 0..frames {
            self.step(character);
        }
    }

    /// Step until the character is idle; panics after `max_seconds`.
    pub fn run_until_idle(&self, character: &mut Character, max_seconds: f32) -> usize {
        let max_frames = (max_seconds / FRAME.as_secs_f32()).ceil() as usize;
        for frame in 0..max_frames {
            if !character.is_busy() {
                return frame;
            }
            self.step(character);
        }
        assert!(!character.is_busy(), "still busy after {max_seconds}s");
        max_frames
    }

    pub fn talking_weights(&self) -> [f32; 3] {
        [
            self.mesh.weight_of("open_mouth").unwrap(),
            self.mesh.weight_of("open_mouth2").unwrap(),
            self.mesh.weight_of("o_mouth").unwrap(),
        ]
    }

    pub fn expression_weights(&self) -> [f32; 2] {
        [
            self.mesh.weight_of("smile").unwrap(),
            self.mesh.weight_of("sad").unwrap(),
        ]
    }
}
