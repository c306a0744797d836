use std::thread;
use std::time::Duration;

use face_core::constants::{DEFAULT_TALKING_BLENDSHAPES, SAD_BLENDSHAPE, SMILE_BLENDSHAPE};
use face_core::memory::{
    ClipPlayer, MemoryAnimator, MemoryBody, MemoryMesh, MemoryTransform, ToggleBehaviour,
};
use face_core::{
    Behaviour, Character, CharacterState, FaceConfig, PhysicsBody, Rig, SampleBuffer,
    SceneTransform, SimulationMode,
};
use glam::{Quat, Vec3};
use instant::Instant;

const SAMPLE_RATE: u32 = 44_100;
const DIALOGUE_SEC: f32 = 3.0;
const FRAME_SLEEP: Duration = Duration::from_millis(15);
const REPORT_EVERY_SEC: f32 = 0.5;

/// Stereo "speech": a voiced carrier under a syllable-rate envelope with
/// short pauses, enough to exercise the envelope mixer.
fn synth_dialogue(duration_sec: f32) -> SampleBuffer {
    let frames = (duration_sec * SAMPLE_RATE as f32) as usize;
    let mut samples = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let t = i as f32 / SAMPLE_RATE as f32;
        let syllable = (t * 4.5 * std::f32::consts::TAU).sin().max(0.0);
        let phrase = if (t % 1.2) > 1.0 { 0.0 } else { 1.0 };
        let voiced = (t * 180.0 * std::f32::consts::TAU).sin()
            + 0.3 * (t * 360.0 * std::f32::consts::TAU).sin();
        let s = 0.4 * syllable * phrase * voiced;
        samples.push(s);
        samples.push(s * 0.9);
    }
    SampleBuffer::new(samples, SAMPLE_RATE, 2)
}

fn face_mesh() -> MemoryMesh {
    let mut names: Vec<&str> = DEFAULT_TALKING_BLENDSHAPES.to_vec();
    names.extend([SMILE_BLENDSHAPE, SAD_BLENDSHAPE, "blink_l", "blink_r"]);
    MemoryMesh::new(names)
}

fn run_until_idle(character: &mut Character, player: &ClipPlayer, mesh: &MemoryMesh) {
    let start = Instant::now();
    let mut last = start;
    let mut next_report = 0.0f32;
    while character.is_busy() {
        let now = Instant::now();
        let dt = now - last;
        last = now;
        player.advance(dt.as_secs_f32());
        character.tick(dt);

        let elapsed = start.elapsed().as_secs_f32();
        if elapsed >= next_report {
            next_report += REPORT_EVERY_SEC;
            let weights: Vec<String> = mesh
                .names()
                .iter()
                .zip(mesh.weights())
                .map(|(n, w)| format!("{n}={w:.0}"))
                .collect();
            log::info!(
                "[native] t={elapsed:.2}s state={:?} {}",
                character.state(),
                weights.join(" ")
            );
        }
        thread::sleep(FRAME_SLEEP);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mesh = face_mesh();
    let player = ClipPlayer::new(synth_dialogue(DIALOGUE_SEC));
    let transform = MemoryTransform::new(Vec3::new(0.0, 0.0, -4.0), Quat::IDENTITY);
    let body = MemoryBody::new(SimulationMode::Dynamic);
    let mover = ToggleBehaviour::new(true);

    let rig = Rig::new(Box::new(mesh.clone()), Box::new(transform.clone()))
        .with_animator(Box::new(MemoryAnimator::new(["idle", "Smile", "Sad"])))
        .with_audio(Box::new(player.clone()))
        .with_body(Box::new(body.clone()))
        .with_behaviour(Box::new(mover.clone()));
    let mut character = Character::new(rig, FaceConfig::default())?;

    log::info!(
        "[native] dialogue clip {:.2}s, {} talking channels resolved",
        player.duration_sec(),
        character.lip_sync().channels().resolved_talking().len()
    );

    if character.play_reaction_on_click() {
        run_until_idle(&mut character, &player, &mesh);
    }
    if character.play_dialogue_on_click() {
        run_until_idle(&mut character, &player, &mesh);
    }

    anyhow::ensure!(
        character.state() == CharacterState::Idle,
        "character did not return to idle"
    );
    log::info!(
        "[native] done, body {:?}, mover enabled {}, transform at {:?}",
        body.simulation_mode(),
        mover.is_enabled(),
        transform.position()
    );
    Ok(())
}
