// Host-side tests for envelope-driven and fallback talking mixing.

mod support;

use face_core::memory::*;
use face_core::mixer::{active_count, peak_weight};
use face_core::*;
use support::*;

fn playing(time: f32, dt: f32) -> FrameClock {
    FrameClock {
        dt,
        audio_playing: true,
        audio_time: time,
    }
}

fn started(params: LipSyncParams, mesh: &MemoryMesh, clip: ClipPlayer) -> LipSync {
    let mut lip = LipSync::new(params, mesh, 7).expect("valid params");
    lip.start(&clip);
    lip
}

#[test]
fn one_second_clip_yields_twenty_windows() {
    let clip = ClipPlayer::new(speech_clip(1.0));
    let lip = started(LipSyncParams::default(), &face_mesh(), clip);
    let env = lip.mixer().and_then(|m| m.envelope()).expect("envelope");
    assert_eq!(env.len(), 20);
    for &w in env.windows() {
        assert!(w >= 0.0 && w <= env.max());
    }
    let max = env.windows().iter().cloned().fold(0.0f32, f32::max);
    assert_eq!(env.max(), max);
}

#[test]
fn half_amplitude_window_targets_midpoint_weight() {
    // window 0 is the loudest at 0.5, window 1 sits at 0.25
    let clip = ClipPlayer::new(stepped_clip(&[0.5, 0.25, 0.1]));
    let mut mesh = face_mesh();
    let params = LipSyncParams::default();
    let mut lip = started(params.clone(), &mesh, clip);

    let env = lip.mixer().and_then(|m| m.envelope()).unwrap();
    assert!((env.max() - 0.5).abs() < 1e-6);
    assert!((env.normalized(0.06) - 0.5).abs() < 1e-5);

    lip.tick_mixer(&playing(0.06, 0.016), &mut mesh);
    let expected = peak_weight(params.talk_min_weight, params.talk_max_weight, 0.5);
    assert!((expected - 55.0).abs() < 1e-4);

    let targets = lip.mixer().unwrap().targets();
    let active: Vec<f32> = targets.iter().cloned().filter(|&t| t > 0.0).collect();
    assert_eq!(active.len(), active_count(2, 0.5, 3, 3));
    for t in active {
        assert!(t >= expected * 0.8 - 1e-4 && t <= expected + 1e-4, "target {t}");
    }
}

#[test]
fn targeted_channels_never_exceed_scaled_count() {
    let clip = ClipPlayer::new(speech_clip(2.0));
    let mut mesh = face_mesh();
    let mut params = LipSyncParams::default();
    params.talk_simultaneous = 3;
    let mut lip = started(params, &mesh, clip);
    let env = lip.mixer().and_then(|m| m.envelope()).unwrap().clone();

    let mut t = 0.0;
    while t < 2.0 {
        lip.tick_mixer(&playing(t, 0.016), &mut mesh);
        let amp = env.normalized(t);
        let limit = active_count(3, amp, 3, 3);
        let active = lip
            .mixer()
            .unwrap()
            .targets()
            .iter()
            .filter(|&&x| x > 0.0)
            .count();
        assert!(active <= limit && active <= 3, "t={t} active={active}");
        assert!(active >= 1);
        t += 0.016;
    }
}

#[test]
fn unresolved_talking_channel_is_skipped() {
    let mut mesh = MemoryMesh::new(["open_mouth", "o_mouth", "smile", "sad"]);
    let mut params = LipSyncParams::default();
    params.talk_simultaneous = 3;
    let mut lip = started(params, &mesh, ClipPlayer::new(speech_clip(1.0)));
    assert_eq!(lip.channels().resolved_talking().len(), 2);

    for i in 0..120 {
        lip.tick_mixer(&playing(i as f32 / 120.0, 0.016), &mut mesh);
        let targets = lip.mixer().unwrap().targets();
        // "open_mouth2" is position 1 and absent from the mesh
        assert_eq!(targets[1], 0.0);
        assert!(targets.iter().filter(|&&x| x > 0.0).count() <= 2);
    }
    assert_eq!(mesh.weights().len(), 4);
}

#[test]
fn weights_smooth_exponentially_toward_target() {
    let mut mesh = face_mesh();
    let mut lip = started(
        LipSyncParams::default(),
        &mesh,
        ClipPlayer::new(stepped_clip(&[0.4; 10])),
    );
    lip.tick_mixer(&playing(0.1, 0.05), &mut mesh);
    let mixer = lip.mixer().unwrap();
    // from zero, one frame at speed 8 and dt 0.05 covers 40% of the gap
    for (w, t) in mixer.weights().iter().zip(mixer.targets()) {
        assert!((w - t * 0.4).abs() < 1e-4);
    }
    assert_eq!(mesh.weight_of("open_mouth"), Some(mixer.weights()[0]));
}

#[test]
fn unreadable_clip_falls_back_to_random_mixing() {
    let mut mesh = face_mesh();
    let mut lip = started(LipSyncParams::default(), &mesh, ClipPlayer::unreadable(1.0));
    let mixer = lip.mixer().unwrap();
    assert!(!mixer.is_audio_driven());
    assert!(mixer.envelope().is_none());

    lip.tick_mixer(&playing(0.0, 0.016), &mut mesh);
    let targets = lip.mixer().unwrap().targets().to_vec();
    let active = targets.iter().filter(|&&x| x > 0.0).count();
    assert!((1..=2).contains(&active));
    for t in targets.iter().filter(|&&x| x > 0.0) {
        assert!((30.0..=80.0).contains(t));
    }
}

#[test]
fn fallback_targets_hold_between_reselections() {
    let mut mesh = face_mesh();
    let mut params = LipSyncParams::default();
    params.audio_driven = false;
    let mut lip = started(params, &mesh, ClipPlayer::new(speech_clip(1.0)));

    lip.tick_mixer(&playing(0.0, 0.01), &mut mesh);
    let first = lip.mixer().unwrap().targets().to_vec();
    // the shortest hold is 60 ms, so five 10 ms frames keep the same targets
    for i in 1..=5 {
        lip.tick_mixer(&playing(i as f32 * 0.01, 0.01), &mut mesh);
        assert_eq!(lip.mixer().unwrap().targets(), first.as_slice());
    }
    // weights keep easing in while the targets are held
    let w = lip.mixer().unwrap().weights().to_vec();
    for (w, t) in w.iter().zip(&first) {
        if *t > 0.0 {
            assert!(*w > 0.0 && *w < *t);
        }
    }
}

#[test]
fn fallback_reselects_within_the_longest_hold() {
    let mut mesh = face_mesh();
    let mut params = LipSyncParams::default();
    params.audio_driven = false;
    let mut lip = started(params, &mesh, ClipPlayer::new(speech_clip(1.0)));

    let mut previous: Vec<f32> = Vec::new();
    let mut changes = Vec::new();
    for frame in 0..100 {
        lip.tick_mixer(&playing(frame as f32 * 0.01, 0.01), &mut mesh);
        let targets = lip.mixer().unwrap().targets().to_vec();
        if targets != previous {
            changes.push(frame);
            previous = targets;
        }
    }
    assert_eq!(changes[0], 0);
    // holds are 60..=120 ms; allow one frame of float slack at the top
    for pair in changes.windows(2) {
        let gap = pair[1] - pair[0];
        assert!((6..=13).contains(&gap), "reselection gap of {gap} frames");
    }
    assert!(changes.len() >= 8, "only {} reselections", changes.len());
}

#[test]
fn mixer_with_no_resolved_talking_channel_writes_nothing() {
    for audio_driven in [true, false] {
        let mut mesh = MemoryMesh::new(["smile", "sad"]);
        let mut params = LipSyncParams::default();
        params.audio_driven = audio_driven;
        let mut lip = started(params, &mesh, ClipPlayer::new(speech_clip(1.0)));
        assert!(lip.channels().resolved_talking().is_empty());

        for i in 0..60 {
            lip.tick_mixer(&playing(i as f32 / 60.0, 0.016), &mut mesh);
            assert!(lip.is_running());
            assert!(lip.mixer().unwrap().targets().iter().all(|&t| t == 0.0));
        }
        assert_eq!(mesh.weights(), vec![0.0, 0.0]);
    }
}

#[test]
fn invalid_params_are_rejected_before_mixing() {
    let mesh = face_mesh();
    let mut params = LipSyncParams::default();
    params.fallback_interval_sec = (0.2, 0.1);
    assert!(matches!(
        LipSync::new(params, &mesh, 1),
        Err(ConfigError::InvertedFallbackInterval { .. })
    ));

    let mut params = LipSyncParams::default();
    params.talk_min_weight = 90.0;
    params.talk_max_weight = 20.0;
    assert!(matches!(
        LipSync::new(params, &mesh, 1),
        Err(ConfigError::InvertedTalkRange { .. })
    ));
}

#[test]
fn oversized_envelope_window_falls_back_instead_of_panicking() {
    let stereo = SampleBuffer::new(vec![0.1; 48_000 * 2], RATE, 2);
    let handles = Handles::new(Some(ClipPlayer::new(stereo)));
    let mut config = FaceConfig::default();
    config.lip_sync.envelope_window_sec = 1e30;
    assert_eq!(config.validate(), Ok(()));
    let mut character = Character::new(handles.rig(), config).unwrap();

    assert!(character.play_dialogue_on_click());
    assert!(!character.lip_sync().mixer().unwrap().is_audio_driven());
    handles.run_for(&mut character, 0.3);
    assert!(handles.talking_weights().iter().any(|&w| w > 0.0));
}

#[test]
fn nan_expression_duration_does_not_stick() {
    let handles = Handles::new(None);
    let mut character = handles.character();
    assert!(character.trigger_expression("smile", 50.0, f32::NAN));
    handles.run_for(&mut character, 1.0);
    assert_eq!(handles.expression_weights(), [50.0, 0.0]);
    assert_eq!(character.lip_sync().expressions().active_count(), 0);

    assert!(!character.trigger_expression("smile", f32::NAN, 0.1));
    handles.step(&mut character);
    assert_eq!(handles.expression_weights(), [50.0, 0.0]);
}

#[test]
fn stop_lip_sync_zeroes_everything_idempotently() {
    let handles = Handles::new(Some(ClipPlayer::new(speech_clip(2.0))));
    let mut character = handles.character();
    let mut audio = handles.audio.clone().unwrap();
    audio.play();
    assert!(character.start_lip_sync());
    assert!(character.trigger_expression("smile", 60.0, 0.0));
    handles.run_for(&mut character, 0.5);
    assert!(handles.talking_weights().iter().any(|&w| w > 0.0));

    character.stop_lip_sync();
    let after_first = handles.mesh.weights();
    character.stop_lip_sync();
    assert_eq!(handles.mesh.weights(), after_first);
    assert_eq!(handles.talking_weights(), [0.0; 3]);
    assert_eq!(handles.expression_weights(), [0.0; 2]);
    assert!(!character.lip_sync().is_running());
}

#[test]
fn mixer_exits_and_resets_when_audio_ends() {
    let handles = Handles::new(Some(ClipPlayer::new(speech_clip(0.4))));
    let mut character = handles.character();
    let mut audio = handles.audio.clone().unwrap();
    audio.play();
    character.start_lip_sync();

    handles.run_for(&mut character, 0.2);
    assert!(character.lip_sync().is_running());
    handles.run_for(&mut character, 0.3);
    assert!(!character.lip_sync().is_running());
    assert_eq!(handles.talking_weights(), [0.0; 3]);
}

#[test]
fn set_then_clear_leaves_a_single_transition() {
    let handles = Handles::new(None);
    let mut character = handles.character();
    assert!(character.trigger_expression("Smile", 75.0, 0.18));
    handles.step(&mut character);
    assert!(character.clear_expression("SMILE", 0.18));

    let expressions = character.lip_sync().expressions();
    assert_eq!(expressions.active_count(), 1);
    assert_eq!(
        expressions.active(ExpressionKind::Smile).map(|t| t.target),
        Some(0.0)
    );
    handles.run_for(&mut character, 0.3);
    assert_eq!(handles.expression_weights(), [0.0, 0.0]);
    assert_eq!(character.lip_sync().expressions().active_count(), 0);
}

#[test]
fn unknown_expression_is_a_silent_no_op() {
    let handles = Handles::new(None);
    let mut character = handles.character();
    assert!(!character.trigger_expression("angry", 50.0, 0.1));
    assert!(!character.start_lip_sync());
    assert_eq!(handles.mesh.weights(), vec![0.0; 6]);
}

#[test]
fn show_and_hide_use_the_default_ease() {
    let handles = Handles::new(None);
    let mut character = handles.character();
    assert!(character.show_expression("sad", 40.0));
    let tr = *character
        .lip_sync()
        .expressions()
        .active(ExpressionKind::Sad)
        .unwrap();
    assert_eq!(tr.duration, constants::DEFAULT_EXPRESSION_DURATION_SEC);

    handles.run_for(&mut character, 0.2);
    assert_eq!(handles.expression_weights(), [0.0, 40.0]);
    assert!(character.hide_expression("Sad"));
    handles.run_for(&mut character, 0.2);
    assert_eq!(handles.expression_weights(), [0.0, 0.0]);
}

#[test]
fn refreshed_channels_follow_a_swapped_mesh() {
    let old = MemoryMesh::new(["smile"]);
    let mut lip = LipSync::new(LipSyncParams::default(), &old, 1).unwrap();
    assert!(lip.channels().resolved_talking().is_empty());
    assert!(!lip.is_expression_label("angry"));

    let mut new = face_mesh();
    lip.refresh_channels(&new);
    assert_eq!(lip.channels().resolved_talking().len(), 3);
    assert!(lip.trigger_expression("Sad", 30.0, 0.0, &mut new));
    assert_eq!(new.weight_of("sad"), Some(30.0));
}
