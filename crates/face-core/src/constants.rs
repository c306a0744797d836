// Shared tuning constants for lip-sync mixing and the reaction sequence.

// Envelope extraction
pub const DEFAULT_ENVELOPE_WINDOW_SEC: f32 = 0.05; // one envelope value per 50 ms
pub const MIN_WINDOW_FRAMES: usize = 128; // floor on frames per window
pub const NORMALIZE_EPSILON: f32 = 1e-6; // guards envelope max in divisions

// Talking channel mixing (weights are in the 0..100 blendshape range)
pub const WEIGHT_MIN: f32 = 0.0;
pub const WEIGHT_MAX: f32 = 100.0;
pub const DEFAULT_TALK_MIN_WEIGHT: f32 = 30.0;
pub const DEFAULT_TALK_MAX_WEIGHT: f32 = 80.0;
pub const DEFAULT_TALK_SIMULTANEOUS: usize = 2; // talking channels active at once
pub const DEFAULT_SMOOTHING_SPEED: f32 = 8.0; // higher = faster approach to target
pub const TALK_JITTER_MIN: f32 = 0.8; // per-channel factor applied to the peak weight
pub const TALK_JITTER_MAX: f32 = 1.0;
pub const ACTIVE_SCALE_QUIET: f32 = 0.5; // fraction of simultaneous channels at silence
pub const ACTIVE_SCALE_LOUD: f32 = 1.0; // fraction at full amplitude
pub const FALLBACK_INTERVAL_MIN_SEC: f32 = 0.06; // random cadence when no envelope exists
pub const FALLBACK_INTERVAL_MAX_SEC: f32 = 0.12;

// Expressions
pub const DEFAULT_EXPRESSION_DURATION_SEC: f32 = 0.15; // entry points called without a duration
pub const DEFAULT_EXPRESSION_STRENGTH: f32 = 75.0;
pub const REACTION_EXPRESSION_EASE_SEC: f32 = 0.18;

// Reaction sequence
pub const DEFAULT_STEP_DURATION_SEC: f32 = 2.0;
pub const STATE_CROSS_FADE_SEC: f32 = 0.12;
pub const REACTION_STEPS: [&str; 4] = ["Smile", "Sad", "Smile", "Sad"];

// Default rig naming
pub const DEFAULT_IDLE_STATE: &str = "idle";
pub const SMILE_LABEL: &str = "Smile";
pub const SAD_LABEL: &str = "Sad";
pub const SMILE_BLENDSHAPE: &str = "smile";
pub const SAD_BLENDSHAPE: &str = "sad";
pub const DEFAULT_TALKING_BLENDSHAPES: [&str; 3] = ["open_mouth", "open_mouth2", "o_mouth"];

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite smoothstep on an already-normalized `t`.
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
