use crate::constants::*;
use crate::error::ConfigError;

/// Talking and expression channel tuning used by [`crate::LipSync`].
///
/// - `smile_label` / `sad_label` are the expression names accepted by
///   `trigger_expression` (matched case-insensitively)
/// - `smile_blendshape` / `sad_blendshape` are the mesh channel names they drive
/// - `talking_blendshapes` are varied randomly while audio plays
/// - `audio_driven` enables envelope mixing; when false the random cadence is used
/// - `expression_duration_sec` is the ease used when a caller gives no duration
#[derive(Clone, Debug)]
pub struct LipSyncParams {
    pub smile_label: String,
    pub sad_label: String,
    pub smile_blendshape: String,
    pub sad_blendshape: String,
    pub talking_blendshapes: Vec<String>,
    pub talk_min_weight: f32,
    pub talk_max_weight: f32,
    pub talk_simultaneous: usize,
    pub audio_driven: bool,
    pub envelope_window_sec: f32,
    pub smoothing_speed: f32,
    pub fallback_interval_sec: (f32, f32),
    pub expression_duration_sec: f32,
}

impl Default for LipSyncParams {
    fn default() -> Self {
        Self {
            smile_label: SMILE_LABEL.to_string(),
            sad_label: SAD_LABEL.to_string(),
            smile_blendshape: SMILE_BLENDSHAPE.to_string(),
            sad_blendshape: SAD_BLENDSHAPE.to_string(),
            talking_blendshapes: DEFAULT_TALKING_BLENDSHAPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            talk_min_weight: DEFAULT_TALK_MIN_WEIGHT,
            talk_max_weight: DEFAULT_TALK_MAX_WEIGHT,
            talk_simultaneous: DEFAULT_TALK_SIMULTANEOUS,
            audio_driven: true,
            envelope_window_sec: DEFAULT_ENVELOPE_WINDOW_SEC,
            smoothing_speed: DEFAULT_SMOOTHING_SPEED,
            fallback_interval_sec: (FALLBACK_INTERVAL_MIN_SEC, FALLBACK_INTERVAL_MAX_SEC),
            expression_duration_sec: DEFAULT_EXPRESSION_DURATION_SEC,
        }
    }
}

/// Timing and naming for the Smile/Sad reaction sequence.
#[derive(Clone, Debug)]
pub struct ReactionParams {
    pub idle_state: String,
    pub expression_strength: f32,
    pub step_duration_sec: f32,
    pub expression_ease_sec: f32,
    pub cross_fade_sec: f32,
    /// Put the transform back to its pre-session snapshot when a session ends.
    pub restore_transform: bool,
    pub steps: Vec<String>,
}

impl Default for ReactionParams {
    fn default() -> Self {
        Self {
            idle_state: DEFAULT_IDLE_STATE.to_string(),
            expression_strength: DEFAULT_EXPRESSION_STRENGTH,
            step_duration_sec: DEFAULT_STEP_DURATION_SEC,
            expression_ease_sec: REACTION_EXPRESSION_EASE_SEC,
            cross_fade_sec: STATE_CROSS_FADE_SEC,
            restore_transform: true,
            steps: REACTION_STEPS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Full configuration for a [`crate::Character`].
///
/// `seed` feeds the channel-selection RNG so runs are reproducible.
#[derive(Clone, Debug)]
pub struct FaceConfig {
    pub lip_sync: LipSyncParams,
    pub reaction: ReactionParams,
    pub seed: u64,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            lip_sync: LipSyncParams::default(),
            reaction: ReactionParams::default(),
            seed: 42,
        }
    }
}

impl LipSyncParams {
    /// Reject values the mixer cannot sample from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_weight("talk_min_weight", self.talk_min_weight)?;
        check_weight("talk_max_weight", self.talk_max_weight)?;
        if self.talk_min_weight > self.talk_max_weight {
            return Err(ConfigError::InvertedTalkRange {
                min: self.talk_min_weight,
                max: self.talk_max_weight,
            });
        }
        if self.talk_simultaneous == 0 {
            return Err(ConfigError::NoSimultaneousChannels);
        }
        check_positive("envelope_window_sec", self.envelope_window_sec)?;
        check_non_negative("smoothing_speed", self.smoothing_speed)?;
        let (lo, hi) = self.fallback_interval_sec;
        check_positive("fallback_interval_sec.0", lo)?;
        check_positive("fallback_interval_sec.1", hi)?;
        if lo > hi {
            return Err(ConfigError::InvertedFallbackInterval { min: lo, max: hi });
        }
        check_non_negative("expression_duration_sec", self.expression_duration_sec)
    }
}

impl ReactionParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_weight("expression_strength", self.expression_strength)?;
        check_non_negative("step_duration_sec", self.step_duration_sec)?;
        check_non_negative("expression_ease_sec", self.expression_ease_sec)?;
        check_non_negative("cross_fade_sec", self.cross_fade_sec)
    }
}

impl FaceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lip_sync.validate()?;
        self.reaction.validate()
    }
}

fn check_weight(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (WEIGHT_MIN..=WEIGHT_MAX).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::WeightOutOfRange { name, value })
    }
}

fn check_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    // NaN fails this comparison too
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn check_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}
