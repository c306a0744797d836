use thiserror::Error;

/// Reasons an amplitude envelope could not be built from a clip.
///
/// These never reach the caller of the lip-sync entry points: the boundary
/// in [`crate::lipsync`] logs them and falls back to random mixing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvelopeError {
    #[error("clip has no samples")]
    EmptyClip,
    #[error("invalid clip format: sample_rate={sample_rate} channels={channels}")]
    InvalidFormat { sample_rate: u32, channels: u16 },
    #[error("{len} samples do not divide into {channels} interleaved channels")]
    RaggedInterleave { len: usize, channels: u16 },
    #[error("sample {index} is not finite")]
    NonFiniteSample { index: usize },
    #[error("window duration must be positive, got {0}")]
    InvalidWindow(f32),
    #[error("audio source could not provide samples: {0}")]
    Unreadable(String),
}

/// Rejected configuration values, reported by [`crate::FaceConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("talk weight range inverted: min {min} > max {max}")]
    InvertedTalkRange { min: f32, max: f32 },
    #[error("{name} = {value} is outside the 0..=100 weight range")]
    WeightOutOfRange { name: &'static str, value: f32 },
    #[error("talk_simultaneous must be at least 1")]
    NoSimultaneousChannels,
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("fallback interval inverted: {min} > {max}")]
    InvertedFallbackInterval { min: f32, max: f32 },
}
