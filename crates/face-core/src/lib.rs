pub mod channels;
pub mod character;
pub mod config;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod expression;
pub mod lipsync;
pub mod memory;
pub mod mixer;
pub mod rig;
pub mod sequence;
pub mod session;
pub mod task;

pub use channels::{ChannelMap, ExpressionKind};
pub use character::{Character, CharacterState};
pub use config::{FaceConfig, LipSyncParams, ReactionParams};
pub use envelope::AmplitudeEnvelope;
pub use error::{ConfigError, EnvelopeError};
pub use expression::{ExpressionManager, ExpressionTransition};
pub use lipsync::LipSync;
pub use mixer::TalkMixer;
pub use rig::*;
pub use session::{EndReason, SceneSnapshot, Session, SessionKind};
pub use task::{FrameClock, Poll, Suspend};
