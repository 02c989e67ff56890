use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the bracket and fusion pipeline.
///
/// Planning never fails; everything here comes from request validation,
/// fusion, capture orchestration or persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum FusionError {
    #[error("Invalid exposure range: lower bound {lower} is above upper bound {upper}")]
    InvalidRange { lower: i32, upper: i32 },

    #[error("Insufficient frames: need {required}, got {provided}")]
    InsufficientFrames { required: usize, provided: usize },

    #[error("Frame {index} could not be decoded: {reason}")]
    DecodeFailure { index: usize, reason: String },

    #[error("Frame {index} cannot be normalized to reference geometry: {reason}")]
    GeometryMismatchUnrecoverable { index: usize, reason: String },

    #[error("Frame {index} has {got} channels, reference has {expected}")]
    ChannelLayoutMismatch { index: usize, expected: u8, got: u8 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Capture failed at bracket step {index}: {reason}")]
    Capture { index: usize, reason: String },

    #[error("Fusion worker failed: {0}")]
    Worker(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, FusionError>;
