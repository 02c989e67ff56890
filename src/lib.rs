//! crabhdr: exposure bracket planning and fusion
//!
//! This crate turns a bracket of differently exposed captures of one scene
//! into a single image with extended apparent dynamic range.
//!
//! # Features
//! - Bracket planning against a device's exposure-compensation range and step
//! - Geometry normalization of captured frames to a reference frame
//! - Deterministic flat alpha fusion, plus a well-exposedness weighted variant
//! - Capture session driver over a pluggable exposure device
//! - TOML configuration and JPEG/PNG output helpers
//!
//! # Usage
//! ```rust,ignore
//! use crabhdr::{bracket, fusion, ExposureRange, ExposureStep};
//!
//! let plan = bracket::plan(3, 1.0, ExposureRange::new(-6, 6), ExposureStep::THIRD_STOP);
//! // capture one frame per index in `plan.indices()` ...
//! let fused = fusion::fuse(&frames)?;
//! ```
pub mod bracket;
pub mod config;
pub mod errors;
pub mod fusion;
pub mod invariant_ppt;
pub mod session;
pub mod storage;
pub mod types;

// Testing utilities - synthetic brackets for offline testing
pub mod testing;

// Re-exports for convenience
pub use bracket::{plan, BracketPlan, ExposureDevice};
pub use config::CrabHdrConfig;
pub use errors::FusionError;
pub use fusion::{fuse, fuse_with, FusionOptions, FusionStrategy, ResizeFilter};
pub use session::{BracketSession, SessionResult};
pub use storage::BatchId;
pub use types::{BracketRequest, ExposureRange, ExposureStep, Frame};

/// Initialize logging for the pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabhdr=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
