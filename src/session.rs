//! End-to-end bracket sessions
//!
//! Plans a bracket from the device's exposure capabilities, captures it,
//! and fuses the frames on a blocking worker so the async runtime stays
//! responsive.

use crate::bracket::{capture_bracket, plan_request, BracketPlan, ExposureDevice};
use crate::config::CrabHdrConfig;
use crate::errors::FusionError;
use crate::fusion::fuse_with;
use crate::storage::BatchId;
use crate::types::Frame;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Outcome of one bracket session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    /// The fused image
    pub fused: Frame,

    /// Indices the device was driven through
    pub plan: BracketPlan,

    /// Number of frames that went into the fusion
    pub num_sources: usize,

    /// Capture plus fusion time (ms)
    pub processing_time_ms: u64,

    /// Batch the session's outputs belong to
    pub batch: BatchId,
}

/// One capture-and-fuse session driven by a configuration
pub struct BracketSession {
    config: CrabHdrConfig,
    batch: BatchId,
}

impl BracketSession {
    pub fn new(config: CrabHdrConfig) -> Result<Self, FusionError> {
        config.validate()?;
        Ok(Self {
            config,
            batch: BatchId::new(),
        })
    }

    pub fn with_batch(mut self, batch: BatchId) -> Self {
        self.batch = batch;
        self
    }

    pub fn batch(&self) -> &BatchId {
        &self.batch
    }

    pub fn config(&self) -> &CrabHdrConfig {
        &self.config
    }

    /// Plan against the device's range and step without capturing.
    pub fn plan_for<D: ExposureDevice + ?Sized>(&self, device: &D) -> BracketPlan {
        plan_request(
            &self.config.bracket_request(),
            device.exposure_range(),
            device.exposure_step(),
        )
    }

    /// Plan, capture and fuse one bracket.
    pub async fn run<D: ExposureDevice + ?Sized>(&self, device: &mut D) -> Result<SessionResult, FusionError> {
        let start_time = Instant::now();
        let plan = self.plan_for(device);

        log::info!(
            "Starting bracket session {}: {} shots at {} EV -> plan {:?}",
            self.batch,
            self.config.bracket.shot_count,
            self.config.bracket.ev_spacing,
            plan.indices()
        );

        if plan.has_duplicates() {
            log::warn!(
                "Bracket plan {:?} repeats exposure indices; device step is too coarse for {} EV spacing",
                plan.indices(),
                self.config.bracket.ev_spacing
            );
        }

        let frames = capture_bracket(device, &plan, &self.config.capture_options()).await?;
        let num_sources = frames.len();

        log::info!("Captured {} frames, starting fusion", num_sources);

        let options = self.config.fusion_options();
        let fused = tokio::task::spawn_blocking(move || fuse_with(&frames, &options))
            .await
            .map_err(|e| FusionError::Worker(e.to_string()))??;

        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        log::info!("Bracket session {} complete in {}ms", self.batch, processing_time_ms);

        Ok(SessionResult {
            fused,
            plan,
            num_sources,
            processing_time_ms,
            batch: self.batch.clone(),
        })
    }
}
