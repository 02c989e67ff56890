/// Exposure Bracketing Module
///
/// Plans and captures an exposure bracket:
/// 1. Convert a shot count and EV spacing into device compensation indices
/// 2. Drive a capture device through those indices, one frame per index
///
/// The plan is pure; capture goes through the [`capture::ExposureDevice`]
/// seam so that hardware stays outside the pipeline.
pub mod capture;
pub mod plan;

pub use capture::{capture_bracket, CaptureOptions, ExposureDevice};
pub use plan::{index_step, plan, plan_request};

use crate::types::ExposureStep;
use serde::{Deserialize, Serialize};

/// Ordered exposure-compensation indices for one capture session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketPlan {
    indices: Vec<i32>,
}

impl BracketPlan {
    pub(crate) fn new(indices: Vec<i32>) -> Self {
        Self { indices }
    }

    pub fn indices(&self) -> &[i32] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains_zero(&self) -> bool {
        self.indices.contains(&0)
    }

    /// EV offset of each planned index on a device with the given step
    pub fn ev_offsets(&self, step: ExposureStep) -> Vec<f32> {
        self.indices
            .iter()
            .map(|&index| index as f32 * step.ev())
            .collect()
    }

    /// True when two or more shots share an index.
    pub fn has_duplicates(&self) -> bool {
        self.indices.windows(2).any(|w| w[0] == w[1])
    }
}

impl IntoIterator for BracketPlan {
    type Item = i32;
    type IntoIter = std::vec::IntoIter<i32>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.into_iter()
    }
}
