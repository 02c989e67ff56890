/// Bracket capture module
///
/// Drives a capture device through a bracket plan, one frame per index.
/// The device itself is an external collaborator behind [`ExposureDevice`].
use super::BracketPlan;
use crate::errors::FusionError;
use crate::types::{ExposureRange, ExposureStep, Frame};
use serde::{Deserialize, Serialize};

/// A camera that supports exposure compensation.
///
/// Errors are plain strings, the same way the platform capture layer reports
/// them; the bracket driver wraps them into [`FusionError::Capture`].
pub trait ExposureDevice {
    /// Supported exposure-compensation index range
    fn exposure_range(&self) -> ExposureRange;

    /// EV per compensation index
    fn exposure_step(&self) -> ExposureStep;

    fn set_exposure_compensation(&mut self, index: i32) -> Result<(), String>;

    /// Capture and decode one frame at the current settings
    fn capture_frame(&mut self) -> Result<Frame, String>;
}

/// Capture timing and retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureOptions {
    /// Delay after changing compensation before capturing (ms)
    pub settle_delay_ms: u64,

    /// Extra attempts per bracket step after a failed capture
    pub max_retries: u32,

    /// Return the device to unadjusted exposure when done
    pub restore_exposure: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            settle_delay_ms: 150,
            max_retries: 2,
            restore_exposure: true,
        }
    }
}

/// Capture one frame per planned index, in plan order.
///
/// Each returned frame carries the index it was captured at. A step that
/// still fails after `max_retries` retries aborts the whole bracket; frames
/// captured so far are discarded.
pub async fn capture_bracket<D: ExposureDevice + ?Sized>(
    device: &mut D,
    plan: &BracketPlan,
    options: &CaptureOptions,
) -> Result<Vec<Frame>, FusionError> {
    log::info!(
        "Starting bracket capture: {} exposures {:?} with {}ms settle delay",
        plan.len(),
        plan.indices(),
        options.settle_delay_ms
    );

    let result = capture_all(device, plan, options).await;

    if options.restore_exposure {
        let neutral = device.exposure_range().clamp(0);
        if let Err(e) = device.set_exposure_compensation(neutral) {
            log::warn!("Failed to restore exposure compensation to {}: {}", neutral, e);
        }
    }

    let frames = result?;
    log::info!("Captured {} frames for exposure bracket", frames.len());
    Ok(frames)
}

async fn capture_all<D: ExposureDevice + ?Sized>(
    device: &mut D,
    plan: &BracketPlan,
    options: &CaptureOptions,
) -> Result<Vec<Frame>, FusionError> {
    let mut frames = Vec::with_capacity(plan.len());

    for (step, &index) in plan.indices().iter().enumerate() {
        log::debug!(
            "Capturing bracket step {}/{} at compensation index {}",
            step + 1,
            plan.len(),
            index
        );

        let frame = capture_step(device, index, options).await.map_err(|reason| {
            log::error!("Failed to capture bracket step {}: {}", step + 1, reason);
            FusionError::Capture {
                index: step,
                reason,
            }
        })?;

        log::debug!(
            "Captured frame: {}x{}x{} ({} bytes)",
            frame.width,
            frame.height,
            frame.channels,
            frame.size_bytes()
        );
        frames.push(frame.with_exposure_index(index));
    }

    Ok(frames)
}

async fn capture_step<D: ExposureDevice + ?Sized>(
    device: &mut D,
    index: i32,
    options: &CaptureOptions,
) -> Result<Frame, String> {
    let mut last_error = String::new();

    for attempt in 0..=options.max_retries {
        if attempt > 0 {
            log::warn!(
                "Retrying capture at index {} (attempt {}/{}): {}",
                index,
                attempt + 1,
                options.max_retries + 1,
                last_error
            );
        }

        if let Err(e) = device.set_exposure_compensation(index) {
            last_error = format!("set exposure compensation {}: {}", index, e);
            continue;
        }

        if options.settle_delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(options.settle_delay_ms)).await;
        }

        match device.capture_frame() {
            Ok(frame) => return Ok(frame),
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::plan;
    use crate::testing::SyntheticExposureDevice;

    fn fast() -> CaptureOptions {
        CaptureOptions {
            settle_delay_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_frames_follow_plan_order() {
        let mut device = SyntheticExposureDevice::new(8, 6);
        let plan = plan(5, 1.0, device.exposure_range(), device.exposure_step());

        let frames = capture_bracket(&mut device, &plan, &fast()).await.unwrap();

        let indices: Vec<i32> = frames.iter().filter_map(|f| f.exposure_index).collect();
        assert_eq!(indices, plan.indices());
        assert_eq!(device.requested_indices(), &[-6, -3, 0, 3, 6, 0]);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let mut device = SyntheticExposureDevice::new(4, 4).failing_first(2);
        let plan = plan(3, 1.0, device.exposure_range(), device.exposure_step());

        let frames = capture_bracket(&mut device, &plan, &fast()).await.unwrap();
        assert_eq!(frames.len(), 3);
    }

    #[tokio::test]
    async fn test_persistent_failure_aborts_and_restores() {
        let mut device = SyntheticExposureDevice::new(4, 4).failing_first(10);
        let plan = plan(3, 1.0, device.exposure_range(), device.exposure_step());

        let result = capture_bracket(&mut device, &plan, &fast()).await;
        assert!(matches!(result, Err(FusionError::Capture { index: 0, .. })));
        assert_eq!(device.requested_indices().last(), Some(&0));
    }

    #[tokio::test]
    async fn test_empty_plan_captures_nothing() {
        let mut device = SyntheticExposureDevice::new(4, 4);
        let plan = plan(0, 1.0, device.exposure_range(), device.exposure_step());

        let frames = capture_bracket(&mut device, &plan, &fast()).await.unwrap();
        assert!(frames.is_empty());
    }
}
