//! Synthetic bracket data
//!
//! Generates frames that behave like an exposure bracket of one static
//! scene, plus a scripted [`ExposureDevice`] that serves them, so the whole
//! pipeline can be exercised offline.

use crate::bracket::ExposureDevice;
use crate::types::{ExposureRange, ExposureStep, Frame};

/// Render a horizontal gradient scene exposed `ev_offset` stops away from
/// the unadjusted exposure.
///
/// Brightness scales by `2^ev_offset` and clips at 255, like a sensor.
pub fn synthetic_bracket_frame(ev_offset: f32, width: u32, height: u32) -> Frame {
    let gain = 2f32.powf(ev_offset);
    let mut data = vec![0u8; (width * height * 3) as usize];

    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            // Scene radiance in [16, 240] along x, slight tint along y
            let base = 16.0 + 224.0 * x as f32 / width.max(2).saturating_sub(1) as f32;
            let tint = 8.0 * y as f32 / height.max(1) as f32;
            data[idx] = (base * gain).min(255.0) as u8;
            data[idx + 1] = ((base + tint) * gain).min(255.0) as u8;
            data[idx + 2] = ((base * 0.8) * gain).min(255.0) as u8;
        }
    }

    Frame::rgb(data, width, height)
}

/// A solid frame of any channel layout
pub fn solid_frame(width: u32, height: u32, channels: u8, value: u8) -> Frame {
    Frame::new(
        vec![value; width as usize * height as usize * channels as usize],
        width,
        height,
        channels,
    )
}

/// Scripted exposure device serving synthetic bracket frames.
///
/// Range is [-6, 6] at a third of a stop per index, which is what most
/// phone and USB camera drivers report.
pub struct SyntheticExposureDevice {
    width: u32,
    height: u32,
    range: ExposureRange,
    step: ExposureStep,
    current_index: i32,
    requested: Vec<i32>,
    failures_left: u32,
}

impl SyntheticExposureDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            range: ExposureRange::new(-6, 6),
            step: ExposureStep::THIRD_STOP,
            current_index: 0,
            requested: Vec::new(),
            failures_left: 0,
        }
    }

    pub fn with_range(mut self, range: ExposureRange, step: ExposureStep) -> Self {
        self.range = range;
        self.step = step;
        self
    }

    /// Make the next `count` captures fail.
    pub fn failing_first(mut self, count: u32) -> Self {
        self.failures_left = count;
        self
    }

    /// Every compensation index the device was asked for, in order
    pub fn requested_indices(&self) -> &[i32] {
        &self.requested
    }
}

impl ExposureDevice for SyntheticExposureDevice {
    fn exposure_range(&self) -> ExposureRange {
        self.range
    }

    fn exposure_step(&self) -> ExposureStep {
        self.step
    }

    fn set_exposure_compensation(&mut self, index: i32) -> Result<(), String> {
        if !self.range.contains(index) {
            return Err(format!(
                "index {} outside [{}, {}]",
                index, self.range.lower, self.range.upper
            ));
        }
        self.current_index = index;
        self.requested.push(index);
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<Frame, String> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err("synthetic sensor timeout".to_string());
        }
        let ev = self.current_index as f32 * self.step.ev();
        Ok(synthetic_bracket_frame(ev, self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brighter_exposure_is_brighter() {
        let dark = synthetic_bracket_frame(-1.0, 16, 4);
        let bright = synthetic_bracket_frame(1.0, 16, 4);
        let sum = |f: &Frame| f.data.iter().map(|&v| v as u64).sum::<u64>();
        assert!(sum(&bright) > sum(&dark));
    }

    #[test]
    fn test_frame_layout() {
        let frame = synthetic_bracket_frame(0.0, 7, 3);
        assert!(frame.check_layout(0).is_ok());
    }

    #[test]
    fn test_device_rejects_out_of_range_index() {
        let mut device = SyntheticExposureDevice::new(2, 2);
        assert!(device.set_exposure_compensation(7).is_err());
        assert!(device.set_exposure_compensation(-6).is_ok());
        assert_eq!(device.requested_indices(), &[-6]);
    }
}
