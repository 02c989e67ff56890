//! Core data types shared by the planner, the fusion engine and the
//! collaborator seams.

use crate::errors::FusionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device exposure-compensation index range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureRange {
    pub lower: i32,
    pub upper: i32,
}

impl ExposureRange {
    pub fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, index: i32) -> bool {
        (self.lower..=self.upper).contains(&index)
    }

    /// Rejects a range whose bounds are inverted.
    ///
    /// The planner does not call this; an inverted range simply drops every
    /// candidate there.
    pub fn validate(&self) -> Result<(), FusionError> {
        if self.lower > self.upper {
            return Err(FusionError::InvalidRange {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    /// Nearest index to `index` that lies inside the range.
    pub fn clamp(&self, index: i32) -> i32 {
        if self.lower > self.upper {
            return self.lower;
        }
        index.clamp(self.lower, self.upper)
    }
}

/// EV value of one exposure-compensation index increment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct ExposureStep(f32);

impl ExposureStep {
    pub const THIRD_STOP: ExposureStep = ExposureStep(1.0 / 3.0);
    pub const HALF_STOP: ExposureStep = ExposureStep(0.5);
    pub const FULL_STOP: ExposureStep = ExposureStep(1.0);

    pub fn new(ev_per_index: f32) -> Result<Self, FusionError> {
        if !ev_per_index.is_finite() || ev_per_index <= 0.0 {
            return Err(FusionError::InvalidConfig(format!(
                "exposure step must be a positive finite EV value, got {}",
                ev_per_index
            )));
        }
        Ok(Self(ev_per_index))
    }

    pub fn ev(&self) -> f32 {
        self.0
    }
}

impl TryFrom<f32> for ExposureStep {
    type Error = FusionError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExposureStep> for f32 {
    fn from(step: ExposureStep) -> Self {
        step.0
    }
}

/// Caller-facing bracket request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BracketRequest {
    /// Number of shots, 3 to 7
    pub shot_count: u32,
    /// EV distance between neighbouring shots, 0.5 to 2.0
    pub ev_spacing: f32,
}

impl BracketRequest {
    pub const MIN_SHOTS: u32 = 3;
    pub const MAX_SHOTS: u32 = 7;
    pub const MIN_EV_SPACING: f32 = 0.5;
    pub const MAX_EV_SPACING: f32 = 2.0;

    pub fn new(shot_count: u32, ev_spacing: f32) -> Self {
        Self {
            shot_count,
            ev_spacing,
        }
    }

    /// Odd counts bracket around the unadjusted exposure.
    pub fn includes_zero(&self) -> bool {
        self.shot_count % 2 == 1
    }

    pub fn validate(&self) -> Result<(), FusionError> {
        if !(Self::MIN_SHOTS..=Self::MAX_SHOTS).contains(&self.shot_count) {
            return Err(FusionError::InvalidConfig(format!(
                "shot_count must be between {} and {}, got {}",
                Self::MIN_SHOTS,
                Self::MAX_SHOTS,
                self.shot_count
            )));
        }
        if !(Self::MIN_EV_SPACING..=Self::MAX_EV_SPACING).contains(&self.ev_spacing) {
            return Err(FusionError::InvalidConfig(format!(
                "ev_spacing must be between {} and {}, got {}",
                Self::MIN_EV_SPACING,
                Self::MAX_EV_SPACING,
                self.ev_spacing
            )));
        }
        Ok(())
    }
}

impl Default for BracketRequest {
    fn default() -> Self {
        Self {
            shot_count: 3,
            ev_spacing: 1.0,
        }
    }
}

/// Decoded raster image with 8-bit samples in row-major, interleaved order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: String,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 1 = luma, 3 = RGB, 4 = RGBA (straight alpha)
    pub channels: u8,
    pub timestamp: DateTime<Utc>,
    /// Exposure-compensation index this frame was captured at, if known
    pub exposure_index: Option<i32>,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            data,
            width,
            height,
            channels,
            timestamp: Utc::now(),
            exposure_index: None,
        }
    }

    pub fn rgb(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self::new(data, width, height, 3)
    }

    pub fn with_exposure_index(mut self, index: i32) -> Self {
        self.exposure_index = Some(index);
        self
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn expected_len(&self) -> usize {
        self.pixel_count() * self.channels as usize
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check that the buffer is a readable raster.
    ///
    /// `index` is the frame's position in the fusion input and is only used
    /// for error reporting.
    pub fn check_layout(&self, index: usize) -> Result<(), FusionError> {
        if !matches!(self.channels, 1 | 3 | 4) {
            return Err(FusionError::DecodeFailure {
                index,
                reason: format!("unsupported channel count {}", self.channels),
            });
        }
        if self.data.len() != self.expected_len() {
            return Err(FusionError::DecodeFailure {
                index,
                reason: format!(
                    "got {} bytes, expected {} for {}x{}x{}",
                    self.data.len(),
                    self.expected_len(),
                    self.width,
                    self.height,
                    self.channels
                ),
            });
        }
        Ok(())
    }

    /// Decode an encoded image (JPEG, PNG, ...) into a frame.
    ///
    /// Images with an alpha channel keep it, grey images stay single channel
    /// and everything else is converted to 8-bit RGB.
    pub fn decode(bytes: &[u8]) -> Result<Self, FusionError> {
        let img = image::load_from_memory(bytes).map_err(|e| FusionError::DecodeFailure {
            index: 0,
            reason: e.to_string(),
        })?;
        Ok(Self::from_dynamic(img))
    }

    pub fn from_dynamic(img: image::DynamicImage) -> Self {
        let color = img.color();
        let (width, height) = (img.width(), img.height());
        if color.has_alpha() {
            Self::new(img.into_rgba8().into_raw(), width, height, 4)
        } else if color.channel_count() == 1 {
            Self::new(img.into_luma8().into_raw(), width, height, 1)
        } else {
            Self::new(img.into_rgb8().into_raw(), width, height, 3)
        }
    }

    /// Copy into an `image` buffer matching the channel layout.
    pub fn to_dynamic(&self) -> Result<image::DynamicImage, FusionError> {
        let corrupt = || FusionError::DecodeFailure {
            index: 0,
            reason: format!(
                "frame {} does not hold a {}x{}x{} raster",
                self.id, self.width, self.height, self.channels
            ),
        };
        let data = self.data.clone();
        let img = match self.channels {
            1 => image::DynamicImage::ImageLuma8(
                image::GrayImage::from_raw(self.width, self.height, data).ok_or_else(corrupt)?,
            ),
            3 => image::DynamicImage::ImageRgb8(
                image::RgbImage::from_raw(self.width, self.height, data).ok_or_else(corrupt)?,
            ),
            4 => image::DynamicImage::ImageRgba8(
                image::RgbaImage::from_raw(self.width, self.height, data).ok_or_else(corrupt)?,
            ),
            _ => return Err(corrupt()),
        };
        Ok(img)
    }
}
