/// Exposure Fusion Module
///
/// Fuses an ordered exposure bracket into one image:
/// 1. Take the first frame's geometry as the reference
/// 2. Resample any frame with other dimensions to the reference
/// 3. Weight each frame according to the selected strategy
/// 4. Composite the frames onto a canvas strictly in input order
///
/// The baseline strategy is a flat alpha blend: frame 0 is the opaque base
/// and the other frames share half an opacity on top of it. It does not look
/// at pixel content, so it is an approximation of exposure fusion rather than
/// a radiance merge.
pub mod composite;
pub mod normalize;
pub mod weights;

use crate::assert_invariant;
use crate::errors::FusionError;
use crate::invariant_ppt::names;
use crate::types::Frame;
use composite::{composite_over, WeightedAccumulator};
use normalize::normalize_frame;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Fusion requires a base frame and at least one overlay
pub const MIN_FRAMES: usize = 2;

/// How frames are weighted against each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionStrategy {
    /// Uniform per-frame opacity, order dependent
    #[default]
    FlatAlpha,
    /// Per-pixel weighted average favouring mid-tone samples
    WellExposedness,
}

impl std::str::FromStr for FusionStrategy {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" | "flat_alpha" => Ok(Self::FlatAlpha),
            "well-exposed" | "well_exposedness" => Ok(Self::WellExposedness),
            other => Err(FusionError::InvalidConfig(format!(
                "unknown fusion strategy '{}'",
                other
            ))),
        }
    }
}

/// Resampling filter used to normalize frame geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    /// Bilinear
    #[default]
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl From<ResizeFilter> for image::imageops::FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Triangle => image::imageops::FilterType::Triangle,
            ResizeFilter::CatmullRom => image::imageops::FilterType::CatmullRom,
            ResizeFilter::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl std::str::FromStr for ResizeFilter {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "triangle" | "bilinear" => Ok(Self::Triangle),
            "catmull_rom" | "catmull-rom" => Ok(Self::CatmullRom),
            "lanczos3" => Ok(Self::Lanczos3),
            other => Err(FusionError::InvalidConfig(format!(
                "unknown resize filter '{}'",
                other
            ))),
        }
    }
}

/// Fusion options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusionOptions {
    pub strategy: FusionStrategy,

    pub resize_filter: ResizeFilter,

    /// Return a lone frame unchanged instead of failing.
    ///
    /// Zero frames still fail with `InsufficientFrames`.
    pub allow_single_frame: bool,
}

/// Fuse frames with the default options (flat alpha, two-frame minimum).
pub fn fuse(frames: &[Frame]) -> Result<Frame, FusionError> {
    fuse_with(frames, &FusionOptions::default())
}

/// Fuse an ordered bracket into one image at `frames[0]`'s geometry.
///
/// Fails atomically: any frame that cannot be read or resampled aborts the
/// call and no partial image is returned.
pub fn fuse_with(frames: &[Frame], options: &FusionOptions) -> Result<Frame, FusionError> {
    if frames.is_empty() {
        return Err(FusionError::InsufficientFrames {
            required: MIN_FRAMES,
            provided: 0,
        });
    }

    if frames.len() == 1 {
        if !options.allow_single_frame {
            return Err(FusionError::InsufficientFrames {
                required: MIN_FRAMES,
                provided: 1,
            });
        }
        frames[0].check_layout(0)?;
        log::info!("Single frame supplied, returning it unfused");
        return Ok(frames[0].clone());
    }

    validate_inputs(frames)?;

    let start = Instant::now();
    let reference = &frames[0];
    let (width, height) = reference.dimensions();

    log::info!(
        "Fusing {} frames at {}x{}x{} ({:?})",
        frames.len(),
        width,
        height,
        reference.channels,
        options.strategy
    );

    let data = match options.strategy {
        FusionStrategy::FlatAlpha => fuse_flat_alpha(frames, options)?,
        FusionStrategy::WellExposedness => fuse_well_exposed(frames, options)?,
    };

    let fused = Frame::new(data, width, height, reference.channels);

    assert_invariant!(
        fused.dimensions() == reference.dimensions() && fused.data.len() == fused.expected_len(),
        names::FUSED_GEOMETRY,
        "fusion::fuse"
    );

    log::info!("Fusion complete in {}ms", start.elapsed().as_millis());
    Ok(fused)
}

/// Check every frame before any pixel work.
fn validate_inputs(frames: &[Frame]) -> Result<(), FusionError> {
    let reference = &frames[0];

    for (index, frame) in frames.iter().enumerate() {
        frame.check_layout(index)?;

        if frame.channels != reference.channels {
            return Err(FusionError::ChannelLayoutMismatch {
                index,
                expected: reference.channels,
                got: frame.channels,
            });
        }

        if frame.width == 0 || frame.height == 0 {
            return Err(FusionError::GeometryMismatchUnrecoverable {
                index,
                reason: format!("{}x{} frame has zero area", frame.width, frame.height),
            });
        }
    }

    Ok(())
}

fn fuse_flat_alpha(frames: &[Frame], options: &FusionOptions) -> Result<Vec<u8>, FusionError> {
    let reference = &frames[0];
    let (width, height) = reference.dimensions();
    let weights = weights::flat_alpha_weights(frames.len());

    let mut canvas = reference.data.clone();

    for (index, frame) in frames.iter().enumerate().skip(1) {
        let normalized = normalize_frame(frame, width, height, options.resize_filter, index)?;
        log::debug!("Compositing frame {} at alpha {:.4}", index, weights[index]);
        composite_over(&mut canvas, &normalized.data, weights[index]);
    }

    Ok(canvas)
}

fn fuse_well_exposed(frames: &[Frame], options: &FusionOptions) -> Result<Vec<u8>, FusionError> {
    let reference = &frames[0];
    let (width, height) = reference.dimensions();
    let mut accumulator = WeightedAccumulator::new(reference.pixel_count(), reference.channels as usize);

    for (index, frame) in frames.iter().enumerate() {
        let normalized = normalize_frame(frame, width, height, options.resize_filter, index)?;
        log::debug!("Accumulating frame {} by well-exposedness", index);
        accumulator.add(&normalized.data, weights::well_exposedness);
    }

    Ok(accumulator.finish())
}
