/// Geometry normalization for fusion
///
/// Brings every frame to the reference frame's dimensions. Frames that
/// already match are borrowed, the rest are resampled into a temporary copy.
use super::{FusionError, ResizeFilter};
use crate::assert_invariant;
use crate::invariant_ppt::names;
use crate::types::Frame;
use std::borrow::Cow;

/// Return `frame` at `(width, height)`, resampling only when needed.
///
/// `index` is the frame's position in the fusion input, used for errors.
pub fn normalize_frame<'a>(
    frame: &'a Frame,
    width: u32,
    height: u32,
    filter: ResizeFilter,
    index: usize,
) -> Result<Cow<'a, Frame>, FusionError> {
    if width == 0 || height == 0 {
        return Err(FusionError::GeometryMismatchUnrecoverable {
            index,
            reason: format!("reference geometry {}x{} has zero area", width, height),
        });
    }

    if frame.dimensions() == (width, height) {
        return Ok(Cow::Borrowed(frame));
    }

    if frame.width == 0 || frame.height == 0 {
        return Err(FusionError::GeometryMismatchUnrecoverable {
            index,
            reason: format!("frame geometry {}x{} has zero area", frame.width, frame.height),
        });
    }

    log::debug!(
        "Resizing frame {} from {}x{} to {}x{} ({:?})",
        index,
        frame.width,
        frame.height,
        width,
        height,
        filter
    );

    let img = frame.to_dynamic().map_err(|e| match e {
        FusionError::DecodeFailure { reason, .. } => FusionError::DecodeFailure { index, reason },
        other => other,
    })?;

    let resized = img.resize_exact(width, height, filter.into());
    if (resized.width(), resized.height()) != (width, height) {
        return Err(FusionError::GeometryMismatchUnrecoverable {
            index,
            reason: format!(
                "resampling produced {}x{} instead of {}x{}",
                resized.width(),
                resized.height(),
                width,
                height
            ),
        });
    }

    let data = match frame.channels {
        1 => resized.into_luma8().into_raw(),
        4 => resized.into_rgba8().into_raw(),
        _ => resized.into_rgb8().into_raw(),
    };

    let mut normalized = frame.clone();
    normalized.data = data;
    normalized.width = width;
    normalized.height = height;

    assert_invariant!(
        normalized.data.len() == normalized.expected_len(),
        names::NORMALIZED_GEOMETRY,
        "fusion::normalize"
    );

    Ok(Cow::Owned(normalized))
}
