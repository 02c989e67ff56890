//! Fusion weighting schemes

use crate::assert_invariant;
use crate::invariant_ppt::names;

/// Total opacity shared by all overlay frames in flat alpha fusion
pub const FLAT_ALPHA_BUDGET: f32 = 0.5;

/// Spread of the well-exposedness Gaussian around mid-grey
pub const WELL_EXPOSED_SIGMA: f32 = 0.2;

/// Per-frame opacities for flat alpha fusion.
///
/// The first frame is the fully opaque base; the remaining frames share
/// [`FLAT_ALPHA_BUDGET`] evenly.
pub fn flat_alpha_weights(frame_count: usize) -> Vec<f32> {
    if frame_count == 0 {
        return Vec::new();
    }

    let mut weights = Vec::with_capacity(frame_count);
    weights.push(1.0);

    if frame_count > 1 {
        let overlay = FLAT_ALPHA_BUDGET / (frame_count - 1) as f32;
        weights.extend(std::iter::repeat(overlay).take(frame_count - 1));

        let budget: f32 = weights[1..].iter().sum();
        assert_invariant!(
            (budget - FLAT_ALPHA_BUDGET).abs() < 1e-5,
            names::FLAT_WEIGHT_BUDGET,
            "fusion::weights"
        );
    }

    weights
}

/// Well-exposedness of one pixel, the product of a Gaussian around 0.5 over
/// its colour samples.
///
/// For RGBA pixels only the colour samples count and the result is scaled by
/// the pixel's alpha, so transparent pixels do not pull the blend.
pub fn well_exposedness(pixel: &[u8]) -> f32 {
    let denom = 2.0 * WELL_EXPOSED_SIGMA * WELL_EXPOSED_SIGMA;
    let (colour, coverage) = match pixel.len() {
        4 => (&pixel[..3], pixel[3] as f32 / 255.0),
        _ => (pixel, 1.0),
    };

    colour
        .iter()
        .map(|&v| {
            let d = v as f32 / 255.0 - 0.5;
            (-(d * d) / denom).exp()
        })
        .product::<f32>()
        * coverage
}
