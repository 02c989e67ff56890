//! Pixel compositing for fusion
//!
//! All buffers are interleaved 8-bit samples with `channels` samples per
//! pixel.

/// Composite `overlay` over `canvas` in place at a uniform opacity.
///
/// Every sample, alpha included, becomes `src * alpha + dst * (1 - alpha)`:
/// the overlay is treated as a layer of constant opacity regardless of its
/// own alpha channel, so compositing a frame onto itself is the identity.
pub fn composite_over(canvas: &mut [u8], overlay: &[u8], alpha: f32) {
    debug_assert_eq!(canvas.len(), overlay.len());
    let alpha = alpha.clamp(0.0, 1.0);
    let keep = 1.0 - alpha;

    for (dst, &src) in canvas.iter_mut().zip(overlay) {
        *dst = to_u8(src as f32 * alpha + *dst as f32 * keep);
    }
}

/// Running per-pixel weighted average, used by content-aware strategies.
pub struct WeightedAccumulator {
    sums: Vec<f32>,
    weights: Vec<f32>,
    channels: usize,
}

impl WeightedAccumulator {
    pub fn new(pixel_count: usize, channels: usize) -> Self {
        Self {
            sums: vec![0.0; pixel_count * channels],
            weights: vec![0.0; pixel_count],
            channels,
        }
    }

    /// Add a frame with one weight per pixel from `weigh`.
    pub fn add<F>(&mut self, data: &[u8], weigh: F)
    where
        F: Fn(&[u8]) -> f32,
    {
        let channels = self.channels;
        for (pixel_idx, pixel) in data.chunks_exact(channels).enumerate() {
            // Floor keeps pixels that are badly exposed everywhere defined
            let w = weigh(pixel).max(1e-12);
            self.weights[pixel_idx] += w;
            let base = pixel_idx * channels;
            for (c, &v) in pixel.iter().enumerate() {
                self.sums[base + c] += v as f32 * w;
            }
        }
    }

    pub fn finish(self) -> Vec<u8> {
        let channels = self.channels;
        self.sums
            .iter()
            .enumerate()
            .map(|(i, &sum)| to_u8(sum / self.weights[i / channels]))
            .collect()
    }
}

fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
