//! Fusion Engine Testing
//!
//! Test suite for exposure fusion including:
//! - Flat alpha blending arithmetic and ordering
//! - Geometry normalization against the reference frame
//! - Atomic failure on unreadable or incompatible frames
//! - Single-frame and empty input contracts
//! - Well-exposedness strategy behaviour on synthetic brackets

use crabhdr::fusion::{fuse, fuse_with, FusionOptions, FusionStrategy, ResizeFilter};
use crabhdr::invariant_ppt::{clear_invariant_log, contract_test, names};
use crabhdr::testing::{solid_frame, synthetic_bracket_frame};
use crabhdr::{FusionError, Frame};

fn gradient_frame(width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8]);
        }
    }
    Frame::rgb(data, width, height)
}

#[test]
fn test_identical_frames_fuse_to_input() {
    let frame = gradient_frame(32, 24);
    let fused = fuse(&[frame.clone(), frame.clone()]).unwrap();
    assert_eq!(fused.dimensions(), (32, 24));
    assert_eq!(fused.data, frame.data);
}

#[test]
fn test_identical_rgba_frames_fuse_to_input() {
    let data: Vec<u8> = (0..4 * 4 * 4).map(|i| (i * 13 % 256) as u8).collect();
    let frame = Frame::new(data, 4, 4, 4);
    let fused = fuse(&[frame.clone(), frame.clone(), frame.clone()]).unwrap();
    assert_eq!(fused.data, frame.data);
}

#[test]
fn test_two_frames_blend_at_half_opacity() {
    let fused = fuse(&[solid_frame(8, 8, 3, 40), solid_frame(8, 8, 3, 240)]).unwrap();
    assert!(fused.data.iter().all(|&v| v == 140));
}

#[test]
fn test_five_frames_split_budget() {
    // Each overlay at alpha 0.125 over a black base
    let frames = vec![
        solid_frame(2, 2, 1, 0),
        solid_frame(2, 2, 1, 80),
        solid_frame(2, 2, 1, 80),
        solid_frame(2, 2, 1, 80),
        solid_frame(2, 2, 1, 80),
    ];
    let fused = fuse(&frames).unwrap();
    // 0 -> 10 -> 18.75(19) -> 26.6(27) -> 33.6(34)
    assert_eq!(fused.data, vec![34; 4]);
}

#[test]
fn test_output_takes_first_frame_geometry() {
    let frames = vec![
        solid_frame(40, 30, 3, 100),
        solid_frame(80, 60, 3, 100),
        solid_frame(20, 15, 3, 100),
    ];
    let fused = fuse(&frames).unwrap();
    assert_eq!(fused.dimensions(), (40, 30));
    assert_eq!(fused.data.len(), 40 * 30 * 3);
    assert!(fused.data.iter().all(|&v| v == 100));

    let swapped = fuse(&[frames[1].clone(), frames[0].clone()]).unwrap();
    assert_eq!(swapped.dimensions(), (80, 60));
}

#[test]
fn test_every_resize_filter_keeps_reference_geometry() {
    for filter in [ResizeFilter::Triangle, ResizeFilter::CatmullRom, ResizeFilter::Lanczos3] {
        let options = FusionOptions {
            resize_filter: filter,
            ..Default::default()
        };
        let fused = fuse_with(&[gradient_frame(16, 9), gradient_frame(33, 17)], &options).unwrap();
        assert_eq!(fused.dimensions(), (16, 9), "{:?}", filter);
    }
}

#[test]
fn test_insufficient_frames() {
    assert_eq!(
        fuse(&[]),
        Err(FusionError::InsufficientFrames {
            required: 2,
            provided: 0
        })
    );
    assert_eq!(
        fuse(&[gradient_frame(4, 4)]),
        Err(FusionError::InsufficientFrames {
            required: 2,
            provided: 1
        })
    );
}

#[test]
fn test_single_frame_degenerate_path() {
    let options = FusionOptions {
        allow_single_frame: true,
        ..Default::default()
    };
    let frame = gradient_frame(5, 5);
    let fused = fuse_with(&[frame.clone()], &options).unwrap();
    assert_eq!(fused.data, frame.data);

    let corrupt = Frame::rgb(vec![0; 3], 5, 5);
    assert!(matches!(
        fuse_with(&[corrupt], &options),
        Err(FusionError::DecodeFailure { index: 0, .. })
    ));
}

#[test]
fn test_corrupt_frame_aborts_whole_fusion() {
    let frames = vec![
        gradient_frame(8, 8),
        gradient_frame(8, 8),
        Frame::rgb(vec![1, 2, 3], 8, 8),
    ];
    assert!(matches!(
        fuse(&frames),
        Err(FusionError::DecodeFailure { index: 2, .. })
    ));
}

#[test]
fn test_zero_area_reference_is_unrecoverable() {
    let frames = vec![Frame::rgb(Vec::new(), 0, 10), gradient_frame(8, 8)];
    assert!(matches!(
        fuse(&frames),
        Err(FusionError::GeometryMismatchUnrecoverable { index: 0, .. })
    ));
}

#[test]
fn test_mixed_channel_layouts_rejected() {
    let frames = vec![solid_frame(4, 4, 3, 0), solid_frame(4, 4, 4, 0)];
    assert!(matches!(
        fuse(&frames),
        Err(FusionError::ChannelLayoutMismatch {
            index: 1,
            expected: 3,
            got: 4
        })
    ));
}

#[test]
fn test_fused_frame_is_fresh() {
    let a = gradient_frame(4, 4).with_exposure_index(-3);
    let b = gradient_frame(4, 4).with_exposure_index(3);
    let fused = fuse(&[a.clone(), b]).unwrap();
    assert_ne!(fused.id, a.id);
    assert_eq!(fused.exposure_index, None);
}

#[test]
fn test_well_exposedness_on_synthetic_bracket() {
    let bracket: Vec<Frame> = [-2.0, 0.0, 2.0]
        .iter()
        .map(|&ev| synthetic_bracket_frame(ev, 64, 8))
        .collect();
    let options = FusionOptions {
        strategy: FusionStrategy::WellExposedness,
        ..Default::default()
    };

    let fused = fuse_with(&bracket, &options).unwrap();
    assert_eq!(fused.dimensions(), (64, 8));

    // Clipped highlights of the +2 EV frame must not dominate the bright end
    let last_pixel = (63 * 3) as usize;
    assert!(fused.data[last_pixel] < 250);
    // Crushed shadows of the -2 EV frame must not dominate the dark end
    assert!(fused.data[0] > bracket[0].data[0]);
}

#[test]
fn test_flat_alpha_is_order_dependent() {
    let dark = solid_frame(2, 2, 3, 20);
    let mid = solid_frame(2, 2, 3, 120);
    let bright = solid_frame(2, 2, 3, 220);

    let a = fuse(&[dark.clone(), mid.clone(), bright.clone()]).unwrap();
    let b = fuse(&[dark, bright, mid]).unwrap();
    assert_ne!(a.data, b.data);
}

#[test]
fn contract_fusion_invariants() {
    clear_invariant_log();
    let _ = fuse(&[gradient_frame(6, 6), gradient_frame(12, 12)]).unwrap();
    contract_test(
        "fusion",
        &[
            names::FLAT_WEIGHT_BUDGET,
            names::NORMALIZED_GEOMETRY,
            names::FUSED_GEOMETRY,
        ],
    );
}
