/// Exposure bracket planning
///
/// Turns a shot count and EV spacing into device exposure-compensation
/// indices, dropping anything the device cannot reach.
use super::BracketPlan;
use crate::assert_invariant;
use crate::invariant_ppt::names;
use crate::types::{BracketRequest, ExposureRange, ExposureStep};

/// Plan the exposure-compensation indices for one bracket.
///
/// Odd shot counts include the unadjusted exposure (index 0), even counts
/// straddle it. Candidates outside `range` are dropped rather than clamped,
/// so the plan can be shorter than `shot_count` or even empty. When the EV
/// spacing is small relative to the device step, several shots collapse onto
/// the same index; those duplicates are kept.
pub fn plan(shot_count: u32, ev_spacing: f32, range: ExposureRange, step: ExposureStep) -> BracketPlan {
    let include_zero = shot_count % 2 == 1;
    let max_steps = if include_zero {
        (shot_count - 1) / 2
    } else {
        shot_count / 2
    };
    let index_step = index_step(ev_spacing, step);

    log::debug!(
        "Planning bracket: {} shots, {} EV spacing, {} EV/index -> index step {}, range [{}, {}]",
        shot_count,
        ev_spacing,
        step.ev(),
        index_step,
        range.lower,
        range.upper
    );

    let mut indices = Vec::with_capacity((shot_count as usize).min(MAX_RESERVED_SHOTS));
    let mut dropped = 0u64;

    if include_zero {
        push_candidate(&mut indices, &mut dropped, Some(0), range);
    }

    // Odd counts step by index_step, even counts by odd multiples of half of it
    let stride = if include_zero { index_step } else { index_step / 2 };

    for i in 1..=max_steps as i64 {
        let offset = if include_zero {
            i.checked_mul(stride)
        } else {
            (2 * i - 1).checked_mul(stride)
        };

        let landed = push_candidate(&mut indices, &mut dropped, offset, range)
            | push_candidate(&mut indices, &mut dropped, offset.and_then(i64::checked_neg), range);

        // Offsets only grow in magnitude (or stay put when stride is 0)
        if !landed && (stride == 0 || offset.map_or(true, |o| beyond_range(o, range))) {
            dropped += 2 * (max_steps as u64 - i as u64);
            break;
        }
    }

    if dropped > 0 {
        log::warn!(
            "Dropped {} bracket candidate(s) outside exposure range [{}, {}]",
            dropped,
            range.lower,
            range.upper
        );
    }

    indices.sort_unstable();

    assert_invariant!(
        indices.windows(2).all(|w| w[0] <= w[1]),
        names::PLAN_SORTED,
        "bracket::plan"
    );
    assert_invariant!(
        indices.iter().all(|&i| range.contains(i)),
        names::PLAN_IN_RANGE,
        "bracket::plan"
    );
    assert_invariant!(
        indices.len() <= shot_count as usize,
        names::PLAN_LENGTH,
        "bracket::plan"
    );

    BracketPlan::new(indices)
}

/// Upper bound on the up-front reservation; longer plans grow on demand.
const MAX_RESERVED_SHOTS: usize = 64;

/// Keep `candidate` if it is a reachable index, otherwise count it as dropped.
///
/// `None` is an offset that overflowed and is always dropped.
fn push_candidate(indices: &mut Vec<i32>, dropped: &mut u64, candidate: Option<i64>, range: ExposureRange) -> bool {
    match candidate.and_then(|c| i32::try_from(c).ok()) {
        Some(index) if range.contains(index) => {
            indices.push(index);
            true
        }
        _ => {
            *dropped += 1;
            false
        }
    }
}

/// True when both `offset` and `-offset` lie outside `range`.
fn beyond_range(offset: i64, range: ExposureRange) -> bool {
    let magnitude = offset.unsigned_abs() as i128;
    magnitude > range.upper as i128 && magnitude > -(range.lower as i128)
}

/// Plan a validated request.
pub fn plan_request(request: &BracketRequest, range: ExposureRange, step: ExposureStep) -> BracketPlan {
    plan(request.shot_count, request.ev_spacing, range, step)
}

/// Device units per requested EV stop, rounded half away from zero.
pub fn index_step(ev_spacing: f32, step: ExposureStep) -> i64 {
    (ev_spacing as f64 / step.ev() as f64).round() as i64
}
