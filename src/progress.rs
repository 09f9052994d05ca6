use crate::models::{KrDirection, KrType, PaceStatus, TimeWindow};
use chrono::NaiveDate;

pub const PACE_AHEAD_THRESHOLD: f64 = 1.10;
pub const PACE_ON_TRACK_THRESHOLD: f64 = 0.90;
pub const PACE_AT_RISK_THRESHOLD: f64 = 0.75;

const EXPECTED_PROGRESS_FLOOR: f64 = 0.01;
const EARLY_PERIOD_AHEAD_RATIO: f64 = 1.5;
const MILESTONE_TASK_PROGRESS_CAP: f64 = 0.95;
const MAINTAIN_TOLERANCE_FRACTION: f64 = 0.05;
const MAINTAIN_TOLERANCE_FLOOR: f64 = 0.5;
const VALUE_EPSILON: f64 = 1e-9;

pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

pub fn compute_progress(
    kr_type: KrType,
    direction: KrDirection,
    current: f64,
    baseline: f64,
    target: f64,
    tolerance_band: Option<f64>,
) -> f64 {
    if kr_type == KrType::Milestone {
        return milestone_progress(current);
    }

    match direction {
        KrDirection::Increase => {
            let range = target - baseline;
            if range.abs() < VALUE_EPSILON {
                tracing::debug!(target, baseline, "degenerate increase range, binary progress");
                return if current >= target { 1.0 } else { 0.0 };
            }
            clamp01((current - baseline) / range)
        }
        KrDirection::Decrease => {
            let range = baseline - target;
            if range.abs() < VALUE_EPSILON {
                tracing::debug!(target, baseline, "degenerate decrease range, binary progress");
                return if current <= target { 1.0 } else { 0.0 };
            }
            clamp01((baseline - current) / range)
        }
        KrDirection::Maintain => {
            let tolerance = maintain_tolerance(target, tolerance_band);
            clamp01(1.0 - (current - target).abs() / tolerance)
        }
    }
}

pub fn milestone_progress(value: f64) -> f64 {
    if value >= 1.0 {
        1.0
    } else if value > 0.0 {
        // Manual partial credit recorded directly on the check-in.
        value
    } else {
        0.0
    }
}

// Task completion alone never reaches 100%; the last 5% is reserved for an
// explicit completion signal on the key result itself.
pub fn milestone_progress_with_tasks(
    value: f64,
    completed_tasks: usize,
    total_tasks: usize,
    explicitly_complete: bool,
) -> f64 {
    if explicitly_complete || value >= 1.0 {
        return 1.0;
    }
    let manual = if value > 0.0 && value < 1.0 { value } else { 0.0 };
    let task_ratio = if total_tasks == 0 {
        0.0
    } else {
        completed_tasks as f64 / total_tasks as f64
    };
    manual.max(task_ratio.min(MILESTONE_TASK_PROGRESS_CAP))
}

pub fn expected_progress(full_window: TimeWindow, as_of: NaiveDate) -> f64 {
    clamp01(full_window.fraction_elapsed(as_of))
}

pub fn expected_value(direction: KrDirection, baseline: f64, target: f64, expected: f64) -> f64 {
    match direction {
        KrDirection::Maintain => target,
        KrDirection::Increase | KrDirection::Decrease => baseline + (target - baseline) * expected,
    }
}

pub fn pace_ratio(progress: f64, expected: f64) -> f64 {
    if expected < EXPECTED_PROGRESS_FLOOR {
        // Essentially day one; fix the ratio instead of dividing by ~zero.
        return if progress > 0.0 { EARLY_PERIOD_AHEAD_RATIO } else { 1.0 };
    }
    progress / expected
}

pub fn pace_status(ratio: f64) -> PaceStatus {
    if ratio >= PACE_AHEAD_THRESHOLD {
        PaceStatus::Ahead
    } else if ratio >= PACE_ON_TRACK_THRESHOLD {
        PaceStatus::OnTrack
    } else if ratio >= PACE_AT_RISK_THRESHOLD {
        PaceStatus::AtRisk
    } else {
        PaceStatus::OffTrack
    }
}

// Signed distance from target, oriented so positive is good.
pub fn delta(direction: KrDirection, current: f64, target: f64) -> f64 {
    match direction {
        KrDirection::Decrease => target - current,
        KrDirection::Increase | KrDirection::Maintain => current - target,
    }
}

fn maintain_tolerance(target: f64, tolerance_band: Option<f64>) -> f64 {
    match tolerance_band {
        Some(band) if band > VALUE_EPSILON => band,
        Some(band) => {
            tracing::warn!(band, "non-positive tolerance band ignored, using default");
            default_tolerance(target)
        }
        None => default_tolerance(target),
    }
}

fn default_tolerance(target: f64) -> f64 {
    (target.abs() * MAINTAIN_TOLERANCE_FRACTION).max(MAINTAIN_TOLERANCE_FLOOR)
}
