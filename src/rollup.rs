use crate::models::{ObjectiveProgress, PaceStatus, PlanProgress, ProgressResult};

// Simple arithmetic mean for progress, worst-status-wins for pace. An empty
// collection reads as "nothing started": zero progress, off track.

pub fn compute_objective_progress(
    objective_id: &str,
    kr_results: &[(String, ProgressResult)],
) -> ObjectiveProgress {
    let kr_count = kr_results.len();
    let (progress, expected_progress) = mean_pair(
        kr_results
            .iter()
            .map(|(_, result)| (result.progress, result.expected_progress)),
    );
    let pace_status = kr_results
        .iter()
        .map(|(_, result)| result.pace_status)
        .reduce(PaceStatus::worst)
        .unwrap_or(PaceStatus::OffTrack);

    ObjectiveProgress {
        objective_id: objective_id.to_string(),
        progress,
        expected_progress,
        pace_status,
        kr_count,
    }
}

pub fn compute_plan_progress(plan_id: &str, objective_results: &[ObjectiveProgress]) -> PlanProgress {
    let objective_count = objective_results.len();
    let (progress, expected_progress) = mean_pair(
        objective_results
            .iter()
            .map(|objective| (objective.progress, objective.expected_progress)),
    );
    let pace_status = objective_results
        .iter()
        .map(|objective| objective.pace_status)
        .reduce(PaceStatus::worst)
        .unwrap_or(PaceStatus::OffTrack);

    PlanProgress {
        plan_id: plan_id.to_string(),
        progress,
        expected_progress,
        pace_status,
        objective_count,
    }
}

fn mean_pair(values: impl Iterator<Item = (f64, f64)>) -> (f64, f64) {
    let mut count = 0usize;
    let mut progress_sum = 0.0;
    let mut expected_sum = 0.0;
    for (progress, expected) in values {
        count += 1;
        progress_sum += progress;
        expected_sum += expected;
    }
    if count == 0 {
        (0.0, 0.0)
    } else {
        (progress_sum / count as f64, expected_sum / count as f64)
    }
}
