use crate::models::KrType;
use chrono::{Duration, NaiveDate};

// Constant-rate extrapolation to the end of the period. Milestones carry no
// meaningful numeric trajectory and never produce a value forecast.
pub fn forecast_value(
    kr_type: KrType,
    current: f64,
    baseline: f64,
    days_elapsed: i64,
    days_remaining: i64,
) -> Option<f64> {
    if kr_type == KrType::Milestone {
        return None;
    }
    let rate_per_day = (current - baseline) / days_elapsed.max(1) as f64;
    Some(current + rate_per_day * days_remaining.max(0) as f64)
}

// Task-velocity completion date for task-driven milestones. Zero velocity
// forecasts nothing; an already-complete milestone forecasts the as-of date.
pub fn forecast_completion_date(
    completed_tasks: usize,
    total_tasks: usize,
    days_elapsed: i64,
    as_of: NaiveDate,
) -> Option<NaiveDate> {
    if total_tasks == 0 {
        return None;
    }
    if completed_tasks >= total_tasks {
        return Some(as_of);
    }
    let tasks_per_day = completed_tasks as f64 / days_elapsed.max(1) as f64;
    if tasks_per_day <= 0.0 {
        tracing::debug!(completed_tasks, total_tasks, "zero task velocity, no completion forecast");
        return None;
    }
    let remaining = (total_tasks - completed_tasks) as f64;
    let days_needed = (remaining / tasks_per_day).ceil() as i64;
    as_of.checked_add_signed(Duration::days(days_needed))
}
