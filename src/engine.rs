use crate::errors::{EngineError, EngineResult};
use crate::forecast::{forecast_completion_date, forecast_value};
use crate::models::{
    AnnualKr, CheckIn, KrConfig, KrType, ProgressResult, QuarterTarget, Task, TimeWindow,
};
use crate::progress::{
    compute_progress, delta, expected_progress, expected_value, milestone_progress_with_tasks,
    pace_ratio, pace_status,
};
use crate::quarter;
use crate::value::{baseline_value, current_value, linked_task_total, ValueSnapshot};
use crate::window::{annual_window, full_annual_window};
use chrono::{DateTime, NaiveDate, Utc};

pub fn compute_kr_progress(
    kr: &AnnualKr,
    check_ins: &[CheckIn],
    tasks: &[Task],
    plan_year: i32,
    as_of: Option<NaiveDate>,
    config: Option<&KrConfig>,
) -> EngineResult<ProgressResult> {
    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
    let default_config = KrConfig::default();
    let config = config.unwrap_or(&default_config);
    validate_ownership(kr, check_ins, tasks)?;

    let window = annual_window(plan_year, as_of);
    let snapshot = current_value(kr, check_ins, tasks, window, config);
    let baseline = baseline_value(kr);
    let progress = kr_progress(kr, &snapshot, tasks, baseline, config);

    let result = assemble(
        kr,
        config,
        full_annual_window(plan_year),
        as_of,
        snapshot.value,
        baseline,
        kr.target_value,
        progress,
        snapshot.check_in_count,
        snapshot.completed_tasks,
        linked_task_total(&kr.id, tasks),
        snapshot.last_check_in_at,
    );
    tracing::debug!(
        kr_id = %kr.id,
        progress = result.progress,
        pace = result.pace_status.as_str(),
        "computed kr progress"
    );
    Ok(result)
}

pub fn compute_quarter_target_progress(
    quarter_target: &QuarterTarget,
    kr: &AnnualKr,
    check_ins: &[CheckIn],
    tasks: &[Task],
    plan_year: i32,
    as_of: Option<NaiveDate>,
    config: Option<&KrConfig>,
) -> EngineResult<ProgressResult> {
    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
    let default_config = KrConfig::default();
    let config = config.unwrap_or(&default_config);
    validate_ownership(kr, check_ins, tasks)?;

    let evaluation = quarter::evaluate(quarter_target, kr, check_ins, tasks, plan_year, as_of, config)?;

    // Pace expectations always run against the full annual window so values
    // computed over different sub-windows share a denominator.
    Ok(assemble(
        kr,
        config,
        full_annual_window(plan_year),
        as_of,
        evaluation.current,
        evaluation.baseline,
        evaluation.target,
        evaluation.progress,
        evaluation.check_in_count,
        evaluation.completed_tasks,
        linked_task_total(&kr.id, tasks),
        evaluation.last_check_in_at,
    ))
}

fn kr_progress(
    kr: &AnnualKr,
    snapshot: &ValueSnapshot,
    tasks: &[Task],
    baseline: f64,
    config: &KrConfig,
) -> f64 {
    if kr.kr_type == KrType::Milestone && config.tracking_source.includes_tasks() {
        let manual = snapshot.last_check_in_value.unwrap_or(0.0);
        let explicit = snapshot.last_check_in_value.map(|value| value >= 1.0).unwrap_or(false);
        return milestone_progress_with_tasks(
            manual,
            snapshot.completed_tasks,
            linked_task_total(&kr.id, tasks),
            explicit,
        );
    }
    compute_progress(
        kr.kr_type,
        kr.direction,
        snapshot.value,
        baseline,
        kr.target_value,
        config.tolerance_band,
    )
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    kr: &AnnualKr,
    config: &KrConfig,
    full_window: TimeWindow,
    as_of: NaiveDate,
    current: f64,
    baseline: f64,
    target: f64,
    progress: f64,
    check_in_count: usize,
    completed_tasks: usize,
    total_tasks: usize,
    last_check_in_at: Option<DateTime<Utc>>,
) -> ProgressResult {
    let expected = expected_progress(full_window, as_of);
    let ratio = pace_ratio(progress, expected);
    let days_elapsed = full_window.days_elapsed(as_of);
    let days_remaining = full_window.days_remaining(as_of);

    let forecast_date = if kr.kr_type == KrType::Milestone && config.tracking_source.includes_tasks() {
        forecast_completion_date(completed_tasks, total_tasks, days_elapsed, as_of)
    } else {
        None
    };

    ProgressResult {
        current_value: current,
        baseline,
        target,
        progress,
        expected_progress: expected,
        expected_value: expected_value(kr.direction, baseline, target, expected),
        pace_ratio: ratio,
        pace_status: pace_status(ratio),
        delta: delta(kr.direction, current, target),
        forecast_value: forecast_value(kr.kr_type, current, baseline, days_elapsed, days_remaining),
        forecast_date,
        days_elapsed,
        days_remaining,
        check_in_count,
        last_check_in_at,
    }
}

fn validate_ownership(kr: &AnnualKr, check_ins: &[CheckIn], tasks: &[Task]) -> EngineResult<()> {
    if let Some(foreign) = check_ins.iter().find(|check_in| check_in.annual_kr_id != kr.id) {
        return Err(EngineError::Contract(format!(
            "check-in {} belongs to key result {}, not {}",
            foreign.id, foreign.annual_kr_id, kr.id
        )));
    }
    if let Some(foreign) = tasks.iter().find(|task| {
        task.annual_kr_id
            .as_deref()
            .map(|kr_id| kr_id != kr.id)
            .unwrap_or(false)
    }) {
        return Err(EngineError::Contract(format!(
            "task {} belongs to a different key result than {}",
            foreign.id, kr.id
        )));
    }
    Ok(())
}
