use crate::errors::{EngineError, EngineResult};
use crate::models::{
    AnnualKr, CheckIn, KrAggregation, KrConfig, KrDirection, KrType, PaceStatus, QuarterProgressResult,
    QuarterTarget, Task, TimeWindow,
};
use crate::progress::{
    compute_progress, milestone_progress, milestone_progress_with_tasks, pace_ratio, pace_status,
};
use crate::value::{
    baseline_value, check_ins_in_window, completed_tasks_in_window, latest_value_before, linked_task_total,
};
use crate::window::{full_quarter_window, quarter_standing, quarter_start, quarter_window, QuarterStanding};
use chrono::{DateTime, NaiveDate, Utc};

const COMPLETE_THRESHOLD: f64 = 0.999;

#[derive(Debug, Clone, Copy)]
pub(crate) struct QuarterEvaluation {
    pub window: TimeWindow,
    // Absolute triple used for ProgressResult reporting.
    pub current: f64,
    pub baseline: f64,
    pub target: f64,
    // Quarter-strip value: the quarter's own contribution for rebaselined
    // metric/rate key results, the plain aggregate otherwise.
    pub contribution: f64,
    pub quarter_baseline: Option<f64>,
    pub progress: f64,
    pub check_in_count: usize,
    pub completed_tasks: usize,
    pub last_check_in_at: Option<DateTime<Utc>>,
}

pub(crate) fn evaluate(
    quarter_target: &QuarterTarget,
    kr: &AnnualKr,
    check_ins: &[CheckIn],
    tasks: &[Task],
    plan_year: i32,
    as_of: NaiveDate,
    config: &KrConfig,
) -> EngineResult<QuarterEvaluation> {
    if quarter_target.annual_kr_id != kr.id {
        return Err(EngineError::Contract(format!(
            "quarter target {} belongs to key result {}, not {}",
            quarter_target.id, quarter_target.annual_kr_id, kr.id
        )));
    }

    let window = quarter_window(plan_year, quarter_target.quarter, kr.aggregation, as_of);

    let rebaseline = kr.aggregation == KrAggregation::ResetQuarterly
        && matches!(kr.kr_type, KrType::Metric | KrType::Rate)
        && kr.direction != KrDirection::Maintain;

    if rebaseline {
        return Ok(evaluate_rebaselined(quarter_target, kr, check_ins, plan_year, window, config));
    }

    let in_window = check_ins_in_window(check_ins, window, config);
    let completed_tasks = completed_tasks_in_window(&kr.id, tasks, window);
    let last = in_window.last().copied();
    let sum: f64 = in_window.iter().map(|check_in| check_in.value).sum();

    // Reset-quarterly counts aggregate the quarter in isolation, so they are
    // measured from zero rather than the annual start value.
    let baseline = match (kr.aggregation, kr.kr_type) {
        (KrAggregation::ResetQuarterly, KrType::Count) => 0.0,
        _ => baseline_value(kr),
    };
    let target = quarter_target.target_value;

    let current = match kr.kr_type {
        KrType::Metric | KrType::Rate => last.map(|check_in| check_in.value).unwrap_or(baseline),
        KrType::Count => {
            let check_in_sum = if config.tracking_source.includes_check_ins() { sum } else { 0.0 };
            let task_count = if config.tracking_source.includes_tasks() {
                completed_tasks as f64
            } else {
                0.0
            };
            check_in_sum + task_count
        }
        KrType::Average => {
            if in_window.is_empty() {
                baseline
            } else {
                sum / in_window.len() as f64
            }
        }
        KrType::Milestone => match last {
            Some(check_in) => check_in.value,
            None if config.tracking_source.includes_tasks() => completed_tasks as f64,
            None => 0.0,
        },
    };

    let progress = if kr.kr_type == KrType::Milestone {
        if config.tracking_source.includes_tasks() {
            let manual = last.map(|check_in| check_in.value).unwrap_or(0.0);
            let explicit = last.map(|check_in| check_in.value >= 1.0).unwrap_or(false);
            milestone_progress_with_tasks(manual, completed_tasks, linked_task_total(&kr.id, tasks), explicit)
        } else {
            milestone_progress(current)
        }
    } else {
        compute_progress(kr.kr_type, kr.direction, current, baseline, target, config.tolerance_band)
    };

    Ok(QuarterEvaluation {
        window,
        current,
        baseline,
        target,
        contribution: current,
        quarter_baseline: None,
        progress,
        check_in_count: in_window.len(),
        completed_tasks,
        last_check_in_at: last.and_then(|check_in| check_in.recorded_at),
    })
}

// An absolute metric must be re-zeroed each quarter: the latest check-in
// strictly before the quarter is the quarter's own baseline, and the stored
// target is the gain expected on top of it.
fn evaluate_rebaselined(
    quarter_target: &QuarterTarget,
    kr: &AnnualKr,
    check_ins: &[CheckIn],
    plan_year: i32,
    window: TimeWindow,
    config: &KrConfig,
) -> QuarterEvaluation {
    let q_start = quarter_start(plan_year, quarter_target.quarter);
    let baseline = latest_value_before(check_ins, q_start, config)
        .map(|check_in| check_in.value)
        .unwrap_or_else(|| kr.start_value.unwrap_or(0.0));

    let in_window = check_ins_in_window(check_ins, window, config);
    let last = in_window.last().copied();
    let current = last.map(|check_in| check_in.value).unwrap_or(baseline);

    let (target, contribution) = match kr.direction {
        KrDirection::Decrease => (baseline - quarter_target.target_value, baseline - current),
        _ => (baseline + quarter_target.target_value, current - baseline),
    };
    let progress = compute_progress(kr.kr_type, kr.direction, current, baseline, target, config.tolerance_band);

    QuarterEvaluation {
        window,
        current,
        baseline,
        target,
        contribution,
        quarter_baseline: Some(baseline),
        progress,
        check_in_count: in_window.len(),
        completed_tasks: 0,
        last_check_in_at: last.and_then(|check_in| check_in.recorded_at),
    }
}

pub fn compute_quarter_progress(
    quarter_target: &QuarterTarget,
    kr: &AnnualKr,
    check_ins: &[CheckIn],
    plan_year: i32,
    as_of: Option<NaiveDate>,
) -> EngineResult<QuarterProgressResult> {
    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
    let config = KrConfig::default();
    let evaluation = evaluate(quarter_target, kr, check_ins, &[], plan_year, as_of, &config)?;

    let standing = quarter_standing(plan_year, quarter_target.quarter, as_of);
    let is_complete = evaluation.progress >= COMPLETE_THRESHOLD;

    // Past quarters were expected in full, future quarters not at all; only
    // the current quarter is judged against the linear calendar ratio.
    let expected = match standing {
        QuarterStanding::Past => 1.0,
        QuarterStanding::Future => 0.0,
        QuarterStanding::Current => {
            full_quarter_window(plan_year, quarter_target.quarter).fraction_elapsed(as_of)
        }
    };

    let pace = match standing {
        QuarterStanding::Future => PaceStatus::OnTrack,
        QuarterStanding::Past if !is_complete => PaceStatus::OffTrack,
        _ => pace_status(pace_ratio(evaluation.progress, expected)),
    };

    Ok(QuarterProgressResult {
        quarter: quarter_target.quarter,
        window: evaluation.window,
        target_value: quarter_target.target_value,
        current_value: evaluation.contribution,
        quarter_baseline: evaluation.quarter_baseline,
        progress: evaluation.progress,
        expected_progress: expected,
        pace_status: pace,
        is_current: standing == QuarterStanding::Current,
        is_past: standing == QuarterStanding::Past,
        is_future: standing == QuarterStanding::Future,
        is_complete,
        check_in_count: evaluation.check_in_count,
    })
}

// Q1..Q4 strip for the dashboard. Quarters without a stored target are
// simply absent; duplicates are a caller contract violation.
pub fn quarter_breakdown(
    kr: &AnnualKr,
    quarter_targets: &[QuarterTarget],
    check_ins: &[CheckIn],
    plan_year: i32,
    as_of: Option<NaiveDate>,
) -> EngineResult<Vec<QuarterProgressResult>> {
    let mut ordered: Vec<&QuarterTarget> = quarter_targets.iter().collect();
    ordered.sort_by_key(|quarter_target| quarter_target.quarter.number());

    for pair in ordered.windows(2) {
        if pair[0].quarter == pair[1].quarter {
            return Err(EngineError::Contract(format!(
                "key result {} has more than one target for quarter {}",
                kr.id,
                pair[0].quarter.number()
            )));
        }
    }

    ordered
        .into_iter()
        .map(|quarter_target| compute_quarter_progress(quarter_target, kr, check_ins, plan_year, as_of))
        .collect()
}
