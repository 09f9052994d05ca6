use crate::models::{AnnualKr, CheckIn, KrConfig, KrDirection, KrType, Task, TaskStatus, TimeWindow};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy)]
pub struct ValueSnapshot {
    pub value: f64,
    pub check_in_count: usize,
    pub completed_tasks: usize,
    pub last_check_in_at: Option<DateTime<Utc>>,
    pub last_check_in_value: Option<f64>,
}

pub fn baseline_value(kr: &AnnualKr) -> f64 {
    match kr.direction {
        KrDirection::Maintain => kr.start_value.unwrap_or(kr.target_value),
        KrDirection::Increase | KrDirection::Decrease => kr.start_value.unwrap_or(0.0),
    }
}

// Chronologically ordered check-ins inside the window. Records without a
// parseable timestamp never match any window.
pub fn check_ins_in_window<'a>(
    check_ins: &'a [CheckIn],
    window: TimeWindow,
    config: &KrConfig,
) -> Vec<&'a CheckIn> {
    let qualifier = config.qualifier.as_ref();
    let mut filtered: Vec<&CheckIn> = check_ins
        .iter()
        .filter(|check_in| {
            check_in
                .recorded_at
                .map(|recorded| window.contains(recorded.date_naive()))
                .unwrap_or(false)
        })
        .filter(|check_in| qualifier.map(|q| q.matches(check_in)).unwrap_or(true))
        .collect();
    filtered.sort_by_key(|check_in| check_in.recorded_at);
    filtered
}

pub fn completed_tasks_in_window(kr_id: &str, tasks: &[Task], window: TimeWindow) -> usize {
    tasks
        .iter()
        .filter(|task| task.annual_kr_id.as_deref() == Some(kr_id))
        .filter(|task| task.status == TaskStatus::Completed)
        .filter(|task| {
            task.completed_at
                .map(|completed| window.contains(completed.date_naive()))
                .unwrap_or(false)
        })
        .count()
}

pub fn linked_task_total(kr_id: &str, tasks: &[Task]) -> usize {
    tasks
        .iter()
        .filter(|task| task.annual_kr_id.as_deref() == Some(kr_id))
        .filter(|task| task.status != TaskStatus::Cancelled)
        .count()
}

pub fn current_value(
    kr: &AnnualKr,
    check_ins: &[CheckIn],
    tasks: &[Task],
    window: TimeWindow,
    config: &KrConfig,
) -> ValueSnapshot {
    let filtered = check_ins_in_window(check_ins, window, config);
    let completed_tasks = completed_tasks_in_window(&kr.id, tasks, window);
    let last = filtered.last().copied();
    let sum: f64 = filtered.iter().map(|check_in| check_in.value).sum();

    let value = match kr.kr_type {
        KrType::Metric | KrType::Rate => last
            .map(|check_in| check_in.value)
            .unwrap_or_else(|| baseline_value(kr)),
        KrType::Count => {
            let check_in_sum = if config.tracking_source.includes_check_ins() {
                sum
            } else {
                0.0
            };
            let task_count = if config.tracking_source.includes_tasks() {
                completed_tasks as f64
            } else {
                0.0
            };
            check_in_sum + task_count
        }
        KrType::Average => {
            if filtered.is_empty() {
                baseline_value(kr)
            } else {
                sum / filtered.len() as f64
            }
        }
        // Latest check-in always wins, so a later lower value un-toggles an
        // apparent completion. Without check-ins the completed-task count is
        // passed through as a proxy for the task-ratio progress mapping.
        KrType::Milestone => match last {
            Some(check_in) => check_in.value,
            None if config.tracking_source.includes_tasks() => {
                tracing::debug!(kr_id = %kr.id, completed_tasks, "milestone using task-count proxy value");
                completed_tasks as f64
            }
            None => 0.0,
        },
    };

    ValueSnapshot {
        value,
        check_in_count: filtered.len(),
        completed_tasks,
        last_check_in_at: last.and_then(|check_in| check_in.recorded_at),
        last_check_in_value: last.map(|check_in| check_in.value),
    }
}

// Latest check-in strictly before the given date; the quarter re-baseline for
// reset-quarterly metric/rate key results.
pub fn latest_value_before<'a>(
    check_ins: &'a [CheckIn],
    cutoff: chrono::NaiveDate,
    config: &KrConfig,
) -> Option<&'a CheckIn> {
    let qualifier = config.qualifier.as_ref();
    check_ins
        .iter()
        .filter(|check_in| {
            check_in
                .recorded_at
                .map(|recorded| recorded.date_naive() < cutoff)
                .unwrap_or(false)
        })
        .filter(|check_in| qualifier.map(|q| q.matches(check_in)).unwrap_or(true))
        .max_by_key(|check_in| check_in.recorded_at)
}

#[cfg(test)]
mod tests {
    use super::{baseline_value, current_value, latest_value_before};
    use crate::models::{
        AnnualKr, CheckIn, KrAggregation, KrConfig, KrDirection, KrType, Task, TaskStatus, TimeWindow,
        TrackingSource,
    };
    use chrono::{NaiveDate, TimeZone, Utc};

    fn kr(kr_type: KrType, direction: KrDirection, start: Option<f64>, target: f64) -> AnnualKr {
        AnnualKr {
            id: "kr-1".to_string(),
            objective_id: "obj-1".to_string(),
            title: "test kr".to_string(),
            kr_type,
            direction,
            aggregation: KrAggregation::Cumulative,
            unit: None,
            start_value: start,
            target_value: target,
            current_value: 0.0,
        }
    }

    fn check_in(value: f64, month: u32, day: u32) -> CheckIn {
        CheckIn {
            id: format!("ci-{}-{}", month, day),
            annual_kr_id: "kr-1".to_string(),
            quarter_target_id: None,
            value,
            recorded_at: Some(Utc.with_ymd_and_hms(2025, month, day, 12, 0, 0).single().expect("valid ts")),
            note: None,
        }
    }

    fn task(status: TaskStatus, completed: Option<(u32, u32)>) -> Task {
        Task {
            id: "task-1".to_string(),
            annual_kr_id: Some("kr-1".to_string()),
            objective_id: None,
            quarter_target_id: None,
            title: "test task".to_string(),
            status,
            completed_at: completed
                .map(|(month, day)| Utc.with_ymd_and_hms(2025, month, day, 9, 0, 0).single().expect("valid ts")),
        }
    }

    fn window() -> TimeWindow {
        TimeWindow {
            start: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
            end: NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date"),
        }
    }

    #[test]
    fn metric_takes_most_recent_value() {
        let kr = kr(KrType::Metric, KrDirection::Increase, Some(100.0), 500.0);
        let check_ins = vec![check_in(200.0, 2, 1), check_in(350.0, 5, 1), check_in(300.0, 3, 1)];
        let snapshot = current_value(&kr, &check_ins, &[], window(), &KrConfig::default());
        assert_eq!(snapshot.value, 350.0);
        assert_eq!(snapshot.check_in_count, 3);
        assert_eq!(snapshot.last_check_in_value, Some(350.0));
    }

    #[test]
    fn metric_falls_back_to_baseline_when_empty() {
        let kr = kr(KrType::Metric, KrDirection::Increase, Some(100.0), 500.0);
        let snapshot = current_value(&kr, &[], &[], window(), &KrConfig::default());
        assert_eq!(snapshot.value, 100.0);
        assert_eq!(snapshot.check_in_count, 0);
        assert!(snapshot.last_check_in_at.is_none());
    }

    #[test]
    fn count_sums_values_in_window_only() {
        let kr = kr(KrType::Count, KrDirection::Increase, None, 100.0);
        let check_ins = vec![check_in(5.0, 2, 1), check_in(10.0, 3, 1), check_in(20.0, 8, 1)];
        let snapshot = current_value(&kr, &check_ins, &[], window(), &KrConfig::default());
        assert_eq!(snapshot.value, 15.0);
        assert_eq!(snapshot.check_in_count, 2);
    }

    #[test]
    fn count_with_task_tracking_counts_completed_tasks() {
        let kr = kr(KrType::Count, KrDirection::Increase, None, 10.0);
        let tasks = vec![
            task(TaskStatus::Completed, Some((2, 10))),
            task(TaskStatus::Completed, Some((9, 1))),
            task(TaskStatus::Pending, None),
        ];
        let config = KrConfig {
            tracking_source: TrackingSource::Tasks,
            ..KrConfig::default()
        };
        let snapshot = current_value(&kr, &[check_in(5.0, 2, 1)], &tasks, window(), &config);
        assert_eq!(snapshot.value, 1.0);

        let mixed = KrConfig {
            tracking_source: TrackingSource::Mixed,
            ..KrConfig::default()
        };
        let snapshot = current_value(&kr, &[check_in(5.0, 2, 1)], &tasks, window(), &mixed);
        assert_eq!(snapshot.value, 6.0);
    }

    #[test]
    fn average_takes_arithmetic_mean() {
        let kr = kr(KrType::Average, KrDirection::Increase, Some(6.0), 8.0);
        let check_ins = vec![check_in(6.5, 2, 1), check_in(7.0, 3, 1), check_in(7.5, 4, 1)];
        let snapshot = current_value(&kr, &check_ins, &[], window(), &KrConfig::default());
        assert_eq!(snapshot.value, 7.0);
    }

    #[test]
    fn milestone_latest_check_in_wins_over_earlier_completion() {
        let kr = kr(KrType::Milestone, KrDirection::Increase, None, 1.0);
        let check_ins = vec![check_in(1.0, 2, 1), check_in(0.0, 4, 1)];
        let snapshot = current_value(&kr, &check_ins, &[], window(), &KrConfig::default());
        assert_eq!(snapshot.value, 0.0);
    }

    #[test]
    fn milestone_without_check_ins_uses_task_count_proxy() {
        let kr = kr(KrType::Milestone, KrDirection::Increase, None, 1.0);
        let tasks = vec![
            task(TaskStatus::Completed, Some((2, 10))),
            task(TaskStatus::Completed, Some((3, 10))),
        ];
        let config = KrConfig {
            tracking_source: TrackingSource::Tasks,
            ..KrConfig::default()
        };
        let snapshot = current_value(&kr, &[], &tasks, window(), &config);
        assert_eq!(snapshot.value, 2.0);
        assert!(snapshot.last_check_in_value.is_none());
    }

    #[test]
    fn baseline_defaults_by_direction() {
        assert_eq!(baseline_value(&kr(KrType::Metric, KrDirection::Increase, None, 10.0)), 0.0);
        assert_eq!(baseline_value(&kr(KrType::Metric, KrDirection::Maintain, None, 10.0)), 10.0);
        assert_eq!(baseline_value(&kr(KrType::Metric, KrDirection::Decrease, Some(25.0), 15.0)), 25.0);
    }

    #[test]
    fn latest_value_before_is_strictly_earlier() {
        let check_ins = vec![check_in(100.0, 1, 15), check_in(200.0, 3, 31), check_in(300.0, 4, 1)];
        let cutoff = NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date");
        let found = latest_value_before(&check_ins, cutoff, &KrConfig::default()).expect("found");
        assert_eq!(found.value, 200.0);
    }
}
