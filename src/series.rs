use crate::models::{AnnualKr, CheckIn, DailyDataPoint, KrConfig, KrType, TimeWindow};
use crate::progress::{clamp01, compute_progress, pace_ratio, pace_status};
use crate::value::{baseline_value, check_ins_in_window};
use chrono::{Datelike, Duration, NaiveDate};

// One point per calendar day, replaying check-ins chronologically and
// carrying running state appropriate to the key result type. Recomputed from
// scratch on every call; the engine caches nothing.
pub fn build_daily_series(kr: &AnnualKr, check_ins: &[CheckIn], window: TimeWindow) -> Vec<DailyDataPoint> {
    let config = KrConfig::default();
    let ordered = check_ins_in_window(check_ins, window, &config);
    let baseline = baseline_value(kr);

    let mut points = Vec::with_capacity((window.days_total() + 1).max(0) as usize);
    let mut cursor = 0usize;
    let mut last_value: Option<f64> = None;
    let mut running_sum = 0.0;
    let mut running_count = 0usize;

    let mut day = window.start;
    loop {
        let mut todays_check_ins = 0usize;
        while cursor < ordered.len() {
            let recorded = match ordered[cursor].recorded_at {
                Some(recorded) => recorded.date_naive(),
                None => {
                    cursor += 1;
                    continue;
                }
            };
            if recorded > day {
                break;
            }
            last_value = Some(ordered[cursor].value);
            running_sum += ordered[cursor].value;
            running_count += 1;
            if recorded == day {
                todays_check_ins += 1;
            }
            cursor += 1;
        }

        let value = match kr.kr_type {
            KrType::Metric | KrType::Rate | KrType::Milestone => last_value.unwrap_or(match kr.kr_type {
                KrType::Milestone => 0.0,
                _ => baseline,
            }),
            KrType::Count => running_sum,
            KrType::Average => {
                if running_count == 0 {
                    baseline
                } else {
                    running_sum / running_count as f64
                }
            }
        };

        let progress = compute_progress(kr.kr_type, kr.direction, value, baseline, kr.target_value, None);
        let expected = clamp01(window.fraction_elapsed(day));
        points.push(DailyDataPoint {
            date: day,
            value,
            progress,
            expected_progress: expected,
            pace_status: pace_status(pace_ratio(progress, expected)),
            check_in_count: todays_check_ins,
        });

        if day >= window.end {
            break;
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    points
}

// Sunday-starting buckets; the last day's values stand for the week while
// check-in counts accumulate across it.
pub fn build_weekly_series(daily: &[DailyDataPoint]) -> Vec<DailyDataPoint> {
    let mut weekly: Vec<DailyDataPoint> = Vec::new();
    let mut current_week: Option<NaiveDate> = None;
    let mut week_check_ins = 0usize;

    for point in daily {
        let week = week_start(point.date);
        if current_week == Some(week) {
            week_check_ins += point.check_in_count;
            let last = weekly.last_mut().expect("bucket exists for current week");
            *last = DailyDataPoint {
                check_in_count: week_check_ins,
                ..point.clone()
            };
        } else {
            current_week = Some(week);
            week_check_ins = point.check_in_count;
            weekly.push(point.clone());
        }
    }

    weekly
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}
