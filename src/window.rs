use crate::models::{KrAggregation, Quarter, TimeWindow};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarterStanding {
    Past,
    Current,
    Future,
}

pub fn year_start(plan_year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(plan_year, 1, 1).expect("valid year start")
}

pub fn year_end(plan_year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(plan_year, 12, 31).expect("valid year end")
}

pub fn quarter_start(plan_year: i32, quarter: Quarter) -> NaiveDate {
    let month = match quarter {
        Quarter::Q1 => 1,
        Quarter::Q2 => 4,
        Quarter::Q3 => 7,
        Quarter::Q4 => 10,
    };
    NaiveDate::from_ymd_opt(plan_year, month, 1).expect("valid quarter start")
}

pub fn quarter_end(plan_year: i32, quarter: Quarter) -> NaiveDate {
    let (month, day) = match quarter {
        Quarter::Q1 => (3, 31),
        Quarter::Q2 => (6, 30),
        Quarter::Q3 => (9, 30),
        Quarter::Q4 => (12, 31),
    };
    NaiveDate::from_ymd_opt(plan_year, month, day).expect("valid quarter end")
}

// Full annual span, not clipped to as-of. Pace expectations always use this
// denominator so sub-window values compare against the same timeline.
pub fn full_annual_window(plan_year: i32) -> TimeWindow {
    TimeWindow {
        start: year_start(plan_year),
        end: year_end(plan_year),
    }
}

pub fn full_quarter_window(plan_year: i32, quarter: Quarter) -> TimeWindow {
    TimeWindow {
        start: quarter_start(plan_year, quarter),
        end: quarter_end(plan_year, quarter),
    }
}

pub fn annual_window(plan_year: i32, as_of: NaiveDate) -> TimeWindow {
    clip(full_annual_window(plan_year), as_of)
}

// Reset-quarterly targets measure the quarter in isolation; cumulative targets
// measure total-to-date, so their window reaches back to January 1.
pub fn quarter_window(
    plan_year: i32,
    quarter: Quarter,
    aggregation: KrAggregation,
    as_of: NaiveDate,
) -> TimeWindow {
    let start = match aggregation {
        KrAggregation::Cumulative => year_start(plan_year),
        KrAggregation::ResetQuarterly => quarter_start(plan_year, quarter),
    };
    clip(
        TimeWindow {
            start,
            end: quarter_end(plan_year, quarter),
        },
        as_of,
    )
}

pub fn quarter_standing(plan_year: i32, quarter: Quarter, as_of: NaiveDate) -> QuarterStanding {
    if as_of < quarter_start(plan_year, quarter) {
        QuarterStanding::Future
    } else if as_of > quarter_end(plan_year, quarter) {
        QuarterStanding::Past
    } else {
        QuarterStanding::Current
    }
}

// Windows never extend into the unobserved future; end clamps to as-of but
// never before start, so an as-of preceding the window yields a zero-width span.
fn clip(window: TimeWindow, as_of: NaiveDate) -> TimeWindow {
    TimeWindow {
        start: window.start,
        end: window.end.min(as_of).max(window.start),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        annual_window, full_annual_window, full_quarter_window, quarter_standing, quarter_window,
        QuarterStanding,
    };
    use crate::models::{KrAggregation, Quarter};
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn annual_window_clips_to_as_of() {
        let window = annual_window(2025, date(2025, 4, 15));
        assert_eq!(window.start, date(2025, 1, 1));
        assert_eq!(window.end, date(2025, 4, 15));

        let past_year = annual_window(2024, date(2025, 4, 15));
        assert_eq!(past_year.end, date(2024, 12, 31));
    }

    #[test]
    fn as_of_before_year_yields_zero_width_window() {
        let window = annual_window(2025, date(2024, 11, 1));
        assert_eq!(window.start, date(2025, 1, 1));
        assert_eq!(window.end, date(2025, 1, 1));
        assert_eq!(window.days_total(), 0);
    }

    #[test]
    fn reset_quarter_window_isolates_the_quarter() {
        let window = quarter_window(2025, Quarter::Q2, KrAggregation::ResetQuarterly, date(2025, 5, 10));
        assert_eq!(window.start, date(2025, 4, 1));
        assert_eq!(window.end, date(2025, 5, 10));
    }

    #[test]
    fn cumulative_quarter_window_reaches_back_to_january() {
        let window = quarter_window(2025, Quarter::Q3, KrAggregation::Cumulative, date(2025, 12, 1));
        assert_eq!(window.start, date(2025, 1, 1));
        assert_eq!(window.end, date(2025, 9, 30));
    }

    #[test]
    fn quarter_standing_splits_on_span_bounds() {
        assert_eq!(quarter_standing(2025, Quarter::Q2, date(2025, 3, 31)), QuarterStanding::Future);
        assert_eq!(quarter_standing(2025, Quarter::Q2, date(2025, 4, 1)), QuarterStanding::Current);
        assert_eq!(quarter_standing(2025, Quarter::Q2, date(2025, 6, 30)), QuarterStanding::Current);
        assert_eq!(quarter_standing(2025, Quarter::Q2, date(2025, 7, 1)), QuarterStanding::Past);
    }

    #[test]
    fn leap_year_annual_window_has_365_days() {
        assert_eq!(full_annual_window(2024).days_total(), 365);
        assert_eq!(full_annual_window(2025).days_total(), 364);
    }

    #[test]
    fn quarter_spans_cover_the_year_without_gaps() {
        let q1 = full_quarter_window(2025, Quarter::Q1);
        let q2 = full_quarter_window(2025, Quarter::Q2);
        let q3 = full_quarter_window(2025, Quarter::Q3);
        let q4 = full_quarter_window(2025, Quarter::Q4);
        assert_eq!(q1.end.succ_opt().expect("next day"), q2.start);
        assert_eq!(q2.end.succ_opt().expect("next day"), q3.start);
        assert_eq!(q3.end.succ_opt().expect("next day"), q4.start);
        assert_eq!(q4.end, date(2025, 12, 31));
    }
}
