use crate::models::{KrType, PaceStatus};

// Display strings shared by the dashboard widgets and exports.

pub fn format_value(value: f64, unit: Option<&str>, kr_type: KrType) -> String {
    if kr_type == KrType::Milestone {
        return if value >= 1.0 {
            "Complete".to_string()
        } else if value > 0.0 {
            format!("{} complete", format_percent(value))
        } else {
            "Incomplete".to_string()
        };
    }
    match unit {
        Some("%") => format!("{}%", format_number(value)),
        Some(unit) => format!("{} {}", format_number(value), unit),
        None => format_number(value),
    }
}

pub fn format_percent(fraction: f64) -> String {
    format!("{}%", (fraction * 100.0).round() as i64)
}

pub fn format_delta(delta: f64, unit: Option<&str>, kr_type: KrType) -> String {
    let magnitude = format_value(delta.abs(), unit, kr_type);
    if delta >= 0.0 {
        format!("+{}", magnitude)
    } else {
        format!("-{}", magnitude)
    }
}

pub fn pace_summary(pace_status: PaceStatus, pace_ratio: f64) -> String {
    format!("{} ({:.2}x pace)", pace_status.label(), pace_ratio)
}

fn format_number(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        let rendered = format!("{:.2}", value);
        rendered.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{format_delta, format_percent, format_value, pace_summary};
    use crate::models::{KrType, PaceStatus};

    #[test]
    fn values_render_with_units() {
        assert_eq!(format_value(1200.0, Some("followers"), KrType::Metric), "1200 followers");
        assert_eq!(format_value(7.5, Some("hours"), KrType::Average), "7.5 hours");
        assert_eq!(format_value(62.0, Some("%"), KrType::Rate), "62%");
        assert_eq!(format_value(15.0, None, KrType::Count), "15");
    }

    #[test]
    fn milestones_render_as_states() {
        assert_eq!(format_value(1.0, None, KrType::Milestone), "Complete");
        assert_eq!(format_value(0.0, None, KrType::Milestone), "Incomplete");
        assert_eq!(format_value(0.4, None, KrType::Milestone), "40% complete");
    }

    #[test]
    fn percent_rounds_to_whole_points() {
        assert_eq!(format_percent(0.666), "67%");
        assert_eq!(format_percent(0.0), "0%");
        assert_eq!(format_percent(1.0), "100%");
    }

    #[test]
    fn deltas_carry_an_explicit_sign() {
        assert_eq!(format_delta(20.0, Some("followers"), KrType::Metric), "+20 followers");
        assert_eq!(format_delta(-0.5, Some("hours"), KrType::Average), "-0.5 hours");
    }

    #[test]
    fn pace_summary_reads_naturally() {
        assert_eq!(pace_summary(PaceStatus::Ahead, 1.25), "Ahead (1.25x pace)");
    }
}
