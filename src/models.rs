use crate::errors::EngineResult;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KrType {
    Metric,
    Count,
    Rate,
    Average,
    Milestone,
}

impl KrType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Count => "count",
            Self::Rate => "rate",
            Self::Average => "average",
            Self::Milestone => "milestone",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KrDirection {
    Increase,
    Decrease,
    Maintain,
}

impl KrDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::Maintain => "maintain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KrAggregation {
    Cumulative,
    ResetQuarterly,
}

impl KrAggregation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cumulative => "cumulative",
            Self::ResetQuarterly => "reset_quarterly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Self; 4] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4];

    pub fn number(self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }
}

impl TryFrom<u8> for Quarter {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Q1),
            2 => Ok(Self::Q2),
            3 => Ok(Self::Q3),
            4 => Ok(Self::Q4),
            other => Err(format!("quarter {} is out of range 1..=4", other)),
        }
    }
}

impl From<Quarter> for u8 {
    fn from(value: Quarter) -> Self {
        value.number()
    }
}

// Severity increases with declaration order, so `Ord::max` picks the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceStatus {
    Ahead,
    OnTrack,
    AtRisk,
    OffTrack,
}

impl PaceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ahead => "ahead",
            Self::OnTrack => "on_track",
            Self::AtRisk => "at_risk",
            Self::OffTrack => "off_track",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ahead => "Ahead",
            Self::OnTrack => "On track",
            Self::AtRisk => "At risk",
            Self::OffTrack => "Off track",
        }
    }

    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingSource {
    #[default]
    CheckIns,
    Tasks,
    Mixed,
}

impl TrackingSource {
    pub fn includes_tasks(self) -> bool {
        matches!(self, Self::Tasks | Self::Mixed)
    }

    pub fn includes_check_ins(self) -> bool {
        matches!(self, Self::CheckIns | Self::Mixed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Qualifier {
    pub field: String,
    pub operator: String,
    pub value: serde_json::Value,
}

impl Qualifier {
    // TODO: evaluate field/operator/value against check-in metadata once the
    // check_ins table grows a metadata column. Until then every record passes.
    pub fn matches(&self, _check_in: &CheckIn) -> bool {
        true
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KrConfig {
    pub qualifier: Option<Qualifier>,
    pub tracking_source: TrackingSource,
    pub tolerance_band: Option<f64>,
}

impl KrConfig {
    pub fn from_value(value: serde_json::Value) -> EngineResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

// ─── Entities (read-only inputs; owned by the persistence layer) ────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub title: String,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub id: String,
    pub plan_id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualKr {
    pub id: String,
    pub objective_id: String,
    pub title: String,
    pub kr_type: KrType,
    pub direction: KrDirection,
    pub aggregation: KrAggregation,
    pub unit: Option<String>,
    pub start_value: Option<f64>,
    pub target_value: f64,
    // Denormalized snapshot maintained by the app layer; never read here.
    pub current_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterTarget {
    pub id: String,
    pub annual_kr_id: String,
    pub quarter: Quarter,
    pub target_value: f64,
    pub current_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: String,
    pub annual_kr_id: String,
    pub quarter_target_id: Option<String>,
    pub value: f64,
    #[serde(default, deserialize_with = "lenient_datetime::deserialize")]
    pub recorded_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub annual_kr_id: Option<String>,
    pub objective_id: Option<String>,
    pub quarter_target_id: Option<String>,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "lenient_datetime::deserialize")]
    pub completed_at: Option<DateTime<Utc>>,
}

// ─── Computed records (produced fresh on every call, never cached) ──────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days_total(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn days_elapsed(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.start).num_days().clamp(0, self.days_total())
    }

    pub fn days_remaining(&self, as_of: NaiveDate) -> i64 {
        self.days_total() - self.days_elapsed(as_of)
    }

    pub fn fraction_elapsed(&self, as_of: NaiveDate) -> f64 {
        self.days_elapsed(as_of) as f64 / self.days_total().max(1) as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResult {
    pub current_value: f64,
    pub baseline: f64,
    pub target: f64,
    pub progress: f64,
    pub expected_progress: f64,
    pub expected_value: f64,
    pub pace_ratio: f64,
    pub pace_status: PaceStatus,
    pub delta: f64,
    pub forecast_value: Option<f64>,
    pub forecast_date: Option<NaiveDate>,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    pub check_in_count: usize,
    pub last_check_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterProgressResult {
    pub quarter: Quarter,
    pub window: TimeWindow,
    pub target_value: f64,
    pub current_value: f64,
    // Absolute level the quarter was re-zeroed from; only set for
    // reset-quarterly metric/rate key results.
    pub quarter_baseline: Option<f64>,
    pub progress: f64,
    pub expected_progress: f64,
    pub pace_status: PaceStatus,
    pub is_current: bool,
    pub is_past: bool,
    pub is_future: bool,
    pub is_complete: bool,
    pub check_in_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveProgress {
    pub objective_id: String,
    pub progress: f64,
    pub expected_progress: f64,
    pub pace_status: PaceStatus,
    pub kr_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanProgress {
    pub plan_id: String,
    pub progress: f64,
    pub expected_progress: f64,
    pub pace_status: PaceStatus,
    pub objective_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyDataPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub progress: f64,
    pub expected_progress: f64,
    pub pace_status: PaceStatus,
    pub check_in_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KrSummary {
    pub kr_id: String,
    pub title: String,
    pub result: ProgressResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveSummary {
    pub objective_id: String,
    pub title: String,
    pub rollup: ObjectiveProgress,
    pub key_results: Vec<KrSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub plan_id: String,
    pub title: String,
    pub year: i32,
    pub rollup: PlanProgress,
    pub objectives: Vec<ObjectiveSummary>,
}

mod lenient_datetime {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    // Unparseable timestamps become None so the record is excluded from every
    // window instead of failing the whole computation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|text| match DateTime::parse_from_rfc3339(&text) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(error) => {
                tracing::warn!(timestamp = %text, error = %error, "unparseable timestamp excluded");
                None
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{CheckIn, KrConfig, PaceStatus, Quarter, TimeWindow, TrackingSource};
    use chrono::NaiveDate;

    #[test]
    fn quarter_rejects_out_of_range_numbers() {
        assert!(Quarter::try_from(0).is_err());
        assert!(Quarter::try_from(5).is_err());
        assert_eq!(Quarter::try_from(3).expect("quarter 3"), Quarter::Q3);
        assert_eq!(Quarter::Q4.number(), 4);
    }

    #[test]
    fn worst_pace_picks_higher_severity() {
        assert_eq!(PaceStatus::Ahead.worst(PaceStatus::OffTrack), PaceStatus::OffTrack);
        assert_eq!(PaceStatus::OnTrack.worst(PaceStatus::AtRisk), PaceStatus::AtRisk);
        assert_eq!(PaceStatus::Ahead.worst(PaceStatus::Ahead), PaceStatus::Ahead);
    }

    #[test]
    fn unparseable_check_in_timestamp_becomes_none() {
        let parsed: CheckIn = serde_json::from_value(serde_json::json!({
            "id": "ci-1",
            "annualKrId": "kr-1",
            "quarterTargetId": null,
            "value": 5.0,
            "recordedAt": "not-a-timestamp",
            "note": null
        }))
        .expect("check-in deserializes");
        assert!(parsed.recorded_at.is_none());

        let valid: CheckIn = serde_json::from_value(serde_json::json!({
            "id": "ci-2",
            "annualKrId": "kr-1",
            "quarterTargetId": null,
            "value": 5.0,
            "recordedAt": "2025-02-01T12:00:00Z",
            "note": null
        }))
        .expect("check-in deserializes");
        assert!(valid.recorded_at.is_some());
    }

    #[test]
    fn kr_config_parses_from_json_column() {
        let config = KrConfig::from_value(serde_json::json!({
            "trackingSource": "mixed",
            "toleranceBand": 0.25,
            "unknownKey": true
        }))
        .expect("config parses");
        assert_eq!(config.tracking_source, TrackingSource::Mixed);
        assert_eq!(config.tolerance_band, Some(0.25));
        assert!(config.qualifier.is_none());
    }

    #[test]
    fn window_day_math_clamps_to_bounds() {
        let window = TimeWindow {
            start: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
            end: NaiveDate::from_ymd_opt(2025, 12, 31).expect("valid date"),
        };
        assert_eq!(window.days_total(), 364);
        assert_eq!(window.days_elapsed(NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")), 0);
        assert_eq!(window.days_elapsed(NaiveDate::from_ymd_opt(2026, 6, 1).expect("valid date")), 364);
        assert_eq!(window.days_remaining(NaiveDate::from_ymd_opt(2025, 12, 31).expect("valid date")), 0);
        assert!((window.fraction_elapsed(NaiveDate::from_ymd_opt(2025, 7, 2).expect("valid date")) - 0.5).abs() < 0.01);
    }
}
