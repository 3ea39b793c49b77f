pub mod advisor;
pub mod playground;
pub mod series;

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use crate::config::{ModelTuning, TargetRange};
use crate::dosing::{earliest_application, generate_patch_windows, hours_between, PatchRecord, PatchWindow, ScheduleParams};
use crate::error::PKResult;
use crate::models::{create_model, PatchModel, Wear};

pub use advisor::*;
pub use playground::*;
pub use series::*;

/// Everything derived from one history snapshot at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub now: DateTime<Utc>,
    pub series: Vec<SeriesPoint>,
    pub current_level: f64,
    pub projection: Vec<SeriesPoint>,
    pub recommendations: Vec<Recommendation>,
    pub summary: Option<SeriesSummary>,
}

/// Superposition engine: sums independent per-patch curves.
///
/// Every method is a pure function of its arguments; "now" is always passed
/// in so that a series, its current level and its recommendations computed
/// for one snapshot agree with each other.
///
/// Records are taken as given: callers pass records that passed
/// `PatchRecord::validate` (as `PatchHistory` and `Playground` ensure), so
/// every contribution is non-negative.
pub struct Simulator {
    model: Box<dyn PatchModel>,
    tuning: ModelTuning,
}

impl Simulator {
    pub fn new(tuning: ModelTuning) -> PKResult<Self> {
        let model = create_model(&tuning)?;
        Ok(Self { model, tuning })
    }

    pub fn with_model(model: Box<dyn PatchModel>, tuning: ModelTuning) -> Self {
        Self { model, tuning }
    }

    pub fn tuning(&self) -> &ModelTuning {
        &self.tuning
    }

    /// Hourly series for a synthetic regular schedule, from hour 0 to the period.
    pub fn schedule_series(&self, params: &ScheduleParams) -> PKResult<Vec<SeriesPoint>> {
        let windows = generate_patch_windows(params)?;
        let dose_factor = params.dose_mg_per_day / self.model.reference_dose();
        let last_hour = params.period_hours.floor() as u32;

        debug!(
            "Schedule simulation: {} windows over {}h at {} mg/day",
            windows.len(), params.period_hours, params.dose_mg_per_day
        );

        let series = (0..=last_hour)
            .map(|hour| {
                let hour = hour as f64;
                let total = self.window_total(&windows, hour) * dose_factor;
                SeriesPoint::new(hour, round_tenth(total))
            })
            .collect();

        Ok(series)
    }

    /// Hourly series of the real history, from the earliest application
    /// through `end` (typically now).
    pub fn personalized_series(&self, records: &[PatchRecord], end: DateTime<Utc>) -> Vec<SeriesPoint> {
        let start = match earliest_application(records) {
            Some(start) => start,
            None => return Vec::new(),
        };
        if start >= end {
            warn!("History starts at {} which is not before {}; nothing to simulate", start, end);
            return Vec::new();
        }

        let total_hours = hours_between(start, end).ceil() as i64;
        debug!("Personalized simulation: {} records over {}h", records.len(), total_hours);

        (0..=total_hours)
            .map(|hour| {
                let at = start + Duration::hours(hour);
                SeriesPoint::new(hour as f64, round_tenth(self.level_at(records, at, false)))
            })
            .collect()
    }

    /// Point estimate at the exact instant `now`.
    pub fn current_level(&self, records: &[PatchRecord], now: DateTime<Utc>) -> f64 {
        round_tenth(self.level_at(records, now, true))
    }

    /// Hourly levels at `now + 0..=hours`, with no further application or
    /// removal events; still-worn patches stay on for the whole horizon.
    pub fn project_forward(&self, records: &[PatchRecord], now: DateTime<Utc>, hours: u32) -> Vec<SeriesPoint> {
        if records.is_empty() {
            return Vec::new();
        }

        (0..=hours)
            .map(|hour| {
                let at = now + Duration::hours(hour as i64);
                SeriesPoint::new(hour as f64, round_tenth(self.level_at(records, at, true)))
            })
            .collect()
    }

    /// Forward projection over the configured default horizon.
    pub fn default_projection(&self, records: &[PatchRecord], now: DateTime<Utc>) -> Vec<SeriesPoint> {
        self.project_forward(records, now, self.tuning.projection_hours)
    }

    /// Series, estimates and guidance for one `now`.
    ///
    /// `series` sums every record, while `current_level` and `projection`
    /// drop records removed more than the negligible cutoff ago. When such a
    /// record exists, the last series point can exceed `current_level` by
    /// that record's residual tail (under 1/32 of its level at removal).
    pub fn snapshot(&self, records: &[PatchRecord], target: &TargetRange, now: DateTime<Utc>) -> Snapshot {
        let series = self.personalized_series(records, now);
        let summary = SeriesSummary::from_series(&series);

        Snapshot {
            now,
            current_level: self.current_level(records, now),
            projection: self.default_projection(records, now),
            recommendations: self.recommendations(records, target, now, self.tuning.advisory_horizon_hours),
            summary,
            series,
        }
    }

    /// Contribution of one record at `at`, scaled by its dose.
    pub fn contribution(&self, record: &PatchRecord, at: DateTime<Utc>) -> f64 {
        let elapsed = record.hours_since_application(at);
        if elapsed < 0.0 {
            return 0.0;
        }

        let dose_factor = record.dose_mg_per_day / self.model.reference_dose();
        self.model.concentration(elapsed, record.wear()) * dose_factor
    }

    fn level_at(&self, records: &[PatchRecord], at: DateTime<Utc>, skip_eliminated: bool) -> f64 {
        let cutoff = self.tuning.negligible_after_hours();

        records.iter()
            .filter(|record| {
                !skip_eliminated
                    || record.hours_since_removal(at).map_or(true, |since| since <= cutoff)
            })
            .map(|record| self.contribution(record, at))
            .sum()
    }

    fn window_total(&self, windows: &[PatchWindow], hour: f64) -> f64 {
        windows.iter()
            .filter(|window| window.applied_at <= hour)
            .map(|window| {
                let wear = Wear::Removed { worn_hours: window.worn_hours() };
                self.model.concentration(hour - window.applied_at, wear)
            })
            .sum()
    }
}
