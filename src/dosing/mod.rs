pub mod history;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::{PKError, PKResult};
use crate::models::Wear;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// One worn patch as recorded by the persistence layer.
///
/// Extra fields (identifiers, body location, notes) are ignored on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub applied_at: DateTime<Utc>,
    pub removed_at: Option<DateTime<Utc>>, // None while still worn
    pub dose_mg_per_day: f64,
}

/// Parameters of a hypothetical regular schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleParams {
    pub patches: u32,        // Patches applied together at each event
    pub spread_hours: f64,   // Interval between application events
    pub worn_hours: f64,     // Wear duration of every patch
    pub period_hours: f64,   // Simulated window
    pub dose_mg_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchWindow {
    pub index: usize,
    pub applied_at: f64, // hour offset from simulation start
    pub removed_at: f64, // hour offset from simulation start
}

impl PatchRecord {
    pub fn new(applied_at: DateTime<Utc>, removed_at: Option<DateTime<Utc>>, dose_mg_per_day: f64) -> Self {
        Self { applied_at, removed_at, dose_mg_per_day }
    }

    pub fn validate(&self) -> PKResult<()> {
        if !(self.dose_mg_per_day.is_finite() && self.dose_mg_per_day > 0.0) {
            return Err(PKError::InvalidRecord(
                format!("Dose must be positive, got {}", self.dose_mg_per_day)
            ));
        }

        if let Some(removed_at) = self.removed_at {
            if removed_at < self.applied_at {
                return Err(PKError::InvalidRecord(
                    format!("Patch applied at {} removed earlier, at {}", self.applied_at, removed_at)
                ));
            }
        }

        Ok(())
    }

    pub fn hours_since_application(&self, at: DateTime<Utc>) -> f64 {
        hours_between(self.applied_at, at)
    }

    pub fn hours_since_removal(&self, at: DateTime<Utc>) -> Option<f64> {
        self.removed_at.map(|removed_at| hours_between(removed_at, at))
    }

    pub fn wear(&self) -> Wear {
        match self.removed_at {
            Some(removed_at) => Wear::Removed { worn_hours: hours_between(self.applied_at, removed_at) },
            None => Wear::Worn,
        }
    }

    /// On the skin at `at`: applied at or before it and not yet removed.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.applied_at <= at && self.removed_at.map_or(true, |removed_at| removed_at > at)
    }
}

impl ScheduleParams {
    /// Upper bound on the windows a single schedule may expand into.
    pub const MAX_WINDOWS: usize = 100_000;

    pub fn new(patches: u32, spread_hours: f64, worn_hours: f64, period_hours: f64) -> Self {
        Self {
            patches,
            spread_hours,
            worn_hours,
            period_hours,
            dose_mg_per_day: 0.1,
        }
    }

    pub fn with_dose(mut self, dose_mg_per_day: f64) -> Self {
        self.dose_mg_per_day = dose_mg_per_day;
        self
    }

    pub fn validate(&self) -> PKResult<()> {
        if self.patches == 0 {
            return Err(PKError::InvalidSchedule(
                "At least one patch per application must be specified".to_string()
            ));
        }

        let positive = [
            ("spread", self.spread_hours),
            ("worn", self.worn_hours),
            ("period", self.period_hours),
            ("dose", self.dose_mg_per_day),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PKError::InvalidSchedule(
                    format!("Parameter {} must be positive, got {}", name, value)
                ));
            }
        }

        let windows = (self.period_hours / self.spread_hours).ceil() * self.patches as f64;
        if windows > Self::MAX_WINDOWS as f64 {
            return Err(PKError::InvalidSchedule(
                format!("Schedule expands to {} windows, limit is {}", windows, Self::MAX_WINDOWS)
            ));
        }

        Ok(())
    }
}

impl PatchWindow {
    pub fn worn_hours(&self) -> f64 {
        self.removed_at - self.applied_at
    }
}

/// Rolling schedule: every `spread` hours, `patches` new patches go on
/// together and each stays on for `worn` hours.
pub fn generate_patch_windows(params: &ScheduleParams) -> PKResult<Vec<PatchWindow>> {
    params.validate()?;

    let events = (params.period_hours / params.spread_hours).ceil() as usize;
    let mut windows = Vec::with_capacity(events * params.patches as usize);

    let mut event = 0usize;
    loop {
        let applied_at = event as f64 * params.spread_hours;
        if applied_at >= params.period_hours {
            break;
        }

        for _ in 0..params.patches {
            windows.push(PatchWindow {
                index: windows.len(),
                applied_at,
                removed_at: applied_at + params.worn_hours,
            });
        }
        event += 1;
    }

    Ok(windows)
}

/// Records on the skin at `at`, in input order.
pub fn active_at(records: &[PatchRecord], at: DateTime<Utc>) -> Vec<&PatchRecord> {
    records.iter().filter(|record| record.is_active_at(at)).collect()
}

pub fn earliest_application(records: &[PatchRecord]) -> Option<DateTime<Utc>> {
    records.iter().map(|record| record.applied_at).min()
}

pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MS_PER_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_twice_weekly_pairs() {
        let params = ScheduleParams::new(2, 84.0, 84.0, 672.0);
        let windows = generate_patch_windows(&params).unwrap();

        assert_eq!(windows.len(), 16);
        let starts: Vec<f64> = windows.iter().step_by(2).map(|w| w.applied_at).collect();
        assert_eq!(starts, vec![0.0, 84.0, 168.0, 252.0, 336.0, 420.0, 504.0, 588.0]);

        for (i, window) in windows.iter().enumerate() {
            assert_eq!(window.index, i);
            assert_eq!(window.removed_at, window.applied_at + 84.0);
            assert_eq!(window.worn_hours(), 84.0);
        }
        assert_eq!(windows[0].applied_at, windows[1].applied_at);
    }

    #[test]
    fn test_overlapping_wear() {
        let params = ScheduleParams::new(1, 48.0, 72.0, 100.0);
        let windows = generate_patch_windows(&params).unwrap();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2].applied_at, 96.0);
        assert_eq!(windows[2].removed_at, 168.0);
    }

    #[test]
    fn test_generation_is_stable() {
        let params = ScheduleParams::new(3, 56.0, 84.0, 672.0);
        assert_eq!(generate_patch_windows(&params).unwrap(), generate_patch_windows(&params).unwrap());
    }

    #[test]
    fn test_non_positive_parameters_rejected() {
        let invalid = [
            ScheduleParams::new(0, 84.0, 84.0, 672.0),
            ScheduleParams::new(2, 0.0, 84.0, 672.0),
            ScheduleParams::new(2, 84.0, -1.0, 672.0),
            ScheduleParams::new(2, 84.0, 84.0, 0.0),
            ScheduleParams::new(2, f64::NAN, 84.0, 672.0),
            ScheduleParams::new(2, 84.0, 84.0, 672.0).with_dose(0.0),
        ];

        for params in &invalid {
            assert!(matches!(generate_patch_windows(params), Err(PKError::InvalidSchedule(_))));
        }
    }

    #[test]
    fn test_unbounded_schedules_rejected() {
        let invalid = [
            ScheduleParams::new(2, f64::MIN_POSITIVE, 84.0, 672.0),
            ScheduleParams::new(2, 1e-9, 84.0, 672.0),
            ScheduleParams::new(u32::MAX, 84.0, 84.0, 672.0),
            ScheduleParams::new(2, 1.0, 84.0, f64::MAX),
        ];
        for params in &invalid {
            assert!(matches!(generate_patch_windows(params), Err(PKError::InvalidSchedule(_))));
        }

        // right at the limit is still generated
        let dense = ScheduleParams::new(10, 1.0, 84.0, 10_000.0);
        assert_eq!(generate_patch_windows(&dense).unwrap().len(), ScheduleParams::MAX_WINDOWS);
    }

    #[test]
    fn test_record_validation() {
        assert!(PatchRecord::new(at(1, 8), Some(at(4, 20)), 0.1).validate().is_ok());
        assert!(PatchRecord::new(at(1, 8), None, 0.05).validate().is_ok());
        assert!(matches!(
            PatchRecord::new(at(4, 8), Some(at(1, 8)), 0.1).validate(),
            Err(PKError::InvalidRecord(_))
        ));
        assert!(matches!(
            PatchRecord::new(at(1, 8), None, 0.0).validate(),
            Err(PKError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_wear_and_activity() {
        let removed = PatchRecord::new(at(1, 8), Some(at(4, 20)), 0.1);
        let worn = PatchRecord::new(at(3, 8), None, 0.1);

        assert_eq!(removed.wear(), Wear::Removed { worn_hours: 84.0 });
        assert_eq!(worn.wear(), Wear::Worn);
        assert_eq!(removed.hours_since_removal(at(5, 20)), Some(24.0));
        assert_eq!(worn.hours_since_removal(at(5, 20)), None);

        let records = vec![removed.clone(), worn.clone()];
        assert_eq!(active_at(&records, at(2, 0)), vec![&removed]);
        assert_eq!(active_at(&records, at(4, 0)).len(), 2);
        // removal instant is exclusive
        assert_eq!(active_at(&records, at(4, 20)), vec![&worn]);
        assert_eq!(earliest_application(&records), Some(at(1, 8)));
        assert_eq!(earliest_application(&[]), None);
    }

    #[test]
    fn test_hour_offsets() {
        assert_eq!(hours_between(at(1, 0), at(1, 6)), 6.0);
        assert_eq!(hours_between(at(1, 6), at(1, 0)), -6.0);
        assert_eq!(hours_between(at(1, 0), at(2, 6) + Duration::minutes(30)), 30.5);
    }
}
