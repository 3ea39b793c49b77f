use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use super::{SeriesPoint, Simulator};
use crate::config::{ModelTuning, TargetRange};
use crate::dosing::PatchRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Apply,
    Remove,
}

/// Ordered by decreasing time pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Now,
    Soon,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub urgency: Urgency,
    pub message: String,
    pub hours_until: f64,
}

impl Recommendation {
    fn new(kind: RecommendationKind, urgency: Urgency, hours_until: f64, message: String) -> Self {
        Self { kind, urgency, message, hours_until }
    }
}

impl Simulator {
    /// Projects `horizon_hours` ahead of `now` and evaluates it against `target`.
    pub fn recommendations(
        &self,
        records: &[PatchRecord],
        target: &TargetRange,
        now: DateTime<Utc>,
        horizon_hours: u32,
    ) -> Vec<Recommendation> {
        let projection = self.project_forward(records, now, horizon_hours);
        advise(&projection, target, self.tuning())
    }
}

/// Evaluates an hourly projection whose first point is the current level.
///
/// Rules, in detection order:
/// 1. below target now: informational "rising, no action" when the projection
///    re-enters range, "consider an extra patch" when it rises but never gets
///    there, otherwise "apply now";
/// 2. above target now: "remove now";
/// 3. forecasts for the first future drop below `min` and the first future
///    rise above `max`, unless that side is already reported by 1 or 2.
///
/// A "rising" note and an over-range forecast can come back together; apply
/// and remove pairs are not reconciled.
pub fn advise(projection: &[SeriesPoint], target: &TargetRange, tuning: &ModelTuning) -> Vec<Recommendation> {
    let current = match projection.first() {
        Some(point) => point.value,
        None => return Vec::new(),
    };

    let mut recommendations = Vec::new();
    let rising = is_rising(projection, current, tuning);
    let urgency_for = |hours: f64| {
        if hours <= tuning.soon_threshold_hours { Urgency::Soon } else { Urgency::Upcoming }
    };

    if current < target.min {
        let enter_range = projection.iter()
            .find(|p| p.value >= target.min)
            .map(|p| p.time);

        let recommendation = match (rising, enter_range) {
            (true, Some(hours)) => Recommendation::new(
                RecommendationKind::Apply,
                urgency_for(hours),
                hours,
                format!(
                    "E2 is rising ({:.0} pg/mL), no action needed. Expected to reach target in ~{}h.",
                    current, hours.round()
                ),
            ),
            (true, None) => Recommendation::new(
                RecommendationKind::Apply,
                Urgency::Upcoming,
                0.0,
                format!(
                    "E2 is rising ({:.0} pg/mL) but may not reach target range. Consider an additional patch.",
                    current
                ),
            ),
            (false, _) => Recommendation::new(
                RecommendationKind::Apply,
                Urgency::Now,
                0.0,
                format!("E2 is below target ({:.0} pg/mL). Apply a new patch now.", current),
            ),
        };
        recommendations.push(recommendation);
    } else if current > target.max {
        recommendations.push(Recommendation::new(
            RecommendationKind::Remove,
            Urgency::Now,
            0.0,
            format!("E2 is above target ({:.0} pg/mL). Consider removing a patch.", current),
        ));
    }

    if current >= target.min {
        if let Some(hours) = first_crossing(projection, |prev, next| prev >= target.min && next < target.min) {
            recommendations.push(Recommendation::new(
                RecommendationKind::Apply,
                urgency_for(hours),
                hours,
                format!("Apply a new patch in ~{}h to stay in range.", hours.round()),
            ));
        }
    }

    if current <= target.max {
        if let Some(hours) = first_crossing(projection, |prev, next| prev <= target.max && next > target.max) {
            recommendations.push(Recommendation::new(
                RecommendationKind::Remove,
                urgency_for(hours),
                hours,
                format!("Consider removing a patch in ~{}h to stay in range.", hours.round()),
            ));
        }
    }

    debug!(
        "Advisor: current {} pg/mL, rising {}, {} recommendations",
        current, rising, recommendations.len()
    );
    recommendations
}

fn is_rising(projection: &[SeriesPoint], current: f64, tuning: &ModelTuning) -> bool {
    let later = projection.iter()
        .find(|p| p.time >= tuning.rising_window_hours)
        .map_or(current, |p| p.value);

    later > current + tuning.rising_threshold_pg_ml
}

fn first_crossing<F>(projection: &[SeriesPoint], crosses: F) -> Option<f64>
where
    F: Fn(f64, f64) -> bool,
{
    projection.windows(2)
        .find(|pair| crosses(pair[0].value, pair[1].value))
        .map(|pair| pair[1].time)
}
