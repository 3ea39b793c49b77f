use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use super::{interpolate_level, Recommendation, SeriesPoint, Simulator};
use crate::config::TargetRange;
use crate::dosing::{earliest_application, hours_between, PatchRecord};
use crate::error::{PKError, PKResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOrigin {
    Real,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaygroundPatch {
    pub id: String,
    pub record: PatchRecord,
    pub origin: PatchOrigin,
}

/// A patch the user may mean when removing at an instant worn by several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalCandidate {
    pub id: String,
    pub applied_at: DateTime<Utc>,
    pub wear_hours: f64, // worn so far at the removal instant
    pub dose_mg_per_day: f64,
    pub origin: PatchOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemovalOutcome {
    NothingActive,
    Removed(String),
    /// Several patches are on; the caller must pick one via `confirm_removal`.
    NeedsChoice(Vec<RemovalCandidate>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchEventKind {
    Applied,
    Removed,
}

/// Chart marker for an application or removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchEvent {
    pub hour: f64, // offset from the series origin
    pub kind: PatchEventKind,
    pub label: String,
    pub origin: PatchOrigin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaygroundSimulation {
    pub series: Vec<SeriesPoint>,
    pub start_time: DateTime<Utc>,
    pub now_hour: f64,
    pub current_level: f64,
    pub events: Vec<PatchEvent>,
    pub recommendations: Vec<Recommendation>,
}

/// Exploratory copy of the patch history.
///
/// Real patches can gain or lose a speculative removal; synthetic patches can
/// be added and deleted. Nothing here touches the stored history.
#[derive(Debug, Clone)]
pub struct Playground {
    initial: Vec<PlaygroundPatch>,
    patches: Vec<PlaygroundPatch>,
    next_synthetic: u64,
}

impl Playground {
    /// Seeds the overlay with the stored history; every record must pass
    /// `PatchRecord::validate`.
    pub fn new<I>(real: I) -> PKResult<Self>
    where
        I: IntoIterator<Item = (String, PatchRecord)>,
    {
        let initial = real.into_iter()
            .map(|(id, record)| {
                record.validate()?;
                Ok(PlaygroundPatch { id, record, origin: PatchOrigin::Real })
            })
            .collect::<PKResult<Vec<_>>>()?;

        Ok(Self {
            patches: initial.clone(),
            initial,
            next_synthetic: 1,
        })
    }

    pub fn patches(&self) -> &[PlaygroundPatch] {
        &self.patches
    }

    pub fn records(&self) -> Vec<PatchRecord> {
        self.patches.iter().map(|p| p.record.clone()).collect()
    }

    pub fn add_synthetic(&mut self, applied_at: DateTime<Utc>, dose_mg_per_day: f64) -> PKResult<String> {
        let record = PatchRecord::new(applied_at, None, dose_mg_per_day);
        record.validate()?;

        let id = format!("pg-{}", self.next_synthetic);
        self.next_synthetic += 1;
        self.patches.push(PlaygroundPatch { id: id.clone(), record, origin: PatchOrigin::Synthetic });

        debug!("Playground: added synthetic patch {} at {}", id, applied_at);
        Ok(id)
    }

    /// Patches on the skin at `at`, with how long each has been worn.
    pub fn removal_candidates(&self, at: DateTime<Utc>) -> Vec<RemovalCandidate> {
        self.patches.iter()
            .filter(|p| p.record.is_active_at(at))
            .map(|p| RemovalCandidate {
                id: p.id.clone(),
                applied_at: p.record.applied_at,
                wear_hours: hours_between(p.record.applied_at, at),
                dose_mg_per_day: p.record.dose_mg_per_day,
                origin: p.origin,
            })
            .collect()
    }

    /// Removes the only patch worn at `at`; defers to the caller when several are.
    pub fn remove_at(&mut self, at: DateTime<Utc>) -> PKResult<RemovalOutcome> {
        let mut candidates = self.removal_candidates(at);

        match candidates.len() {
            0 => Ok(RemovalOutcome::NothingActive),
            1 => {
                let id = candidates.remove(0).id;
                self.confirm_removal(&id, at)?;
                Ok(RemovalOutcome::Removed(id))
            },
            _ => Ok(RemovalOutcome::NeedsChoice(candidates)),
        }
    }

    pub fn confirm_removal(&mut self, id: &str, at: DateTime<Utc>) -> PKResult<()> {
        let patch = self.find_mut(id)?;
        if !patch.record.is_active_at(at) {
            return Err(PKError::Validation(
                format!("Patch {} is not worn at {}", id, at)
            ));
        }

        patch.record.removed_at = Some(at);
        debug!("Playground: patch {} removed at {}", id, at);
        Ok(())
    }

    /// Drops a synthetic patch; a real patch instead gets its stored removal back.
    pub fn delete(&mut self, id: &str) -> PKResult<()> {
        let origin = self.find_mut(id)?.origin;

        match origin {
            PatchOrigin::Synthetic => {
                self.patches.retain(|p| p.id != id);
                Ok(())
            },
            PatchOrigin::Real => self.undo_removal(id),
        }
    }

    pub fn undo_removal(&mut self, id: &str) -> PKResult<()> {
        let original = self.initial.iter()
            .find(|p| p.id == id)
            .map(|p| p.record.removed_at)
            .ok_or_else(|| PKError::Validation(format!("Patch {} is not a real patch", id)))?;

        self.find_mut(id)?.record.removed_at = original;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.patches = self.initial.clone();
    }

    /// True for a real patch whose removal differs from the stored one.
    pub fn is_modified(&self, id: &str) -> bool {
        let current = self.patches.iter().find(|p| p.id == id);
        let initial = self.initial.iter().find(|p| p.id == id);

        match (current, initial) {
            (Some(current), Some(initial)) => current.record.removed_at != initial.record.removed_at,
            _ => false,
        }
    }

    /// Full pipeline over the speculative set, from the earliest patch
    /// through `now` plus the configured playground horizon.
    pub fn simulate(&self, simulator: &Simulator, target: &TargetRange, now: DateTime<Utc>) -> Option<PlaygroundSimulation> {
        let records = self.records();
        let start_time = earliest_application(&records)?;
        let horizon = simulator.tuning().playground_horizon_hours;

        let series = simulator.personalized_series(&records, now + Duration::hours(horizon as i64));
        if series.is_empty() {
            return None;
        }

        let now_hour = hours_between(start_time, now);
        let current_level = interpolate_level(&series, now_hour);
        let recommendations = simulator.recommendations(&records, target, now, horizon);

        Some(PlaygroundSimulation {
            events: self.events(start_time),
            series,
            start_time,
            now_hour,
            current_level,
            recommendations,
        })
    }

    fn events(&self, origin: DateTime<Utc>) -> Vec<PatchEvent> {
        let mut events = Vec::with_capacity(self.patches.len() * 2);

        for patch in &self.patches {
            let record = &patch.record;
            events.push(PatchEvent {
                hour: hours_between(origin, record.applied_at),
                kind: PatchEventKind::Applied,
                label: format!("{}mg/day applied", record.dose_mg_per_day),
                origin: patch.origin,
            });

            if let Some(removed_at) = record.removed_at {
                events.push(PatchEvent {
                    hour: hours_between(origin, removed_at),
                    kind: PatchEventKind::Removed,
                    label: format!("{}mg/day removed", record.dose_mg_per_day),
                    origin: patch.origin,
                });
            }
        }

        events.sort_by(|a, b| a.hour.total_cmp(&b.hour));
        events
    }

    fn find_mut(&mut self, id: &str) -> PKResult<&mut PlaygroundPatch> {
        self.patches.iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PKError::Validation(format!("Unknown playground patch {}", id)))
    }
}
