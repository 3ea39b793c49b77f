pub mod settings;

use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{PKError, PKResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target: TargetRange,
    pub default_wear_hours: f64,
    pub default_dose_mg_per_day: f64,
    pub patches_per_change: u32,
    pub reminder_hours_before: f64, // Consumed by the host's reminder scheduler
    pub tuning: ModelTuning,
}

/// Acceptable serum E2 band in pg/mL, supplied by the caller on every run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRange {
    pub min: f64,
    pub max: f64,
}

/// Tunable constants of the kinetic model and the advisory heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelTuning {
    pub elimination_half_life_hours: f64,   // Post-removal decay
    pub extended_wear_half_life_hours: f64, // Reservoir depletion past the table
    pub reference_dose_mg_per_day: f64,     // Dose the absorption table was measured at
    pub rising_threshold_pg_ml: f64,
    pub rising_window_hours: f64,
    pub negligible_half_lives: f64,
    pub soon_threshold_hours: f64,
    pub projection_hours: u32,
    pub advisory_horizon_hours: u32,
    pub playground_horizon_hours: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: TargetRange::default(),
            default_wear_hours: 84.0,
            default_dose_mg_per_day: 0.1,
            patches_per_change: 2,
            reminder_hours_before: 2.0,
            tuning: ModelTuning::default(),
        }
    }
}

impl Default for TargetRange {
    fn default() -> Self {
        Self { min: 100.0, max: 200.0 }
    }
}

impl Default for ModelTuning {
    fn default() -> Self {
        Self {
            elimination_half_life_hours: 7.0,
            extended_wear_half_life_hours: 180.0,
            reference_dose_mg_per_day: 0.1,
            rising_threshold_pg_ml: 2.0,
            rising_window_hours: 4.0,
            negligible_half_lives: 5.0,
            soon_threshold_hours: 6.0,
            projection_hours: 48,
            advisory_horizon_hours: 72,
            playground_horizon_hours: 168,
        }
    }
}

impl TargetRange {
    pub fn new(min: f64, max: f64) -> PKResult<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> PKResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(PKError::InvalidTarget(
                "Target bounds must be finite".to_string()
            ));
        }
        if self.min < 0.0 {
            return Err(PKError::InvalidTarget(
                format!("Target minimum must be non-negative, got {}", self.min)
            ));
        }
        if self.min > self.max {
            return Err(PKError::InvalidTarget(
                format!("Target minimum {} exceeds maximum {}", self.min, self.max)
            ));
        }
        Ok(())
    }

    pub fn contains(&self, level: f64) -> bool {
        level >= self.min && level <= self.max
    }
}

impl ModelTuning {
    /// Time after removal beyond which a patch is treated as fully eliminated.
    pub fn negligible_after_hours(&self) -> f64 {
        self.elimination_half_life_hours * self.negligible_half_lives
    }

    pub fn validate(&self) -> PKResult<()> {
        let positive = [
            ("elimination_half_life_hours", self.elimination_half_life_hours),
            ("extended_wear_half_life_hours", self.extended_wear_half_life_hours),
            ("reference_dose_mg_per_day", self.reference_dose_mg_per_day),
            ("rising_window_hours", self.rising_window_hours),
            ("negligible_half_lives", self.negligible_half_lives),
        ];

        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PKError::Validation(
                    format!("Parameter {} must be positive", name)
                ));
            }
        }

        if !(self.rising_threshold_pg_ml.is_finite() && self.rising_threshold_pg_ml >= 0.0) {
            return Err(PKError::Validation(
                "Parameter rising_threshold_pg_ml must be non-negative".to_string()
            ));
        }
        if !(self.soon_threshold_hours.is_finite() && self.soon_threshold_hours >= 0.0) {
            return Err(PKError::Validation(
                "Parameter soon_threshold_hours must be non-negative".to_string()
            ));
        }

        Ok(())
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> PKResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PKResult<()> {
        self.target.validate()?;
        self.tuning.validate()?;

        if !(self.default_wear_hours.is_finite() && self.default_wear_hours > 0.0) {
            return Err(PKError::Validation(
                "Default wear hours must be positive".to_string()
            ));
        }

        if !(self.default_dose_mg_per_day.is_finite() && self.default_dose_mg_per_day > 0.0) {
            return Err(PKError::Validation(
                "Default dose must be positive".to_string()
            ));
        }

        if self.patches_per_change == 0 {
            return Err(PKError::Validation(
                "At least one patch per change must be specified".to_string()
            ));
        }

        Ok(())
    }
}
