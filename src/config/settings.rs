use std::collections::HashMap;
use std::str::FromStr;
use log::debug;
use crate::config::{Config, TargetRange};
use crate::error::{PKError, PKResult};

pub const TARGET_E2_MIN: &str = "target_e2_min";
pub const TARGET_E2_MAX: &str = "target_e2_max";
pub const DEFAULT_WEAR_HOURS: &str = "default_wear_hours";
pub const DEFAULT_DOSE_MG_PER_DAY: &str = "default_dose_mg_per_day";
pub const PATCHES_PER_CHANGE: &str = "patches_per_change";
pub const REMINDER_HOURS_BEFORE: &str = "reminder_hours_before";

/// Builds a `Config` from the persistence layer's string key/value settings.
///
/// Missing keys keep their defaults and unknown keys are ignored; a value
/// that does not parse is rejected rather than silently defaulted.
pub fn from_settings(settings: &HashMap<String, String>) -> PKResult<Config> {
    let defaults = Config::default();

    let config = Config {
        target: TargetRange {
            min: read(settings, TARGET_E2_MIN, defaults.target.min)?,
            max: read(settings, TARGET_E2_MAX, defaults.target.max)?,
        },
        default_wear_hours: read(settings, DEFAULT_WEAR_HOURS, defaults.default_wear_hours)?,
        default_dose_mg_per_day: read(settings, DEFAULT_DOSE_MG_PER_DAY, defaults.default_dose_mg_per_day)?,
        patches_per_change: read(settings, PATCHES_PER_CHANGE, defaults.patches_per_change)?,
        reminder_hours_before: read(settings, REMINDER_HOURS_BEFORE, defaults.reminder_hours_before)?,
        tuning: defaults.tuning,
    };

    config.validate()?;
    debug!("Loaded settings: target {:?}, wear {}h", config.target, config.default_wear_hours);
    Ok(config)
}

fn read<T: FromStr>(settings: &HashMap<String, String>, key: &str, default: T) -> PKResult<T> {
    match settings.get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            PKError::Validation(format!("Setting {} has unparseable value {:?}", key, raw))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_store_values_override_defaults() {
        let config = from_settings(&settings(&[
            (TARGET_E2_MIN, "120"),
            (TARGET_E2_MAX, "250"),
            (PATCHES_PER_CHANGE, "1"),
            ("onboarding_complete", "true"),
        ])).unwrap();

        assert_eq!(config.target, TargetRange { min: 120.0, max: 250.0 });
        assert_eq!(config.patches_per_change, 1);
        assert_eq!(config.default_wear_hours, 84.0);
        assert_eq!(config.default_dose_mg_per_day, 0.1);
    }

    #[test]
    fn test_empty_store_yields_defaults() {
        let config = from_settings(&HashMap::new()).unwrap();
        assert_eq!(config.target, TargetRange::default());
        assert_eq!(config.reminder_hours_before, 2.0);
    }

    #[test]
    fn test_garbage_value_rejected() {
        let result = from_settings(&settings(&[(TARGET_E2_MIN, "lots")]));
        assert!(matches!(result, Err(PKError::Validation(_))));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let result = from_settings(&settings(&[(TARGET_E2_MIN, "300")]));
        assert!(matches!(result, Err(PKError::InvalidTarget(_))));
    }
}
