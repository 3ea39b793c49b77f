use super::{absorption, PatchModel, Wear};
use crate::config::ModelTuning;

/// Table-driven patch model: empirical absorption while worn, first-order
/// elimination from the skin depot after removal.
#[derive(Debug, Clone)]
pub struct EmpiricalPatchModel {
    elimination_half_life: f64,
    extended_wear_half_life: f64,
    reference_dose: f64,
}

impl EmpiricalPatchModel {
    pub fn new() -> Self {
        Self::from_tuning(&ModelTuning::default())
    }

    pub fn from_tuning(tuning: &ModelTuning) -> Self {
        Self {
            elimination_half_life: tuning.elimination_half_life_hours,
            extended_wear_half_life: tuning.extended_wear_half_life_hours,
            reference_dose: tuning.reference_dose_mg_per_day,
        }
    }

    fn worn_concentration(&self, elapsed: f64) -> f64 {
        absorption::table_concentration(elapsed, self.extended_wear_half_life)
    }

    fn removed_concentration(&self, elapsed: f64, worn_hours: f64) -> f64 {
        let hours_since_removal = elapsed - worn_hours;
        let at_removal = self.worn_concentration(worn_hours);

        // C(t) = C_removal * (1/2)^(t / t_half)
        at_removal * 0.5_f64.powf(hours_since_removal / self.elimination_half_life)
    }
}

impl Default for EmpiricalPatchModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchModel for EmpiricalPatchModel {
    fn concentration(&self, elapsed_hours: f64, wear: Wear) -> f64 {
        if elapsed_hours <= 0.0 {
            return 0.0;
        }

        let concentration = match wear {
            Wear::Removed { worn_hours } if elapsed_hours > worn_hours => {
                self.removed_concentration(elapsed_hours, worn_hours)
            },
            _ => self.worn_concentration(elapsed_hours),
        };

        concentration.max(0.0)
    }

    fn reference_dose(&self) -> f64 {
        self.reference_dose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_before_application() {
        let model = EmpiricalPatchModel::new();
        for elapsed in [-48.0, -0.5, 0.0] {
            assert_eq!(model.concentration(elapsed, Wear::Worn), 0.0);
            assert_eq!(model.concentration(elapsed, Wear::Removed { worn_hours: 84.0 }), 0.0);
        }
    }

    #[test]
    fn test_continuous_at_removal() {
        let model = EmpiricalPatchModel::new();
        let worn = Wear::Removed { worn_hours: 84.0 };

        let at_removal = model.concentration(84.0, worn);
        assert_relative_eq!(at_removal, model.concentration(84.0, Wear::Worn));
        assert_relative_eq!(model.concentration(84.0 + 1e-9, worn), at_removal, epsilon = 1e-6);
    }

    #[test]
    fn test_half_life_after_removal() {
        let model = EmpiricalPatchModel::new();
        let worn = Wear::Removed { worn_hours: 84.0 };

        let at_removal = model.concentration(84.0, worn);
        assert_relative_eq!(at_removal, 59.9);
        assert_relative_eq!(model.concentration(91.0, worn), at_removal / 2.0, epsilon = 1e-9);
        assert_relative_eq!(model.concentration(98.0, worn), at_removal / 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_monotone_decay_after_removal() {
        let model = EmpiricalPatchModel::new();
        // removal during the absorption ramp, where the worn curve keeps rising
        let worn = Wear::Removed { worn_hours: 6.5 };

        let mut previous = model.concentration(6.5, worn);
        for step in 1..200 {
            let current = model.concentration(6.5 + step as f64 * 0.25, worn);
            assert!(current <= previous);
            assert!(current >= 0.0);
            previous = current;
        }
    }

    #[test]
    fn test_extended_wear_past_table() {
        let model = EmpiricalPatchModel::new();
        let week = model.concentration(168.0, Wear::Worn);
        let later = model.concentration(240.0, Wear::Worn);

        assert!(later < week);
        assert_relative_eq!(later, 24.9 * 0.5_f64.powf(72.0 / 180.0), epsilon = 1e-9);
        // removal past the table seeds decay from the extrapolated value
        assert_relative_eq!(
            model.concentration(247.0, Wear::Removed { worn_hours: 240.0 }),
            later / 2.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_zero_length_wear_contributes_nothing() {
        let model = EmpiricalPatchModel::new();
        assert_eq!(model.concentration(5.0, Wear::Removed { worn_hours: 0.0 }), 0.0);
    }

    #[test]
    fn test_custom_half_life() {
        let tuning = ModelTuning { elimination_half_life_hours: 10.0, ..ModelTuning::default() };
        let model = EmpiricalPatchModel::from_tuning(&tuning);
        let worn = Wear::Removed { worn_hours: 24.0 };

        assert_relative_eq!(model.concentration(34.0, worn), 108.1 / 2.0, epsilon = 1e-9);
        assert_eq!(model.reference_dose(), 0.1);
    }
}
