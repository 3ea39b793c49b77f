pub mod absorption;
pub mod empirical;

use crate::config::ModelTuning;
use crate::error::PKResult;

/// Concentration curve of a single patch at the reference dose.
///
/// Implementations are dose-agnostic: callers scale the result by
/// `dose / reference_dose()`.
pub trait PatchModel: Send + Sync {
    fn concentration(&self, elapsed_hours: f64, wear: Wear) -> f64;
    fn reference_dose(&self) -> f64;
}

/// Wear state of a patch as seen by the kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wear {
    /// Still on the skin for every instant being queried.
    Worn,
    /// Taken off after `worn_hours` of wear.
    Removed { worn_hours: f64 },
}

pub fn create_model(tuning: &ModelTuning) -> PKResult<Box<dyn PatchModel>> {
    tuning.validate()?;
    Ok(Box::new(empirical::EmpiricalPatchModel::from_tuning(tuning)))
}
