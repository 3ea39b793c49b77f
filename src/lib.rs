pub mod config;
pub mod dosing;
pub mod error;
pub mod models;
pub mod output;
pub mod simulation;

pub use config::{Config, ModelTuning, TargetRange};
pub use dosing::{generate_patch_windows, PatchRecord, PatchWindow, ScheduleParams};
pub use dosing::history::PatchHistory;
pub use error::{PKError, PKResult};
pub use models::{PatchModel, Wear};
pub use simulation::{
    Playground, PlaygroundSimulation, Recommendation, RecommendationKind, RemovalOutcome,
    SeriesPoint, SeriesSummary, Simulator, Urgency,
};
