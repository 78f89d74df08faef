pub mod cut;
pub mod engine;
pub mod leaderboard;
pub mod schedule;
pub mod scoring;

pub use engine::{CutOutcome, Engine, EngineConfig, StepOutcome};
