pub mod engine;

pub use engine::{
    calculate_score, compute_score, FactorContribution, ScoreResult, Tier, HSTS_MIN_MAX_AGE,
};
