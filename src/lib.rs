// Library interface for the traincore calculators
// This allows the CLI and integration tests to share the core modules

pub mod config;
pub mod duration;
pub mod error;
pub mod flatten;
pub mod live;
pub mod logging;
pub mod models;
pub mod projection;
pub mod stats;
pub mod targets;

// Re-export commonly used types for convenience
pub use models::*;
pub use config::{AppConfig, CalculationConfig, ConfigError, ZoneCutoffs};
pub use duration::DurationResolver;
pub use flatten::{flatten, leaf_count};
pub use live::{LiveEvaluator, TargetGuidance};
pub use projection::{
    validate_blocks, CtlPoint, FitnessProgression, LoadProjector, ProjectedLoad, ProjectionConfig,
    ProjectionError, ProjectionSummary, TrainingBlock, TrainingPhase, TssRange,
};
pub use stats::{StatsCalculator, WorkoutStats, ZoneDurations};
pub use targets::{
    estimated_max_hr_from_age, ResolvedTarget, TargetResolver, TargetStatus, TargetUnit,
};
pub use error::{CoreError, ErrorSeverity, Result};
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
