//! Unified error hierarchy
//!
//! Folds the per-module error types into one top-level enum with
//! severity classification for the tracing and CLI layers. The
//! calculators themselves stay quiet; these errors come from the
//! advisory validation passes and the surrounding tooling.

use thiserror::Error;

use crate::config::ConfigError;
use crate::models::ModelError;
use crate::projection::ProjectionError;

/// Top-level error type for traincore operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Workout plan structure errors
    #[error("Plan structure error: {0}")]
    Plan(#[from] ModelError),

    /// Block schedule and projection errors
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for traincore operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Plan(_) => ErrorSeverity::Warning,
            CoreError::Projection(ProjectionError::ConfigurationError(_)) => ErrorSeverity::Error,
            CoreError::Projection(_) => ErrorSeverity::Warning,
            CoreError::Configuration(_) => ErrorSeverity::Error,
            CoreError::Io(_) => ErrorSeverity::Error,
            CoreError::Internal(_) => ErrorSeverity::Critical,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Plan(err) => {
                format!("The workout plan has a structural problem: {}", err)
            }
            CoreError::Projection(ProjectionError::NonContiguousBlocks(detail)) => {
                format!(
                    "Training blocks must follow each other without gaps ({})",
                    detail
                )
            }
            CoreError::Projection(ProjectionError::OverlappingBlocks(detail)) => {
                format!("Training blocks must not overlap ({})", detail)
            }
            CoreError::Configuration(err) => {
                format!("Configuration problem: {}. Check your config file.", err)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
