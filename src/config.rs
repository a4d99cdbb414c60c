use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logging::LogConfig;
use crate::models::AthleteSnapshot;
use crate::projection::ProjectionConfig;

/// Configuration validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Lower bounds (%FTP, inclusive) for power zones 2 through 5
///
/// Everything below `z2_min` is zone 1; everything at or above `z5_min`
/// is zone 5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneCutoffs {
    pub z2_min: Decimal,
    pub z3_min: Decimal,
    pub z4_min: Decimal,
    pub z5_min: Decimal,
}

impl Default for ZoneCutoffs {
    fn default() -> Self {
        ZoneCutoffs {
            z2_min: dec!(56),
            z3_min: dec!(76),
            z4_min: dec!(91),
            z5_min: dec!(106),
        }
    }
}

/// Tunable constants shared by the workout calculators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationConfig {
    /// Fallback FTP in watts when the athlete has none on file
    pub reference_ftp: Decimal,

    /// %FTP above which a step counts as an interval effort
    pub interval_threshold_pct: Decimal,

    /// Calories estimated per TSS point
    pub calorie_factor: Decimal,

    /// Seconds assumed per kilometer for distance-based steps
    pub seconds_per_km: Decimal,

    /// Seconds assumed per movement repetition (strength steps)
    pub seconds_per_repetition: Decimal,

    /// Display length in seconds for open-ended steps
    pub open_ended_step_secs: Decimal,

    /// Tolerance band around point targets, as a fraction (0.05 = 5%)
    pub target_tolerance: Decimal,

    /// Power zone boundaries in %FTP
    pub zone_cutoffs: ZoneCutoffs,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        CalculationConfig {
            reference_ftp: dec!(250),
            interval_threshold_pct: dec!(85),
            calorie_factor: dec!(4),
            seconds_per_km: dec!(60),
            seconds_per_repetition: dec!(30),
            open_ended_step_secs: dec!(300),
            target_tolerance: dec!(0.05),
            zone_cutoffs: ZoneCutoffs::default(),
        }
    }
}

impl CalculationConfig {
    /// Check the constants for values the calculators cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reference_ftp <= Decimal::ZERO {
            return Err(ConfigError::ValidationFailed(
                "Reference FTP must be positive".to_string(),
            ));
        }
        if self.interval_threshold_pct <= Decimal::ZERO {
            return Err(ConfigError::ValidationFailed(
                "Interval threshold must be positive".to_string(),
            ));
        }
        if self.calorie_factor < Decimal::ZERO {
            return Err(ConfigError::ValidationFailed(
                "Calorie factor must not be negative".to_string(),
            ));
        }
        if self.seconds_per_km <= Decimal::ZERO || self.seconds_per_repetition <= Decimal::ZERO {
            return Err(ConfigError::ValidationFailed(
                "Duration heuristics must be positive".to_string(),
            ));
        }
        if self.open_ended_step_secs < Decimal::ZERO {
            return Err(ConfigError::ValidationFailed(
                "Open-ended display length must not be negative".to_string(),
            ));
        }
        if self.target_tolerance <= Decimal::ZERO || self.target_tolerance >= Decimal::ONE {
            return Err(ConfigError::ValidationFailed(
                "Target tolerance must be a fraction between 0 and 1".to_string(),
            ));
        }
        let cutoffs = &self.zone_cutoffs;
        if cutoffs.z2_min <= Decimal::ZERO
            || cutoffs.z2_min >= cutoffs.z3_min
            || cutoffs.z3_min >= cutoffs.z4_min
            || cutoffs.z4_min >= cutoffs.z5_min
        {
            return Err(ConfigError::ValidationFailed(
                "Zone cutoffs must be positive and strictly ascending".to_string(),
            ));
        }
        Ok(())
    }
}

/// Main application configuration
///
/// Sections a config file leaves out fall back to their defaults, so a
/// minimal file can override a single constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Athlete thresholds used when a command does not override them
    pub athlete: AthleteSnapshot,

    /// Workout calculator constants
    pub calculation: CalculationConfig,

    /// Training load projection settings
    pub projection: ProjectionConfig,

    /// Logging settings
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            athlete: AthleteSnapshot::default(),
            calculation: CalculationConfig::default(),
            projection: ProjectionConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize configuration")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".traincore")
            .join("config.toml")
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            match Self::load_from_file(&config_path) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!("Ignoring unreadable config {}: {err:#}", config_path.display());
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// Validate every section that carries numeric constants
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calculation.validate()?;
        self.projection
            .validate()
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;
        Ok(())
    }
}
