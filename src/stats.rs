use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::CalculationConfig;
use crate::duration::DurationResolver;
use crate::flatten::flatten;
use crate::models::{AthleteSnapshot, PlanNode, Step, TargetMetric};

/// Planned seconds per power zone (%FTP-based, 5-zone model)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneDurations {
    pub z1: Decimal,
    pub z2: Decimal,
    pub z3: Decimal,
    pub z4: Decimal,
    pub z5: Decimal,
}

impl ZoneDurations {
    /// Total seconds across all zones
    pub fn total(&self) -> Decimal {
        self.z1 + self.z2 + self.z3 + self.z4 + self.z5
    }

    fn add(&mut self, pct_ftp: Decimal, seconds: Decimal, config: &CalculationConfig) {
        let cutoffs = &config.zone_cutoffs;
        if pct_ftp < cutoffs.z2_min {
            self.z1 += seconds;
        } else if pct_ftp < cutoffs.z3_min {
            self.z2 += seconds;
        } else if pct_ftp < cutoffs.z4_min {
            self.z3 += seconds;
        } else if pct_ftp < cutoffs.z5_min {
            self.z4 += seconds;
        } else {
            self.z5 += seconds;
        }
    }
}

/// Planning-time estimates for a structured workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutStats {
    /// Number of steps after flattening
    pub step_count: u32,

    /// Estimated total duration in seconds
    pub total_duration_secs: Decimal,

    /// Duration-weighted average intensity in %FTP
    pub avg_intensity_pct: Decimal,

    /// Highest step intensity in %FTP
    pub max_intensity_pct: Decimal,

    /// Steps hard enough to count as interval efforts
    pub interval_count: u32,

    /// Estimated Training Stress Score
    pub estimated_tss: Decimal,

    /// Estimated energy expenditure in kilocalories
    pub estimated_calories: Decimal,

    /// Estimated time in each power zone
    pub zones: ZoneDurations,
}

impl WorkoutStats {
    /// Intensity Factor implied by the average intensity (IF = avg / 100)
    pub fn intensity_factor(&self) -> Decimal {
        self.avg_intensity_pct / dec!(100)
    }
}

/// Estimates summary statistics for structured workout plans
///
/// Works entirely from the plan's intensity prescriptions, so the
/// numbers are projections of what the workout asks for, not of what
/// the athlete will actually do. Steps without a power-based target
/// contribute duration but are left out of the intensity weighting.
pub struct StatsCalculator {
    config: CalculationConfig,
    durations: DurationResolver,
}

impl StatsCalculator {
    /// Create a calculator with default constants
    pub fn new() -> Self {
        Self::with_config(CalculationConfig::default())
    }

    /// Create a calculator with custom constants
    pub fn with_config(config: CalculationConfig) -> Self {
        StatsCalculator {
            durations: DurationResolver::with_config(config.clone()),
            config,
        }
    }

    /// Estimate statistics for a structured plan
    pub fn aggregate(&self, nodes: &[PlanNode], athlete: &AthleteSnapshot) -> WorkoutStats {
        let steps = flatten(nodes);

        let mut total_secs = Decimal::ZERO;
        let mut weighted_intensity = Decimal::ZERO;
        let mut targeted_secs = Decimal::ZERO;
        let mut max_pct = Decimal::ZERO;
        let mut interval_count = 0u32;
        let mut zones = ZoneDurations::default();

        for flat in &steps {
            let seconds = self.durations.resolve(&flat.step.duration);
            total_secs += seconds;

            let pct = self.percent_ftp_equivalent(&flat.step, athlete);
            if let Some(pct) = pct {
                weighted_intensity += pct * seconds;
                targeted_secs += seconds;
                if pct > max_pct {
                    max_pct = pct;
                }
                if pct > self.config.interval_threshold_pct {
                    interval_count += 1;
                }
            }

            // Untargeted time still lands somewhere: zone 1
            zones.add(pct.unwrap_or(Decimal::ZERO), seconds, &self.config);
        }

        let avg_pct = if targeted_secs > Decimal::ZERO {
            weighted_intensity / targeted_secs
        } else {
            Decimal::ZERO
        };

        // TSS = (duration_hours × IF²) × 100
        let duration_hours = total_secs / dec!(3600);
        let intensity_factor = avg_pct / dec!(100);
        let tss = duration_hours * intensity_factor * intensity_factor * dec!(100);
        let calories = tss * self.config.calorie_factor;

        WorkoutStats {
            step_count: steps.len() as u32,
            total_duration_secs: total_secs,
            avg_intensity_pct: avg_pct,
            max_intensity_pct: max_pct,
            interval_count,
            estimated_tss: tss,
            estimated_calories: calories,
            zones,
        }
    }

    /// A step's intensity as %FTP, from its first power-based target
    ///
    /// Absolute watt targets convert through the athlete's FTP, or the
    /// configured reference FTP when the athlete has none.
    fn percent_ftp_equivalent(&self, step: &Step, athlete: &AthleteSnapshot) -> Option<Decimal> {
        let target = step.primary_power_target()?;
        let value = target.effective_value()?;

        match target.metric {
            TargetMetric::PercentFtp => Some(value),
            TargetMetric::Watts => {
                let ftp = match athlete.ftp {
                    Some(ftp) if ftp > 0 => Decimal::from(ftp),
                    _ => self.config.reference_ftp,
                };
                Some(value / ftp * dec!(100))
            }
            _ => None,
        }
    }
}

impl Default for StatsCalculator {
    fn default() -> Self {
        Self::new()
    }
}
