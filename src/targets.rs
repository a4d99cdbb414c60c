use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::CalculationConfig;
use crate::models::{AthleteSnapshot, IntensityTarget, TargetMetric};

/// Unit a resolved target is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetUnit {
    Watts,
    Bpm,
    Rpm,
    Percent,
}

impl fmt::Display for TargetUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self {
            TargetUnit::Watts => "W",
            TargetUnit::Bpm => "bpm",
            TargetUnit::Rpm => "rpm",
            TargetUnit::Percent => "%",
        };
        write!(f, "{}", unit)
    }
}

/// Where a live reading sits relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Within,
    Below,
    Above,
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            TargetStatus::Within => "within",
            TargetStatus::Below => "below",
            TargetStatus::Above => "above",
        };
        write!(f, "{}", status)
    }
}

/// An intensity target converted to absolute executable units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    /// Point intensity; midpoint when the target was a pure range
    pub intensity: Decimal,

    /// Lower bound for ranged targets
    pub min: Option<Decimal>,

    /// Upper bound for ranged targets
    pub max: Option<Decimal>,

    /// Unit of all three values
    pub unit: TargetUnit,

    /// Human-readable form ("175 W", "140-160 bpm")
    pub label: String,
}

/// Resolves relative intensity targets against athlete thresholds
///
/// Relative metrics (%FTP, %max HR, %threshold HR) scale by the
/// matching athlete threshold; absolute metrics pass through with a
/// unit attached. Resolution is quiet: a missing or zero threshold
/// yields `None` rather than an error, and the caller falls back to
/// displaying the target in its relative form.
pub struct TargetResolver {
    config: CalculationConfig,
}

impl TargetResolver {
    /// Create a resolver with default tolerance settings
    pub fn new() -> Self {
        TargetResolver {
            config: CalculationConfig::default(),
        }
    }

    /// Create a resolver with custom tolerance settings
    pub fn with_config(config: CalculationConfig) -> Self {
        TargetResolver { config }
    }

    /// Convert a target to absolute units against the athlete's thresholds
    ///
    /// Returns `None` when the required threshold is missing or zero,
    /// or when the target carries neither a value nor a range.
    pub fn resolve(
        &self,
        target: &IntensityTarget,
        athlete: &AthleteSnapshot,
    ) -> Option<ResolvedTarget> {
        let (factor, unit) = match target.metric {
            TargetMetric::PercentFtp => match athlete.ftp {
                Some(ftp) if ftp > 0 => (Decimal::from(ftp) / dec!(100), TargetUnit::Watts),
                _ => return None,
            },
            TargetMetric::Watts => (Decimal::ONE, TargetUnit::Watts),
            TargetMetric::PercentThresholdHr => match athlete.threshold_hr {
                Some(hr) if hr > 0 => (Decimal::from(hr) / dec!(100), TargetUnit::Bpm),
                _ => return None,
            },
            TargetMetric::PercentMaxHr => match athlete.max_hr {
                Some(hr) if hr > 0 => (Decimal::from(hr) / dec!(100), TargetUnit::Bpm),
                _ => return None,
            },
            TargetMetric::Bpm => (Decimal::ONE, TargetUnit::Bpm),
            TargetMetric::Cadence => (Decimal::ONE, TargetUnit::Rpm),
            TargetMetric::Grade => (Decimal::ONE, TargetUnit::Percent),
        };

        let intensity = target.effective_value()? * factor;
        let min = target.range.as_ref().map(|r| r.min * factor);
        let max = target.range.as_ref().map(|r| r.max * factor);

        let label = match (min, max) {
            (Some(lower), Some(upper)) => attach_unit(
                format!("{}-{}", display_value(lower), display_value(upper)),
                unit,
            ),
            _ => attach_unit(display_value(intensity).to_string(), unit),
        };

        Some(ResolvedTarget {
            intensity,
            min,
            max,
            unit,
            label,
        })
    }

    /// Classify a live reading against a resolved target
    ///
    /// Ranged targets use their own bounds; point targets use a
    /// symmetric tolerance band around the intensity. Both bounds are
    /// inclusive.
    pub fn classify(&self, current: Decimal, resolved: &ResolvedTarget) -> TargetStatus {
        let (lower, upper) = match (resolved.min, resolved.max) {
            (Some(lower), Some(upper)) => (lower, upper),
            _ => {
                let tolerance = self.config.target_tolerance;
                (
                    resolved.intensity * (Decimal::ONE - tolerance),
                    resolved.intensity * (Decimal::ONE + tolerance),
                )
            }
        };

        if current < lower {
            TargetStatus::Below
        } else if current > upper {
            TargetStatus::Above
        } else {
            TargetStatus::Within
        }
    }

    /// Classify when either side may be missing
    ///
    /// An unresolved target or an absent reading never flags the
    /// athlete off-target.
    pub fn classify_opt(
        &self,
        current: Option<Decimal>,
        resolved: Option<&ResolvedTarget>,
    ) -> TargetStatus {
        match (current, resolved) {
            (Some(current), Some(resolved)) => self.classify(current, resolved),
            _ => TargetStatus::Within,
        }
    }
}

impl Default for TargetResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Estimate maximum heart rate from age (220 - age)
///
/// Accepts ages 10 through 100; a population formula has nothing
/// useful to say outside that range.
pub fn estimated_max_hr_from_age(age: u8) -> Option<u16> {
    if !(10..=100).contains(&age) {
        return None;
    }
    Some(220u16.saturating_sub(u16::from(age)))
}

/// Describe a target in its own terms, without athlete context
///
/// This is the wording shown when resolution is not possible or not
/// wanted: "70% FTP", "80-90% max HR", "260 W".
pub fn describe(target: &IntensityTarget) -> String {
    let quantity = match (&target.value, &target.range) {
        (Some(value), _) => value.normalize().to_string(),
        (None, Some(range)) => format!("{}-{}", range.min.normalize(), range.max.normalize()),
        (None, None) => return target.metric.to_string(),
    };

    match target.metric {
        TargetMetric::PercentFtp => format!("{}% FTP", quantity),
        TargetMetric::PercentMaxHr => format!("{}% max HR", quantity),
        TargetMetric::PercentThresholdHr => format!("{}% threshold HR", quantity),
        TargetMetric::Watts => format!("{} W", quantity),
        TargetMetric::Bpm => format!("{} bpm", quantity),
        TargetMetric::Cadence => format!("{} rpm", quantity),
        TargetMetric::Grade => format!("{}%", quantity),
    }
}

fn display_value(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

fn attach_unit(text: String, unit: TargetUnit) -> String {
    match unit {
        TargetUnit::Percent => format!("{}%", text),
        _ => format!("{} {}", text, unit),
    }
}
