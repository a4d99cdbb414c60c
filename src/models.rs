use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Structural validation errors for workout plans
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Duration value must be positive, got {0}")]
    NonPositiveDuration(Decimal),
    #[error("Repetition-based duration must have a positive count")]
    ZeroDurationCount,
    #[error("Target range minimum {min} exceeds maximum {max}")]
    InvertedTargetRange { min: Decimal, max: Decimal },
    #[error("Target value {value} falls outside its range {min}..{max}")]
    TargetValueOutsideRange {
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },
}

/// Time units accepted for timed step durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Minutes,
}

/// Distance units accepted for distance-based step durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[serde(rename = "meters")]
    Meters,
    #[serde(rename = "km")]
    Kilometers,
}

/// How long a single step lasts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepDuration {
    /// Fixed time duration
    Time { value: Decimal, unit: TimeUnit },

    /// Distance to cover before the step completes
    Distance { value: Decimal, unit: DistanceUnit },

    /// Count of movement repetitions (strength work)
    Repetitions { count: u32 },

    /// Open ended, completed manually by the athlete
    UntilFinished,
}

impl StepDuration {
    /// Check the duration for structurally impossible values
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            StepDuration::Time { value, .. } | StepDuration::Distance { value, .. } => {
                if *value <= Decimal::ZERO {
                    return Err(ModelError::NonPositiveDuration(*value));
                }
            }
            StepDuration::Repetitions { count } => {
                if *count == 0 {
                    return Err(ModelError::ZeroDurationCount);
                }
            }
            StepDuration::UntilFinished => {}
        }
        Ok(())
    }
}

impl fmt::Display for StepDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepDuration::Time { value, unit } => match unit {
                TimeUnit::Seconds => write!(f, "{} s", value.normalize()),
                TimeUnit::Minutes => write!(f, "{} min", value.normalize()),
            },
            StepDuration::Distance { value, unit } => match unit {
                DistanceUnit::Meters => write!(f, "{} m", value.normalize()),
                DistanceUnit::Kilometers => write!(f, "{} km", value.normalize()),
            },
            StepDuration::Repetitions { count } => write!(f, "{} reps", count),
            StepDuration::UntilFinished => write!(f, "until finished"),
        }
    }
}

/// Metric an intensity target is expressed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMetric {
    /// Percentage of Functional Threshold Power
    PercentFtp,
    /// Absolute power in watts
    Watts,
    /// Percentage of maximum heart rate
    PercentMaxHr,
    /// Percentage of threshold heart rate
    PercentThresholdHr,
    /// Absolute heart rate in beats per minute
    Bpm,
    /// Pedaling or stride cadence
    Cadence,
    /// Treadmill or terrain grade
    Grade,
}

impl TargetMetric {
    /// True for metrics that express effort as power
    pub fn is_power(&self) -> bool {
        matches!(self, TargetMetric::PercentFtp | TargetMetric::Watts)
    }
}

impl fmt::Display for TargetMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetMetric::PercentFtp => "%FTP",
            TargetMetric::Watts => "power",
            TargetMetric::PercentMaxHr => "%max HR",
            TargetMetric::PercentThresholdHr => "%threshold HR",
            TargetMetric::Bpm => "heart rate",
            TargetMetric::Cadence => "cadence",
            TargetMetric::Grade => "grade",
        };
        write!(f, "{}", name)
    }
}

/// Inclusive low/high band for a ranged intensity target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRange {
    pub min: Decimal,
    pub max: Decimal,
}

/// A single intensity prescription attached to a step
///
/// Carries either a point value, a range, or both. Values are in the
/// metric's native scale: percents for the relative metrics, watts for
/// `Watts`, beats per minute for `Bpm`, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityTarget {
    /// Metric the target is expressed against
    pub metric: TargetMetric,

    /// Point target in the metric's native scale
    pub value: Option<Decimal>,

    /// Ranged target in the metric's native scale
    pub range: Option<TargetRange>,
}

impl IntensityTarget {
    /// Point target against the given metric
    pub fn value(metric: TargetMetric, value: Decimal) -> Self {
        IntensityTarget {
            metric,
            value: Some(value),
            range: None,
        }
    }

    /// Ranged target against the given metric
    pub fn range(metric: TargetMetric, min: Decimal, max: Decimal) -> Self {
        IntensityTarget {
            metric,
            value: None,
            range: Some(TargetRange { min, max }),
        }
    }

    /// Point value, or the midpoint when only a range is present
    pub fn effective_value(&self) -> Option<Decimal> {
        self.value.or_else(|| {
            self.range
                .as_ref()
                .map(|r| (r.min + r.max) / Decimal::from(2))
        })
    }

    /// Check the target for inverted ranges and out-of-band values
    pub fn validate(&self) -> Result<(), ModelError> {
        if let Some(range) = &self.range {
            if range.min > range.max {
                return Err(ModelError::InvertedTargetRange {
                    min: range.min,
                    max: range.max,
                });
            }
            if let Some(value) = self.value {
                if value < range.min || value > range.max {
                    return Err(ModelError::TargetValueOutsideRange {
                        value,
                        min: range.min,
                        max: range.max,
                    });
                }
            }
        }
        Ok(())
    }
}

/// A single executable step within a workout plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Short display name ("Warmup", "Hard effort")
    pub name: String,

    /// Optional longer coaching note
    pub description: Option<String>,

    /// How long the step lasts
    pub duration: StepDuration,

    /// Intensity prescriptions, possibly across several metrics
    #[serde(default)]
    pub targets: Vec<IntensityTarget>,
}

impl Step {
    /// First power-based target in prescription order, if any
    pub fn primary_power_target(&self) -> Option<&IntensityTarget> {
        self.targets.iter().find(|t| t.metric.is_power())
    }

    /// Check the step's duration and every target
    pub fn validate(&self) -> Result<(), ModelError> {
        self.duration.validate()?;
        for target in &self.targets {
            target.validate()?;
        }
        Ok(())
    }
}

/// A node in the structured plan tree
///
/// A plan is an ordered forest of these nodes. Repetition blocks nest
/// arbitrarily; a repeat count of zero contributes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanNode {
    /// Leaf step executed as-is
    Step(Step),

    /// Block of child nodes executed `repeat` times in order
    Repetition { repeat: u32, nodes: Vec<PlanNode> },
}

impl PlanNode {
    /// Validate every step reachable from this node
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                PlanNode::Step(step) => step.validate()?,
                PlanNode::Repetition { nodes, .. } => stack.extend(nodes.iter()),
            }
        }
        Ok(())
    }
}

/// A leaf step in execution order, annotated with its position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedStep {
    /// The step to execute
    pub step: Step,

    /// Zero-based position in the flattened sequence
    pub index: u32,

    /// Zero-based iteration index per enclosing repetition block,
    /// outermost first; empty for steps outside any repetition
    pub iterations: Vec<u32>,
}

impl FlattenedStep {
    /// Iteration index within the innermost enclosing repetition
    pub fn iteration(&self) -> Option<u32> {
        self.iterations.last().copied()
    }
}

/// Unit preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    Metric,
    Imperial,
}

impl Default for Units {
    fn default() -> Self {
        Units::Metric
    }
}

/// Athlete thresholds the calculations resolve against
///
/// This is a point-in-time view supplied by the caller; none of the
/// calculators mutate or persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AthleteSnapshot {
    /// Functional Threshold Power in watts
    pub ftp: Option<u16>,

    /// Lactate threshold heart rate in beats per minute
    pub threshold_hr: Option<u16>,

    /// Maximum heart rate in beats per minute
    pub max_hr: Option<u16>,

    /// Preferred units (metric/imperial)
    pub preferred_units: Units,
}

impl AthleteSnapshot {
    /// True when a positive FTP is available for power scaling
    pub fn has_power_threshold(&self) -> bool {
        matches!(self.ftp, Some(ftp) if ftp > 0)
    }
}

impl Default for AthleteSnapshot {
    fn default() -> Self {
        AthleteSnapshot {
            ftp: None,
            threshold_hr: None,
            max_hr: None,
            preferred_units: Units::default(),
        }
    }
}

/// One instantaneous sensor sample during execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Power output in watts
    pub power: Option<u16>,

    /// Heart rate in beats per minute
    pub heart_rate: Option<u16>,

    /// Cadence in revolutions (or strides) per minute
    pub cadence: Option<u16>,

    /// Speed in meters per second
    pub speed: Option<Decimal>,
}

impl Default for Reading {
    fn default() -> Self {
        Reading {
            power: None,
            heart_rate: None,
            cadence: None,
            speed: None,
        }
    }
}
